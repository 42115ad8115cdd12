use rusqlite::Connection;

use super::{clean_optional, ensure_exists, require_text};
use crate::db::now_timestamp;
use crate::error::{AppError, AppResult};
use crate::models::{CreateStaff, Staff, UpdateStaff};

const SELECT_STAFF: &str = "SELECT id, company_id, name, email, role, pin, is_active, created_at FROM staff";

fn map_staff(row: &rusqlite::Row<'_>) -> rusqlite::Result<Staff> {
    let pin: Option<String> = row.get(5)?;
    Ok(Staff {
        id: row.get(0)?,
        company_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        role: row.get(4)?,
        has_pin: pin.is_some(),
        pin,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn validate_pin(pin: Option<String>) -> AppResult<Option<String>> {
    match clean_optional(pin) {
        Some(pin) if !(4..=6).contains(&pin.len()) || !pin.chars().all(|c| c.is_ascii_digit()) => {
            Err(AppError::validation("PIN must be 4 to 6 digits"))
        }
        other => Ok(other),
    }
}

fn company_id(conn: &Connection) -> AppResult<Option<i64>> {
    let id = conn.query_row("SELECT MIN(id) FROM companies", [], |row| row.get(0))?;
    Ok(id)
}

pub fn list(conn: &Connection) -> AppResult<Vec<Staff>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY name", SELECT_STAFF))?;
    let staff = stmt
        .query_map([], map_staff)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(staff)
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Staff> {
    conn.query_row(&format!("{} WHERE id = ?1", SELECT_STAFF), [id], map_staff)
        .map_err(|e| AppError::or_not_found(e, format!("Staff member {}", id)))
}

pub fn create(conn: &Connection, input: CreateStaff) -> AppResult<Staff> {
    let name = require_text(&input.name, "Staff name")?;
    let pin = validate_pin(input.pin)?;

    conn.execute(
        "INSERT INTO staff (company_id, name, email, role, pin, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
        rusqlite::params![
            company_id(conn)?,
            name,
            clean_optional(input.email),
            input.role.unwrap_or_default(),
            pin,
            now_timestamp(),
        ],
    )
    .map_err(|e| AppError::or_conflict(e, format!("A staff member named '{}' already exists", name)))?;

    let staff = get(conn, conn.last_insert_rowid())?;
    tracing::info!(staff_id = staff.id, role = %staff.role, "Staff member created");
    Ok(staff)
}

pub fn update(conn: &Connection, input: UpdateStaff) -> AppResult<Staff> {
    let name = require_text(&input.name, "Staff name")?;
    let existing = get(conn, input.id)?;

    let pin = match input.pin {
        None => existing.pin,
        Some(pin) => validate_pin(Some(pin))?,
    };

    conn.execute(
        "UPDATE staff SET name = ?1, email = ?2, role = ?3, pin = ?4 WHERE id = ?5",
        rusqlite::params![name, clean_optional(input.email), input.role, pin, input.id],
    )
    .map_err(|e| AppError::or_conflict(e, format!("A staff member named '{}' already exists", name)))?;

    get(conn, input.id)
}

pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    ensure_exists(conn, "staff", id, "Staff member")?;

    // Check if staff has orders
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM orders WHERE staff_id = ?1",
        [id],
        |row| row.get(0),
    )?;

    if count > 0 {
        return Err(AppError::Conflict(
            "Cannot delete staff member with existing orders; deactivate them instead".to_string(),
        ));
    }

    conn.execute("DELETE FROM staff WHERE id = ?1", [id])?;
    Ok(())
}

pub fn set_active(conn: &Connection, id: i64, active: bool) -> AppResult<Staff> {
    conn.execute(
        "UPDATE staff SET is_active = ?1 WHERE id = ?2",
        rusqlite::params![active, id],
    )?;
    if conn.changes() == 0 {
        return Err(AppError::not_found(format!("Staff member {}", id)));
    }
    get(conn, id)
}

pub fn verify_pin(conn: &Connection, id: i64, pin: &str) -> AppResult<bool> {
    let staff = get(conn, id)?;
    if !staff.is_active {
        return Ok(false);
    }

    match staff.pin {
        Some(p) => Ok(p == pin),
        None => Ok(true), // No PIN set, allow access
    }
}
