//! The single restaurant company record and the signed-in admin's profile.

use rusqlite::{Connection, OptionalExtension};

use super::{clean_optional, require_text};
use crate::db::now_timestamp;
use crate::error::{AppError, AppResult};
use crate::models::{Company, StaffRole, UpdateCompany, UpsertUserProfile, UserProfile};

const SELECT_COMPANY: &str =
    "SELECT id, name, address, phone, email, currency, timezone, created_at FROM companies";

fn map_company(row: &rusqlite::Row<'_>) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        currency: row.get(5)?,
        timezone: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn map_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        company_id: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        role: row.get(4)?,
        avatar_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn get_company(conn: &Connection) -> AppResult<Option<Company>> {
    let company = conn
        .query_row(&format!("{} ORDER BY id LIMIT 1", SELECT_COMPANY), [], map_company)
        .optional()?;
    Ok(company)
}

/// Updates the company, creating it on first save.
pub fn update_company(conn: &Connection, input: UpdateCompany, default_currency: &str) -> AppResult<Company> {
    let name = require_text(&input.name, "Company name")?;
    let currency = clean_optional(input.currency)
        .map(|c| c.to_uppercase())
        .unwrap_or_else(|| default_currency.to_string());
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::validation("Currency must be a three-letter code"));
    }

    match get_company(conn)? {
        Some(existing) => {
            conn.execute(
                "UPDATE companies SET name = ?1, address = ?2, phone = ?3, email = ?4, currency = ?5, timezone = ?6
                 WHERE id = ?7",
                rusqlite::params![
                    name,
                    clean_optional(input.address),
                    clean_optional(input.phone),
                    clean_optional(input.email),
                    currency,
                    clean_optional(input.timezone),
                    existing.id,
                ],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO companies (name, address, phone, email, currency, timezone, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    name,
                    clean_optional(input.address),
                    clean_optional(input.phone),
                    clean_optional(input.email),
                    currency,
                    clean_optional(input.timezone),
                    now_timestamp(),
                ],
            )?;
            let company_id = conn.last_insert_rowid();
            conn.execute("UPDATE staff SET company_id = ?1 WHERE company_id IS NULL", [company_id])?;
            conn.execute(
                "UPDATE user_profiles SET company_id = ?1 WHERE company_id IS NULL",
                [company_id],
            )?;
        }
    }

    get_company(conn)?.ok_or_else(|| AppError::not_found("Company"))
}

pub fn get_profile(conn: &Connection, email: &str) -> AppResult<UserProfile> {
    conn.query_row(
        "SELECT id, company_id, full_name, email, role, avatar_url, created_at FROM user_profiles WHERE email = ?1",
        [email.trim().to_lowercase()],
        map_profile,
    )
    .map_err(|e| AppError::or_not_found(e, format!("Profile for {}", email.trim())))
}

pub fn upsert_profile(conn: &Connection, input: UpsertUserProfile) -> AppResult<UserProfile> {
    let full_name = require_text(&input.full_name, "Full name")?;
    let email = require_text(&input.email, "Email")?.to_lowercase();
    if !email.contains('@') {
        return Err(AppError::validation(format!("'{}' is not a valid email address", email)));
    }
    let company_id = get_company(conn)?.map(|c| c.id);

    conn.execute(
        "INSERT INTO user_profiles (company_id, full_name, email, role, avatar_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(email) DO UPDATE SET
            full_name = excluded.full_name,
            role = excluded.role,
            avatar_url = excluded.avatar_url,
            company_id = COALESCE(user_profiles.company_id, excluded.company_id)",
        rusqlite::params![
            company_id,
            full_name,
            email,
            input.role.unwrap_or(StaffRole::Manager),
            clean_optional(input.avatar_url),
            now_timestamp(),
        ],
    )?;

    get_profile(conn, &email)
}
