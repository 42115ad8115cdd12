use rusqlite::Connection;

use super::{clean_optional, ensure_exists, require_text};
use crate::error::{AppError, AppResult};
use crate::models::{Category, CreateCategory, UpdateCategory};

fn map_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        sort_order: row.get(3)?,
    })
}

pub fn list(conn: &Connection) -> AppResult<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, sort_order FROM categories ORDER BY sort_order, name",
    )?;

    let categories = stmt
        .query_map([], map_category)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(categories)
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Category> {
    conn.query_row(
        "SELECT id, name, description, sort_order FROM categories WHERE id = ?1",
        [id],
        map_category,
    )
    .map_err(|e| AppError::or_not_found(e, format!("Category {}", id)))
}

pub fn create(conn: &Connection, input: CreateCategory) -> AppResult<Category> {
    let name = require_text(&input.name, "Category name")?;

    // New categories go to the end of the menu.
    let next_position: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM categories",
        [],
        |row| row.get(0),
    )?;

    conn.execute(
        "INSERT INTO categories (name, description, sort_order) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, clean_optional(input.description), next_position],
    )
    .map_err(|e| AppError::or_conflict(e, format!("Category '{}' already exists", name)))?;

    get(conn, conn.last_insert_rowid())
}

pub fn update(conn: &Connection, input: UpdateCategory) -> AppResult<Category> {
    let name = require_text(&input.name, "Category name")?;
    ensure_exists(conn, "categories", input.id, "Category")?;

    conn.execute(
        "UPDATE categories SET name = ?1, description = ?2 WHERE id = ?3",
        rusqlite::params![name, clean_optional(input.description), input.id],
    )
    .map_err(|e| AppError::or_conflict(e, format!("Category '{}' already exists", name)))?;

    get(conn, input.id)
}

pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;

    // Set category_id to NULL for products in this category
    tx.execute(
        "UPDATE products SET category_id = NULL WHERE category_id = ?1",
        [id],
    )?;

    tx.execute("DELETE FROM categories WHERE id = ?1", [id])?;
    if tx.changes() == 0 {
        return Err(AppError::not_found(format!("Category {}", id)));
    }

    tx.commit()?;
    Ok(())
}

/// Rewrites `sort_order` so categories appear in the given order.
/// Categories missing from `ids` keep their relative order after the listed ones.
pub fn reorder(conn: &Connection, ids: &[i64]) -> AppResult<Vec<Category>> {
    let current = list(conn)?;
    for id in ids {
        if !current.iter().any(|c| c.id == *id) {
            return Err(AppError::not_found(format!("Category {}", id)));
        }
    }

    let mut ordered: Vec<i64> = Vec::with_capacity(current.len());
    for id in ids {
        if !ordered.contains(id) {
            ordered.push(*id);
        }
    }
    ordered.extend(current.iter().map(|c| c.id).filter(|id| !ids.contains(id)));

    let tx = conn.unchecked_transaction()?;
    for (position, id) in ordered.iter().enumerate() {
        tx.execute(
            "UPDATE categories SET sort_order = ?1 WHERE id = ?2",
            rusqlite::params![position as i64, id],
        )?;
    }
    tx.commit()?;

    list(conn)
}
