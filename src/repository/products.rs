use rusqlite::Connection;

use super::{clean_optional, ensure_exists, require_text};
use crate::db::now_timestamp;
use crate::error::{AppError, AppResult};
use crate::listing::ProductQuery;
use crate::models::{CreateProduct, Product, UpdateProduct};
use crate::pricing::round_money;

const SELECT_PRODUCT: &str = "SELECT p.id, p.name, p.description, p.price, p.category_id, c.name, p.is_available,
            p.stock_quantity, p.low_stock_threshold, p.image_url, p.created_at, p.updated_at
     FROM products p
     LEFT JOIN categories c ON p.category_id = c.id";

fn map_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        category_id: row.get(4)?,
        category_name: row.get(5)?,
        is_available: row.get(6)?,
        stock_quantity: row.get(7)?,
        low_stock_threshold: row.get(8)?,
        image_url: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn validate(name: &str, price: f64, threshold: i64, stock: Option<i64>) -> AppResult<String> {
    let name = require_text(name, "Product name")?;
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::validation("Price must be zero or more"));
    }
    if threshold < 0 {
        return Err(AppError::validation("Low stock threshold must be zero or more"));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(AppError::validation("Stock quantity must be zero or more"));
    }
    Ok(name)
}

pub fn list_all(conn: &Connection) -> AppResult<Vec<Product>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY p.name", SELECT_PRODUCT))?;
    let products = stmt
        .query_map([], map_product)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(products)
}

pub fn list(conn: &Connection, query: &ProductQuery) -> AppResult<Vec<Product>> {
    Ok(query.apply(list_all(conn)?))
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Product> {
    conn.query_row(&format!("{} WHERE p.id = ?1", SELECT_PRODUCT), [id], map_product)
        .map_err(|e| AppError::or_not_found(e, format!("Product {}", id)))
}

pub fn create(conn: &Connection, input: CreateProduct) -> AppResult<Product> {
    let threshold = input.low_stock_threshold.unwrap_or(5);
    let name = validate(&input.name, input.price, threshold, input.stock_quantity)?;
    if let Some(category_id) = input.category_id {
        ensure_exists(conn, "categories", category_id, "Category")?;
    }

    let now = now_timestamp();
    conn.execute(
        "INSERT INTO products (name, description, price, category_id, is_available, stock_quantity,
                               low_stock_threshold, image_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        rusqlite::params![
            name,
            clean_optional(input.description),
            round_money(input.price),
            input.category_id,
            input.is_available.unwrap_or(true),
            input.stock_quantity,
            threshold,
            clean_optional(input.image_url),
            now,
        ],
    )?;

    let product = get(conn, conn.last_insert_rowid())?;
    tracing::info!(product_id = product.id, name = %product.name, "Product created");
    Ok(product)
}

pub fn update(conn: &Connection, input: UpdateProduct) -> AppResult<Product> {
    let name = validate(&input.name, input.price, input.low_stock_threshold, input.stock_quantity)?;
    ensure_exists(conn, "products", input.id, "Product")?;
    if let Some(category_id) = input.category_id {
        ensure_exists(conn, "categories", category_id, "Category")?;
    }

    conn.execute(
        "UPDATE products SET name = ?1, description = ?2, price = ?3, category_id = ?4, is_available = ?5,
                stock_quantity = ?6, low_stock_threshold = ?7, image_url = ?8, updated_at = ?9
         WHERE id = ?10",
        rusqlite::params![
            name,
            clean_optional(input.description),
            round_money(input.price),
            input.category_id,
            input.is_available,
            input.stock_quantity,
            input.low_stock_threshold,
            clean_optional(input.image_url),
            now_timestamp(),
            input.id,
        ],
    )?;

    get(conn, input.id)
}

/// Products that appear on past orders cannot be removed; mark them
/// unavailable instead so order history keeps its references.
pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    ensure_exists(conn, "products", id, "Product")?;

    let used: i64 = conn.query_row(
        "SELECT COUNT(*) FROM order_items WHERE product_id = ?1",
        [id],
        |row| row.get(0),
    )?;
    if used > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a product that appears on orders; mark it unavailable instead".to_string(),
        ));
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM products_daily_analysis WHERE product_id = ?1", [id])?;
    tx.execute("DELETE FROM products WHERE id = ?1", [id])?;
    tx.commit()?;

    tracing::info!(product_id = id, "Product deleted");
    Ok(())
}

pub fn set_availability(conn: &Connection, id: i64, available: bool) -> AppResult<Product> {
    conn.execute(
        "UPDATE products SET is_available = ?1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![available, now_timestamp(), id],
    )?;
    if conn.changes() == 0 {
        return Err(AppError::not_found(format!("Product {}", id)));
    }
    get(conn, id)
}

/// Manual stock correction. Untracked products start tracking from zero.
pub fn adjust_stock(conn: &Connection, id: i64, delta: i64) -> AppResult<Product> {
    let product = get(conn, id)?;
    let next = product.stock_quantity.unwrap_or(0) + delta;
    if next < 0 {
        return Err(AppError::validation(format!(
            "Insufficient stock for {}: available {}, adjustment {}",
            product.name,
            product.stock_quantity.unwrap_or(0),
            delta
        )));
    }

    conn.execute(
        "UPDATE products SET stock_quantity = ?1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![next, now_timestamp(), id],
    )?;
    get(conn, id)
}

pub fn low_stock(conn: &Connection) -> AppResult<Vec<Product>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE p.stock_quantity IS NOT NULL AND p.stock_quantity <= p.low_stock_threshold
         ORDER BY p.stock_quantity ASC",
        SELECT_PRODUCT
    ))?;

    let products = stmt
        .query_map([], map_product)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(products)
}
