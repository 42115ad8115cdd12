use chrono::NaiveDate;
use rusqlite::Connection;

use super::{clean_optional, ensure_exists, orders, require_text};
use crate::db::now_timestamp;
use crate::error::{AppError, AppResult};
use crate::listing::CustomerQuery;
use crate::models::{CreateCustomer, Customer, CustomerSegment, CustomerSummary, OrderWithItems, UpdateCustomer};

pub const VIP_SPEND: f64 = 500.0;
pub const VIP_ORDERS: i64 = 10;
pub const AT_RISK_DAYS: i64 = 60;

const SELECT_CUSTOMER: &str =
    "SELECT id, name, email, phone, address, notes, loyalty_points, created_at, updated_at FROM customers";

fn map_customer(row: &rusqlite::Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        notes: row.get(5)?,
        loyalty_points: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn normalize_email(email: Option<String>) -> AppResult<Option<String>> {
    match clean_optional(email) {
        Some(email) if !email.contains('@') => {
            Err(AppError::validation(format!("'{}' is not a valid email address", email)))
        }
        other => Ok(other.map(|e| e.to_lowercase())),
    }
}

pub fn segment_for(total_orders: i64, total_spent: f64, last_order_at: Option<&str>, today: NaiveDate) -> CustomerSegment {
    if total_spent >= VIP_SPEND || total_orders >= VIP_ORDERS {
        return CustomerSegment::Vip;
    }
    if total_orders <= 1 {
        return CustomerSegment::New;
    }
    let last = last_order_at
        .and_then(|ts| ts.get(..10))
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
    match last {
        Some(last) if (today - last).num_days() > AT_RISK_DAYS => CustomerSegment::AtRisk,
        _ => CustomerSegment::Regular,
    }
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Customer> {
    conn.query_row(&format!("{} WHERE id = ?1", SELECT_CUSTOMER), [id], map_customer)
        .map_err(|e| AppError::or_not_found(e, format!("Customer {}", id)))
}

pub fn list(conn: &Connection, query: &CustomerQuery, today: NaiveDate) -> AppResult<Vec<CustomerSummary>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.email, c.phone, c.address, c.notes, c.loyalty_points, c.created_at, c.updated_at,
                COUNT(o.id), COALESCE(SUM(o.total), 0), MAX(o.created_at)
         FROM customers c
         LEFT JOIN orders o ON o.customer_id = c.id AND o.status != 'cancelled'
         GROUP BY c.id
         ORDER BY c.id",
    )?;

    let summaries = stmt
        .query_map([], |row| {
            let customer = map_customer(row)?;
            let total_orders: i64 = row.get(9)?;
            let total_spent: f64 = row.get(10)?;
            let last_order_at: Option<String> = row.get(11)?;
            Ok(CustomerSummary {
                segment: segment_for(total_orders, total_spent, last_order_at.as_deref(), today),
                customer,
                total_orders,
                total_spent: crate::pricing::round_money(total_spent),
                last_order_at,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(query.apply(summaries))
}

pub fn create(conn: &Connection, input: CreateCustomer) -> AppResult<Customer> {
    let name = require_text(&input.name, "Customer name")?;
    let email = normalize_email(input.email)?;
    let now = now_timestamp();

    conn.execute(
        "INSERT INTO customers (name, email, phone, address, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        rusqlite::params![
            name,
            email,
            clean_optional(input.phone),
            clean_optional(input.address),
            clean_optional(input.notes),
            now,
        ],
    )
    .map_err(|e| AppError::or_conflict(e, "A customer with this email already exists"))?;

    let customer = get(conn, conn.last_insert_rowid())?;
    tracing::info!(customer_id = customer.id, "Customer created");
    Ok(customer)
}

pub fn update(conn: &Connection, input: UpdateCustomer) -> AppResult<Customer> {
    let name = require_text(&input.name, "Customer name")?;
    let email = normalize_email(input.email)?;
    ensure_exists(conn, "customers", input.id, "Customer")?;

    conn.execute(
        "UPDATE customers SET name = ?1, email = ?2, phone = ?3, address = ?4, notes = ?5, updated_at = ?6
         WHERE id = ?7",
        rusqlite::params![
            name,
            email,
            clean_optional(input.phone),
            clean_optional(input.address),
            clean_optional(input.notes),
            now_timestamp(),
            input.id,
        ],
    )
    .map_err(|e| AppError::or_conflict(e, "A customer with this email already exists"))?;

    get(conn, input.id)
}

/// Orders survive as walk-in orders; the customer's subscriptions go with them.
pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    ensure_exists(conn, "customers", id, "Customer")?;

    let tx = conn.unchecked_transaction()?;
    tx.execute("UPDATE orders SET customer_id = NULL WHERE customer_id = ?1", [id])?;
    tx.execute("DELETE FROM subscriptions WHERE customer_id = ?1", [id])?;
    tx.execute("DELETE FROM customers WHERE id = ?1", [id])?;
    tx.commit()?;

    tracing::info!(customer_id = id, "Customer deleted");
    Ok(())
}

pub fn orders_for(conn: &Connection, id: i64) -> AppResult<Vec<OrderWithItems>> {
    ensure_exists(conn, "customers", id, "Customer")?;
    let mut all = orders::load_where(conn, "o.customer_id = ?1", [id])?;
    all.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
    Ok(all)
}

/// Adds (or with a negative delta, redeems) loyalty points, never below zero.
pub fn adjust_loyalty_points(conn: &Connection, id: i64, delta: i64) -> AppResult<Customer> {
    let customer = get(conn, id)?;
    let next = customer.loyalty_points + delta;
    if next < 0 {
        return Err(AppError::validation(format!(
            "Customer only has {} loyalty points",
            customer.loyalty_points
        )));
    }

    conn.execute(
        "UPDATE customers SET loyalty_points = ?1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![next, now_timestamp(), id],
    )?;
    get(conn, id)
}
