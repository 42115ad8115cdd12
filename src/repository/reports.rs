//! Per-product daily sales rollups and day summaries.

use chrono::{Duration, NaiveDate};
use rusqlite::Connection;

use crate::error::{AppError, AppResult};
use crate::models::{DaySummary, OrderStatus, ProductDailyAnalysis, TopProduct};
use crate::pricing::round_money;

use super::{orders, sql_limit};

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Rebuilds the `products_daily_analysis` rows for one day from the
/// non-cancelled orders placed on it. Returns the number of rows written.
pub fn refresh_daily_analysis(conn: &Connection, date: NaiveDate) -> AppResult<usize> {
    let day = format_date(date);
    let tx = conn.unchecked_transaction()?;

    tx.execute("DELETE FROM products_daily_analysis WHERE date = ?1", [&day])?;
    let written = tx.execute(
        "INSERT INTO products_daily_analysis (product_id, date, units_sold, revenue, order_count)
         SELECT oi.product_id, ?1, SUM(oi.quantity), ROUND(SUM(oi.total), 2), COUNT(DISTINCT oi.order_id)
         FROM order_items oi
         JOIN orders o ON oi.order_id = o.id
         WHERE date(o.created_at) = ?1 AND o.status != ?2
         GROUP BY oi.product_id",
        rusqlite::params![day, OrderStatus::Cancelled],
    )?;

    tx.commit()?;
    tracing::info!(date = %day, products = written, "Daily analysis refreshed");
    Ok(written)
}

/// The last `days` days of rollups for one product, oldest first.
pub fn product_analysis(
    conn: &Connection,
    product_id: i64,
    days: i64,
    today: NaiveDate,
) -> AppResult<Vec<ProductDailyAnalysis>> {
    if days <= 0 {
        return Err(AppError::validation("Days must be greater than zero"));
    }
    let from = Duration::try_days(days - 1)
        .and_then(|span| today.checked_sub_signed(span))
        .ok_or_else(|| AppError::validation(format!("Days is out of range: {}", days)))?;

    let mut stmt = conn.prepare(
        "SELECT a.product_id, p.name, a.date, a.units_sold, a.revenue, a.order_count
         FROM products_daily_analysis a
         LEFT JOIN products p ON a.product_id = p.id
         WHERE a.product_id = ?1 AND a.date BETWEEN ?2 AND ?3
         ORDER BY a.date",
    )?;
    let rows = stmt
        .query_map(
            rusqlite::params![product_id, format_date(from), format_date(today)],
            |row| {
                Ok(ProductDailyAnalysis {
                    product_id: row.get(0)?,
                    product_name: row.get(1)?,
                    date: row.get(2)?,
                    units_sold: row.get(3)?,
                    revenue: row.get(4)?,
                    order_count: row.get(5)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Best sellers by revenue over an inclusive date range, computed from the
/// orders themselves so it never lags behind the rollup table.
pub fn top_products(conn: &Connection, from: NaiveDate, to: NaiveDate, limit: usize) -> AppResult<Vec<TopProduct>> {
    if to < from {
        return Err(AppError::validation("End date must not be before start date"));
    }

    let mut stmt = conn.prepare(
        "SELECT oi.product_id, oi.product_name, SUM(oi.quantity), SUM(oi.total)
         FROM order_items oi
         JOIN orders o ON oi.order_id = o.id
         WHERE date(o.created_at) BETWEEN ?1 AND ?2 AND o.status != ?3
         GROUP BY oi.product_id
         ORDER BY SUM(oi.total) DESC, SUM(oi.quantity) DESC, oi.product_id
         LIMIT ?4",
    )?;
    let products = stmt
        .query_map(
            rusqlite::params![format_date(from), format_date(to), OrderStatus::Cancelled, sql_limit(limit)],
            |row| {
                Ok(TopProduct {
                    product_id: row.get(0)?,
                    name: row.get(1)?,
                    units_sold: row.get(2)?,
                    revenue: round_money(row.get(3)?),
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(products)
}

pub fn day_summary(conn: &Connection, date: NaiveDate) -> AppResult<DaySummary> {
    let day = format_date(date);
    let orders = orders::load_where(conn, "date(o.created_at) = ?1", [&day])?;

    let counted = orders
        .iter()
        .filter(|o| o.order.status != OrderStatus::Cancelled);
    let total_revenue = round_money(counted.clone().map(|o| o.order.total).sum());
    let total_orders = counted.count() as i64;

    Ok(DaySummary {
        date: day,
        total_revenue,
        total_orders,
        orders,
    })
}
