//! Headline figures for the dashboard cards.

use chrono::{Duration, NaiveDate};
use rusqlite::Connection;

use super::{orders, reports};
use crate::error::AppResult;
use crate::models::{DashboardPeriod, DashboardStats, OrderStatus, StatCard, StatusCount};
use crate::pricing::{average, percent_change, round_money};

const RECENT_ORDERS: usize = 5;
const TOP_PRODUCTS: usize = 5;

/// An inclusive span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// The range of equal length ending the day before this one starts.
    pub fn previous(&self) -> DateRange {
        let to = self.from - Duration::days(1);
        DateRange {
            from: to - Duration::days(self.days() - 1),
            to,
        }
    }
}

impl DashboardPeriod {
    /// Rolling window ending today: 1, 7 or 30 days.
    pub fn range(self, today: NaiveDate) -> DateRange {
        let days = match self {
            DashboardPeriod::Today => 1,
            DashboardPeriod::Week => 7,
            DashboardPeriod::Month => 30,
        };
        DateRange {
            from: today - Duration::days(days - 1),
            to: today,
        }
    }
}

struct Totals {
    revenue: f64,
    orders: i64,
    new_customers: i64,
}

fn totals(conn: &Connection, range: DateRange) -> AppResult<Totals> {
    let from = range.from.format("%Y-%m-%d").to_string();
    let to = range.to.format("%Y-%m-%d").to_string();

    let (revenue, orders): (f64, i64) = conn.query_row(
        "SELECT COALESCE(SUM(total), 0), COUNT(*) FROM orders
         WHERE date(created_at) BETWEEN ?1 AND ?2 AND status != ?3",
        rusqlite::params![from, to, OrderStatus::Cancelled],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let new_customers: i64 = conn.query_row(
        "SELECT COUNT(*) FROM customers WHERE date(created_at) BETWEEN ?1 AND ?2",
        rusqlite::params![from, to],
        |row| row.get(0),
    )?;

    Ok(Totals {
        revenue: round_money(revenue),
        orders,
        new_customers,
    })
}

fn card(value: f64, previous: f64) -> StatCard {
    StatCard {
        value,
        previous,
        change_percent: percent_change(value, previous),
    }
}

pub fn stats(conn: &Connection, period: DashboardPeriod, today: NaiveDate) -> AppResult<DashboardStats> {
    let range = period.range(today);
    let current = totals(conn, range)?;
    let previous = totals(conn, range.previous())?;

    let from = range.from.format("%Y-%m-%d").to_string();
    let to = range.to.format("%Y-%m-%d").to_string();

    let mut orders_by_status = Vec::new();
    for status in OrderStatus::board_order() {
        if status == OrderStatus::Cancelled {
            continue;
        }
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM orders WHERE status = ?1 AND date(created_at) BETWEEN ?2 AND ?3",
            rusqlite::params![status, from, to],
            |row| row.get(0),
        )?;
        orders_by_status.push(StatusCount { status, count });
    }

    let mut recent_orders = orders::load_where(conn, "o.status != ?1", [OrderStatus::Cancelled])?;
    recent_orders.truncate(RECENT_ORDERS);

    let top_products = reports::top_products(conn, range.from, range.to, TOP_PRODUCTS)?;

    Ok(DashboardStats {
        period,
        from,
        to,
        revenue: card(current.revenue, previous.revenue),
        orders: card(current.orders as f64, previous.orders as f64),
        average_order_value: card(
            average(current.revenue, current.orders),
            average(previous.revenue, previous.orders),
        ),
        new_customers: card(current.new_customers as f64, previous.new_customers as f64),
        orders_by_status,
        recent_orders,
        top_products,
    })
}
