use chrono::{Duration, Months, NaiveDate};
use rusqlite::Connection;

use super::{ensure_exists, require_text};
use crate::db::now_timestamp;
use crate::error::{AppError, AppResult};
use crate::models::{
    BillingCycle, CreateSubscription, Subscription, SubscriptionStats, SubscriptionStatus, UpdateSubscription,
};
use crate::pricing::round_money;
use crate::workflow::ensure_subscription_transition;

impl BillingCycle {
    /// Next billing date one cycle after `date`. Month arithmetic clamps to
    /// the end of shorter months (Jan 31 + 1 month = Feb 28/29). Fails with a
    /// validation error past the last representable date.
    pub fn advance(self, date: NaiveDate) -> AppResult<NaiveDate> {
        let next = match self {
            BillingCycle::Weekly => date.checked_add_signed(Duration::days(7)),
            BillingCycle::Monthly => date.checked_add_months(Months::new(1)),
            BillingCycle::Yearly => date.checked_add_months(Months::new(12)),
        };
        next.ok_or_else(|| AppError::validation(format!("Billing date {} is out of range", date)))
    }

    pub fn monthly_equivalent(self, price: f64) -> f64 {
        match self {
            BillingCycle::Weekly => price * 52.0 / 12.0,
            BillingCycle::Monthly => price,
            BillingCycle::Yearly => price / 12.0,
        }
    }
}

const SELECT_SUBSCRIPTION: &str = "SELECT s.id, s.customer_id, c.name, s.plan_name, s.price, s.billing_cycle, s.meals_per_cycle,
            s.status, s.start_date, s.next_billing_date, s.created_at
     FROM subscriptions s
     LEFT JOIN customers c ON s.customer_id = c.id";

fn map_subscription(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        customer_name: row.get(2)?,
        plan_name: row.get(3)?,
        price: row.get(4)?,
        billing_cycle: row.get(5)?,
        meals_per_cycle: row.get(6)?,
        status: row.get(7)?,
        start_date: row.get(8)?,
        next_billing_date: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date: {}", value)))
}

fn validate_plan(plan_name: &str, price: f64, meals: i64) -> AppResult<String> {
    let plan_name = require_text(plan_name, "Plan name")?;
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::validation("Subscription price must be greater than zero"));
    }
    if meals < 0 {
        return Err(AppError::validation("Meals per cycle cannot be negative"));
    }
    Ok(plan_name)
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Subscription> {
    conn.query_row(&format!("{} WHERE s.id = ?1", SELECT_SUBSCRIPTION), [id], map_subscription)
        .map_err(|e| AppError::or_not_found(e, format!("Subscription {}", id)))
}

pub fn list(conn: &Connection, status: Option<SubscriptionStatus>) -> AppResult<Vec<Subscription>> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY s.next_billing_date, s.id",
        SELECT_SUBSCRIPTION
    ))?;

    let subscriptions = stmt
        .query_map([], map_subscription)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(subscriptions
        .into_iter()
        .filter(|s| status.map_or(true, |wanted| s.status == wanted))
        .collect())
}

pub fn create(conn: &Connection, input: CreateSubscription, today: NaiveDate) -> AppResult<Subscription> {
    let meals = input.meals_per_cycle.unwrap_or(0);
    let plan_name = validate_plan(&input.plan_name, input.price, meals)?;
    ensure_exists(conn, "customers", input.customer_id, "Customer")?;

    let start = match input.start_date.as_deref() {
        Some(date) if !date.trim().is_empty() => parse_date(date)?,
        _ => today,
    };
    let next_billing = input.billing_cycle.advance(start)?;

    conn.execute(
        "INSERT INTO subscriptions (customer_id, plan_name, price, billing_cycle, meals_per_cycle, status,
                                    start_date, next_billing_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            input.customer_id,
            plan_name,
            round_money(input.price),
            input.billing_cycle,
            meals,
            SubscriptionStatus::Active,
            start.format("%Y-%m-%d").to_string(),
            next_billing.format("%Y-%m-%d").to_string(),
            now_timestamp(),
        ],
    )?;

    let subscription = get(conn, conn.last_insert_rowid())?;
    tracing::info!(
        subscription_id = subscription.id,
        customer_id = subscription.customer_id,
        "Subscription created"
    );
    Ok(subscription)
}

pub fn update(conn: &Connection, input: UpdateSubscription) -> AppResult<Subscription> {
    let plan_name = validate_plan(&input.plan_name, input.price, input.meals_per_cycle)?;
    let existing = get(conn, input.id)?;
    if existing.status == SubscriptionStatus::Cancelled {
        return Err(AppError::validation("Cancelled subscriptions cannot be edited"));
    }

    conn.execute(
        "UPDATE subscriptions SET plan_name = ?1, price = ?2, billing_cycle = ?3, meals_per_cycle = ?4 WHERE id = ?5",
        rusqlite::params![
            plan_name,
            round_money(input.price),
            input.billing_cycle,
            input.meals_per_cycle,
            input.id,
        ],
    )?;

    get(conn, input.id)
}

pub fn set_status(conn: &Connection, id: i64, status: SubscriptionStatus) -> AppResult<Subscription> {
    let existing = get(conn, id)?;
    ensure_subscription_transition(existing.status, status)?;

    conn.execute(
        "UPDATE subscriptions SET status = ?1 WHERE id = ?2",
        rusqlite::params![status, id],
    )?;

    tracing::info!(subscription_id = id, from = %existing.status, to = %status, "Subscription status changed");
    get(conn, id)
}

/// Records a successful billing run by pushing the next billing date out
/// one cycle.
pub fn renew(conn: &Connection, id: i64) -> AppResult<Subscription> {
    let existing = get(conn, id)?;
    if existing.status != SubscriptionStatus::Active {
        return Err(AppError::validation(format!(
            "Only active subscriptions can be renewed (this one is {})",
            existing.status
        )));
    }

    let next = existing.billing_cycle.advance(parse_date(&existing.next_billing_date)?)?;
    conn.execute(
        "UPDATE subscriptions SET next_billing_date = ?1 WHERE id = ?2",
        rusqlite::params![next.format("%Y-%m-%d").to_string(), id],
    )?;

    get(conn, id)
}

pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    conn.execute("DELETE FROM subscriptions WHERE id = ?1", [id])?;
    if conn.changes() == 0 {
        return Err(AppError::not_found(format!("Subscription {}", id)));
    }
    Ok(())
}

pub fn stats(conn: &Connection, today: NaiveDate) -> AppResult<SubscriptionStats> {
    let all = list(conn, None)?;
    let week_out = today + Duration::days(7);

    let count = |status: SubscriptionStatus| all.iter().filter(|s| s.status == status).count() as i64;
    let active: Vec<&Subscription> = all
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Active)
        .collect();

    let mrr: f64 = active
        .iter()
        .map(|s| s.billing_cycle.monthly_equivalent(s.price))
        .sum();
    let due_within_week = active
        .iter()
        .filter_map(|s| NaiveDate::parse_from_str(&s.next_billing_date, "%Y-%m-%d").ok())
        .filter(|date| *date <= week_out)
        .count() as i64;

    Ok(SubscriptionStats {
        active: count(SubscriptionStatus::Active),
        paused: count(SubscriptionStatus::Paused),
        cancelled: count(SubscriptionStatus::Cancelled),
        monthly_recurring_revenue: round_money(mrr),
        due_within_week,
    })
}
