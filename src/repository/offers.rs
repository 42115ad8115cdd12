use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

use super::{clean_optional, ensure_exists, require_text};
use crate::db::now_timestamp;
use crate::error::{AppError, AppResult};
use crate::models::{CreateOffer, DiscountType, Offer, UpdateOffer};
use crate::pricing::{apply_discount, round_money};

const SELECT_OFFER: &str = "SELECT id, title, description, code, discount_type, discount_value, min_order_amount,
            starts_at, ends_at, is_active, created_at
     FROM offers";

fn map_offer(row: &rusqlite::Row<'_>) -> rusqlite::Result<Offer> {
    Ok(Offer {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        code: row.get(3)?,
        discount_type: row.get(4)?,
        discount_value: row.get(5)?,
        min_order_amount: row.get(6)?,
        starts_at: row.get(7)?,
        ends_at: row.get(8)?,
        is_active: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

impl Offer {
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        if !self.is_active {
            return false;
        }
        let started = parse_date(self.starts_at.as_deref()).map_or(true, |start| date >= start);
        let not_ended = parse_date(self.ends_at.as_deref()).map_or(true, |end| date <= end);
        started && not_ended
    }

    /// Discount this offer grants on `subtotal`; zero below the minimum order.
    pub fn discount_for(&self, subtotal: f64) -> f64 {
        if subtotal < self.min_order_amount {
            return 0.0;
        }
        apply_discount(subtotal, self.discount_type, self.discount_value)
    }
}

struct OfferFields {
    title: String,
    code: Option<String>,
    starts_at: Option<String>,
    ends_at: Option<String>,
}

fn validate(
    title: &str,
    code: Option<String>,
    discount_type: DiscountType,
    discount_value: f64,
    min_order_amount: f64,
    starts_at: Option<String>,
    ends_at: Option<String>,
) -> AppResult<OfferFields> {
    let title = require_text(title, "Offer title")?;

    match discount_type {
        DiscountType::Percentage if !(discount_value > 0.0 && discount_value <= 100.0) => {
            return Err(AppError::validation("Percentage discount must be between 0 and 100"));
        }
        DiscountType::FixedAmount if !(discount_value > 0.0) => {
            return Err(AppError::validation("Fixed discount must be greater than zero"));
        }
        _ => {}
    }
    if !(min_order_amount >= 0.0) {
        return Err(AppError::validation("Minimum order amount must be zero or more"));
    }

    let starts_at = clean_optional(starts_at);
    let ends_at = clean_optional(ends_at);
    for date in [&starts_at, &ends_at].into_iter().flatten() {
        if parse_date(Some(date)).is_none() {
            return Err(AppError::validation(format!("Invalid date: {}", date)));
        }
    }
    if let (Some(start), Some(end)) = (parse_date(starts_at.as_deref()), parse_date(ends_at.as_deref())) {
        if end < start {
            return Err(AppError::validation("Offer cannot end before it starts"));
        }
    }

    Ok(OfferFields {
        title,
        code: clean_optional(code).map(|c| c.to_uppercase()),
        starts_at,
        ends_at,
    })
}

pub fn list(conn: &Connection) -> AppResult<Vec<Offer>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY is_active DESC, created_at DESC, id DESC", SELECT_OFFER))?;
    let offers = stmt
        .query_map([], map_offer)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(offers)
}

pub fn active_on(conn: &Connection, date: NaiveDate) -> AppResult<Vec<Offer>> {
    Ok(list(conn)?.into_iter().filter(|o| o.is_valid_on(date)).collect())
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Offer> {
    conn.query_row(&format!("{} WHERE id = ?1", SELECT_OFFER), [id], map_offer)
        .map_err(|e| AppError::or_not_found(e, format!("Offer {}", id)))
}

pub fn find_by_code(conn: &Connection, code: &str) -> AppResult<Option<Offer>> {
    let offer = conn
        .query_row(
            &format!("{} WHERE code = ?1", SELECT_OFFER),
            [code.trim().to_uppercase()],
            map_offer,
        )
        .optional()?;
    Ok(offer)
}

pub fn create(conn: &Connection, input: CreateOffer) -> AppResult<Offer> {
    let min_order_amount = input.min_order_amount.unwrap_or(0.0);
    let fields = validate(
        &input.title,
        input.code,
        input.discount_type,
        input.discount_value,
        min_order_amount,
        input.starts_at,
        input.ends_at,
    )?;

    conn.execute(
        "INSERT INTO offers (title, description, code, discount_type, discount_value, min_order_amount,
                             starts_at, ends_at, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9)",
        rusqlite::params![
            fields.title,
            clean_optional(input.description),
            fields.code,
            input.discount_type,
            input.discount_value,
            round_money(min_order_amount),
            fields.starts_at,
            fields.ends_at,
            now_timestamp(),
        ],
    )
    .map_err(|e| AppError::or_conflict(e, "An offer with this code already exists"))?;

    let offer = get(conn, conn.last_insert_rowid())?;
    tracing::info!(offer_id = offer.id, code = ?offer.code, "Offer created");
    Ok(offer)
}

pub fn update(conn: &Connection, input: UpdateOffer) -> AppResult<Offer> {
    let fields = validate(
        &input.title,
        input.code,
        input.discount_type,
        input.discount_value,
        input.min_order_amount,
        input.starts_at,
        input.ends_at,
    )?;
    ensure_exists(conn, "offers", input.id, "Offer")?;

    conn.execute(
        "UPDATE offers SET title = ?1, description = ?2, code = ?3, discount_type = ?4, discount_value = ?5,
                min_order_amount = ?6, starts_at = ?7, ends_at = ?8, is_active = ?9
         WHERE id = ?10",
        rusqlite::params![
            fields.title,
            clean_optional(input.description),
            fields.code,
            input.discount_type,
            input.discount_value,
            round_money(input.min_order_amount),
            fields.starts_at,
            fields.ends_at,
            input.is_active,
            input.id,
        ],
    )
    .map_err(|e| AppError::or_conflict(e, "An offer with this code already exists"))?;

    get(conn, input.id)
}

pub fn set_active(conn: &Connection, id: i64, active: bool) -> AppResult<Offer> {
    conn.execute("UPDATE offers SET is_active = ?1 WHERE id = ?2", rusqlite::params![active, id])?;
    if conn.changes() == 0 {
        return Err(AppError::not_found(format!("Offer {}", id)));
    }
    get(conn, id)
}

/// Orders that used the offer lose the link; their stored totals stay as
/// they are until the next item change recalculates them.
pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    ensure_exists(conn, "offers", id, "Offer")?;

    let tx = conn.unchecked_transaction()?;
    tx.execute("UPDATE orders SET offer_id = NULL WHERE offer_id = ?1", [id])?;
    tx.execute("DELETE FROM offers WHERE id = ?1", [id])?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(discount_type: DiscountType, value: f64, min: f64) -> Offer {
        Offer {
            id: 1,
            title: "Lunch deal".to_string(),
            description: None,
            code: Some("LUNCH".to_string()),
            discount_type,
            discount_value: value,
            min_order_amount: min,
            starts_at: Some("2026-03-01".to_string()),
            ends_at: Some("2026-03-31".to_string()),
            is_active: true,
            created_at: "2026-02-20 09:00:00".to_string(),
        }
    }

    #[test]
    fn validity_window_is_inclusive() {
        let o = offer(DiscountType::Percentage, 10.0, 0.0);
        let day = |d| NaiveDate::from_ymd_opt(2026, 3, d).unwrap();
        assert!(o.is_valid_on(day(1)));
        assert!(o.is_valid_on(day(31)));
        assert!(!o.is_valid_on(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()));

        let inactive = Offer { is_active: false, ..o };
        assert!(!inactive.is_valid_on(day(10)));
    }

    #[test]
    fn minimum_order_gates_discount() {
        let o = offer(DiscountType::FixedAmount, 5.0, 30.0);
        assert_eq!(o.discount_for(29.99), 0.0);
        assert_eq!(o.discount_for(30.0), 5.0);

        let pct = offer(DiscountType::Percentage, 15.0, 0.0);
        assert_eq!(pct.discount_for(40.0), 6.0);
    }

    #[test]
    fn rejects_bad_percentages_and_reversed_windows() {
        let bad_pct = validate("X", None, DiscountType::Percentage, 120.0, 0.0, None, None);
        assert!(bad_pct.is_err());

        let reversed = validate(
            "X",
            None,
            DiscountType::FixedAmount,
            5.0,
            0.0,
            Some("2026-05-10".to_string()),
            Some("2026-05-01".to_string()),
        );
        assert_eq!(reversed.err().map(|e| e.code()), Some("validation"));

        let ok = validate("X", Some(" summer10 ".to_string()), DiscountType::Percentage, 10.0, 0.0, None, None)
            .unwrap();
        assert_eq!(ok.code.as_deref(), Some("SUMMER10"));
    }
}
