use chrono::NaiveDate;
use tauri::AppHandle;

use crate::db::{today, DatabaseExt};
use crate::error::AppResult;
use crate::models::{DaySummary, ProductDailyAnalysis, TopProduct};
use crate::repository::reports;

#[tauri::command]
pub fn refresh_daily_analysis(app: AppHandle, date: Option<NaiveDate>) -> AppResult<usize> {
    let db = app.db();
    let conn = db.lock()?;
    reports::refresh_daily_analysis(&conn, date.unwrap_or_else(today))
}

#[tauri::command]
pub fn get_product_analysis(
    app: AppHandle,
    product_id: i64,
    days: Option<i64>,
) -> AppResult<Vec<ProductDailyAnalysis>> {
    let db = app.db();
    let conn = db.lock()?;
    reports::product_analysis(&conn, product_id, days.unwrap_or(30), today())
}

#[tauri::command]
pub fn get_top_products(
    app: AppHandle,
    from: NaiveDate,
    to: NaiveDate,
    limit: Option<usize>,
) -> AppResult<Vec<TopProduct>> {
    let db = app.db();
    let conn = db.lock()?;
    reports::top_products(&conn, from, to, limit.unwrap_or(10))
}

#[tauri::command]
pub fn get_day_summary(app: AppHandle, date: Option<NaiveDate>) -> AppResult<DaySummary> {
    let db = app.db();
    let conn = db.lock()?;
    reports::day_summary(&conn, date.unwrap_or_else(today))
}
