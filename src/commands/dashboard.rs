use crate::db::{today, DatabaseExt};
use crate::error::AppResult;
use crate::models::{DashboardPeriod, DashboardStats};
use crate::repository::dashboard;
use tauri::AppHandle;

#[tauri::command]
pub fn get_dashboard_stats(app: AppHandle, period: Option<DashboardPeriod>) -> AppResult<DashboardStats> {
    let db = app.db();
    let conn = db.lock()?;
    dashboard::stats(&conn, period.unwrap_or_default(), today())
}
