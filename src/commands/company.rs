use tauri::{AppHandle, Manager};

use crate::config::AppConfig;
use crate::db::DatabaseExt;
use crate::error::AppResult;
use crate::models::{Company, UpdateCompany, UpsertUserProfile, UserProfile};
use crate::repository::company;

#[tauri::command]
pub fn get_company(app: AppHandle) -> AppResult<Option<Company>> {
    let db = app.db();
    let conn = db.lock()?;
    company::get_company(&conn)
}

#[tauri::command]
pub fn update_company(app: AppHandle, company: UpdateCompany) -> AppResult<Company> {
    let currency = app.state::<AppConfig>().currency.clone();
    let db = app.db();
    let conn = db.lock()?;
    company::update_company(&conn, company, &currency)
}

#[tauri::command]
pub fn get_user_profile(app: AppHandle, email: String) -> AppResult<UserProfile> {
    let db = app.db();
    let conn = db.lock()?;
    company::get_profile(&conn, &email)
}

#[tauri::command]
pub fn upsert_user_profile(app: AppHandle, profile: UpsertUserProfile) -> AppResult<UserProfile> {
    let db = app.db();
    let conn = db.lock()?;
    company::upsert_profile(&conn, profile)
}
