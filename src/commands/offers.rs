use chrono::NaiveDate;
use tauri::AppHandle;

use crate::db::{today, DatabaseExt};
use crate::error::AppResult;
use crate::models::{CreateOffer, Offer, UpdateOffer};
use crate::repository::offers;

#[tauri::command]
pub fn get_offers(app: AppHandle) -> AppResult<Vec<Offer>> {
    let db = app.db();
    let conn = db.lock()?;
    offers::list(&conn)
}

#[tauri::command]
pub fn get_active_offers(app: AppHandle, date: Option<NaiveDate>) -> AppResult<Vec<Offer>> {
    let db = app.db();
    let conn = db.lock()?;
    offers::active_on(&conn, date.unwrap_or_else(today))
}

#[tauri::command]
pub fn get_offer(app: AppHandle, id: i64) -> AppResult<Offer> {
    let db = app.db();
    let conn = db.lock()?;
    offers::get(&conn, id)
}

#[tauri::command]
pub fn find_offer_by_code(app: AppHandle, code: String) -> AppResult<Option<Offer>> {
    let db = app.db();
    let conn = db.lock()?;
    offers::find_by_code(&conn, &code)
}

#[tauri::command]
pub fn create_offer(app: AppHandle, offer: CreateOffer) -> AppResult<Offer> {
    let db = app.db();
    let conn = db.lock()?;
    offers::create(&conn, offer)
}

#[tauri::command]
pub fn update_offer(app: AppHandle, offer: UpdateOffer) -> AppResult<Offer> {
    let db = app.db();
    let conn = db.lock()?;
    offers::update(&conn, offer)
}

#[tauri::command]
pub fn set_offer_active(app: AppHandle, id: i64, active: bool) -> AppResult<Offer> {
    let db = app.db();
    let conn = db.lock()?;
    offers::set_active(&conn, id, active)
}

#[tauri::command]
pub fn delete_offer(app: AppHandle, id: i64) -> AppResult<()> {
    let db = app.db();
    let conn = db.lock()?;
    offers::delete(&conn, id)
}
