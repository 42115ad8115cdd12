use crate::db::DatabaseExt;
use crate::error::AppResult;
use crate::models::{CreateStaff, Staff, UpdateStaff};
use crate::repository::staff;
use tauri::AppHandle;

#[tauri::command]
pub fn get_staff(app: AppHandle) -> AppResult<Vec<Staff>> {
    let db = app.db();
    let conn = db.lock()?;
    staff::list(&conn)
}

#[tauri::command]
pub fn create_staff(app: AppHandle, staff: CreateStaff) -> AppResult<Staff> {
    let db = app.db();
    let conn = db.lock()?;
    staff::create(&conn, staff)
}

#[tauri::command]
pub fn update_staff(app: AppHandle, staff: UpdateStaff) -> AppResult<Staff> {
    let db = app.db();
    let conn = db.lock()?;
    staff::update(&conn, staff)
}

#[tauri::command]
pub fn delete_staff(app: AppHandle, id: i64) -> AppResult<()> {
    let db = app.db();
    let conn = db.lock()?;
    staff::delete(&conn, id)
}

#[tauri::command]
pub fn set_staff_active(app: AppHandle, id: i64, active: bool) -> AppResult<Staff> {
    let db = app.db();
    let conn = db.lock()?;
    staff::set_active(&conn, id, active)
}

#[tauri::command]
pub fn verify_staff_pin(app: AppHandle, id: i64, pin: String) -> AppResult<bool> {
    let db = app.db();
    let conn = db.lock()?;
    staff::verify_pin(&conn, id, &pin)
}
