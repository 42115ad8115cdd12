use crate::db::DatabaseExt;
use crate::error::AppResult;
use crate::models::{Category, CreateCategory, UpdateCategory};
use crate::repository::categories;
use tauri::AppHandle;

#[tauri::command]
pub fn get_categories(app: AppHandle) -> AppResult<Vec<Category>> {
    let db = app.db();
    let conn = db.lock()?;
    categories::list(&conn)
}

#[tauri::command]
pub fn create_category(app: AppHandle, category: CreateCategory) -> AppResult<Category> {
    let db = app.db();
    let conn = db.lock()?;
    categories::create(&conn, category)
}

#[tauri::command]
pub fn update_category(app: AppHandle, category: UpdateCategory) -> AppResult<Category> {
    let db = app.db();
    let conn = db.lock()?;
    categories::update(&conn, category)
}

#[tauri::command]
pub fn delete_category(app: AppHandle, id: i64) -> AppResult<()> {
    let db = app.db();
    let conn = db.lock()?;
    categories::delete(&conn, id)
}

#[tauri::command]
pub fn reorder_categories(app: AppHandle, ids: Vec<i64>) -> AppResult<Vec<Category>> {
    let db = app.db();
    let conn = db.lock()?;
    categories::reorder(&conn, &ids)
}
