use crate::db::DatabaseExt;
use crate::error::AppResult;
use crate::listing::ProductQuery;
use crate::models::{CreateProduct, Product, UpdateProduct};
use crate::repository::products;
use tauri::AppHandle;

#[tauri::command]
pub fn get_products(app: AppHandle, query: Option<ProductQuery>) -> AppResult<Vec<Product>> {
    let db = app.db();
    let conn = db.lock()?;
    products::list(&conn, &query.unwrap_or_default())
}

#[tauri::command]
pub fn get_product(app: AppHandle, id: i64) -> AppResult<Product> {
    let db = app.db();
    let conn = db.lock()?;
    products::get(&conn, id)
}

#[tauri::command]
pub fn create_product(app: AppHandle, product: CreateProduct) -> AppResult<Product> {
    let db = app.db();
    let conn = db.lock()?;
    products::create(&conn, product)
}

#[tauri::command]
pub fn update_product(app: AppHandle, product: UpdateProduct) -> AppResult<Product> {
    let db = app.db();
    let conn = db.lock()?;
    products::update(&conn, product)
}

#[tauri::command]
pub fn delete_product(app: AppHandle, id: i64) -> AppResult<()> {
    let db = app.db();
    let conn = db.lock()?;
    products::delete(&conn, id)
}

#[tauri::command]
pub fn set_product_availability(app: AppHandle, id: i64, available: bool) -> AppResult<Product> {
    let db = app.db();
    let conn = db.lock()?;
    products::set_availability(&conn, id, available)
}

#[tauri::command]
pub fn adjust_stock(app: AppHandle, id: i64, delta: i64) -> AppResult<Product> {
    let db = app.db();
    let conn = db.lock()?;
    products::adjust_stock(&conn, id, delta)
}

#[tauri::command]
pub fn get_low_stock(app: AppHandle) -> AppResult<Vec<Product>> {
    let db = app.db();
    let conn = db.lock()?;
    products::low_stock(&conn)
}
