use crate::db::DatabaseExt;
use crate::error::AppResult;
use crate::listing::OrderQuery;
use crate::models::{CreateOrder, CreateOrderItem, OrderStatus, OrderWithItems, UpdateOrderDetails};
use crate::repository::orders;
use tauri::AppHandle;

#[tauri::command]
pub fn create_order(app: AppHandle, order: CreateOrder) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.lock()?;
    orders::create(&conn, order)
}

#[tauri::command]
pub fn get_order(app: AppHandle, id: i64) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.lock()?;
    orders::get(&conn, id)
}

#[tauri::command]
pub fn list_orders(app: AppHandle, query: Option<OrderQuery>) -> AppResult<Vec<OrderWithItems>> {
    let db = app.db();
    let conn = db.lock()?;
    orders::list(&conn, &query.unwrap_or_default())
}

#[tauri::command]
pub fn get_open_orders(app: AppHandle) -> AppResult<Vec<OrderWithItems>> {
    let db = app.db();
    let conn = db.lock()?;
    orders::open_orders(&conn)
}

#[tauri::command]
pub fn update_order_details(app: AppHandle, details: UpdateOrderDetails) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.lock()?;
    orders::update_details(&conn, details)
}

#[tauri::command]
pub fn add_items_to_order(app: AppHandle, order_id: i64, items: Vec<CreateOrderItem>) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.lock()?;
    orders::add_items(&conn, order_id, items)
}

/// Returns `None` when removing the last line deleted the whole order.
#[tauri::command]
pub fn update_item_quantity(app: AppHandle, item_id: i64, quantity: i64) -> AppResult<Option<OrderWithItems>> {
    let db = app.db();
    let conn = db.lock()?;
    orders::update_item_quantity(&conn, item_id, quantity)
}

#[tauri::command]
pub fn remove_order_item(app: AppHandle, item_id: i64) -> AppResult<Option<OrderWithItems>> {
    let db = app.db();
    let conn = db.lock()?;
    orders::remove_item(&conn, item_id)
}

#[tauri::command]
pub fn apply_offer_to_order(app: AppHandle, order_id: i64, code: String) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.lock()?;
    orders::apply_offer(&conn, order_id, &code)
}

#[tauri::command]
pub fn remove_offer_from_order(app: AppHandle, order_id: i64) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.lock()?;
    orders::remove_offer(&conn, order_id)
}

#[tauri::command]
pub fn update_order_status(app: AppHandle, order_id: i64, status: OrderStatus) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.lock()?;
    orders::update_status(&conn, order_id, status)
}

#[tauri::command]
pub fn mark_order_paid(app: AppHandle, order_id: i64) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.lock()?;
    orders::mark_paid(&conn, order_id)
}

#[tauri::command]
pub fn refund_order(app: AppHandle, order_id: i64) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.lock()?;
    orders::refund(&conn, order_id)
}

#[tauri::command]
pub fn delete_order(app: AppHandle, order_id: i64) -> AppResult<()> {
    let db = app.db();
    let conn = db.lock()?;
    orders::delete(&conn, order_id)
}
