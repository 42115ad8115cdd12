use crate::db::{today, DatabaseExt};
use crate::error::AppResult;
use crate::listing::CustomerQuery;
use crate::models::{CreateCustomer, Customer, CustomerSummary, OrderWithItems, UpdateCustomer};
use crate::repository::customers;
use tauri::AppHandle;

#[tauri::command]
pub fn get_customers(app: AppHandle, query: Option<CustomerQuery>) -> AppResult<Vec<CustomerSummary>> {
    let db = app.db();
    let conn = db.lock()?;
    customers::list(&conn, &query.unwrap_or_default(), today())
}

#[tauri::command]
pub fn get_customer(app: AppHandle, id: i64) -> AppResult<Customer> {
    let db = app.db();
    let conn = db.lock()?;
    customers::get(&conn, id)
}

#[tauri::command]
pub fn create_customer(app: AppHandle, customer: CreateCustomer) -> AppResult<Customer> {
    let db = app.db();
    let conn = db.lock()?;
    customers::create(&conn, customer)
}

#[tauri::command]
pub fn update_customer(app: AppHandle, customer: UpdateCustomer) -> AppResult<Customer> {
    let db = app.db();
    let conn = db.lock()?;
    customers::update(&conn, customer)
}

#[tauri::command]
pub fn delete_customer(app: AppHandle, id: i64) -> AppResult<()> {
    let db = app.db();
    let conn = db.lock()?;
    customers::delete(&conn, id)
}

#[tauri::command]
pub fn get_customer_orders(app: AppHandle, id: i64) -> AppResult<Vec<OrderWithItems>> {
    let db = app.db();
    let conn = db.lock()?;
    customers::orders_for(&conn, id)
}

#[tauri::command]
pub fn adjust_loyalty_points(app: AppHandle, id: i64, delta: i64) -> AppResult<Customer> {
    let db = app.db();
    let conn = db.lock()?;
    customers::adjust_loyalty_points(&conn, id, delta)
}
