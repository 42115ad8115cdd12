use crate::db::{today, DatabaseExt};
use crate::error::AppResult;
use crate::models::{CreateSubscription, Subscription, SubscriptionStats, SubscriptionStatus, UpdateSubscription};
use crate::repository::subscriptions;
use tauri::AppHandle;

#[tauri::command]
pub fn get_subscriptions(app: AppHandle, status: Option<SubscriptionStatus>) -> AppResult<Vec<Subscription>> {
    let db = app.db();
    let conn = db.lock()?;
    subscriptions::list(&conn, status)
}

#[tauri::command]
pub fn get_subscription(app: AppHandle, id: i64) -> AppResult<Subscription> {
    let db = app.db();
    let conn = db.lock()?;
    subscriptions::get(&conn, id)
}

#[tauri::command]
pub fn create_subscription(app: AppHandle, subscription: CreateSubscription) -> AppResult<Subscription> {
    let db = app.db();
    let conn = db.lock()?;
    subscriptions::create(&conn, subscription, today())
}

#[tauri::command]
pub fn update_subscription(app: AppHandle, subscription: UpdateSubscription) -> AppResult<Subscription> {
    let db = app.db();
    let conn = db.lock()?;
    subscriptions::update(&conn, subscription)
}

#[tauri::command]
pub fn set_subscription_status(app: AppHandle, id: i64, status: SubscriptionStatus) -> AppResult<Subscription> {
    let db = app.db();
    let conn = db.lock()?;
    subscriptions::set_status(&conn, id, status)
}

#[tauri::command]
pub fn renew_subscription(app: AppHandle, id: i64) -> AppResult<Subscription> {
    let db = app.db();
    let conn = db.lock()?;
    subscriptions::renew(&conn, id)
}

#[tauri::command]
pub fn delete_subscription(app: AppHandle, id: i64) -> AppResult<()> {
    let db = app.db();
    let conn = db.lock()?;
    subscriptions::delete(&conn, id)
}

#[tauri::command]
pub fn get_subscription_stats(app: AppHandle) -> AppResult<SubscriptionStats> {
    let db = app.db();
    let conn = db.lock()?;
    subscriptions::stats(&conn, today())
}
