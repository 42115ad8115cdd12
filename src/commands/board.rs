use crate::db::DatabaseExt;
use crate::error::AppResult;
use crate::models::{BoardColumn, MoveOrderCard, OrderWithItems};
use crate::repository::board;
use tauri::AppHandle;

#[tauri::command]
pub fn get_order_board(app: AppHandle, include_terminal: Option<bool>) -> AppResult<Vec<BoardColumn>> {
    let db = app.db();
    let conn = db.lock()?;
    board::get_board(&conn, include_terminal.unwrap_or(true))
}

#[tauri::command]
pub fn move_order_card(app: AppHandle, card: MoveOrderCard) -> AppResult<OrderWithItems> {
    let db = app.db();
    let conn = db.lock()?;
    board::move_card(&conn, card)
}
