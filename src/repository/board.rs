//! Kanban board: one column per order status, cards ordered by
//! `board_position`. Positions inside a column are kept dense (0..n).

use rusqlite::Connection;

use super::orders;
use crate::db::now_timestamp;
use crate::error::AppResult;
use crate::models::{BoardColumn, MoveOrderCard, OrderStatus, OrderWithItems};
use crate::workflow::ensure_order_transition;

fn column_ids(conn: &Connection, status: OrderStatus) -> AppResult<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM orders WHERE status = ?1 ORDER BY board_position, created_at, id",
    )?;
    let ids = stmt
        .query_map([status], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

fn write_positions(conn: &Connection, ids: &[i64]) -> AppResult<()> {
    for (position, id) in ids.iter().enumerate() {
        conn.execute(
            "UPDATE orders SET board_position = ?1 WHERE id = ?2",
            rusqlite::params![position as i64, id],
        )?;
    }
    Ok(())
}

/// Renumbers a column after a card left it.
pub(crate) fn compact_column(conn: &Connection, status: OrderStatus) -> AppResult<()> {
    let ids = column_ids(conn, status)?;
    write_positions(conn, &ids)
}

pub fn get_board(conn: &Connection, include_terminal: bool) -> AppResult<Vec<BoardColumn>> {
    let mut all = orders::load_where(conn, "1 = 1", [])?;
    all.sort_by(|a, b| {
        a.order
            .board_position
            .cmp(&b.order.board_position)
            .then_with(|| a.order.created_at.cmp(&b.order.created_at))
            .then_with(|| a.order.id.cmp(&b.order.id))
    });

    let columns = OrderStatus::board_order()
        .into_iter()
        .filter(|status| include_terminal || !status.is_terminal())
        .map(|status| {
            let cards: Vec<OrderWithItems> = all
                .iter()
                .filter(|o| o.order.status == status)
                .cloned()
                .collect();
            BoardColumn {
                status,
                allowed_targets: status.allowed_transitions().to_vec(),
                orders: cards,
            }
        })
        .collect();

    Ok(columns)
}

/// Drag-and-drop handler. Dropping in the same column only reorders;
/// dropping in another column is a status change and must be allowed by
/// the transition table.
pub fn move_card(conn: &Connection, input: MoveOrderCard) -> AppResult<OrderWithItems> {
    let current = orders::get(conn, input.order_id)?.order.status;
    let target = input.to_status;
    if current != target {
        ensure_order_transition(current, target)?;
    }

    let tx = conn.unchecked_transaction()?;

    let mut ids: Vec<i64> = column_ids(&tx, target)?
        .into_iter()
        .filter(|id| *id != input.order_id)
        .collect();
    let index = input.to_index.min(ids.len());
    ids.insert(index, input.order_id);

    if current != target {
        if target == OrderStatus::Cancelled {
            orders::restore_all_stock(&tx, input.order_id)?;
        }
        tx.execute(
            "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![target, now_timestamp(), input.order_id],
        )?;
    }

    write_positions(&tx, &ids)?;
    if current != target {
        compact_column(&tx, current)?;
    }
    tx.commit()?;

    tracing::info!(
        order_id = input.order_id,
        from = %current,
        to = %target,
        index,
        "Board card moved"
    );
    orders::get(conn, input.order_id)
}
