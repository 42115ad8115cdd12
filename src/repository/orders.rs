use rusqlite::{Connection, OptionalExtension, Params};

use super::{clean_optional, ensure_exists, offers};
use crate::db::{now_timestamp, today};
use crate::error::{AppError, AppResult};
use crate::listing::OrderQuery;
use crate::models::{
    CreateOrder, CreateOrderItem, Offer, Order, OrderItem, OrderStatus, OrderType, OrderWithItems, PaymentStatus,
    UpdateOrderDetails,
};
use crate::pricing::{line_total, round_money};
use crate::workflow::ensure_order_transition;

const SELECT_ORDER: &str = "SELECT o.id, o.order_number, o.customer_id, c.name, o.staff_id, s.name, o.order_type, o.status,
            o.payment_status, o.table_number, o.delivery_address, o.notes, o.offer_id, o.subtotal, o.discount,
            o.total, o.board_position, o.created_at, o.updated_at
     FROM orders o
     LEFT JOIN customers c ON o.customer_id = c.id
     LEFT JOIN staff s ON o.staff_id = s.id";

fn map_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        order_number: row.get(1)?,
        customer_id: row.get(2)?,
        customer_name: row.get(3)?,
        staff_id: row.get(4)?,
        staff_name: row.get(5)?,
        order_type: row.get(6)?,
        status: row.get(7)?,
        payment_status: row.get(8)?,
        table_number: row.get(9)?,
        delivery_address: row.get(10)?,
        notes: row.get(11)?,
        offer_id: row.get(12)?,
        subtotal: row.get(13)?,
        discount: row.get(14)?,
        total: row.get(15)?,
        board_position: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

fn map_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrderItem> {
    Ok(OrderItem {
        id: row.get(0)?,
        order_id: row.get(1)?,
        product_id: row.get(2)?,
        product_name: row.get(3)?,
        quantity: row.get(4)?,
        unit_price: row.get(5)?,
        total: row.get(6)?,
    })
}

pub(crate) fn load_items(conn: &Connection, order_id: i64) -> AppResult<Vec<OrderItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, order_id, product_id, product_name, quantity, unit_price, total
         FROM order_items
         WHERE order_id = ?1
         ORDER BY id",
    )?;

    let items = stmt
        .query_map([order_id], map_item)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

/// Loads orders matching a SQL condition together with their line items.
pub(crate) fn load_where<P: Params>(conn: &Connection, condition: &str, params: P) -> AppResult<Vec<OrderWithItems>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE {} ORDER BY o.created_at DESC, o.id DESC",
        SELECT_ORDER, condition
    ))?;

    let orders: Vec<Order> = stmt
        .query_map(params, map_order)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        let items = load_items(conn, order.id)?;
        result.push(OrderWithItems { order, items });
    }

    Ok(result)
}

pub fn get(conn: &Connection, id: i64) -> AppResult<OrderWithItems> {
    let order = conn
        .query_row(&format!("{} WHERE o.id = ?1", SELECT_ORDER), [id], map_order)
        .map_err(|e| AppError::or_not_found(e, format!("Order {}", id)))?;

    let items = load_items(conn, id)?;
    Ok(OrderWithItems { order, items })
}

pub fn list(conn: &Connection, query: &OrderQuery) -> AppResult<Vec<OrderWithItems>> {
    let all = load_where(conn, "1 = 1", [])?;
    Ok(query.apply(all))
}

/// Orders still moving through the kitchen, oldest first.
pub fn open_orders(conn: &Connection) -> AppResult<Vec<OrderWithItems>> {
    let mut open = load_where(conn, "o.status NOT IN ('delivered', 'cancelled')", [])?;
    open.reverse();
    Ok(open)
}

fn status_of(conn: &Connection, order_id: i64) -> AppResult<OrderStatus> {
    conn.query_row("SELECT status FROM orders WHERE id = ?1", [order_id], |row| row.get(0))
        .map_err(|e| AppError::or_not_found(e, format!("Order {}", order_id)))
}

fn ensure_editable(conn: &Connection, order_id: i64) -> AppResult<()> {
    let status = status_of(conn, order_id)?;
    if !status.is_editable() {
        return Err(AppError::validation(format!(
            "Cannot modify items on an order that is {}",
            status
        )));
    }
    Ok(())
}

fn validate_fulfilment(order_type: OrderType, table_number: Option<i64>, delivery_address: Option<&str>) -> AppResult<()> {
    match order_type {
        OrderType::DineIn if !table_number.is_some_and(|t| t > 0) => {
            Err(AppError::validation("Dine-in orders need a table number"))
        }
        OrderType::Delivery if delivery_address.is_none() => {
            Err(AppError::validation("Delivery orders need a delivery address"))
        }
        _ => Ok(()),
    }
}

pub(crate) fn next_board_position(conn: &Connection, status: OrderStatus) -> AppResult<i64> {
    let position = conn.query_row(
        "SELECT COALESCE(MAX(board_position) + 1, 0) FROM orders WHERE status = ?1",
        [status],
        |row| row.get(0),
    )?;
    Ok(position)
}

struct PricedProduct {
    name: String,
    price: f64,
    stock: Option<i64>,
}

/// Looks up a sellable product and checks tracked stock for `quantity` units.
fn price_product(conn: &Connection, product_id: i64, quantity: i64) -> AppResult<PricedProduct> {
    if quantity <= 0 {
        return Err(AppError::validation("Quantity must be at least 1"));
    }

    let (name, price, available, stock): (String, f64, bool, Option<i64>) = conn
        .query_row(
            "SELECT name, price, is_available, stock_quantity FROM products WHERE id = ?1",
            [product_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .map_err(|e| AppError::or_not_found(e, format!("Product {}", product_id)))?;

    if !available {
        return Err(AppError::validation(format!("{} is currently unavailable", name)));
    }
    if let Some(stock) = stock {
        if stock < quantity {
            return Err(AppError::validation(format!(
                "Insufficient stock for {}: requested {}, available {}",
                name, quantity, stock
            )));
        }
    }

    Ok(PricedProduct { name, price, stock })
}

fn change_stock(conn: &Connection, product_id: i64, delta: i64) -> AppResult<()> {
    // Untracked products have NULL stock and stay that way.
    conn.execute(
        "UPDATE products SET stock_quantity = stock_quantity + ?1 WHERE id = ?2 AND stock_quantity IS NOT NULL",
        rusqlite::params![delta, product_id],
    )?;
    Ok(())
}

pub(crate) fn restore_all_stock(conn: &Connection, order_id: i64) -> AppResult<()> {
    for item in load_items(conn, order_id)? {
        change_stock(conn, item.product_id, item.quantity)?;
    }
    Ok(())
}

/// Recomputes subtotal, discount and total from the line items.
pub(crate) fn recalculate_totals(conn: &Connection, order_id: i64) -> AppResult<()> {
    let subtotal: f64 = conn.query_row(
        "SELECT COALESCE(SUM(total), 0) FROM order_items WHERE order_id = ?1",
        [order_id],
        |row| row.get(0),
    )?;
    let subtotal = round_money(subtotal);

    let offer_id: Option<i64> = conn.query_row("SELECT offer_id FROM orders WHERE id = ?1", [order_id], |row| {
        row.get(0)
    })?;
    let discount = match offer_id {
        Some(offer_id) => offers::get(conn, offer_id)?.discount_for(subtotal),
        None => 0.0,
    };
    let total = round_money((subtotal - discount).max(0.0));

    conn.execute(
        "UPDATE orders SET subtotal = ?1, discount = ?2, total = ?3, updated_at = ?4 WHERE id = ?5",
        rusqlite::params![subtotal, discount, total, now_timestamp(), order_id],
    )?;
    Ok(())
}

fn insert_or_merge_item(conn: &Connection, order_id: i64, item: &CreateOrderItem) -> AppResult<()> {
    let existing: Option<(i64, i64, f64)> = conn
        .query_row(
            "SELECT id, quantity, unit_price FROM order_items WHERE order_id = ?1 AND product_id = ?2",
            [order_id, item.product_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let product = price_product(conn, item.product_id, item.quantity)?;

    match existing {
        Some((item_id, quantity, unit_price)) => {
            let quantity = quantity + item.quantity;
            conn.execute(
                "UPDATE order_items SET quantity = ?1, total = ?2 WHERE id = ?3",
                rusqlite::params![quantity, line_total(unit_price, quantity), item_id],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price, total)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    order_id,
                    item.product_id,
                    product.name,
                    item.quantity,
                    product.price,
                    line_total(product.price, item.quantity),
                ],
            )?;
        }
    }

    if product.stock.is_some() {
        change_stock(conn, item.product_id, -item.quantity)?;
    }
    Ok(())
}

pub fn create(conn: &Connection, input: CreateOrder) -> AppResult<OrderWithItems> {
    if input.items.is_empty() {
        return Err(AppError::validation("An order needs at least one item"));
    }
    let delivery_address = clean_optional(input.delivery_address);
    validate_fulfilment(input.order_type, input.table_number, delivery_address.as_deref())?;

    if let Some(customer_id) = input.customer_id {
        ensure_exists(conn, "customers", customer_id, "Customer")?;
    }
    if let Some(staff_id) = input.staff_id {
        ensure_exists(conn, "staff", staff_id, "Staff member")?;
    }

    let offer = match clean_optional(input.offer_code) {
        Some(code) => {
            let offer = offers::find_by_code(conn, &code)?
                .ok_or_else(|| AppError::not_found(format!("Offer code {}", code)))?;
            if !offer.is_valid_on(today()) {
                return Err(AppError::validation(format!("Offer code {} is not active", code)));
            }
            Some(offer)
        }
        None => None,
    };

    let tx = conn.unchecked_transaction()?;
    let now = now_timestamp();
    let position = next_board_position(&tx, OrderStatus::Pending)?;

    tx.execute(
        "INSERT INTO orders (customer_id, staff_id, order_type, status, payment_status, table_number,
                             delivery_address, notes, offer_id, board_position, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        rusqlite::params![
            input.customer_id,
            input.staff_id,
            input.order_type,
            OrderStatus::Pending,
            PaymentStatus::Unpaid,
            input.table_number,
            delivery_address,
            clean_optional(input.notes),
            offer.as_ref().map(|o| o.id),
            position,
            now,
        ],
    )?;
    let order_id = tx.last_insert_rowid();

    let order_number = format!("ORD-{}-{:04}", &now[..10].replace('-', ""), order_id);
    tx.execute(
        "UPDATE orders SET order_number = ?1 WHERE id = ?2",
        rusqlite::params![order_number, order_id],
    )?;

    for item in &input.items {
        insert_or_merge_item(&tx, order_id, item)?;
    }
    recalculate_totals(&tx, order_id)?;
    if let Some(offer) = &offer {
        ensure_offer_minimum(&tx, order_id, offer)?;
    }
    tx.commit()?;

    let created = get(conn, order_id)?;
    tracing::info!(
        order_id,
        order_number = %created.order.order_number,
        total = created.order.total,
        "Order created"
    );
    Ok(created)
}

pub fn update_details(conn: &Connection, input: UpdateOrderDetails) -> AppResult<OrderWithItems> {
    ensure_exists(conn, "orders", input.id, "Order")?;
    let delivery_address = clean_optional(input.delivery_address);
    validate_fulfilment(input.order_type, input.table_number, delivery_address.as_deref())?;

    if let Some(customer_id) = input.customer_id {
        ensure_exists(conn, "customers", customer_id, "Customer")?;
    }
    if let Some(staff_id) = input.staff_id {
        ensure_exists(conn, "staff", staff_id, "Staff member")?;
    }

    conn.execute(
        "UPDATE orders SET customer_id = ?1, staff_id = ?2, order_type = ?3, table_number = ?4,
                delivery_address = ?5, notes = ?6, updated_at = ?7
         WHERE id = ?8",
        rusqlite::params![
            input.customer_id,
            input.staff_id,
            input.order_type,
            input.table_number,
            delivery_address,
            clean_optional(input.notes),
            now_timestamp(),
            input.id,
        ],
    )?;

    get(conn, input.id)
}

pub fn add_items(conn: &Connection, order_id: i64, items: Vec<CreateOrderItem>) -> AppResult<OrderWithItems> {
    if items.is_empty() {
        return Err(AppError::validation("No items to add"));
    }
    ensure_editable(conn, order_id)?;

    let tx = conn.unchecked_transaction()?;
    for item in &items {
        insert_or_merge_item(&tx, order_id, item)?;
    }
    recalculate_totals(&tx, order_id)?;
    tx.commit()?;

    get(conn, order_id)
}

/// Sets a line's quantity, returning stock or taking more as needed.
/// A quantity of zero removes the line; removing the last line deletes the
/// order and returns `None`.
pub fn update_item_quantity(conn: &Connection, item_id: i64, quantity: i64) -> AppResult<Option<OrderWithItems>> {
    if quantity < 0 {
        return Err(AppError::validation("Quantity cannot be negative"));
    }

    let (order_id, product_id, current, unit_price): (i64, i64, i64, f64) = conn
        .query_row(
            "SELECT order_id, product_id, quantity, unit_price FROM order_items WHERE id = ?1",
            [item_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .map_err(|e| AppError::or_not_found(e, format!("Order item {}", item_id)))?;

    ensure_editable(conn, order_id)?;

    let extra = quantity - current;
    if extra > 0 {
        // Only the additional units need stock.
        price_product(conn, product_id, extra)?;
    }

    let tx = conn.unchecked_transaction()?;
    if quantity == 0 {
        tx.execute("DELETE FROM order_items WHERE id = ?1", [item_id])?;
    } else {
        tx.execute(
            "UPDATE order_items SET quantity = ?1, total = ?2 WHERE id = ?3",
            rusqlite::params![quantity, line_total(unit_price, quantity), item_id],
        )?;
    }
    change_stock(&tx, product_id, -extra)?;

    let remaining: i64 = tx.query_row(
        "SELECT COUNT(*) FROM order_items WHERE order_id = ?1",
        [order_id],
        |row| row.get(0),
    )?;

    if remaining == 0 {
        let status = status_of(&tx, order_id)?;
        tx.execute("DELETE FROM orders WHERE id = ?1", [order_id])?;
        super::board::compact_column(&tx, status)?;
        tx.commit()?;
        tracing::info!(order_id, "Order removed after its last item was deleted");
        return Ok(None);
    }

    recalculate_totals(&tx, order_id)?;
    tx.commit()?;
    Ok(Some(get(conn, order_id)?))
}

pub fn remove_item(conn: &Connection, item_id: i64) -> AppResult<Option<OrderWithItems>> {
    update_item_quantity(conn, item_id, 0)
}

fn ensure_offer_minimum(conn: &Connection, order_id: i64, offer: &Offer) -> AppResult<()> {
    let subtotal: f64 = conn.query_row("SELECT subtotal FROM orders WHERE id = ?1", [order_id], |row| row.get(0))?;
    if subtotal < offer.min_order_amount {
        return Err(AppError::validation(format!(
            "Offer requires a minimum order of {:.2}",
            offer.min_order_amount
        )));
    }
    Ok(())
}

pub fn apply_offer(conn: &Connection, order_id: i64, code: &str) -> AppResult<OrderWithItems> {
    ensure_editable(conn, order_id)?;

    let offer = offers::find_by_code(conn, code)?
        .ok_or_else(|| AppError::not_found(format!("Offer code {}", code.trim())))?;
    if !offer.is_valid_on(today()) {
        return Err(AppError::validation(format!("Offer code {} is not active", code.trim())));
    }

    ensure_offer_minimum(conn, order_id, &offer)?;

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE orders SET offer_id = ?1 WHERE id = ?2",
        rusqlite::params![offer.id, order_id],
    )?;
    recalculate_totals(&tx, order_id)?;
    tx.commit()?;

    get(conn, order_id)
}

pub fn remove_offer(conn: &Connection, order_id: i64) -> AppResult<OrderWithItems> {
    ensure_editable(conn, order_id)?;

    let tx = conn.unchecked_transaction()?;
    tx.execute("UPDATE orders SET offer_id = NULL WHERE id = ?1", [order_id])?;
    recalculate_totals(&tx, order_id)?;
    tx.commit()?;

    get(conn, order_id)
}

/// Moves an order to `status` if the transition table allows it. The card
/// lands at the bottom of the target board column.
pub fn update_status(conn: &Connection, order_id: i64, status: OrderStatus) -> AppResult<OrderWithItems> {
    let current = status_of(conn, order_id)?;
    ensure_order_transition(current, status)?;

    let tx = conn.unchecked_transaction()?;
    if status == OrderStatus::Cancelled {
        restore_all_stock(&tx, order_id)?;
    }
    let position = next_board_position(&tx, status)?;
    tx.execute(
        "UPDATE orders SET status = ?1, board_position = ?2, updated_at = ?3 WHERE id = ?4",
        rusqlite::params![status, position, now_timestamp(), order_id],
    )?;
    super::board::compact_column(&tx, current)?;
    tx.commit()?;

    tracing::info!(order_id, from = %current, to = %status, "Order status changed");
    get(conn, order_id)
}

pub fn mark_paid(conn: &Connection, order_id: i64) -> AppResult<OrderWithItems> {
    if status_of(conn, order_id)? == OrderStatus::Cancelled {
        return Err(AppError::validation("Cannot take payment for a cancelled order"));
    }

    conn.execute(
        "UPDATE orders SET payment_status = ?1, updated_at = ?2 WHERE id = ?3 AND payment_status = ?4",
        rusqlite::params![PaymentStatus::Paid, now_timestamp(), order_id, PaymentStatus::Unpaid],
    )?;

    if conn.changes() == 0 {
        return Err(AppError::Conflict("Order is already paid".to_string()));
    }

    tracing::info!(order_id, "Order marked paid");
    get(conn, order_id)
}

pub fn refund(conn: &Connection, order_id: i64) -> AppResult<OrderWithItems> {
    ensure_exists(conn, "orders", order_id, "Order")?;

    conn.execute(
        "UPDATE orders SET payment_status = ?1, updated_at = ?2 WHERE id = ?3 AND payment_status = ?4",
        rusqlite::params![PaymentStatus::Refunded, now_timestamp(), order_id, PaymentStatus::Paid],
    )?;

    if conn.changes() == 0 {
        return Err(AppError::Conflict("Only paid orders can be refunded".to_string()));
    }

    tracing::info!(order_id, "Order refunded");
    get(conn, order_id)
}

pub fn delete(conn: &Connection, order_id: i64) -> AppResult<()> {
    let status = status_of(conn, order_id)?;

    let tx = conn.unchecked_transaction()?;
    if !status.is_terminal() {
        restore_all_stock(&tx, order_id)?;
    }
    tx.execute("DELETE FROM order_items WHERE order_id = ?1", [order_id])?;
    tx.execute("DELETE FROM orders WHERE id = ?1", [order_id])?;
    super::board::compact_column(&tx, status)?;
    tx.commit()?;

    tracing::info!(order_id, "Order deleted");
    Ok(())
}
