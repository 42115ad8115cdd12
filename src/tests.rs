//! Integration tests for database operations
//! These tests use an in-memory SQLite database to test business logic

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rusqlite::Connection;

    use crate::assistant::{self, AiSettings, UpsellMode};
    use crate::db::{today, Database};
    use crate::demo;
    use crate::error::AppError;
    use crate::listing::{CustomerQuery, OrderQuery};
    use crate::models::*;
    use crate::repository::conversations::NewConversation;
    use crate::repository::{
        board, categories, company, conversations, customers, dashboard, offers, orders, products, reports,
        staff, subscriptions,
    };

    /// Create a test database with schema
    fn setup_test_db() -> Database {
        let db = Database::open_in_memory().expect("Failed to create in-memory database");
        db.initialize().expect("Failed to create schema");
        db
    }

    struct Fixture {
        category_id: i64,
        burger_id: i64,
        fries_id: i64,
        soda_id: i64,
        customer_id: i64,
        staff_id: i64,
    }

    fn product(name: &str, price: f64, category_id: i64, stock: Option<i64>) -> CreateProduct {
        CreateProduct {
            name: name.to_string(),
            description: None,
            price,
            category_id: Some(category_id),
            is_available: None,
            stock_quantity: stock,
            low_stock_threshold: None,
            image_url: None,
        }
    }

    /// Burger (12.50, 10 in stock), fries (4.00, untracked), soda (2.50, 3 in stock)
    fn seed_test_data(conn: &Connection) -> Fixture {
        let category = categories::create(
            conn,
            CreateCategory {
                name: "Mains".to_string(),
                description: None,
            },
        )
        .unwrap();

        let burger = products::create(conn, product("Burger", 12.5, category.id, Some(10))).unwrap();
        let fries = products::create(conn, product("Fries", 4.0, category.id, None)).unwrap();
        let soda = products::create(conn, product("Soda", 2.5, category.id, Some(3))).unwrap();

        let customer = customers::create(
            conn,
            CreateCustomer {
                name: "Ada Lovelace".to_string(),
                email: Some("Ada@Example.com".to_string()),
                phone: None,
                address: Some("12 Analytical Way".to_string()),
                notes: None,
            },
        )
        .unwrap();

        let server = staff::create(
            conn,
            CreateStaff {
                name: "Sam".to_string(),
                email: None,
                role: None,
                pin: Some("1234".to_string()),
            },
        )
        .unwrap();

        Fixture {
            category_id: category.id,
            burger_id: burger.id,
            fries_id: fries.id,
            soda_id: soda.id,
            customer_id: customer.id,
            staff_id: server.id,
        }
    }

    fn item(product_id: i64, quantity: i64) -> CreateOrderItem {
        CreateOrderItem { product_id, quantity }
    }

    fn dine_in(f: &Fixture, items: Vec<CreateOrderItem>) -> CreateOrder {
        CreateOrder {
            customer_id: Some(f.customer_id),
            staff_id: Some(f.staff_id),
            order_type: OrderType::DineIn,
            table_number: Some(4),
            delivery_address: None,
            notes: None,
            offer_code: None,
            items,
        }
    }

    fn stock_of(conn: &Connection, product_id: i64) -> Option<i64> {
        products::get(conn, product_id).unwrap().stock_quantity
    }

    fn advance(conn: &Connection, order_id: i64, statuses: &[OrderStatus]) {
        for status in statuses {
            orders::update_status(conn, order_id, *status).unwrap();
        }
    }

    fn assert_money(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    fn ten_percent_offer(code: &str, min: f64) -> CreateOffer {
        CreateOffer {
            title: "Ten off".to_string(),
            description: None,
            code: Some(code.to_string()),
            discount_type: DiscountType::Percentage,
            discount_value: 10.0,
            min_order_amount: Some(min),
            starts_at: None,
            ends_at: None,
        }
    }

    // ===== SCHEMA TESTS =====

    fn columns(conn: &Connection, table: &str) -> Vec<String> {
        conn.prepare(&format!("PRAGMA table_info({})", table))
            .unwrap()
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_initialize_upgrades_older_tables() {
        let db = Database::open_in_memory().unwrap();
        db.lock()
            .unwrap()
            .execute_batch(
                "
                CREATE TABLE staff (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    company_id INTEGER,
                    name TEXT NOT NULL UNIQUE,
                    email TEXT,
                    role TEXT NOT NULL DEFAULT 'server',
                    pin TEXT,
                    created_at DATETIME NOT NULL
                );
                CREATE TABLE products (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    description TEXT,
                    price REAL NOT NULL,
                    category_id INTEGER,
                    is_available INTEGER NOT NULL DEFAULT 1,
                    stock_quantity INTEGER,
                    low_stock_threshold INTEGER NOT NULL DEFAULT 5,
                    created_at DATETIME NOT NULL,
                    updated_at DATETIME NOT NULL
                );
                CREATE TABLE orders (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    order_number TEXT NOT NULL DEFAULT '',
                    customer_id INTEGER,
                    staff_id INTEGER,
                    order_type TEXT NOT NULL DEFAULT 'dine_in',
                    status TEXT NOT NULL DEFAULT 'pending',
                    payment_status TEXT NOT NULL DEFAULT 'unpaid',
                    table_number INTEGER,
                    notes TEXT,
                    subtotal REAL NOT NULL DEFAULT 0,
                    total REAL NOT NULL DEFAULT 0,
                    created_at DATETIME NOT NULL,
                    updated_at DATETIME NOT NULL
                );
                INSERT INTO orders (order_number, table_number, subtotal, total, created_at, updated_at)
                VALUES ('ORD-20250101-0001', 2, 18.0, 18.0, '2025-01-01 12:00:00', '2025-01-01 12:00:00');
                ",
            )
            .unwrap();

        db.initialize().unwrap();
        // A second run finds nothing left to migrate.
        db.initialize().unwrap();

        let conn = db.lock().unwrap();
        let order_columns = columns(&conn, "orders");
        for column in ["offer_id", "discount", "board_position", "delivery_address"] {
            assert!(order_columns.iter().any(|c| c == column), "orders.{column} missing");
        }
        assert!(columns(&conn, "products").iter().any(|c| c == "image_url"));
        assert!(columns(&conn, "staff").iter().any(|c| c == "is_active"));

        let old = orders::get(&conn, 1).unwrap();
        assert_eq!(old.order.order_number, "ORD-20250101-0001");
        assert_eq!(old.order.offer_id, None);
        assert_eq!(old.order.delivery_address, None);
        assert_eq!(old.order.board_position, 0);
        assert_money(old.order.discount, 0.0);
        assert_money(old.order.total, 18.0);
    }

    // ===== CATEGORY TESTS =====

    #[test]
    fn test_duplicate_category_is_conflict() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        seed_test_data(&conn);

        let err = categories::create(
            &conn,
            CreateCategory {
                name: "Mains".to_string(),
                description: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "conflict");
    }

    #[test]
    fn test_delete_category_unlinks_products() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        categories::delete(&conn, f.category_id).unwrap();

        let burger = products::get(&conn, f.burger_id).unwrap();
        assert_eq!(burger.category_id, None);
        assert!(matches!(
            categories::delete(&conn, f.category_id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_reorder_categories_keeps_unlisted_after() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let drinks = categories::create(
            &conn,
            CreateCategory {
                name: "Drinks".to_string(),
                description: None,
            },
        )
        .unwrap();
        let desserts = categories::create(
            &conn,
            CreateCategory {
                name: "Desserts".to_string(),
                description: None,
            },
        )
        .unwrap();

        let ordered = categories::reorder(&conn, &[desserts.id]).unwrap();
        let ids: Vec<i64> = ordered.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![desserts.id, f.category_id, drinks.id]);

        assert!(categories::reorder(&conn, &[999]).is_err());
    }

    // ===== PRODUCT TESTS =====

    #[test]
    fn test_low_stock_only_lists_tracked_products() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        let low: Vec<i64> = products::low_stock(&conn).unwrap().iter().map(|p| p.id).collect();
        assert_eq!(low, vec![f.soda_id]);
    }

    #[test]
    fn test_adjust_stock() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        assert_eq!(products::adjust_stock(&conn, f.burger_id, -4).unwrap().stock_quantity, Some(6));
        assert_eq!(products::adjust_stock(&conn, f.fries_id, 20).unwrap().stock_quantity, Some(20));

        let err = products::adjust_stock(&conn, f.soda_id, -4).unwrap_err();
        assert_eq!(err.code(), "validation");
        assert_eq!(stock_of(&conn, f.soda_id), Some(3));
    }

    #[test]
    fn test_product_on_an_order_cannot_be_deleted() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 1)])).unwrap();

        let err = products::delete(&conn, f.burger_id).unwrap_err();
        assert_eq!(err.code(), "conflict");

        products::delete(&conn, f.fries_id).unwrap();
        assert!(products::get(&conn, f.fries_id).is_err());
    }

    #[test]
    fn test_invalid_product_price_rejected() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        let err = products::create(&conn, product("Free lunch", -1.0, f.category_id, None)).unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    // ===== ORDER TESTS =====

    #[test]
    fn test_create_order_totals_and_stock() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        let created = orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 2), item(f.fries_id, 1)])).unwrap();

        assert_eq!(created.items.len(), 2);
        assert_money(created.order.subtotal, 29.0);
        assert_money(created.order.discount, 0.0);
        assert_money(created.order.total, 29.0);
        assert_eq!(created.order.status, OrderStatus::Pending);
        assert_eq!(created.order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(created.order.customer_name.as_deref(), Some("Ada Lovelace"));
        assert!(created.order.order_number.starts_with("ORD-"));
        assert!(created.order.order_number.ends_with(&format!("{:04}", created.order.id)));

        assert_eq!(stock_of(&conn, f.burger_id), Some(8));
        assert_eq!(stock_of(&conn, f.fries_id), None);
    }

    #[test]
    fn test_repeated_products_merge_into_one_line() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        let created = orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 1), item(f.burger_id, 2)])).unwrap();
        assert_eq!(created.items.len(), 1);
        assert_eq!(created.items[0].quantity, 3);
        assert_money(created.items[0].total, 37.5);

        let added = orders::add_items(&conn, created.order.id, vec![item(f.burger_id, 1)]).unwrap();
        assert_eq!(added.items.len(), 1);
        assert_eq!(added.items[0].quantity, 4);
        assert_eq!(stock_of(&conn, f.burger_id), Some(6));
    }

    #[test]
    fn test_insufficient_stock_rolls_back() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        let err = orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 1), item(f.soda_id, 4)])).unwrap_err();
        assert_eq!(err.code(), "validation");
        assert!(err.to_string().contains("Insufficient stock for Soda"));

        assert!(orders::list(&conn, &OrderQuery::default()).unwrap().is_empty());
        assert_eq!(stock_of(&conn, f.burger_id), Some(10));
        assert_eq!(stock_of(&conn, f.soda_id), Some(3));
    }

    #[test]
    fn test_order_validation() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        assert!(orders::create(&conn, dine_in(&f, vec![])).is_err());

        let mut no_table = dine_in(&f, vec![item(f.fries_id, 1)]);
        no_table.table_number = None;
        assert_eq!(orders::create(&conn, no_table).unwrap_err().code(), "validation");

        let mut delivery = dine_in(&f, vec![item(f.fries_id, 1)]);
        delivery.order_type = OrderType::Delivery;
        delivery.delivery_address = Some("   ".to_string());
        assert_eq!(orders::create(&conn, delivery).unwrap_err().code(), "validation");

        let mut ghost = dine_in(&f, vec![item(f.fries_id, 1)]);
        ghost.customer_id = Some(999);
        assert_eq!(orders::create(&conn, ghost).unwrap_err().code(), "not_found");

        products::set_availability(&conn, f.fries_id, false).unwrap();
        let err = orders::create(&conn, dine_in(&f, vec![item(f.fries_id, 1)])).unwrap_err();
        assert_eq!(err.to_string(), "Fries is currently unavailable");

        let err = orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 0)])).unwrap_err();
        assert_eq!(err.to_string(), "Quantity must be at least 1");
    }

    #[test]
    fn test_offer_discount_and_minimum() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        offers::create(&conn, ten_percent_offer("save10", 20.0)).unwrap();

        let mut input = dine_in(&f, vec![item(f.burger_id, 2), item(f.fries_id, 1)]);
        input.offer_code = Some("SAVE10".to_string());
        let created = orders::create(&conn, input).unwrap();
        assert!(created.order.offer_id.is_some());
        assert_money(created.order.discount, 2.9);
        assert_money(created.order.total, 26.1);

        // Dropping below the minimum keeps the offer attached but stops discounting.
        let burger_line = created.items.iter().find(|i| i.product_id == f.burger_id).unwrap();
        let updated = orders::update_item_quantity(&conn, burger_line.id, 1).unwrap().unwrap();
        assert_money(updated.order.subtotal, 16.5);
        assert_money(updated.order.discount, 0.0);
        assert_money(updated.order.total, 16.5);
        assert_eq!(stock_of(&conn, f.burger_id), Some(9));

        let removed = orders::remove_offer(&conn, created.order.id).unwrap();
        assert_eq!(removed.order.offer_id, None);

        let err = orders::apply_offer(&conn, created.order.id, "save10").unwrap_err();
        assert!(err.to_string().contains("minimum order of 20.00"));

        assert_eq!(
            orders::apply_offer(&conn, created.order.id, "NOPE").unwrap_err().code(),
            "not_found"
        );
    }

    #[test]
    fn test_create_order_below_offer_minimum_rejected() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        offers::create(&conn, ten_percent_offer("save10", 20.0)).unwrap();

        let mut input = dine_in(&f, vec![item(f.burger_id, 1), item(f.soda_id, 1)]);
        input.offer_code = Some("SAVE10".to_string());
        let err = orders::create(&conn, input).unwrap_err();
        assert_eq!(err.code(), "validation");
        assert!(err.to_string().contains("minimum order of 20.00"));

        // Nothing from the rejected order sticks.
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 0);
        assert_eq!(stock_of(&conn, f.burger_id), Some(10));
        assert_eq!(stock_of(&conn, f.soda_id), Some(3));

        let mut exact = dine_in(&f, vec![item(f.burger_id, 1), item(f.soda_id, 3)]);
        exact.offer_code = Some("save10".to_string());
        let created = orders::create(&conn, exact).unwrap();
        assert_money(created.order.subtotal, 20.0);
        assert_money(created.order.discount, 2.0);
    }

    #[test]
    fn test_inactive_offer_code_rejected() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let offer = offers::create(&conn, ten_percent_offer("LATER", 0.0)).unwrap();
        offers::set_active(&conn, offer.id, false).unwrap();

        let mut input = dine_in(&f, vec![item(f.fries_id, 1)]);
        input.offer_code = Some("later".to_string());
        let err = orders::create(&conn, input).unwrap_err();
        assert_eq!(err.to_string(), "Offer code later is not active");

        assert!(offers::active_on(&conn, today()).unwrap().is_empty());
    }

    #[test]
    fn test_items_locked_once_kitchen_starts() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let created = orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 1)])).unwrap();
        let id = created.order.id;

        orders::update_status(&conn, id, OrderStatus::Confirmed).unwrap();
        orders::add_items(&conn, id, vec![item(f.fries_id, 2)]).unwrap();

        orders::update_status(&conn, id, OrderStatus::Preparing).unwrap();
        let err = orders::add_items(&conn, id, vec![item(f.fries_id, 1)]).unwrap_err();
        assert_eq!(err.to_string(), "Cannot modify items on an order that is preparing");
        assert!(orders::update_item_quantity(&conn, created.items[0].id, 3).is_err());
    }

    #[test]
    fn test_removing_last_item_deletes_order() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let created = orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 2), item(f.soda_id, 1)])).unwrap();

        let soda_line = created.items.iter().find(|i| i.product_id == f.soda_id).unwrap();
        let remaining = orders::remove_item(&conn, soda_line.id).unwrap().unwrap();
        assert_eq!(remaining.items.len(), 1);
        assert_money(remaining.order.total, 25.0);
        assert_eq!(stock_of(&conn, f.soda_id), Some(3));

        let gone = orders::update_item_quantity(&conn, remaining.items[0].id, 0).unwrap();
        assert!(gone.is_none());
        assert!(matches!(orders::get(&conn, created.order.id), Err(AppError::NotFound(_))));
        assert_eq!(stock_of(&conn, f.burger_id), Some(10));
    }

    #[test]
    fn test_status_transitions() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let created = orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 3)])).unwrap();
        let id = created.order.id;

        let err = orders::update_status(&conn, id, OrderStatus::Ready).unwrap_err();
        assert_eq!(err.code(), "invalid_transition");
        assert_eq!(err.to_string(), "Cannot change status from pending to ready");

        advance(
            &conn,
            id,
            &[OrderStatus::Confirmed, OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Delivered],
        );
        assert_eq!(orders::get(&conn, id).unwrap().order.status, OrderStatus::Delivered);

        // Delivered is terminal.
        assert!(orders::update_status(&conn, id, OrderStatus::Cancelled).is_err());
        assert_eq!(stock_of(&conn, f.burger_id), Some(7));
    }

    #[test]
    fn test_cancel_restores_stock() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let created = orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 3), item(f.soda_id, 2)])).unwrap();
        assert_eq!(stock_of(&conn, f.soda_id), Some(1));

        advance(&conn, created.order.id, &[OrderStatus::Confirmed, OrderStatus::Cancelled]);

        assert_eq!(stock_of(&conn, f.burger_id), Some(10));
        assert_eq!(stock_of(&conn, f.soda_id), Some(3));
        let open = orders::open_orders(&conn).unwrap();
        assert!(open.is_empty());
    }

    #[test]
    fn test_payment_and_refund() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let id = orders::create(&conn, dine_in(&f, vec![item(f.fries_id, 1)])).unwrap().order.id;

        assert_eq!(orders::refund(&conn, id).unwrap_err().code(), "conflict");

        let paid = orders::mark_paid(&conn, id).unwrap();
        assert_eq!(paid.order.payment_status, PaymentStatus::Paid);
        assert_eq!(orders::mark_paid(&conn, id).unwrap_err().to_string(), "Order is already paid");

        let refunded = orders::refund(&conn, id).unwrap();
        assert_eq!(refunded.order.payment_status, PaymentStatus::Refunded);
        assert!(orders::refund(&conn, id).is_err());

        let other = orders::create(&conn, dine_in(&f, vec![item(f.fries_id, 1)])).unwrap().order.id;
        orders::update_status(&conn, other, OrderStatus::Cancelled).unwrap();
        assert_eq!(orders::mark_paid(&conn, other).unwrap_err().code(), "validation");
    }

    #[test]
    fn test_delete_order_restores_stock_unless_finished() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        let open = orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 2)])).unwrap().order.id;
        orders::delete(&conn, open).unwrap();
        assert_eq!(stock_of(&conn, f.burger_id), Some(10));

        let done = orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 2)])).unwrap().order.id;
        advance(
            &conn,
            done,
            &[OrderStatus::Confirmed, OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Delivered],
        );
        orders::delete(&conn, done).unwrap();
        assert_eq!(stock_of(&conn, f.burger_id), Some(8));

        assert!(matches!(orders::delete(&conn, done), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_update_details_switches_to_delivery() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let id = orders::create(&conn, dine_in(&f, vec![item(f.fries_id, 1)])).unwrap().order.id;

        let updated = orders::update_details(
            &conn,
            UpdateOrderDetails {
                id,
                customer_id: Some(f.customer_id),
                staff_id: None,
                order_type: OrderType::Delivery,
                table_number: None,
                delivery_address: Some(" 12 Analytical Way ".to_string()),
                notes: Some("Ring twice".to_string()),
            },
        )
        .unwrap();

        assert_eq!(updated.order.order_type, OrderType::Delivery);
        assert_eq!(updated.order.delivery_address.as_deref(), Some("12 Analytical Way"));
        assert_eq!(updated.order.staff_id, None);
    }

    #[test]
    fn test_order_list_filters() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        let first = orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 1)])).unwrap().order.id;
        let mut walk_in = dine_in(&f, vec![item(f.soda_id, 1)]);
        walk_in.customer_id = None;
        walk_in.order_type = OrderType::Takeaway;
        walk_in.table_number = None;
        let second = orders::create(&conn, walk_in).unwrap().order.id;
        orders::update_status(&conn, second, OrderStatus::Confirmed).unwrap();

        let confirmed = orders::list(
            &conn,
            &OrderQuery {
                statuses: vec![OrderStatus::Confirmed],
                ..OrderQuery::default()
            },
        )
        .unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].order.id, second);

        let by_name = orders::list(
            &conn,
            &OrderQuery {
                search: Some("ada".to_string()),
                ..OrderQuery::default()
            },
        )
        .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].order.id, first);

        let by_item = orders::list(
            &conn,
            &OrderQuery {
                search: Some("SODA".to_string()),
                order_type: Some(OrderType::Takeaway),
                ..OrderQuery::default()
            },
        )
        .unwrap();
        assert_eq!(by_item.len(), 1);
    }

    // ===== OFFER TESTS =====

    #[test]
    fn test_update_offer_and_code_conflict() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let lunch = offers::create(&conn, ten_percent_offer("lunch", 15.0)).unwrap();
        offers::create(&conn, ten_percent_offer("dinner", 0.0)).unwrap();

        let edit = |code: &str| UpdateOffer {
            id: lunch.id,
            title: "  Lunch fiver  ".to_string(),
            description: Some("Weekdays only".to_string()),
            code: Some(code.to_string()),
            discount_type: DiscountType::FixedAmount,
            discount_value: 5.0,
            min_order_amount: 25.0,
            starts_at: Some("2026-01-01".to_string()),
            ends_at: Some("2026-12-31".to_string()),
            is_active: false,
        };

        let updated = offers::update(&conn, edit("lunch5")).unwrap();
        assert_eq!(updated.title, "Lunch fiver");
        assert_eq!(updated.code.as_deref(), Some("LUNCH5"));
        assert_eq!(updated.discount_type, DiscountType::FixedAmount);
        assert_money(updated.min_order_amount, 25.0);
        assert!(!updated.is_active);
        assert_eq!(offers::get(&conn, lunch.id).unwrap().description.as_deref(), Some("Weekdays only"));

        let err = offers::update(&conn, edit("Dinner")).unwrap_err();
        assert_eq!(err.code(), "conflict");
        assert_eq!(err.to_string(), "An offer with this code already exists");
        assert_eq!(offers::get(&conn, lunch.id).unwrap().code.as_deref(), Some("LUNCH5"));

        let missing = UpdateOffer { id: 999, ..edit("other") };
        assert_eq!(offers::update(&conn, missing).unwrap_err().code(), "not_found");
    }

    #[test]
    fn test_delete_offer_unlinks_orders() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let offer = offers::create(&conn, ten_percent_offer("save10", 0.0)).unwrap();

        let mut input = dine_in(&f, vec![item(f.burger_id, 2)]);
        input.offer_code = Some("save10".to_string());
        let created = orders::create(&conn, input).unwrap();
        assert_eq!(created.order.offer_id, Some(offer.id));

        offers::delete(&conn, offer.id).unwrap();

        let order = orders::get(&conn, created.order.id).unwrap();
        assert_eq!(order.order.offer_id, None);
        assert_money(order.order.discount, 2.5);
        assert_money(order.order.total, 22.5);
        assert_eq!(order.items.len(), 1);

        assert_eq!(offers::get(&conn, offer.id).unwrap_err().code(), "not_found");
        assert_eq!(offers::delete(&conn, offer.id).unwrap_err().code(), "not_found");

        // The next item change reprices without the deleted offer.
        let repriced = orders::update_item_quantity(&conn, order.items[0].id, 1).unwrap().unwrap();
        assert_money(repriced.order.discount, 0.0);
        assert_money(repriced.order.total, 12.5);
    }

    // ===== BOARD TESTS =====

    fn column_ids(conn: &Connection, status: OrderStatus) -> Vec<i64> {
        board::get_board(conn, true)
            .unwrap()
            .into_iter()
            .find(|c| c.status == status)
            .unwrap()
            .orders
            .iter()
            .map(|o| o.order.id)
            .collect()
    }

    fn positions(conn: &Connection, status: OrderStatus) -> Vec<i64> {
        board::get_board(conn, true)
            .unwrap()
            .into_iter()
            .find(|c| c.status == status)
            .unwrap()
            .orders
            .iter()
            .map(|o| o.order.board_position)
            .collect()
    }

    #[test]
    fn test_board_columns() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();

        let all: Vec<OrderStatus> = board::get_board(&conn, true).unwrap().iter().map(|c| c.status).collect();
        assert_eq!(
            all,
            vec![
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Preparing,
                OrderStatus::Ready,
                OrderStatus::Delivered,
                OrderStatus::Cancelled,
            ]
        );

        let active = board::get_board(&conn, false).unwrap();
        assert_eq!(active.len(), 4);
        assert_eq!(active[0].allowed_targets, vec![OrderStatus::Confirmed, OrderStatus::Cancelled]);
    }

    #[test]
    fn test_move_card_within_column() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let ids: Vec<i64> = (0..3)
            .map(|_| orders::create(&conn, dine_in(&f, vec![item(f.fries_id, 1)])).unwrap().order.id)
            .collect();
        assert_eq!(column_ids(&conn, OrderStatus::Pending), ids);

        board::move_card(
            &conn,
            MoveOrderCard {
                order_id: ids[2],
                to_status: OrderStatus::Pending,
                to_index: 0,
            },
        )
        .unwrap();

        assert_eq!(column_ids(&conn, OrderStatus::Pending), vec![ids[2], ids[0], ids[1]]);
        assert_eq!(positions(&conn, OrderStatus::Pending), vec![0, 1, 2]);
    }

    #[test]
    fn test_move_card_across_columns() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let ids: Vec<i64> = (0..3)
            .map(|_| orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 1)])).unwrap().order.id)
            .collect();
        orders::update_status(&conn, ids[0], OrderStatus::Confirmed).unwrap();

        let moved = board::move_card(
            &conn,
            MoveOrderCard {
                order_id: ids[1],
                to_status: OrderStatus::Confirmed,
                to_index: 0,
            },
        )
        .unwrap();
        assert_eq!(moved.order.status, OrderStatus::Confirmed);
        assert_eq!(column_ids(&conn, OrderStatus::Confirmed), vec![ids[1], ids[0]]);
        assert_eq!(positions(&conn, OrderStatus::Pending), vec![0]);

        // An index past the end lands at the bottom.
        board::move_card(
            &conn,
            MoveOrderCard {
                order_id: ids[2],
                to_status: OrderStatus::Cancelled,
                to_index: 50,
            },
        )
        .unwrap();
        assert_eq!(column_ids(&conn, OrderStatus::Cancelled), vec![ids[2]]);
        assert_eq!(stock_of(&conn, f.burger_id), Some(8));
    }

    #[test]
    fn test_move_card_rejects_disallowed_drop() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let id = orders::create(&conn, dine_in(&f, vec![item(f.fries_id, 1)])).unwrap().order.id;

        let err = board::move_card(
            &conn,
            MoveOrderCard {
                order_id: id,
                to_status: OrderStatus::Delivered,
                to_index: 0,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "invalid_transition");
        assert_eq!(column_ids(&conn, OrderStatus::Pending), vec![id]);
    }

    // ===== CUSTOMER TESTS =====

    #[test]
    fn test_customer_email_normalized_and_unique() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        let ada = customers::get(&conn, f.customer_id).unwrap();
        assert_eq!(ada.email.as_deref(), Some("ada@example.com"));

        let err = customers::create(
            &conn,
            CreateCustomer {
                name: "Imposter".to_string(),
                email: Some("ADA@example.com".to_string()),
                phone: None,
                address: None,
                notes: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "conflict");

        let err = customers::create(
            &conn,
            CreateCustomer {
                name: "No At".to_string(),
                email: Some("not-an-email".to_string()),
                phone: None,
                address: None,
                notes: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn test_customer_segments() {
        let day = today();
        let long_ago = (day - Duration::days(90)).format("%Y-%m-%d 12:00:00").to_string();
        let recent = (day - Duration::days(3)).format("%Y-%m-%d 12:00:00").to_string();

        assert_eq!(customers::segment_for(0, 0.0, None, day), CustomerSegment::New);
        assert_eq!(customers::segment_for(1, 30.0, Some(recent.as_str()), day), CustomerSegment::New);
        assert_eq!(customers::segment_for(3, 80.0, Some(recent.as_str()), day), CustomerSegment::Regular);
        assert_eq!(customers::segment_for(3, 80.0, Some(long_ago.as_str()), day), CustomerSegment::AtRisk);
        assert_eq!(customers::segment_for(2, 650.0, Some(long_ago.as_str()), day), CustomerSegment::Vip);
        assert_eq!(customers::segment_for(10, 90.0, Some(recent.as_str()), day), CustomerSegment::Vip);
    }

    #[test]
    fn test_customer_list_aggregates_non_cancelled_orders() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 2)])).unwrap();
        orders::create(&conn, dine_in(&f, vec![item(f.fries_id, 1)])).unwrap();
        let cancelled = orders::create(&conn, dine_in(&f, vec![item(f.soda_id, 1)])).unwrap();
        orders::update_status(&conn, cancelled.order.id, OrderStatus::Cancelled).unwrap();

        let list = customers::list(&conn, &CustomerQuery::default(), today()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].total_orders, 2);
        assert_money(list[0].total_spent, 29.0);
        assert_eq!(list[0].segment, CustomerSegment::Regular);

        let vips = customers::list(
            &conn,
            &CustomerQuery {
                segment: Some(CustomerSegment::Vip),
                ..CustomerQuery::default()
            },
            today(),
        )
        .unwrap();
        assert!(vips.is_empty());
    }

    #[test]
    fn test_delete_customer_keeps_orders_as_walk_ins() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let id = orders::create(&conn, dine_in(&f, vec![item(f.fries_id, 1)])).unwrap().order.id;
        subscriptions::create(
            &conn,
            CreateSubscription {
                customer_id: f.customer_id,
                plan_name: "Lunch club".to_string(),
                price: 49.0,
                billing_cycle: BillingCycle::Monthly,
                meals_per_cycle: Some(8),
                start_date: None,
            },
            today(),
        )
        .unwrap();

        assert_eq!(customers::orders_for(&conn, f.customer_id).unwrap().len(), 1);
        customers::delete(&conn, f.customer_id).unwrap();

        let order = orders::get(&conn, id).unwrap();
        assert_eq!(order.order.customer_id, None);
        assert!(subscriptions::list(&conn, None).unwrap().is_empty());
        assert!(customers::get(&conn, f.customer_id).is_err());
    }

    #[test]
    fn test_loyalty_points_never_negative() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        assert_eq!(customers::adjust_loyalty_points(&conn, f.customer_id, 50).unwrap().loyalty_points, 50);
        assert_eq!(customers::adjust_loyalty_points(&conn, f.customer_id, -20).unwrap().loyalty_points, 30);
        let err = customers::adjust_loyalty_points(&conn, f.customer_id, -31).unwrap_err();
        assert_eq!(err.to_string(), "Customer only has 30 loyalty points");
    }

    // ===== SUBSCRIPTION TESTS =====

    #[test]
    fn test_subscription_lifecycle() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        let sub = subscriptions::create(
            &conn,
            CreateSubscription {
                customer_id: f.customer_id,
                plan_name: "Dinner for two".to_string(),
                price: 120.0,
                billing_cycle: BillingCycle::Monthly,
                meals_per_cycle: Some(4),
                start_date: Some("2026-01-31".to_string()),
            },
            today(),
        )
        .unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.next_billing_date, "2026-02-28");
        assert_eq!(sub.customer_name.as_deref(), Some("Ada Lovelace"));

        let renewed = subscriptions::renew(&conn, sub.id).unwrap();
        assert_eq!(renewed.next_billing_date, "2026-03-28");

        subscriptions::set_status(&conn, sub.id, SubscriptionStatus::Paused).unwrap();
        assert_eq!(subscriptions::renew(&conn, sub.id).unwrap_err().code(), "validation");

        subscriptions::set_status(&conn, sub.id, SubscriptionStatus::Cancelled).unwrap();
        let err = subscriptions::set_status(&conn, sub.id, SubscriptionStatus::Active).unwrap_err();
        assert_eq!(err.code(), "invalid_transition");
    }

    #[test]
    fn test_subscription_stats() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let day = today();

        let plan = |name: &str, price: f64, cycle: BillingCycle| CreateSubscription {
            customer_id: f.customer_id,
            plan_name: name.to_string(),
            price,
            billing_cycle: cycle,
            meals_per_cycle: None,
            start_date: None,
        };
        subscriptions::create(&conn, plan("Weekly lunch", 30.0, BillingCycle::Weekly), day).unwrap();
        subscriptions::create(&conn, plan("Monthly dinner", 100.0, BillingCycle::Monthly), day).unwrap();
        let yearly = subscriptions::create(&conn, plan("Annual pass", 1200.0, BillingCycle::Yearly), day).unwrap();
        subscriptions::set_status(&conn, yearly.id, SubscriptionStatus::Paused).unwrap();

        let stats = subscriptions::stats(&conn, day).unwrap();
        assert_eq!(stats.active, 2);
        assert_eq!(stats.paused, 1);
        assert_eq!(stats.cancelled, 0);
        assert_money(stats.monthly_recurring_revenue, 230.0);
        assert_eq!(stats.due_within_week, 1);

        let err = subscriptions::create(&conn, plan("Free", 0.0, BillingCycle::Monthly), day).unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    // ===== STAFF TESTS =====

    #[test]
    fn test_staff_pin_rules() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        assert!(staff::verify_pin(&conn, f.staff_id, "1234").unwrap());
        assert!(!staff::verify_pin(&conn, f.staff_id, "9999").unwrap());

        staff::set_active(&conn, f.staff_id, false).unwrap();
        assert!(!staff::verify_pin(&conn, f.staff_id, "1234").unwrap());

        let err = staff::create(
            &conn,
            CreateStaff {
                name: "Kai".to_string(),
                email: None,
                role: Some(StaffRole::Kitchen),
                pin: Some("12a".to_string()),
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "PIN must be 4 to 6 digits");

        let open = staff::create(
            &conn,
            CreateStaff {
                name: "Kai".to_string(),
                email: None,
                role: Some(StaffRole::Kitchen),
                pin: None,
            },
        )
        .unwrap();
        assert!(!open.has_pin);
        assert!(staff::verify_pin(&conn, open.id, "").unwrap());
    }

    #[test]
    fn test_staff_with_orders_cannot_be_deleted() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        orders::create(&conn, dine_in(&f, vec![item(f.fries_id, 1)])).unwrap();

        assert_eq!(staff::delete(&conn, f.staff_id).unwrap_err().code(), "conflict");
        assert_eq!(staff::list(&conn).unwrap().len(), 1);
    }

    // ===== COMPANY TESTS =====

    #[test]
    fn test_company_created_on_first_save() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        assert!(company::get_company(&conn).unwrap().is_none());

        let input = |currency: Option<&str>| UpdateCompany {
            name: "Bistro".to_string(),
            address: None,
            phone: None,
            email: None,
            currency: currency.map(str::to_string),
            timezone: None,
        };

        let created = company::update_company(&conn, input(None), "USD").unwrap();
        assert_eq!(created.currency, "USD");
        assert_eq!(staff::get(&conn, f.staff_id).unwrap().company_id, Some(created.id));

        let updated = company::update_company(&conn, input(Some("eur")), "USD").unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.currency, "EUR");

        let err = company::update_company(&conn, input(Some("EURO")), "USD").unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn test_user_profile_upsert() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();

        let profile = company::upsert_profile(
            &conn,
            UpsertUserProfile {
                full_name: "Grace Hopper".to_string(),
                email: "Grace@Example.com".to_string(),
                role: None,
                avatar_url: None,
            },
        )
        .unwrap();
        assert_eq!(profile.role, StaffRole::Manager);
        assert_eq!(profile.email, "grace@example.com");

        company::upsert_profile(
            &conn,
            UpsertUserProfile {
                full_name: "Rear Admiral Hopper".to_string(),
                email: "grace@example.com".to_string(),
                role: Some(StaffRole::Owner),
                avatar_url: None,
            },
        )
        .unwrap();

        let loaded = company::get_profile(&conn, "GRACE@example.com").unwrap();
        assert_eq!(loaded.id, profile.id);
        assert_eq!(loaded.full_name, "Rear Admiral Hopper");
        assert_eq!(loaded.role, StaffRole::Owner);

        assert_eq!(company::get_profile(&conn, "nobody@example.com").unwrap_err().code(), "not_found");
    }

    // ===== REPORT TESTS =====

    #[test]
    fn test_daily_analysis_skips_cancelled_orders() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let day = today();

        orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 2), item(f.fries_id, 1)])).unwrap();
        orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 1)])).unwrap();
        let cancelled = orders::create(&conn, dine_in(&f, vec![item(f.soda_id, 2)])).unwrap();
        orders::update_status(&conn, cancelled.order.id, OrderStatus::Cancelled).unwrap();

        assert_eq!(reports::refresh_daily_analysis(&conn, day).unwrap(), 2);
        // Refreshing again replaces rather than duplicates.
        assert_eq!(reports::refresh_daily_analysis(&conn, day).unwrap(), 2);

        let burger = reports::product_analysis(&conn, f.burger_id, 7, day).unwrap();
        assert_eq!(burger.len(), 1);
        assert_eq!(burger[0].units_sold, 3);
        assert_eq!(burger[0].order_count, 2);
        assert_money(burger[0].revenue, 37.5);
        assert_eq!(burger[0].product_name.as_deref(), Some("Burger"));

        assert!(reports::product_analysis(&conn, f.soda_id, 7, day).unwrap().is_empty());
        assert_eq!(reports::product_analysis(&conn, f.burger_id, 0, day).unwrap_err().code(), "validation");
        for days in [1_000_000_000, i64::MAX] {
            let err = reports::product_analysis(&conn, f.burger_id, days, day).unwrap_err();
            assert_eq!(err.code(), "validation");
        }
        assert_eq!(reports::product_analysis(&conn, f.burger_id, 3650, day).unwrap().len(), 1);
    }

    #[test]
    fn test_top_products_and_day_summary() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);
        let day = today();

        orders::create(&conn, dine_in(&f, vec![item(f.fries_id, 5), item(f.burger_id, 1)])).unwrap();
        let cancelled = orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 4)])).unwrap();
        orders::update_status(&conn, cancelled.order.id, OrderStatus::Cancelled).unwrap();

        let top = reports::top_products(&conn, day, day, 10).unwrap();
        let names: Vec<&str> = top.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Fries", "Burger"]);
        assert_eq!(top[1].units_sold, 1);
        assert_eq!(reports::top_products(&conn, day, day, 1).unwrap().len(), 1);
        assert_eq!(reports::top_products(&conn, day, day, usize::MAX).unwrap().len(), top.len());
        assert!(reports::top_products(&conn, day, day - Duration::days(1), 5).is_err());

        let summary = reports::day_summary(&conn, day).unwrap();
        assert_eq!(summary.total_orders, 1);
        assert_money(summary.total_revenue, 32.5);
        assert_eq!(summary.orders.len(), 2);
    }

    // ===== DASHBOARD TESTS =====

    #[test]
    fn test_dashboard_stats_for_today() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let f = seed_test_data(&conn);

        orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 2)])).unwrap();
        let second = orders::create(&conn, dine_in(&f, vec![item(f.fries_id, 1)])).unwrap();
        orders::update_status(&conn, second.order.id, OrderStatus::Confirmed).unwrap();
        let cancelled = orders::create(&conn, dine_in(&f, vec![item(f.burger_id, 1)])).unwrap();
        orders::update_status(&conn, cancelled.order.id, OrderStatus::Cancelled).unwrap();

        let stats = dashboard::stats(&conn, DashboardPeriod::Today, today()).unwrap();
        assert_money(stats.revenue.value, 29.0);
        assert_money(stats.revenue.previous, 0.0);
        assert_money(stats.revenue.change_percent, 100.0);
        assert_money(stats.orders.value, 2.0);
        assert_money(stats.average_order_value.value, 14.5);
        assert_money(stats.new_customers.value, 1.0);

        let pending = stats
            .orders_by_status
            .iter()
            .find(|s| s.status == OrderStatus::Pending)
            .unwrap();
        assert_eq!(pending.count, 1);
        assert!(stats.orders_by_status.iter().all(|s| s.status != OrderStatus::Cancelled));

        assert_eq!(stats.recent_orders.len(), 2);
        assert!(stats.recent_orders.iter().all(|o| o.order.id != cancelled.order.id));
        assert_eq!(stats.top_products[0].name, "Burger");
    }

    #[test]
    fn test_dashboard_stats_empty_database() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();

        let stats = dashboard::stats(&conn, DashboardPeriod::Month, today()).unwrap();
        assert_money(stats.revenue.value, 0.0);
        assert_money(stats.revenue.change_percent, 0.0);
        assert_money(stats.average_order_value.value, 0.0);
        assert!(stats.recent_orders.is_empty());
        assert!(stats.top_products.is_empty());
    }

    // ===== ASSISTANT TESTS =====

    #[test]
    fn test_assistant_settings_respect_mode_locks() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();

        let defaults = assistant::load_settings(&conn).unwrap();
        assert_eq!(defaults, AiSettings::default());

        let err = assistant::update_settings(
            &conn,
            AiSettings {
                max_upsell_suggestions: 4,
                ..AiSettings::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "max_upsell_suggestions cannot be changed in smart mode");

        let saved = assistant::update_settings(
            &conn,
            AiSettings {
                upsell_mode: UpsellMode::Manual,
                max_upsell_suggestions: 3,
                assistant_name: "  Sous Chef  ".to_string(),
                ..AiSettings::default()
            },
        )
        .unwrap();
        assert_eq!(saved.assistant_name, "Sous Chef");
        assert_eq!(assistant::load_settings(&conn).unwrap(), saved);
    }

    #[test]
    fn test_prepare_reply_uses_menu_and_settings() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        seed_test_data(&conn);
        let mut rng = StdRng::seed_from_u64(7);

        let reply = assistant::prepare_reply(&conn, "What's on the menu?", &mut rng).unwrap();
        assert_eq!(reply.intent, ChatIntent::Menu);
        assert!((0.80..=0.99).contains(&reply.confidence));
        assert!((300..=1500).contains(&reply.latency_ms));

        assert_eq!(assistant::prepare_reply(&conn, "   ", &mut rng).unwrap_err().code(), "validation");

        assistant::update_settings(
            &conn,
            AiSettings {
                enabled: false,
                ..AiSettings::default()
            },
        )
        .unwrap();
        let err = assistant::prepare_reply(&conn, "hello", &mut rng).unwrap_err();
        assert_eq!(err.to_string(), "Chef Bot is disabled");
    }

    // ===== CONVERSATION TESTS =====

    #[test]
    fn test_conversation_log_and_analytics() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();

        let empty = conversations::analytics(&conn).unwrap();
        assert_eq!(empty.total_conversations, 0);
        assert_money(empty.resolution_rate, 0.0);

        let entries = [
            ("s1", "hi", ChatIntent::Greeting, 0.9, 400),
            ("s1", "menu?", ChatIntent::Menu, 0.8, 600),
            ("s2", "blorp", ChatIntent::Fallback, 0.5, 800),
        ];
        for (session_id, message, intent, confidence, latency_ms) in entries {
            let logged = conversations::insert(
                &conn,
                NewConversation {
                    session_id,
                    customer_message: message,
                    assistant_reply: "ok",
                    intent,
                    confidence,
                    latency_ms,
                },
            )
            .unwrap();
            assert_eq!(logged.resolved, intent != ChatIntent::Fallback);
        }

        let recent = conversations::list(&conn, 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].customer_message, "blorp");
        assert_eq!(conversations::list(&conn, usize::MAX).unwrap().len(), 3);

        let stats = conversations::analytics(&conn).unwrap();
        assert_eq!(stats.total_conversations, 3);
        assert_eq!(stats.total_sessions, 2);
        assert_money(stats.average_confidence, 0.73);
        assert_money(stats.average_latency_ms, 600.0);
        assert_money(stats.resolution_rate, 66.7);
        assert_eq!(stats.intents.len(), 3);
        assert_eq!(stats.per_day.len(), 1);
        assert_eq!(stats.per_day[0].count, 3);

        assert_eq!(conversations::clear(&conn).unwrap(), 3);
        assert!(conversations::list(&conn, 10).unwrap().is_empty());
    }

    // ===== DEMO DATA TESTS =====

    #[test]
    fn test_demo_seed_runs_once() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        let day = today();

        assert!(demo::seed_demo_data(&conn, day).unwrap());
        assert!(!demo::seed_demo_data(&conn, day).unwrap());

        assert!(company::get_company(&conn).unwrap().is_some());
        assert!(!customers::list(&conn, &CustomerQuery::default(), day).unwrap().is_empty());
        assert!(!orders::list(&conn, &OrderQuery::default()).unwrap().is_empty());
        assert!(!conversations::list(&conn, 50).unwrap().is_empty());
        assert_eq!(subscriptions::list(&conn, None).unwrap().len(), 3);

        // Board positions stay dense in every column.
        for column in board::get_board(&conn, true).unwrap() {
            let positions: Vec<i64> = column.orders.iter().map(|o| o.order.board_position).collect();
            let expected: Vec<i64> = (0..positions.len() as i64).collect();
            assert_eq!(positions, expected, "column {}", column.status);
        }

        dashboard::stats(&conn, DashboardPeriod::Month, day).unwrap();
    }

    #[test]
    fn test_demo_seed_skips_existing_data() {
        let db = setup_test_db();
        let conn = db.lock().unwrap();
        seed_test_data(&conn);

        assert!(!demo::seed_demo_data(&conn, today()).unwrap());
        assert!(company::get_company(&conn).unwrap().is_none());
    }
}
