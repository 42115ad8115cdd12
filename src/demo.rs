//! Demo restaurant used to populate a fresh install.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusqlite::Connection;

use crate::assistant::{self, AiSettings};
use crate::error::AppResult;
use crate::models::{
    BillingCycle, CreateCategory, CreateCustomer, CreateOffer, CreateOrder, CreateOrderItem, CreateProduct,
    CreateStaff, CreateSubscription, DiscountType, OrderStatus, OrderType, StaffRole, UpdateCompany,
    UpsertUserProfile,
};
use crate::repository::conversations::{self, NewConversation};
use crate::repository::{
    categories, company, customers, offers, orders, products, reports, staff, subscriptions,
};

const MENU: &[(&str, &[(&str, &str, f64, Option<i64>)])] = &[
    (
        "Starters",
        &[
            ("Garlic Bread", "Sourdough, garlic butter, parsley", 5.50, None),
            ("Burrata", "Heirloom tomatoes, basil oil", 11.00, Some(12)),
            ("Calamari", "Lemon aioli", 9.50, Some(3)),
        ],
    ),
    (
        "Mains",
        &[
            ("Margherita Pizza", "San Marzano tomato, fior di latte", 12.00, None),
            ("Truffle Tagliatelle", "Fresh pasta, black truffle, parmesan", 18.50, Some(20)),
            ("Grilled Salmon", "Salsa verde, new potatoes", 21.00, Some(8)),
            ("Chicken Milanese", "Rocket, lemon, capers", 17.00, None),
        ],
    ),
    (
        "Desserts",
        &[
            ("Tiramisu", "Mascarpone, espresso, cocoa", 7.00, Some(15)),
            ("Panna Cotta", "Vanilla, berry compote", 6.50, None),
        ],
    ),
    (
        "Drinks",
        &[
            ("Lemonade", "House-made", 3.50, None),
            ("Espresso", "Double shot", 2.80, None),
            ("Chianti (glass)", "Tuscany", 8.00, Some(40)),
        ],
    ),
];

const CUSTOMERS: &[(&str, &str, &str, &str)] = &[
    ("Ana Sousa", "ana.sousa@example.com", "+1 555 0101", "12 Elm Street"),
    ("Ben Okafor", "ben.okafor@example.com", "+1 555 0102", "4 Harbour Road"),
    ("Chloe Martin", "chloe.martin@example.com", "+1 555 0103", "88 Mill Lane"),
    ("Dev Patel", "dev.patel@example.com", "+1 555 0104", "7 Orchard Way"),
    ("Eva Novak", "eva.novak@example.com", "+1 555 0105", "31 Station Road"),
    ("Farid Haddad", "farid.haddad@example.com", "+1 555 0106", "19 Bridge Street"),
];

const CHATS: &[&str] = &[
    "Hi there!",
    "What's on the menu today?",
    "When do you close on Sunday?",
    "Where is my order?",
    "Do you deliver to Harbour Road?",
    "How much is the salmon?",
    "What do you recommend for dessert?",
    "My pasta arrived cold",
    "Can I bring my dog?",
];

fn is_empty(conn: &Connection) -> AppResult<bool> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?;
    Ok(count == 0)
}

/// Moves an order back in time, keeping its number in step with its date.
fn backdate_order(conn: &Connection, order_id: i64, day: NaiveDate, time: &str) -> AppResult<()> {
    let timestamp = format!("{} {}", day.format("%Y-%m-%d"), time);
    let order_number = format!("ORD-{}-{:04}", day.format("%Y%m%d"), order_id);
    conn.execute(
        "UPDATE orders SET created_at = ?1, updated_at = ?1, order_number = ?2 WHERE id = ?3",
        rusqlite::params![timestamp, order_number, order_id],
    )?;
    Ok(())
}

fn advance(conn: &Connection, order_id: i64, to: OrderStatus) -> AppResult<()> {
    for status in OrderStatus::board_order() {
        if status == OrderStatus::Cancelled {
            break;
        }
        let current = orders::get(conn, order_id)?.order.status;
        if current == to {
            break;
        }
        if current.can_transition_to(status) {
            orders::update_status(conn, order_id, status)?;
        }
    }
    Ok(())
}

/// Seeds the demo restaurant when the database has no customers yet.
/// Returns whether anything was written.
pub fn seed_demo_data(conn: &Connection, today: NaiveDate) -> AppResult<bool> {
    if !is_empty(conn)? {
        tracing::debug!("Database already has data, skipping demo seed");
        return Ok(false);
    }

    // Not wrapped in a transaction: repository calls open their own.
    company::update_company(
        conn,
        UpdateCompany {
            name: "Trattoria Demo".to_string(),
            address: Some("1 Market Square".to_string()),
            phone: Some("+1 555 0100".to_string()),
            email: Some("hello@trattoria.example".to_string()),
            currency: Some("USD".to_string()),
            timezone: Some("America/New_York".to_string()),
        },
        "USD",
    )?;
    company::upsert_profile(
        conn,
        UpsertUserProfile {
            full_name: "Demo Manager".to_string(),
            email: "manager@trattoria.example".to_string(),
            role: Some(StaffRole::Manager),
            avatar_url: None,
        },
    )?;

    let mut staff_ids = Vec::new();
    for (name, role, pin) in [
        ("Marco", StaffRole::Owner, Some("1234")),
        ("Giulia", StaffRole::Server, Some("2468")),
        ("Luca", StaffRole::Kitchen, None),
        ("Sofia", StaffRole::Driver, None),
    ] {
        let member = staff::create(
            conn,
            CreateStaff {
                name: name.to_string(),
                email: Some(format!("{}@trattoria.example", name.to_lowercase())),
                role: Some(role),
                pin: pin.map(str::to_string),
            },
        )?;
        staff_ids.push(member.id);
    }

    let mut product_ids = Vec::new();
    for (category_name, items) in MENU {
        let category = categories::create(
            conn,
            CreateCategory {
                name: category_name.to_string(),
                description: None,
            },
        )?;
        for (name, description, price, stock) in items.iter() {
            let product = products::create(
                conn,
                CreateProduct {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                    price: *price,
                    category_id: Some(category.id),
                    is_available: Some(true),
                    stock_quantity: *stock,
                    low_stock_threshold: None,
                    image_url: None,
                },
            )?;
            product_ids.push(product.id);
        }
    }

    let mut customer_ids = Vec::new();
    for (name, email, phone, address) in CUSTOMERS {
        let customer = customers::create(
            conn,
            CreateCustomer {
                name: name.to_string(),
                email: Some(email.to_string()),
                phone: Some(phone.to_string()),
                address: Some(address.to_string()),
                notes: None,
            },
        )?;
        customer_ids.push(customer.id);
    }
    // Spread sign-ups so the new-customer card has a history.
    for (offset, id) in customer_ids.iter().enumerate() {
        let joined = today - Duration::days(75 - offset as i64 * 14);
        conn.execute(
            "UPDATE customers SET created_at = ?1, updated_at = ?1 WHERE id = ?2",
            rusqlite::params![format!("{} 12:00:00", joined.format("%Y-%m-%d")), id],
        )?;
    }

    offers::create(
        conn,
        CreateOffer {
            title: "Welcome 10%".to_string(),
            description: Some("10% off your first order".to_string()),
            code: Some("welcome10".to_string()),
            discount_type: DiscountType::Percentage,
            discount_value: 10.0,
            min_order_amount: Some(0.0),
            starts_at: None,
            ends_at: None,
        },
    )?;
    offers::create(
        conn,
        CreateOffer {
            title: "Five off fifty".to_string(),
            description: None,
            code: Some("FIVEOFF".to_string()),
            discount_type: DiscountType::FixedAmount,
            discount_value: 5.0,
            min_order_amount: Some(50.0),
            starts_at: Some((today - Duration::days(30)).format("%Y-%m-%d").to_string()),
            ends_at: Some((today + Duration::days(30)).format("%Y-%m-%d").to_string()),
        },
    )?;

    for (customer, plan, price, cycle, meals) in [
        (customer_ids[0], "Weekday Lunch", 45.0, BillingCycle::Weekly, 5),
        (customer_ids[2], "Family Dinner", 180.0, BillingCycle::Monthly, 8),
        (customer_ids[4], "Wine Club", 420.0, BillingCycle::Yearly, 12),
    ] {
        subscriptions::create(
            conn,
            CreateSubscription {
                customer_id: customer,
                plan_name: plan.to_string(),
                price,
                billing_cycle: cycle,
                meals_per_cycle: Some(meals),
                start_date: Some((today - Duration::days(20)).format("%Y-%m-%d").to_string()),
            },
            today,
        )?;
    }

    // (days ago, customer index, type, [(product index, qty)], final status, paid)
    let history: [(i64, usize, OrderType, &[(usize, i64)], OrderStatus, bool); 12] = [
        (0, 0, OrderType::DineIn, &[(3, 2), (10, 2)], OrderStatus::Pending, false),
        (0, 1, OrderType::Delivery, &[(4, 1), (7, 1)], OrderStatus::Confirmed, false),
        (0, 2, OrderType::Takeaway, &[(0, 1), (6, 1)], OrderStatus::Preparing, false),
        (0, 3, OrderType::DineIn, &[(5, 2), (11, 2)], OrderStatus::Ready, true),
        (1, 4, OrderType::DineIn, &[(1, 1), (3, 1), (8, 2)], OrderStatus::Delivered, true),
        (1, 0, OrderType::Delivery, &[(4, 2)], OrderStatus::Delivered, true),
        (2, 5, OrderType::Takeaway, &[(2, 1), (9, 2)], OrderStatus::Cancelled, false),
        (3, 1, OrderType::DineIn, &[(5, 1), (6, 1), (11, 2)], OrderStatus::Delivered, true),
        (5, 2, OrderType::DineIn, &[(3, 3), (7, 3)], OrderStatus::Delivered, true),
        (8, 3, OrderType::Delivery, &[(4, 1), (11, 1)], OrderStatus::Delivered, true),
        (12, 4, OrderType::Takeaway, &[(0, 2), (10, 2)], OrderStatus::Delivered, true),
        (70, 5, OrderType::DineIn, &[(5, 2)], OrderStatus::Delivered, true),
    ];

    for (n, (days_ago, customer, order_type, items, status, paid)) in history.into_iter().enumerate() {
        let order = orders::create(
            conn,
            CreateOrder {
                customer_id: Some(customer_ids[customer]),
                staff_id: Some(staff_ids[1]),
                order_type,
                table_number: (order_type == OrderType::DineIn).then_some(n as i64 % 8 + 1),
                delivery_address: (order_type == OrderType::Delivery)
                    .then(|| CUSTOMERS[customer].3.to_string()),
                notes: None,
                offer_code: (n == 4).then(|| "WELCOME10".to_string()),
                items: items
                    .iter()
                    .map(|(product, quantity)| CreateOrderItem {
                        product_id: product_ids[*product],
                        quantity: *quantity,
                    })
                    .collect(),
            },
        )?;
        let order_id = order.order.id;

        if paid {
            orders::mark_paid(conn, order_id)?;
        }
        if status == OrderStatus::Cancelled {
            orders::update_status(conn, order_id, OrderStatus::Cancelled)?;
        } else {
            advance(conn, order_id, status)?;
        }
        backdate_order(conn, order_id, today - Duration::days(days_ago), &format!("{:02}:15:00", 11 + n % 10))?;
    }

    for days_ago in 0..14 {
        reports::refresh_daily_analysis(conn, today - Duration::days(days_ago))?;
    }

    let settings = AiSettings::default();
    let menu = products::list_all(conn)?;
    let mut rng = StdRng::seed_from_u64(42);
    for (n, message) in CHATS.iter().enumerate() {
        let reply = assistant::generate_mock_response(message, &settings, &menu, &mut rng);
        conversations::insert(
            conn,
            NewConversation {
                session_id: &format!("demo-session-{}", n / 3 + 1),
                customer_message: message,
                assistant_reply: &reply.reply,
                intent: reply.intent,
                confidence: reply.confidence,
                latency_ms: reply.latency_ms,
            },
        )?;
    }

    tracing::info!(
        products = product_ids.len(),
        customers = customer_ids.len(),
        orders = history.len(),
        "Demo data seeded"
    );
    Ok(true)
}
