use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tauri::{AppHandle, Manager};

use crate::error::{AppError, AppResult};

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn new(app_handle: &AppHandle, file_name: &str) -> AppResult<Self> {
        let app_dir = app_handle
            .path()
            .app_data_dir()
            .map_err(|e| AppError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string())))?;

        std::fs::create_dir_all(&app_dir)?;

        Self::open(app_dir.join(file_name))
    }

    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "Opened database");

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> AppResult<Self> {
        Ok(Database {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    pub fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| AppError::Lock)
    }

    pub fn initialize(&self) -> AppResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS companies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                address TEXT,
                phone TEXT,
                email TEXT,
                currency TEXT NOT NULL DEFAULT 'USD',
                timezone TEXT,
                created_at DATETIME NOT NULL
            );

            CREATE TABLE IF NOT EXISTS user_profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id INTEGER,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL DEFAULT 'manager',
                avatar_url TEXT,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (company_id) REFERENCES companies(id)
            );

            CREATE TABLE IF NOT EXISTS staff (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id INTEGER,
                name TEXT NOT NULL UNIQUE,
                email TEXT,
                role TEXT NOT NULL DEFAULT 'server',
                pin TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (company_id) REFERENCES companies(id)
            );

            CREATE TABLE IF NOT EXISTS customers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT UNIQUE,
                phone TEXT,
                address TEXT,
                notes TEXT,
                loyalty_points INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            );

            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                price REAL NOT NULL,
                category_id INTEGER,
                is_available INTEGER NOT NULL DEFAULT 1,
                stock_quantity INTEGER,
                low_stock_threshold INTEGER NOT NULL DEFAULT 5,
                image_url TEXT,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                FOREIGN KEY (category_id) REFERENCES categories(id)
            );

            CREATE TABLE IF NOT EXISTS offers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                code TEXT UNIQUE,
                discount_type TEXT NOT NULL,
                discount_value REAL NOT NULL,
                min_order_amount REAL NOT NULL DEFAULT 0,
                starts_at DATE,
                ends_at DATE,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at DATETIME NOT NULL
            );

            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_number TEXT NOT NULL DEFAULT '',
                customer_id INTEGER,
                staff_id INTEGER,
                order_type TEXT NOT NULL DEFAULT 'dine_in',
                status TEXT NOT NULL DEFAULT 'pending',
                payment_status TEXT NOT NULL DEFAULT 'unpaid',
                table_number INTEGER,
                delivery_address TEXT,
                notes TEXT,
                offer_id INTEGER,
                subtotal REAL NOT NULL DEFAULT 0,
                discount REAL NOT NULL DEFAULT 0,
                total REAL NOT NULL DEFAULT 0,
                board_position INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                FOREIGN KEY (customer_id) REFERENCES customers(id),
                FOREIGN KEY (staff_id) REFERENCES staff(id),
                FOREIGN KEY (offer_id) REFERENCES offers(id)
            );

            CREATE TABLE IF NOT EXISTS order_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id INTEGER NOT NULL,
                product_id INTEGER NOT NULL,
                product_name TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                unit_price REAL NOT NULL,
                total REAL NOT NULL,
                FOREIGN KEY (order_id) REFERENCES orders(id),
                FOREIGN KEY (product_id) REFERENCES products(id)
            );

            CREATE TABLE IF NOT EXISTS subscriptions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_id INTEGER NOT NULL,
                plan_name TEXT NOT NULL,
                price REAL NOT NULL,
                billing_cycle TEXT NOT NULL,
                meals_per_cycle INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'active',
                start_date DATE NOT NULL,
                next_billing_date DATE NOT NULL,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (customer_id) REFERENCES customers(id)
            );

            CREATE TABLE IF NOT EXISTS products_daily_analysis (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL,
                date DATE NOT NULL,
                units_sold INTEGER NOT NULL,
                revenue REAL NOT NULL,
                order_count INTEGER NOT NULL,
                UNIQUE (product_id, date),
                FOREIGN KEY (product_id) REFERENCES products(id)
            );

            CREATE TABLE IF NOT EXISTS ai_conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                customer_message TEXT NOT NULL,
                assistant_reply TEXT NOT NULL,
                intent TEXT NOT NULL,
                confidence REAL NOT NULL,
                latency_ms INTEGER NOT NULL,
                resolved INTEGER NOT NULL,
                created_at DATETIME NOT NULL
            );

            CREATE TABLE IF NOT EXISTS app_settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        // Run migrations for existing databases (pass connection to avoid deadlock)
        Self::migrate_conn(&conn)?;

        conn.execute_batch(
            "
            CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status, board_position);
            CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id);
            ",
        )?;

        Ok(())
    }

    fn migrate_conn(conn: &Connection) -> AppResult<()> {
        let order_columns = table_columns(conn, "orders")?;
        let order_migrations = [
            ("offer_id", "ALTER TABLE orders ADD COLUMN offer_id INTEGER"),
            ("discount", "ALTER TABLE orders ADD COLUMN discount REAL NOT NULL DEFAULT 0"),
            (
                "board_position",
                "ALTER TABLE orders ADD COLUMN board_position INTEGER NOT NULL DEFAULT 0",
            ),
            ("delivery_address", "ALTER TABLE orders ADD COLUMN delivery_address TEXT"),
        ];
        for (column, sql) in order_migrations {
            if !order_columns.iter().any(|c| c == column) {
                tracing::info!(column, "Migrating orders table");
                conn.execute(sql, [])?;
            }
        }

        let product_columns = table_columns(conn, "products")?;
        if !product_columns.iter().any(|c| c == "image_url") {
            conn.execute("ALTER TABLE products ADD COLUMN image_url TEXT", [])?;
        }

        let staff_columns = table_columns(conn, "staff")?;
        if !staff_columns.iter().any(|c| c == "is_active") {
            conn.execute(
                "ALTER TABLE staff ADD COLUMN is_active INTEGER NOT NULL DEFAULT 1",
                [],
            )?;
        }

        Ok(())
    }
}

fn table_columns(conn: &Connection, table: &str) -> AppResult<Vec<String>> {
    let columns = conn
        .prepare(&format!("PRAGMA table_info({})", table))?
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

pub fn load_setting<T: DeserializeOwned>(conn: &Connection, key: &str) -> AppResult<Option<T>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM app_settings WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;

    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_setting<T: Serialize>(conn: &Connection, key: &str, value: &T) -> AppResult<()> {
    let raw = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO app_settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        rusqlite::params![key, raw],
    )?;
    Ok(())
}

/// Local wall-clock timestamp in the format every table stores.
pub fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

pub trait DatabaseExt {
    fn db(&self) -> &Database;
}

impl DatabaseExt for AppHandle {
    fn db(&self) -> &Database {
        self.state::<Database>().inner()
    }
}
