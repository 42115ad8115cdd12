mod assistant;
mod commands;
mod config;
mod db;
mod demo;
mod error;
mod listing;
mod logging;
mod models;
mod preferences;
mod pricing;
mod repository;
mod workflow;

#[cfg(test)]
mod tests;

use commands::{
    ai, board, categories, company, customers, dashboard, offers, orders, preferences as prefs, products,
    reports, staff, subscriptions,
};
use config::{AppConfig, AppPaths};
use db::Database;
use preferences::PreferencesStore;
use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .setup(|app| {
            let paths = AppPaths::new(app.path().app_data_dir()?);
            std::fs::create_dir_all(&paths.data_dir)?;

            let loaded = AppConfig::load(&paths.config_file());
            let config = match &loaded {
                Ok(config) => config.clone(),
                Err(_) => AppConfig::default(),
            }
            .with_env_overrides();

            let guard = logging::init(&config, &paths.log_dir())?;
            if let Err(e) = loaded {
                tracing::warn!(error = %e, "Ignoring malformed config.json, using defaults");
            }
            tracing::info!(data_dir = %paths.data_dir.display(), "Restaurant admin starting");

            let db = Database::new(app.handle(), &config.database_file)?;
            db.initialize()?;
            if config.seed_demo_data {
                let conn = db.lock()?;
                if let Err(e) = demo::seed_demo_data(&conn, db::today()) {
                    tracing::error!(error = %e, "Failed to seed demo data");
                }
            }

            app.manage(PreferencesStore::open(paths.preferences_file()));
            app.manage(db);
            app.manage(config);
            if let Some(guard) = guard {
                app.manage(guard);
            }

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Categories
            categories::get_categories,
            categories::create_category,
            categories::update_category,
            categories::delete_category,
            categories::reorder_categories,
            // Products
            products::get_products,
            products::get_product,
            products::create_product,
            products::update_product,
            products::delete_product,
            products::set_product_availability,
            products::adjust_stock,
            products::get_low_stock,
            // Customers
            customers::get_customers,
            customers::get_customer,
            customers::create_customer,
            customers::update_customer,
            customers::delete_customer,
            customers::get_customer_orders,
            customers::adjust_loyalty_points,
            // Orders
            orders::create_order,
            orders::get_order,
            orders::list_orders,
            orders::get_open_orders,
            orders::update_order_details,
            orders::add_items_to_order,
            orders::update_item_quantity,
            orders::remove_order_item,
            orders::apply_offer_to_order,
            orders::remove_offer_from_order,
            orders::update_order_status,
            orders::mark_order_paid,
            orders::refund_order,
            orders::delete_order,
            // Board
            board::get_order_board,
            board::move_order_card,
            // Offers
            offers::get_offers,
            offers::get_active_offers,
            offers::get_offer,
            offers::find_offer_by_code,
            offers::create_offer,
            offers::update_offer,
            offers::set_offer_active,
            offers::delete_offer,
            // Subscriptions
            subscriptions::get_subscriptions,
            subscriptions::get_subscription,
            subscriptions::create_subscription,
            subscriptions::update_subscription,
            subscriptions::set_subscription_status,
            subscriptions::renew_subscription,
            subscriptions::delete_subscription,
            subscriptions::get_subscription_stats,
            // Staff
            staff::get_staff,
            staff::create_staff,
            staff::update_staff,
            staff::delete_staff,
            staff::set_staff_active,
            staff::verify_staff_pin,
            // Company & profile
            company::get_company,
            company::update_company,
            company::get_user_profile,
            company::upsert_user_profile,
            // Reports
            reports::refresh_daily_analysis,
            reports::get_product_analysis,
            reports::get_top_products,
            reports::get_day_summary,
            // Dashboard
            dashboard::get_dashboard_stats,
            prefs::get_preferences,
            prefs::save_preferences,
            prefs::toggle_dashboard_card,
            prefs::move_dashboard_card,
            prefs::reset_preferences,
            // Assistant
            ai::get_ai_settings,
            ai::update_ai_settings,
            ai::get_editable_ai_fields,
            ai::simulate_chat,
            ai::get_conversations,
            ai::get_conversation_analytics,
            ai::clear_conversations,
            ai::get_upsell_suggestions,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
