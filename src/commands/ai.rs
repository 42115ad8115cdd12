use std::time::Duration;

use tauri::{AppHandle, Manager};

use crate::assistant::{self, AiField, AiSettings, UpsellMode};
use crate::config::AppConfig;
use crate::db::DatabaseExt;
use crate::error::AppResult;
use crate::models::{Conversation, ConversationAnalytics, Product};
use crate::repository::conversations::{self, NewConversation};
use crate::repository::{orders, products};

#[tauri::command]
pub fn get_ai_settings(app: AppHandle) -> AppResult<AiSettings> {
    let db = app.db();
    let conn = db.lock()?;
    assistant::load_settings(&conn)
}

#[tauri::command]
pub fn update_ai_settings(app: AppHandle, settings: AiSettings) -> AppResult<AiSettings> {
    let db = app.db();
    let conn = db.lock()?;
    assistant::update_settings(&conn, settings)
}

/// Fields the settings form may enable for a given upsell mode.
#[tauri::command]
pub fn get_editable_ai_fields(mode: UpsellMode) -> Vec<AiField> {
    mode.editable_fields()
}

/// Answers a test message from the settings page. The database lock is not
/// held while the simulated latency elapses.
#[tauri::command]
pub async fn simulate_chat(app: AppHandle, message: String, session_id: Option<String>) -> AppResult<Conversation> {
    let reply = {
        let db = app.db();
        let conn = db.lock()?;
        assistant::prepare_reply(&conn, &message, &mut rand::thread_rng())?
    };

    if app.state::<AppConfig>().simulate_ai_latency {
        tokio::time::sleep(Duration::from_millis(reply.latency_ms as u64)).await;
    }

    let session_id = session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let db = app.db();
    let conn = db.lock()?;
    let conversation = conversations::insert(
        &conn,
        NewConversation {
            session_id: &session_id,
            customer_message: message.trim(),
            assistant_reply: &reply.reply,
            intent: reply.intent,
            confidence: reply.confidence,
            latency_ms: reply.latency_ms,
        },
    )?;
    tracing::debug!(session_id = %conversation.session_id, intent = %conversation.intent, "Chat simulated");
    Ok(conversation)
}

#[tauri::command]
pub fn get_conversations(app: AppHandle, limit: Option<usize>) -> AppResult<Vec<Conversation>> {
    let db = app.db();
    let conn = db.lock()?;
    conversations::list(&conn, limit.unwrap_or(50))
}

#[tauri::command]
pub fn get_conversation_analytics(app: AppHandle) -> AppResult<ConversationAnalytics> {
    let db = app.db();
    let conn = db.lock()?;
    conversations::analytics(&conn)
}

#[tauri::command]
pub fn clear_conversations(app: AppHandle) -> AppResult<usize> {
    let db = app.db();
    let conn = db.lock()?;
    conversations::clear(&conn)
}

#[tauri::command]
pub fn get_upsell_suggestions(app: AppHandle, order_id: i64) -> AppResult<Vec<Product>> {
    let db = app.db();
    let conn = db.lock()?;
    let order = orders::get(&conn, order_id)?;
    let settings = assistant::load_settings(&conn)?;
    let menu = products::list_all(&conn)?;
    let in_order: Vec<i64> = order.items.iter().map(|i| i.product_id).collect();
    Ok(assistant::suggestions_for_order(&settings, &menu, order.order.subtotal, &in_order))
}
