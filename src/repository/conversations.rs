use rusqlite::Connection;

use super::sql_limit;
use crate::db::now_timestamp;
use crate::error::{AppError, AppResult};
use crate::models::{ChatIntent, Conversation, ConversationAnalytics, DailyCount, IntentCount};

/// One exchange to append to the log.
#[derive(Debug, Clone)]
pub struct NewConversation<'a> {
    pub session_id: &'a str,
    pub customer_message: &'a str,
    pub assistant_reply: &'a str,
    pub intent: ChatIntent,
    pub confidence: f64,
    pub latency_ms: i64,
}

const SELECT_CONVERSATION: &str = "SELECT id, session_id, customer_message, assistant_reply, intent, confidence,
            latency_ms, resolved, created_at
     FROM ai_conversations";

fn map_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        session_id: row.get(1)?,
        customer_message: row.get(2)?,
        assistant_reply: row.get(3)?,
        intent: row.get(4)?,
        confidence: row.get(5)?,
        latency_ms: row.get(6)?,
        resolved: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Anything the assistant recognised counts as resolved; fallbacks need a human.
pub fn insert(conn: &Connection, entry: NewConversation<'_>) -> AppResult<Conversation> {
    conn.execute(
        "INSERT INTO ai_conversations (session_id, customer_message, assistant_reply, intent, confidence,
                                       latency_ms, resolved, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            entry.session_id,
            entry.customer_message,
            entry.assistant_reply,
            entry.intent,
            entry.confidence,
            entry.latency_ms,
            entry.intent != ChatIntent::Fallback,
            now_timestamp(),
        ],
    )?;

    let id = conn.last_insert_rowid();
    conn.query_row(&format!("{} WHERE id = ?1", SELECT_CONVERSATION), [id], map_conversation)
        .map_err(|e| AppError::or_not_found(e, format!("Conversation {}", id)))
}

/// Newest first.
pub fn list(conn: &Connection, limit: usize) -> AppResult<Vec<Conversation>> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY created_at DESC, id DESC LIMIT ?1",
        SELECT_CONVERSATION
    ))?;
    let rows = stmt
        .query_map([sql_limit(limit)], map_conversation)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn analytics(conn: &Connection) -> AppResult<ConversationAnalytics> {
    let (total, sessions, avg_confidence, avg_latency, resolved): (i64, i64, f64, f64, i64) = conn.query_row(
        "SELECT COUNT(*), COUNT(DISTINCT session_id), COALESCE(AVG(confidence), 0),
                COALESCE(AVG(latency_ms), 0), COALESCE(SUM(resolved), 0)
         FROM ai_conversations",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
    )?;

    let mut stmt = conn.prepare(
        "SELECT intent, COUNT(*) FROM ai_conversations GROUP BY intent ORDER BY COUNT(*) DESC, intent",
    )?;
    let intents = stmt
        .query_map([], |row| {
            Ok(IntentCount {
                intent: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT date(created_at), COUNT(*) FROM ai_conversations GROUP BY date(created_at) ORDER BY date(created_at)",
    )?;
    let per_day = stmt
        .query_map([], |row| {
            Ok(DailyCount {
                date: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let resolution_rate = if total == 0 {
        0.0
    } else {
        (resolved as f64 / total as f64 * 1000.0).round() / 10.0
    };

    Ok(ConversationAnalytics {
        total_conversations: total,
        total_sessions: sessions,
        average_confidence: (avg_confidence * 100.0).round() / 100.0,
        average_latency_ms: avg_latency.round(),
        resolution_rate,
        intents,
        per_day,
    })
}

pub fn clear(conn: &Connection) -> AppResult<usize> {
    let removed = conn.execute("DELETE FROM ai_conversations", [])?;
    tracing::info!(removed, "Conversation log cleared");
    Ok(removed)
}
