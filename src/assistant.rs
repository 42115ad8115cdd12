//! Mock restaurant assistant.
//!
//! There is no model behind this: replies come from ordered keyword checks,
//! and confidence and latency are random numbers from an injected RNG.

use rand::Rng;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::db::{load_setting, save_setting};
use crate::error::{AppError, AppResult};
use crate::models::{ChatIntent, Product};
use crate::repository::products;

pub const SETTINGS_KEY: &str = "ai_settings";
pub const MAX_UPSELL_SUGGESTIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UpsellMode {
    /// Suggestions are picked automatically; only the basics are editable.
    #[default]
    Smart,
    /// The admin picks which products get suggested.
    Manual,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tone {
    #[default]
    Friendly,
    Professional,
    Casual,
}

impl Tone {
    fn opener(self) -> &'static str {
        match self {
            Tone::Friendly => "Happy to help! ",
            Tone::Professional => "",
            Tone::Casual => "Sure thing! ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub enabled: bool,
    pub assistant_name: String,
    pub greeting: String,
    pub tone: Tone,
    pub upsell_mode: UpsellMode,
    pub max_upsell_suggestions: u32,
    pub upsell_product_ids: Vec<i64>,
    pub upsell_min_order: f64,
    pub custom_instructions: Option<String>,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            assistant_name: "Chef Bot".to_string(),
            greeting: "Welcome! How can I help you today?".to_string(),
            tone: Tone::default(),
            upsell_mode: UpsellMode::default(),
            max_upsell_suggestions: 2,
            upsell_product_ids: Vec::new(),
            upsell_min_order: 0.0,
            custom_instructions: None,
        }
    }
}

/// Settings fields, for reporting which ones an upsell mode locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AiField {
    Enabled,
    AssistantName,
    Greeting,
    Tone,
    UpsellMode,
    MaxUpsellSuggestions,
    UpsellProductIds,
    UpsellMinOrder,
    CustomInstructions,
}

impl UpsellMode {
    pub fn is_editable(self, field: AiField) -> bool {
        match field {
            AiField::Enabled | AiField::AssistantName | AiField::Greeting | AiField::Tone | AiField::UpsellMode => {
                true
            }
            AiField::MaxUpsellSuggestions | AiField::UpsellProductIds => self != Self::Smart,
            AiField::UpsellMinOrder | AiField::CustomInstructions => self == Self::Advanced,
        }
    }

    pub fn editable_fields(self) -> Vec<AiField> {
        AiField::iter().filter(|f| self.is_editable(*f)).collect()
    }
}

impl AiSettings {
    pub fn changed_fields(&self, other: &AiSettings) -> Vec<AiField> {
        AiField::iter()
            .filter(|field| match field {
                AiField::Enabled => self.enabled != other.enabled,
                AiField::AssistantName => self.assistant_name != other.assistant_name,
                AiField::Greeting => self.greeting != other.greeting,
                AiField::Tone => self.tone != other.tone,
                AiField::UpsellMode => self.upsell_mode != other.upsell_mode,
                AiField::MaxUpsellSuggestions => self.max_upsell_suggestions != other.max_upsell_suggestions,
                AiField::UpsellProductIds => self.upsell_product_ids != other.upsell_product_ids,
                AiField::UpsellMinOrder => self.upsell_min_order != other.upsell_min_order,
                AiField::CustomInstructions => self.custom_instructions != other.custom_instructions,
            })
            .collect()
    }

    fn validate(&self) -> AppResult<()> {
        if self.assistant_name.trim().is_empty() {
            return Err(AppError::validation("Assistant name is required"));
        }
        if self.max_upsell_suggestions > MAX_UPSELL_SUGGESTIONS {
            return Err(AppError::validation(format!(
                "At most {} upsell suggestions are allowed",
                MAX_UPSELL_SUGGESTIONS
            )));
        }
        if !self.upsell_min_order.is_finite() || self.upsell_min_order < 0.0 {
            return Err(AppError::validation("Minimum order for upsells cannot be negative"));
        }
        Ok(())
    }
}

/// Checks an edit against the field locks of the mode being switched to.
pub fn apply_update(current: &AiSettings, mut requested: AiSettings) -> AppResult<AiSettings> {
    let locked: Vec<String> = current
        .changed_fields(&requested)
        .into_iter()
        .filter(|field| !requested.upsell_mode.is_editable(*field))
        .map(|field| field.to_string())
        .collect();
    if !locked.is_empty() {
        return Err(AppError::validation(format!(
            "{} cannot be changed in {} mode",
            locked.join(", "),
            requested.upsell_mode
        )));
    }

    requested.assistant_name = requested.assistant_name.trim().to_string();
    requested.custom_instructions = requested
        .custom_instructions
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let mut seen = Vec::with_capacity(requested.upsell_product_ids.len());
    requested.upsell_product_ids.retain(|id| {
        if seen.contains(id) {
            false
        } else {
            seen.push(*id);
            true
        }
    });
    requested.validate()?;
    Ok(requested)
}

pub fn load_settings(conn: &Connection) -> AppResult<AiSettings> {
    Ok(load_setting(conn, SETTINGS_KEY)?.unwrap_or_default())
}

pub fn update_settings(conn: &Connection, requested: AiSettings) -> AppResult<AiSettings> {
    let current = load_settings(conn)?;
    let settings = apply_update(&current, requested)?;
    save_setting(conn, SETTINGS_KEY, &settings)?;
    tracing::info!(mode = %settings.upsell_mode, enabled = settings.enabled, "Assistant settings saved");
    Ok(settings)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockReply {
    pub reply: String,
    pub intent: ChatIntent,
    pub confidence: f64,
    pub latency_ms: i64,
}

/// Keyword table in match order; the first intent with a hit wins.
const KEYWORDS: &[(ChatIntent, &[&str])] = &[
    (
        ChatIntent::Greeting,
        &["hello", "hi", "hey", "good morning", "good afternoon", "good evening"],
    ),
    (ChatIntent::Menu, &["menu", "dishes", "serve", "food", "vegetarian", "vegan"]),
    (ChatIntent::Hours, &["hours", "open", "opening", "close", "closing"]),
    (ChatIntent::OrderStatus, &["my order", "order status", "track", "where is"]),
    (ChatIntent::Delivery, &["delivery", "deliver", "shipping", "takeaway"]),
    (ChatIntent::Pricing, &["price", "prices", "cost", "how much", "expensive", "cheap"]),
    (
        ChatIntent::Recommendation,
        &["recommend", "suggest", "suggestion", "best", "popular", "special"],
    ),
    (
        ChatIntent::Complaint,
        &["complaint", "complain", "bad", "cold", "wrong", "terrible", "disappointed", "refund"],
    ),
];

/// Lowercased words of the message joined by single spaces, padded so a
/// keyword only matches on word boundaries.
fn normalize(message: &str) -> String {
    let words: Vec<String> = message
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();
    format!(" {} ", words.join(" "))
}

pub fn detect_intent(message: &str) -> ChatIntent {
    let text = normalize(message);
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(&format!(" {} ", w))))
        .map(|(intent, _)| *intent)
        .unwrap_or(ChatIntent::Fallback)
}

/// Products the assistant may push. Smart mode takes the first available
/// items of the menu; the other modes use the admin's picks, in order.
pub fn upsell_candidates<'a>(settings: &AiSettings, menu: &'a [Product]) -> Vec<&'a Product> {
    let limit = settings.max_upsell_suggestions as usize;
    let available = menu.iter().filter(|p| p.is_available);
    match settings.upsell_mode {
        UpsellMode::Smart => available.take(limit).collect(),
        UpsellMode::Manual | UpsellMode::Advanced => settings
            .upsell_product_ids
            .iter()
            .filter_map(|id| menu.iter().find(|p| p.id == *id && p.is_available))
            .take(limit)
            .collect(),
    }
}

fn price_range(menu: &[Product]) -> Option<(f64, f64)> {
    let prices: Vec<f64> = menu.iter().filter(|p| p.is_available).map(|p| p.price).collect();
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (!prices.is_empty()).then_some((min, max))
}

pub fn generate_mock_response(
    message: &str,
    settings: &AiSettings,
    menu: &[Product],
    rng: &mut impl Rng,
) -> MockReply {
    let intent = detect_intent(message);
    let opener = settings.tone.opener();

    let reply = match intent {
        ChatIntent::Greeting => format!("{} I'm {}.", settings.greeting, settings.assistant_name),
        ChatIntent::Menu => {
            let names: Vec<&str> = menu
                .iter()
                .filter(|p| p.is_available)
                .take(5)
                .map(|p| p.name.as_str())
                .collect();
            if names.is_empty() {
                "Our menu is being updated right now, please check back soon.".to_string()
            } else {
                format!("{}Today we're serving {}, and more.", opener, names.join(", "))
            }
        }
        ChatIntent::Hours => {
            format!("{}We're open every day from 11:00 to 22:00, kitchen closes at 21:30.", opener)
        }
        ChatIntent::OrderStatus => format!(
            "{}Please share your order number (it looks like ORD-20240101-0001) and I'll check on it.",
            opener
        ),
        ChatIntent::Delivery => format!(
            "{}We deliver within 5 km. Delivery usually takes 30 to 45 minutes.",
            opener
        ),
        ChatIntent::Pricing => match price_range(menu) {
            Some((min, max)) => format!("{}Our dishes range from {:.2} to {:.2}.", opener, min, max),
            None => "Prices will be available once our menu is published.".to_string(),
        },
        ChatIntent::Recommendation => {
            let picks: Vec<&str> = upsell_candidates(settings, menu)
                .into_iter()
                .map(|p| p.name.as_str())
                .collect();
            if picks.is_empty() {
                format!("{}Our chef's specials change daily, just ask your server.", opener)
            } else {
                format!("{}I'd recommend trying {}.", opener, picks.join(" or "))
            }
        }
        ChatIntent::Complaint => {
            "I'm sorry to hear that. I've flagged this for a manager who will follow up with you shortly."
                .to_string()
        }
        ChatIntent::Fallback => {
            "I'm not sure I understood. Could you rephrase, or ask about our menu, hours or delivery?"
                .to_string()
        }
    };

    let confidence = if intent == ChatIntent::Fallback {
        rng.gen_range(0.40..=0.65)
    } else {
        rng.gen_range(0.80..=0.99)
    };

    MockReply {
        reply,
        intent,
        confidence: (confidence * 100.0_f64).round() / 100.0,
        latency_ms: rng.gen_range(300..=1500),
    }
}

/// Loads settings and the menu and builds a reply. Fails when the
/// assistant is switched off.
pub fn prepare_reply(conn: &Connection, message: &str, rng: &mut impl Rng) -> AppResult<MockReply> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::validation("Message is required"));
    }
    let settings = load_settings(conn)?;
    if !settings.enabled {
        return Err(AppError::validation(format!("{} is disabled", settings.assistant_name)));
    }
    let menu = products::list_all(conn)?;
    Ok(generate_mock_response(message, &settings, &menu, rng))
}

/// Upsell picks for an order, excluding what it already contains. Nothing
/// is suggested below the configured minimum order.
pub fn suggestions_for_order(
    settings: &AiSettings,
    menu: &[Product],
    subtotal: f64,
    in_order: &[i64],
) -> Vec<Product> {
    if !settings.enabled || subtotal < settings.upsell_min_order {
        return Vec::new();
    }
    let remaining: Vec<Product> = menu
        .iter()
        .filter(|p| !in_order.contains(&p.id))
        .cloned()
        .collect();
    upsell_candidates(settings, &remaining).into_iter().cloned().collect()
}
