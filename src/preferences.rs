//! Dashboard view preferences: which cards show and in what order, the
//! screen mode, and how the orders page is laid out. Kept in
//! `preferences.json` next to the database.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::{AppError, AppResult};
use crate::listing::OrderQuery;

pub const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DashboardCard {
    Revenue,
    Orders,
    AverageOrderValue,
    NewCustomers,
    OrdersByStatus,
    RecentOrders,
    TopProducts,
    LowStock,
    Subscriptions,
    AiAssistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScreenMode {
    #[default]
    Standard,
    Compact,
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderView {
    #[default]
    List,
    Board,
    Kanban,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPreference {
    pub card: DashboardCard,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardPreferences {
    pub cards: Vec<CardPreference>,
    pub screen_mode: ScreenMode,
    pub order_view: OrderView,
    /// Last filters used on the orders page.
    pub order_filters: OrderQuery,
}

impl Default for DashboardPreferences {
    fn default() -> Self {
        Self {
            cards: DashboardCard::iter()
                .map(|card| CardPreference { card, visible: true })
                .collect(),
            screen_mode: ScreenMode::default(),
            order_view: OrderView::default(),
            order_filters: OrderQuery::default(),
        }
    }
}

impl DashboardPreferences {
    /// Drops repeated cards (first wins) and appends any card the saved
    /// list doesn't know about yet, visible.
    pub fn normalize(&mut self) {
        let mut seen = Vec::with_capacity(self.cards.len());
        self.cards.retain(|pref| {
            if seen.contains(&pref.card) {
                false
            } else {
                seen.push(pref.card);
                true
            }
        });
        for card in DashboardCard::iter() {
            if !seen.contains(&card) {
                self.cards.push(CardPreference { card, visible: true });
            }
        }
    }

    fn position(&self, card: DashboardCard) -> AppResult<usize> {
        self.cards
            .iter()
            .position(|pref| pref.card == card)
            .ok_or_else(|| AppError::not_found(format!("Dashboard card {}", card)))
    }

    /// Flips a card's visibility and returns the new state.
    pub fn toggle_card(&mut self, card: DashboardCard) -> AppResult<bool> {
        let index = self.position(card)?;
        let pref = &mut self.cards[index];
        pref.visible = !pref.visible;
        Ok(pref.visible)
    }

    /// Moves a card to `to_index`, clamped to the end of the list.
    pub fn move_card(&mut self, card: DashboardCard, to_index: usize) -> AppResult<()> {
        let from = self.position(card)?;
        let pref = self.cards.remove(from);
        let to = to_index.min(self.cards.len());
        self.cards.insert(to, pref);
        Ok(())
    }

    pub fn visible_cards(&self) -> Vec<DashboardCard> {
        self.cards
            .iter()
            .filter(|pref| pref.visible)
            .map(|pref| pref.card)
            .collect()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Reads preferences, falling back to defaults when the file is missing or
/// unreadable. A bad file is logged and left on disk until the next save.
pub fn load_preferences(path: &Path) -> DashboardPreferences {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No saved preferences, using defaults");
            return DashboardPreferences::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read preferences, using defaults");
            return DashboardPreferences::default();
        }
    };

    match serde_json::from_str::<DashboardPreferences>(&content) {
        Ok(mut prefs) => {
            prefs.normalize();
            prefs
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Corrupt preferences file, using defaults");
            DashboardPreferences::default()
        }
    }
}

pub fn save_preferences(path: &Path, prefs: &DashboardPreferences) -> AppResult<()> {
    let mut prefs = prefs.clone();
    prefs.normalize();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&prefs)?)?;
    Ok(())
}

/// The current preferences plus the file they are saved to. Every change
/// is written through immediately.
pub struct PreferencesStore {
    path: PathBuf,
    current: Mutex<DashboardPreferences>,
}

impl PreferencesStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = load_preferences(&path);
        Self {
            path,
            current: Mutex::new(current),
        }
    }

    pub fn get(&self) -> AppResult<DashboardPreferences> {
        Ok(self.current.lock().map_err(|_| AppError::Lock)?.clone())
    }

    /// Applies `change` to a copy, saves it, and only then makes it current.
    pub fn update<T>(
        &self,
        change: impl FnOnce(&mut DashboardPreferences) -> AppResult<T>,
    ) -> AppResult<DashboardPreferences> {
        let mut current = self.current.lock().map_err(|_| AppError::Lock)?;
        let mut next = current.clone();
        change(&mut next)?;
        next.normalize();
        save_preferences(&self.path, &next)?;
        *current = next.clone();
        Ok(next)
    }
}
