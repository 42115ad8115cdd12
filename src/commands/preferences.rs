use tauri::State;

use crate::error::AppResult;
use crate::preferences::{DashboardCard, DashboardPreferences, PreferencesStore};

#[tauri::command]
pub fn get_preferences(store: State<'_, PreferencesStore>) -> AppResult<DashboardPreferences> {
    store.get()
}

#[tauri::command]
pub fn save_preferences(
    store: State<'_, PreferencesStore>,
    preferences: DashboardPreferences,
) -> AppResult<DashboardPreferences> {
    store.update(|current| {
        *current = preferences;
        Ok(())
    })
}

#[tauri::command]
pub fn toggle_dashboard_card(
    store: State<'_, PreferencesStore>,
    card: DashboardCard,
) -> AppResult<DashboardPreferences> {
    store.update(|prefs| prefs.toggle_card(card))
}

#[tauri::command]
pub fn move_dashboard_card(
    store: State<'_, PreferencesStore>,
    card: DashboardCard,
    to_index: usize,
) -> AppResult<DashboardPreferences> {
    store.update(|prefs| prefs.move_card(card, to_index))
}

#[tauri::command]
pub fn reset_preferences(store: State<'_, PreferencesStore>) -> AppResult<DashboardPreferences> {
    store.update(|prefs| {
        prefs.reset();
        Ok(())
    })
}
