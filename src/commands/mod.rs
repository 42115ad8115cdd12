//! `#[tauri::command]` entry points. Each one locks the shared connection
//! and hands off to the matching domain function.

pub mod ai;
pub mod board;
pub mod categories;
pub mod company;
pub mod customers;
pub mod dashboard;
pub mod offers;
pub mod orders;
pub mod preferences;
pub mod products;
pub mod reports;
pub mod staff;
pub mod subscriptions;
