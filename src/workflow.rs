//! Status transition tables for orders and subscriptions.
//!
//! The board view, the status dropdown and the subscription actions all
//! consult these tables before mutating anything.

use strum::IntoEnumIterator;

use crate::error::{AppError, AppResult};
use crate::models::{OrderStatus, SubscriptionStatus};

impl OrderStatus {
    pub fn allowed_transitions(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Preparing, Cancelled],
            Preparing => &[Ready, Cancelled],
            Ready => &[Delivered, Cancelled],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Line items may only change before the kitchen starts on the order.
    pub fn is_editable(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Column order on the board.
    pub fn board_order() -> Vec<OrderStatus> {
        OrderStatus::iter().collect()
    }
}

impl SubscriptionStatus {
    pub fn allowed_transitions(self) -> &'static [SubscriptionStatus] {
        use SubscriptionStatus::*;
        match self {
            Active => &[Paused, Cancelled],
            Paused => &[Active, Cancelled],
            Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: SubscriptionStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

pub fn ensure_order_transition(from: OrderStatus, to: OrderStatus) -> AppResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

pub fn ensure_subscription_transition(from: SubscriptionStatus, to: SubscriptionStatus) -> AppResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}
