//! Shared traits for domain entities.

use uuid::Uuid;

/// Exposes a stable identifier for entities stored in the fee book.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Returns `true` when `amount` is a usable, strictly positive money value.
pub fn is_positive_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

/// Returns `true` when `amount` is a usable money value of zero or more.
pub fn is_non_negative_amount(amount: f64) -> bool {
    amount.is_finite() && amount >= 0.0
}
