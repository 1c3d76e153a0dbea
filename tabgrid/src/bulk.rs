//! Bulk actions over the selected rows.

use async_trait::async_trait;

/// Asks the user to confirm a destructive action.
///
/// Hosts implement this with their confirmation modal; it resolves to
/// `true` when the user confirms.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// A confirmation that always answers the same way. Useful for hosts that
/// gate elsewhere, and for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl ConfirmPrompt for AutoConfirm {
    async fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

/// Result of a bulk action that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome<T> {
    /// The user declined; nothing ran and the selection is untouched.
    Cancelled,
    Completed(T),
}

/// Confirmation text for a bulk action, e.g. "Delete 3 selected entries?".
pub fn confirmation_message(verb: &str, count: usize) -> String {
    let noun = if count == 1 { "entry" } else { "entries" };
    format!("{verb} {count} selected {noun}?")
}
