//! Column drag-and-drop reorder gesture.
//!
//! `dragstart` on a header begins the gesture; `dragover` always permits a
//! drop and computes no preview; a `drop` yields the move to apply when the
//! target differs; `drop` and `dragend` both end the gesture.

/// An in-flight column drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderGesture {
    pub source_key: String,
}

impl ReorderGesture {
    pub fn start(source_key: impl Into<String>) -> Self {
        Self {
            source_key: source_key.into(),
        }
    }

    /// The `(source, target)` move a drop on `target` produces, if any.
    pub fn drop_on(&self, target_key: &str) -> Option<(String, String)> {
        (self.source_key != target_key)
            .then(|| (self.source_key.clone(), target_key.to_string()))
    }
}
