//! Global pointer capture with guaranteed release.
//!
//! While a resize or reorder gesture is in flight the host must route
//! pointer-move, pointer-up and drag-end events from its root event target to
//! the grid, even after the pointer leaves the header. Attaching those
//! listeners is an acquisition; a [`CaptureGuard`] releases it exactly once,
//! whether the gesture completes, is cancelled, or the grid is dropped
//! mid-gesture.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Which gesture owns a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKind {
    Resize,
    Reorder,
}

/// Handle for one attached listener set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureToken(u64);

impl CaptureToken {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for CaptureToken {
    fn default() -> Self {
        Self::new()
    }
}

/// The host's root event target.
///
/// `attach` installs global listeners that forward to the grid identified by
/// `table_id`; `detach` removes them. The grid calls each at most once per
/// gesture.
pub trait PointerCapture: Send + Sync {
    fn attach(&self, table_id: &str, kind: CaptureKind) -> CaptureToken;
    fn detach(&self, token: CaptureToken);
}

/// Releases a capture when dropped.
pub struct CaptureGuard {
    capture: Arc<dyn PointerCapture>,
    token: Option<CaptureToken>,
    kind: CaptureKind,
}

impl CaptureGuard {
    /// Attach listeners for a gesture.
    pub fn acquire(capture: Arc<dyn PointerCapture>, table_id: &str, kind: CaptureKind) -> Self {
        let token = capture.attach(table_id, kind);
        log::trace!("capture {:?} acquired for {} ({:?})", token, table_id, kind);
        Self {
            capture,
            token: Some(token),
            kind,
        }
    }

    pub fn kind(&self) -> CaptureKind {
        self.kind
    }

    /// Release now instead of on drop.
    pub fn release(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(token) = self.token.take() {
            log::trace!("capture {:?} released ({:?})", token, self.kind);
            self.capture.detach(token);
        }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureGuard")
            .field("token", &self.token)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A simple root target that tracks attached listeners per table.
///
/// Hosts with a real event loop route events by looking up
/// [`RootListeners::active_for`]; it also makes leaks observable.
#[derive(Debug, Default)]
pub struct RootListeners {
    active: RwLock<HashMap<CaptureToken, (String, CaptureKind)>>,
}

impl RootListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attached listener sets across all tables.
    pub fn active(&self) -> usize {
        self.active.read().map(|g| g.len()).unwrap_or(0)
    }

    /// Gestures currently capturing for a table.
    pub fn active_for(&self, table_id: &str) -> Vec<CaptureKind> {
        self.active
            .read()
            .map(|g| {
                g.values()
                    .filter(|(id, _)| id == table_id)
                    .map(|(_, kind)| *kind)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl PointerCapture for RootListeners {
    fn attach(&self, table_id: &str, kind: CaptureKind) -> CaptureToken {
        let token = CaptureToken::new();
        if let Ok(mut guard) = self.active.write() {
            guard.insert(token, (table_id.to_string(), kind));
        }
        token
    }

    fn detach(&self, token: CaptureToken) {
        if let Ok(mut guard) = self.active.write()
            && guard.remove(&token).is_none()
        {
            log::warn!("detach of unknown capture {:?}", token);
        }
    }
}
