//! Column resize gesture.
//!
//! `Idle -> Resizing` on pointer-down over a column border, the width tracks
//! the pointer on every move (no debouncing), `Resizing -> Idle` on
//! pointer-up. There is no cancel path: the last tracked width is the
//! committed width.

/// An in-flight resize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeGesture {
    pub key: String,
    pub start_pointer_x: i64,
    pub start_width: u32,
}

impl ResizeGesture {
    /// Record the column's width and the pointer position at press time.
    pub fn begin(key: impl Into<String>, pointer_x: i64, current_width: u32) -> Self {
        Self {
            key: key.into(),
            start_pointer_x: pointer_x,
            start_width: current_width,
        }
    }

    /// Width for the current pointer position, clamped to `min_width`.
    pub fn width_at(&self, pointer_x: i64, min_width: u32) -> u32 {
        let width = self.start_width as i64 + (pointer_x - self.start_pointer_x);
        width.clamp(min_width.max(1) as i64, u32::MAX as i64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_follows_pointer() {
        let gesture = ResizeGesture::begin("command", 300, 200);
        assert_eq!(gesture.width_at(340, 50), 240);
        assert_eq!(gesture.width_at(260, 50), 160);
    }

    #[test]
    fn test_width_clamped_to_minimum() {
        let gesture = ResizeGesture::begin("command", 300, 200);
        assert_eq!(gesture.width_at(-1000, 50), 50);
        assert_eq!(gesture.width_at(-1000, 0), 1);
    }
}
