//! Process-wide layout hints.
//!
//! The report screen sizes its skeleton placeholder to the last measured height
//! of the history area, so a freshly constructed screen does not flash an
//! empty placeholder. Create one [`LayoutHints`] at process start and share it
//! with every screen; each non-zero measurement updates it, construction reads it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct LayoutHints {
    skeleton_height_bits: Arc<AtomicU64>,
}

impl LayoutHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded history height, `0.0` before the first measurement.
    pub fn skeleton_height(&self) -> f64 {
        f64::from_bits(self.skeleton_height_bits.load(Ordering::Relaxed))
    }

    /// Record a measured height. Zero, negative, and non-finite heights are
    /// ignored; they come from views being torn down. Returns whether the
    /// measurement was kept.
    pub fn record_skeleton_height(&self, height: f64) -> bool {
        if !height.is_finite() || height <= 0.0 {
            return false;
        }
        self.skeleton_height_bits
            .store(height.to_bits(), Ordering::Relaxed);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert!(LayoutHints::new().skeleton_height().abs() < f64::EPSILON);
    }

    #[test]
    fn ignores_unusable_heights() {
        let hints = LayoutHints::new();
        assert!(hints.record_skeleton_height(640.0));
        assert!(!hints.record_skeleton_height(0.0));
        assert!(!hints.record_skeleton_height(-3.0));
        assert!(!hints.record_skeleton_height(f64::NAN));
        assert!((hints.skeleton_height() - 640.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clones_share_state() {
        let hints = LayoutHints::new();
        let other = hints.clone();
        other.record_skeleton_height(300.5);
        assert!((hints.skeleton_height() - 300.5).abs() < f64::EPSILON);
    }
}
