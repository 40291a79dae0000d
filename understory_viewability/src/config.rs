// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Threshold used when no other value is configured: half of an item must be on screen.
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 50.0;

/// Per-coordinator viewability settings.
///
/// Individual views may override the threshold at registration time via
/// [`ViewabilityCoordinator::register_view_with_threshold`](crate::ViewabilityCoordinator::register_view_with_threshold).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewabilityConfig {
    threshold_percent: f64,
}

impl Default for ViewabilityConfig {
    fn default() -> Self {
        Self {
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
        }
    }
}

impl ViewabilityConfig {
    /// Creates a configuration with the default threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this configuration with a different threshold.
    ///
    /// See [`normalize_threshold`] for how out-of-range values are treated.
    #[must_use]
    pub fn with_threshold(self, threshold_percent: f64) -> Self {
        Self {
            threshold_percent: normalize_threshold(threshold_percent),
        }
    }

    /// Percentage of a view's own height that must be inside the viewport.
    #[must_use]
    pub fn threshold_percent(&self) -> f64 {
        self.threshold_percent
    }
}

/// Clamps a threshold into `0..=100`; NaN falls back to [`DEFAULT_THRESHOLD_PERCENT`].
#[must_use]
pub fn normalize_threshold(threshold_percent: f64) -> f64 {
    if threshold_percent.is_nan() {
        DEFAULT_THRESHOLD_PERCENT
    } else {
        threshold_percent.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_THRESHOLD_PERCENT, ViewabilityConfig, normalize_threshold};

    #[test]
    fn default_threshold_is_fifty() {
        assert_eq!(
            ViewabilityConfig::default().threshold_percent(),
            DEFAULT_THRESHOLD_PERCENT
        );
        assert_eq!(ViewabilityConfig::new().threshold_percent(), 50.0);
    }

    #[test]
    fn thresholds_are_clamped() {
        assert_eq!(ViewabilityConfig::new().with_threshold(150.0).threshold_percent(), 100.0);
        assert_eq!(ViewabilityConfig::new().with_threshold(-3.0).threshold_percent(), 0.0);
        assert_eq!(normalize_threshold(f64::NAN), DEFAULT_THRESHOLD_PERCENT);
        assert_eq!(normalize_threshold(75.0), 75.0);
    }
}
