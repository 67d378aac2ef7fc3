//! Tunable behavior constants.
//!
//! Every field has the default the page templates were designed against, so
//! an empty JSON object is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PageError, PageResult};

/// Timing, geometry and storage knobs for the page behaviors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Delay before the cursor halo catches up with the pointer
    pub cursor_trail_delay_ms: u64,
    /// Maximum card rotation on each axis, in degrees
    pub tilt_max_degrees: f64,
    /// Uniform scale applied while a card is tilted
    pub tilt_scale: f64,
    /// Scroll offset the back-to-top control must exceed to show
    pub back_to_top_threshold: f64,
    /// Quiet period before a search query is evaluated
    pub search_debounce_ms: u64,
    /// Shortest trimmed query that produces results
    pub search_min_chars: usize,
    /// Visible fraction that triggers a reveal animation
    pub reveal_threshold: f64,
    /// Lifetime of the re-entry highlight on filtered posts
    pub filter_highlight_ms: u64,
    /// Starting position of comparison sliders, in percent
    pub slider_initial_percent: f64,
    /// Preference key the theme record is stored under
    pub theme_storage_key: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            cursor_trail_delay_ms: 100,
            tilt_max_degrees: 15.0,
            tilt_scale: 1.05,
            back_to_top_threshold: 300.0,
            search_debounce_ms: 300,
            search_min_chars: 2,
            reveal_threshold: 0.2,
            filter_highlight_ms: 500,
            slider_initial_percent: 50.0,
            theme_storage_key: "selectedTheme".to_string(),
        }
    }
}

impl BehaviorConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> PageResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> PageResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Reject values the behaviors cannot work with
    pub fn validate(&self) -> PageResult<()> {
        if !self.tilt_max_degrees.is_finite() || self.tilt_max_degrees < 0.0 {
            return Err(PageError::Config(format!(
                "tilt_max_degrees must be a non-negative number, got {}",
                self.tilt_max_degrees
            )));
        }
        if !self.tilt_scale.is_finite() || self.tilt_scale <= 0.0 {
            return Err(PageError::Config(format!(
                "tilt_scale must be positive, got {}",
                self.tilt_scale
            )));
        }
        if !(0.0..=1.0).contains(&self.reveal_threshold) {
            return Err(PageError::Config(format!(
                "reveal_threshold must be within [0, 1], got {}",
                self.reveal_threshold
            )));
        }
        if !(0.0..=100.0).contains(&self.slider_initial_percent) {
            return Err(PageError::Config(format!(
                "slider_initial_percent must be within [0, 100], got {}",
                self.slider_initial_percent
            )));
        }
        if self.theme_storage_key.is_empty() {
            return Err(PageError::Config("theme_storage_key must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = BehaviorConfig::from_json("{}").unwrap();
        assert_eq!(config, BehaviorConfig::default());
        assert_eq!(config.theme_storage_key, "selectedTheme");
    }

    #[test]
    fn test_partial_override() {
        let config = BehaviorConfig::from_json(r#"{"search_debounce_ms": 50}"#).unwrap();
        assert_eq!(config.search_debounce_ms, 50);
        assert_eq!(config.cursor_trail_delay_ms, 100);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        assert!(matches!(
            BehaviorConfig::from_json(r#"{"reveal_threshold": 1.5}"#),
            Err(PageError::Config(_))
        ));
        assert!(BehaviorConfig::from_json(r#"{"theme_storage_key": ""}"#).is_err());
        assert!(BehaviorConfig::from_json(r#"{"slider_initial_percent": -1}"#).is_err());
    }
}
