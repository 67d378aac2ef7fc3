//! Markup contract between the page templates and the behaviors.
//!
//! Every class name, data attribute and selector a behavior binds to is
//! declared here. Templates and behaviors both depend on this module; bump
//! [`CONTRACT_VERSION`] whenever a selector changes meaning.

use std::fmt;

use serde::Serialize;

use crate::dom::Document;
use crate::error::PageResult;

pub const CONTRACT_VERSION: u32 = 1;

// === Cursor ===
pub const CURSOR_HALO: &str = ".custom-cursor";
pub const CURSOR_DOT: &str = ".cursor-dot";
pub const CURSOR_INTERACTIVE: &str = "a, button, .card, .interactive";
pub const CURSOR_ACTIVE_CLASS: &str = "cursor-active";

// === Theme ===
pub const THEME_SWATCH: &str = ".theme-color";
pub const THEME_DATA_MAIN: &str = "color";
pub const THEME_DATA_SECONDARY: &str = "secondary";
pub const THEME_DATA_ACCENT: &str = "accent";
pub const THEME_VAR_MAIN: &str = "--primary-color";
pub const THEME_VAR_SECONDARY: &str = "--secondary-color";
pub const THEME_VAR_ACCENT: &str = "--accent-color";

// === Tilt ===
pub const TILT_CARD: &str = ".card-3d";
pub const TILT_SHINE_CLASS: &str = "card-shine";

// === Scroll widgets ===
pub const BACK_TO_TOP: &str = ".back-to-top";
pub const PROGRESS_BAR: &str = ".reading-progress-bar";
pub const SHOW_CLASS: &str = "show";

// === Mobile menu ===
pub const MENU_TOGGLE: &str = ".menu-toggle";
pub const MENU_PANEL: &str = ".mobile-nav";
pub const MENU_BODY_CLASS: &str = "menu-open";
pub const SUBMENU_ITEM: &str = ".has-submenu";
pub const SUBMENU_TOGGLE: &str = ".submenu-toggle";
pub const SUBMENU: &str = ".submenu";

// === Comparison slider ===
pub const SLIDER: &str = ".image-comparison-slider";
pub const SLIDER_HANDLE: &str = ".slider-handle";
pub const SLIDER_BEFORE: &str = ".before-image";

// === Search ===
pub const SEARCH_TOGGLE: &str = ".search-toggle";
pub const SEARCH_FORM: &str = ".search-form";
pub const SEARCH_INPUT: &str = ".search-input";
pub const SEARCH_RESULTS: &str = ".search-results";
pub const SEARCH_NO_RESULTS_CLASS: &str = "no-results";
pub const SEARCH_TITLE_CLASS: &str = "result-title";
pub const SEARCH_CATEGORY_CLASS: &str = "result-category";
pub const SEARCH_HIGHLIGHT_TAG: &str = "mark";

// === Form validation ===
pub const VALIDATED_FORM: &str = "form[data-validate]";
pub const REQUIRED_FIELD: &str = "[required]";
pub const LIVE_FIELDS: &str = "input, textarea, select";
pub const FIELD_ERROR_CLASS: &str = "error";
pub const ERROR_MESSAGE_CLASS: &str = "error-message";

// === Reveal ===
pub const REVEAL_TARGETS: &str = ".fade-in, .slide-in, .scale-in";
pub const REVEAL_CLASS: &str = "animate";
pub const BODY_LOADED_CLASS: &str = "loaded";

// === Category filter ===
pub const FILTER_BUTTON: &str = ".category-filter button";
pub const FILTER_POST: &str = ".blog-post";
pub const FILTER_DATA_CATEGORY: &str = "category";
pub const FILTER_DATA_CATEGORIES: &str = "categories";
pub const FILTER_ALL: &str = "all";
pub const FILTER_HIGHLIGHT_CLASS: &str = "fade-in";

/// Shared "on" marker used by menus, swatches, filters and the search form
pub const ACTIVE_CLASS: &str = "active";

/// The eleven behaviors, in initialization order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Cursor,
    Theme,
    Tilt,
    BackToTop,
    ReadingProgress,
    MobileMenu,
    ComparisonSlider,
    Search,
    FormValidation,
    Reveal,
    CategoryFilter,
}

impl Feature {
    pub const ALL: [Feature; 11] = [
        Feature::Cursor,
        Feature::Theme,
        Feature::Tilt,
        Feature::BackToTop,
        Feature::ReadingProgress,
        Feature::MobileMenu,
        Feature::ComparisonSlider,
        Feature::Search,
        Feature::FormValidation,
        Feature::Reveal,
        Feature::CategoryFilter,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Cursor => "cursor",
            Feature::Theme => "theme",
            Feature::Tilt => "tilt",
            Feature::BackToTop => "back-to-top",
            Feature::ReadingProgress => "reading-progress",
            Feature::MobileMenu => "mobile-menu",
            Feature::ComparisonSlider => "comparison-slider",
            Feature::Search => "search",
            Feature::FormValidation => "form-validation",
            Feature::Reveal => "reveal",
            Feature::CategoryFilter => "category-filter",
        }
    }

    /// Selectors that must all match for the feature to bind
    pub fn required_selectors(self) -> &'static [&'static str] {
        match self {
            Feature::Cursor => &[CURSOR_HALO, CURSOR_DOT],
            Feature::Theme => &[THEME_SWATCH],
            Feature::Tilt => &[TILT_CARD],
            Feature::BackToTop => &[BACK_TO_TOP],
            Feature::ReadingProgress => &[PROGRESS_BAR],
            Feature::MobileMenu => &[MENU_TOGGLE, MENU_PANEL],
            Feature::ComparisonSlider => &[SLIDER],
            Feature::Search => &[SEARCH_TOGGLE, SEARCH_FORM],
            Feature::FormValidation => &[VALIDATED_FORM],
            Feature::Reveal => &[REVEAL_TARGETS],
            Feature::CategoryFilter => &[FILTER_BUTTON, FILTER_POST],
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Binding status of one feature against a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureReport {
    pub feature: Feature,
    pub bound: bool,
    /// Match count per required selector
    pub matches: Vec<(String, usize)>,
}

/// Result of checking a document against the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractReport {
    pub version: u32,
    pub features: Vec<FeatureReport>,
}

impl ContractReport {
    pub fn bound(&self) -> impl Iterator<Item = Feature> + '_ {
        self.features.iter().filter(|f| f.bound).map(|f| f.feature)
    }

    pub fn is_bound(&self, feature: Feature) -> bool {
        self.features.iter().any(|f| f.feature == feature && f.bound)
    }
}

impl fmt::Display for ContractReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "contract v{}", self.version)?;
        for report in &self.features {
            let mark = if report.bound { "bound" } else { "absent" };
            let detail = report
                .matches
                .iter()
                .map(|(sel, n)| format!("{sel} x{n}"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "  {:<18} {:<6} {}", report.feature.name(), mark, detail)?;
        }
        Ok(())
    }
}

/// Report which features `document` would bind
pub fn audit(document: &Document) -> PageResult<ContractReport> {
    let mut features = Vec::with_capacity(Feature::ALL.len());
    for feature in Feature::ALL {
        let mut matches = Vec::new();
        for selector in feature.required_selectors() {
            matches.push((selector.to_string(), document.query_all(selector)?.len()));
        }
        let bound = matches.iter().all(|(_, n)| *n > 0);
        features.push(FeatureReport {
            feature,
            bound,
            matches,
        });
    }
    Ok(ContractReport {
        version: CONTRACT_VERSION,
        features,
    })
}
