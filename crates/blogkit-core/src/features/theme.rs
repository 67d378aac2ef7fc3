//! Theme switcher with a persisted color triple.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::contract::{
    ACTIVE_CLASS, THEME_DATA_ACCENT, THEME_DATA_MAIN, THEME_DATA_SECONDARY, THEME_SWATCH,
    THEME_VAR_ACCENT, THEME_VAR_MAIN, THEME_VAR_SECONDARY,
};
use crate::dom::NodeId;
use crate::error::PageResult;
use crate::events::{EventKind, EventTarget};
use crate::page::Page;
use crate::store::PreferenceStore;

/// The persisted color scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePreference {
    pub main: String,
    pub secondary: String,
    pub accent: String,
}

impl ThemePreference {
    /// Read the triple off a swatch; `None` if any color is missing
    pub fn from_swatch(page: &Page, swatch: NodeId) -> Option<Self> {
        let doc = &page.document;
        Some(Self {
            main: doc.data(swatch, THEME_DATA_MAIN)?.to_string(),
            secondary: doc.data(swatch, THEME_DATA_SECONDARY)?.to_string(),
            accent: doc.data(swatch, THEME_DATA_ACCENT)?.to_string(),
        })
    }

    /// Set the three colors as custom properties on the root element
    pub fn apply(&self, page: &mut Page) {
        let root = page.document.root();
        page.document.set_style(root, THEME_VAR_MAIN, &self.main);
        page.document.set_style(root, THEME_VAR_SECONDARY, &self.secondary);
        page.document.set_style(root, THEME_VAR_ACCENT, &self.accent);
    }
}

/// Load the saved preference, failing closed.
///
/// A missing key, an unreadable store and a malformed record all mean "no
/// saved preference"; the latter two are logged.
pub fn load_preference(store: &dyn PreferenceStore, key: &str) -> Option<ThemePreference> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, error = %err, "could not read saved theme");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(theme) => Some(theme),
        Err(err) => {
            warn!(key, error = %err, "ignoring malformed saved theme");
            None
        }
    }
}

pub fn save_preference(store: &dyn PreferenceStore, key: &str, theme: &ThemePreference) -> PageResult<()> {
    let raw = serde_json::to_string(theme)?;
    store.set(key, &raw)
}

pub fn init(page: &mut Page) -> PageResult<bool> {
    let swatches = page.document.query_all(THEME_SWATCH)?;
    if swatches.is_empty() {
        return Ok(false);
    }
    let key = page.config().theme_storage_key.clone();

    if let Some(saved) = load_preference(page.store().as_ref(), &key) {
        debug!(?saved, "restoring saved theme");
        saved.apply(page);
    }

    for swatch in swatches.iter().copied() {
        let all = swatches.clone();
        let key = key.clone();
        page.add_listener(EventTarget::Node(swatch), EventKind::Click, move |page, _| {
            let Some(theme) = ThemePreference::from_swatch(page, swatch) else {
                warn!(%swatch, "theme swatch is missing a color attribute");
                return;
            };
            theme.apply(page);
            if let Err(err) = save_preference(page.store().as_ref(), &key, &theme) {
                warn!(error = %err, "could not persist theme");
            }
            for other in &all {
                page.document.remove_class(*other, ACTIVE_CLASS);
            }
            page.document.add_class(swatch, ACTIVE_CLASS);
        });
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, El};
    use crate::store::{MemoryStore, UnavailableStore};
    use std::sync::Arc;

    fn swatch(main: &str, secondary: &str, accent: &str) -> El {
        El::new("button")
            .class("theme-color")
            .data("color", main)
            .data("secondary", secondary)
            .data("accent", accent)
    }

    fn theme_doc() -> Document {
        let mut doc = Document::new();
        let body = doc.body();
        doc.append(body, swatch("#6c5ce7", "#a29bfe", "#fd79a8"));
        doc.append(body, swatch("#00b894", "#55efc4", "#fdcb6e"));
        doc
    }

    #[test]
    fn test_click_applies_persists_and_selects() {
        let store = Arc::new(MemoryStore::new());
        let mut page = Page::with_store(theme_doc(), store.clone());
        assert!(init(&mut page).unwrap());
        let swatches = page.document.query_all(".theme-color").unwrap();

        page.click(swatches[0]);
        page.click(swatches[1]);

        let root = page.document.root();
        assert_eq!(page.document.style(root, "--primary-color"), Some("#00b894"));
        assert_eq!(page.document.style(root, "--accent-color"), Some("#fdcb6e"));
        assert!(!page.document.has_class(swatches[0], "active"));
        assert!(page.document.has_class(swatches[1], "active"));

        let saved = load_preference(store.as_ref(), "selectedTheme").unwrap();
        assert_eq!(saved.main, "#00b894");
        assert_eq!(saved.secondary, "#55efc4");
    }

    #[test]
    fn test_saved_theme_restored_at_init() {
        let store = Arc::new(MemoryStore::with_entry(
            "selectedTheme",
            r##"{"main":"#111","secondary":"#222","accent":"#333"}"##,
        ));
        let mut page = Page::with_store(theme_doc(), store);
        init(&mut page).unwrap();

        let root = page.document.root();
        assert_eq!(page.document.style(root, "--primary-color"), Some("#111"));
        assert_eq!(page.document.style(root, "--secondary-color"), Some("#222"));
    }

    #[test]
    fn test_malformed_saved_theme_is_ignored() {
        let store = Arc::new(MemoryStore::with_entry("selectedTheme", "{not json"));
        let mut page = Page::with_store(theme_doc(), store);
        assert!(init(&mut page).unwrap());
        assert_eq!(page.document.style(page.document.root(), "--primary-color"), None);
    }

    #[test]
    fn test_unavailable_store_still_applies_colors() {
        let mut page = Page::with_store(theme_doc(), Arc::new(UnavailableStore));
        assert!(init(&mut page).unwrap());
        let first = page.document.query(".theme-color").unwrap().unwrap();
        page.click(first);
        assert_eq!(
            page.document.style(page.document.root(), "--primary-color"),
            Some("#6c5ce7")
        );
        assert!(page.document.has_class(first, "active"));
    }

    #[test]
    fn test_incomplete_swatch_is_ignored() {
        let mut doc = Document::new();
        let broken = doc.append(
            doc.body(),
            El::new("button").class("theme-color").data("color", "#fff"),
        );
        let mut page = Page::new(doc);
        init(&mut page).unwrap();
        page.click(broken);
        assert!(!page.document.has_class(broken, "active"));
        assert_eq!(page.document.style(page.document.root(), "--primary-color"), None);
    }
}
