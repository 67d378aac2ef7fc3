//! The eleven page behaviors.
//!
//! Each submodule exposes `init(&mut Page) -> PageResult<bool>`: it queries
//! the document for its elements, binds listeners when they are present and
//! reports whether it bound. Behaviors share nothing but the page.

pub mod back_to_top;
pub mod category_filter;
pub mod cursor;
pub mod mobile_menu;
pub mod progress;
pub mod reveal;
pub mod search;
pub mod slider;
pub mod theme;
pub mod tilt;
pub mod validation;

use tracing::{debug, info, warn};

use crate::contract::Feature;
use crate::error::PageResult;
use crate::page::Page;

fn init_feature(page: &mut Page, feature: Feature) -> PageResult<bool> {
    match feature {
        Feature::Cursor => cursor::init(page),
        Feature::Theme => theme::init(page),
        Feature::Tilt => tilt::init(page),
        Feature::BackToTop => back_to_top::init(page),
        Feature::ReadingProgress => progress::init(page),
        Feature::MobileMenu => mobile_menu::init(page),
        Feature::ComparisonSlider => slider::init(page),
        Feature::Search => search::init(page),
        Feature::FormValidation => validation::init(page),
        Feature::Reveal => reveal::init(page),
        Feature::CategoryFilter => category_filter::init(page),
    }
}

/// Run every initializer once the document is ready.
///
/// A failing initializer is logged and skipped; the rest still bind. Ends
/// with a first observer pass so elements already in view are revealed.
pub fn initialize(page: &mut Page) -> Vec<Feature> {
    let mut bound = Vec::new();
    for feature in Feature::ALL {
        match init_feature(page, feature) {
            Ok(true) => {
                debug!(%feature, "bound");
                bound.push(feature);
            }
            Ok(false) => debug!(%feature, "elements absent, skipped"),
            Err(err) => warn!(%feature, error = %err, "initializer failed"),
        }
    }
    page.evaluate_observers();
    info!(
        bound = bound.len(),
        listeners = page.bus.len(),
        "page behaviors initialized"
    );
    bound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, El, Rect};

    #[test]
    fn test_empty_document_binds_nothing_but_loaded() {
        let mut page = Page::new(Document::new());
        assert!(initialize(&mut page).is_empty());
        assert!(page.bus.is_empty());
        assert!(page.document.has_class(page.document.body(), "loaded"));
    }

    #[test]
    fn test_bound_features_match_audit() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.append(body, El::new("a").class("back-to-top"));
        doc.append(body, El::new("div").class("reading-progress-bar"));
        doc.append(
            body,
            El::new("div").class("card-3d fade-in").rect(Rect::new(0.0, 0.0, 200.0, 200.0)),
        );
        let report = crate::contract::audit(&doc).unwrap();

        let mut page = Page::new(doc);
        let bound = initialize(&mut page);
        assert_eq!(bound, report.bound().collect::<Vec<_>>());
        assert_eq!(
            bound,
            vec![Feature::Tilt, Feature::BackToTop, Feature::ReadingProgress, Feature::Reveal]
        );

        let card = page.document.query(".card-3d").unwrap().unwrap();
        assert!(page.document.has_class(card, "animate"));
    }
}
