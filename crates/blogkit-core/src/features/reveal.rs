//! One-shot reveal animations for elements scrolled into view.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::contract::{BODY_LOADED_CLASS, REVEAL_CLASS, REVEAL_TARGETS};
use crate::error::PageResult;
use crate::observer::ObserverId;
use crate::page::Page;

/// Mark the body loaded, then observe every tagged element.
///
/// Without intersection support every target is revealed at once.
pub fn init(page: &mut Page) -> PageResult<bool> {
    let body = page.document.body();
    page.document.add_class(body, BODY_LOADED_CLASS);

    let targets = page.document.query_all(REVEAL_TARGETS)?;
    if targets.is_empty() {
        return Ok(false);
    }

    if !page.capabilities.intersection_observer {
        debug!(targets = targets.len(), "no intersection support, revealing all");
        for target in targets {
            page.document.add_class(target, REVEAL_CLASS);
        }
        return Ok(true);
    }

    let own_id: Rc<Cell<Option<ObserverId>>> = Rc::new(Cell::new(None));
    let slot = Rc::clone(&own_id);
    let threshold = page.config().reveal_threshold;
    let observer = page.observers.create(threshold, move |page, target| {
        page.document.add_class(target, REVEAL_CLASS);
        if let Some(id) = slot.get() {
            page.observers.unobserve(id, target);
        }
    });
    own_id.set(Some(observer));

    for target in targets {
        page.observers.observe(observer, target);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, El, NodeId, Rect};
    use crate::page::ScrollBehavior;

    fn reveal_doc() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let above = doc.append(
            body,
            El::new("section").class("fade-in").rect(Rect::new(0.0, 100.0, 600.0, 400.0)),
        );
        let below = doc.append(
            body,
            El::new("section").class("slide-in").rect(Rect::new(0.0, 1500.0, 600.0, 500.0)),
        );
        (doc, above, below)
    }

    #[test]
    fn test_reveals_once_when_visible() {
        let (doc, above, below) = reveal_doc();
        let mut page = Page::new(doc);
        page.viewport.document_height = 3000.0;
        assert!(init(&mut page).unwrap());
        assert!(page.document.has_class(page.document.body(), "loaded"));

        page.evaluate_observers();
        assert!(page.document.has_class(above, "animate"));
        assert!(!page.document.has_class(below, "animate"));
        assert_eq!(page.observers.observed_count(), 1);

        // 50 of 500 px visible: under the threshold
        page.scroll_to(750.0, ScrollBehavior::Instant);
        assert!(!page.document.has_class(below, "animate"));

        page.scroll_to(900.0, ScrollBehavior::Instant);
        assert!(page.document.has_class(below, "animate"));
        assert_eq!(page.observers.observed_count(), 0);

        page.document.remove_class(below, "animate");
        page.scroll_to(1000.0, ScrollBehavior::Instant);
        assert!(!page.document.has_class(below, "animate"));
    }

    #[test]
    fn test_fallback_reveals_everything() {
        let (doc, above, below) = reveal_doc();
        let mut page = Page::new(doc);
        page.capabilities.intersection_observer = false;
        assert!(init(&mut page).unwrap());
        assert!(page.document.has_class(above, "animate"));
        assert!(page.document.has_class(below, "animate"));
        assert_eq!(page.observers.observed_count(), 0);
    }

    #[test]
    fn test_body_loaded_without_targets() {
        let mut page = Page::new(Document::new());
        assert!(!init(&mut page).unwrap());
        assert!(page.document.has_class(page.document.body(), "loaded"));
    }
}
