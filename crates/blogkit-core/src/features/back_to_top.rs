//! Back-to-top control.

use crate::contract::{BACK_TO_TOP, SHOW_CLASS};
use crate::error::PageResult;
use crate::events::{EventKind, EventTarget};
use crate::page::{Page, ScrollBehavior};

pub fn init(page: &mut Page) -> PageResult<bool> {
    let Some(button) = page.document.query(BACK_TO_TOP)? else {
        return Ok(false);
    };
    let threshold = page.config().back_to_top_threshold;

    page.add_listener(EventTarget::Window, EventKind::Scroll, move |page, _| {
        if page.viewport.scroll_y > threshold {
            page.document.add_class(button, SHOW_CLASS);
        } else {
            page.document.remove_class(button, SHOW_CLASS);
        }
    });

    page.add_listener(EventTarget::Node(button), EventKind::Click, |page, event| {
        event.prevent_default();
        page.scroll_to(0.0, ScrollBehavior::Smooth);
    });

    Ok(true)
}
