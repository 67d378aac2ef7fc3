//! Pointer-trailing cursor.

use crate::contract::{CURSOR_ACTIVE_CLASS, CURSOR_DOT, CURSOR_HALO, CURSOR_INTERACTIVE};
use crate::dom::NodeId;
use crate::error::PageResult;
use crate::events::{EventKind, EventTarget};
use crate::page::Page;

fn place(page: &mut Page, node: NodeId, x: f64, y: f64) {
    page.document.set_style(node, "left", &format!("{x}px"));
    page.document.set_style(node, "top", &format!("{y}px"));
}

/// The dot follows the pointer immediately; the halo follows after a fixed
/// delay. Delayed updates are independent and never canceled.
pub fn init(page: &mut Page) -> PageResult<bool> {
    let (Some(halo), Some(dot)) = (
        page.document.query(CURSOR_HALO)?,
        page.document.query(CURSOR_DOT)?,
    ) else {
        return Ok(false);
    };
    let delay = page.config().cursor_trail_delay_ms;

    page.add_listener(EventTarget::Document, EventKind::MouseMove, move |page, event| {
        let Some(point) = event.pointer() else {
            return;
        };
        page.set_timeout(delay, move |page| place(page, halo, point.x, point.y));
        place(page, dot, point.x, point.y);
    });

    for element in page.document.query_all(CURSOR_INTERACTIVE)? {
        page.add_listener(EventTarget::Node(element), EventKind::MouseEnter, move |page, _| {
            page.document.add_class(halo, CURSOR_ACTIVE_CLASS);
            page.document.add_class(dot, CURSOR_ACTIVE_CLASS);
        });
        page.add_listener(EventTarget::Node(element), EventKind::MouseLeave, move |page, _| {
            page.document.remove_class(halo, CURSOR_ACTIVE_CLASS);
            page.document.remove_class(dot, CURSOR_ACTIVE_CLASS);
        });
    }

    Ok(true)
}
