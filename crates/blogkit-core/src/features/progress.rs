//! Reading progress bar.

use crate::contract::PROGRESS_BAR;
use crate::error::PageResult;
use crate::events::{EventKind, EventTarget};
use crate::page::{Page, Viewport};

/// Share of the scrollable height already scrolled, in `[0, 100]`.
///
/// A document that fits in the viewport reads as 0%.
pub fn scroll_percent(viewport: &Viewport) -> f64 {
    let scrollable = viewport.document_height - viewport.height;
    if scrollable.is_nan() || scrollable <= 0.0 || !viewport.scroll_y.is_finite() {
        return 0.0;
    }
    (viewport.scroll_y / scrollable * 100.0).clamp(0.0, 100.0)
}

pub fn init(page: &mut Page) -> PageResult<bool> {
    let Some(bar) = page.document.query(PROGRESS_BAR)? else {
        return Ok(false);
    };

    page.add_listener(EventTarget::Window, EventKind::Scroll, move |page, _| {
        let percent = scroll_percent(&page.viewport);
        page.document.set_style(bar, "width", &format!("{percent}%"));
    });

    Ok(true)
}
