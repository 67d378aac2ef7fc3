//! Category filter buttons over the post list.

use tracing::debug;

use crate::contract::{
    ACTIVE_CLASS, FILTER_ALL, FILTER_BUTTON, FILTER_DATA_CATEGORIES, FILTER_DATA_CATEGORY,
    FILTER_HIGHLIGHT_CLASS, FILTER_POST,
};
use crate::dom::NodeId;
use crate::error::PageResult;
use crate::events::{EventKind, EventTarget};
use crate::page::Page;

/// Whether a post tagged `categories` (comma-separated) belongs to `category`
pub fn post_matches(categories: Option<&str>, category: &str) -> bool {
    if category == FILTER_ALL {
        return true;
    }
    categories.is_some_and(|list| list.split(',').any(|c| c.trim() == category))
}

/// Show the posts in `category`, hide the rest
pub fn apply_filter(page: &mut Page, posts: &[NodeId], category: &str) {
    let highlight_ms = page.config().filter_highlight_ms;
    let mut shown = 0;
    for post in posts.iter().copied() {
        let tags = page.document.data(post, FILTER_DATA_CATEGORIES);
        if post_matches(tags, category) {
            page.document.set_style(post, "display", "block");
            page.document.add_class(post, FILTER_HIGHLIGHT_CLASS);
            page.set_timeout(highlight_ms, move |page| {
                page.document.remove_class(post, FILTER_HIGHLIGHT_CLASS);
            });
            shown += 1;
        } else {
            page.document.set_style(post, "display", "none");
        }
    }
    debug!(category, shown, total = posts.len(), "posts filtered");
}

pub fn init(page: &mut Page) -> PageResult<bool> {
    let buttons = page.document.query_all(FILTER_BUTTON)?;
    let posts = page.document.query_all(FILTER_POST)?;
    if buttons.is_empty() || posts.is_empty() {
        return Ok(false);
    }

    for button in buttons.iter().copied() {
        let all_buttons = buttons.clone();
        let posts = posts.clone();
        page.add_listener(EventTarget::Node(button), EventKind::Click, move |page, _| {
            let category = page
                .document
                .data(button, FILTER_DATA_CATEGORY)
                .unwrap_or(FILTER_ALL)
                .to_string();
            for other in &all_buttons {
                page.document.remove_class(*other, ACTIVE_CLASS);
            }
            page.document.add_class(button, ACTIVE_CLASS);
            apply_filter(page, &posts, &category);
        });
    }

    Ok(true)
}
