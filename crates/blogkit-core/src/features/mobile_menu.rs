//! Mobile navigation menu with nested submenus.

use tracing::debug;

use crate::contract::{
    ACTIVE_CLASS, MENU_BODY_CLASS, MENU_PANEL, MENU_TOGGLE, SUBMENU, SUBMENU_ITEM, SUBMENU_TOGGLE,
};
use crate::dom::NodeId;
use crate::error::PageResult;
use crate::events::{EventKind, EventTarget};
use crate::page::Page;

/// The bound toggle and panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Menu {
    pub toggle: NodeId,
    pub panel: NodeId,
}

impl Menu {
    pub fn is_open(&self, page: &Page) -> bool {
        page.document.has_class(self.panel, ACTIVE_CLASS)
    }

    /// Flip all three open markers together
    pub fn toggle(&self, page: &mut Page) {
        let body = page.document.body();
        page.document.toggle_class(self.toggle, ACTIVE_CLASS);
        page.document.toggle_class(self.panel, ACTIVE_CLASS);
        page.document.toggle_class(body, MENU_BODY_CLASS);
    }

    /// Clear all three open markers; a host may call this after navigation
    pub fn close(&self, page: &mut Page) {
        let body = page.document.body();
        page.document.remove_class(self.toggle, ACTIVE_CLASS);
        page.document.remove_class(self.panel, ACTIVE_CLASS);
        page.document.remove_class(body, MENU_BODY_CLASS);
    }
}

/// Bind the menu, returning its handles when both elements exist
pub fn bind(page: &mut Page) -> PageResult<Option<Menu>> {
    let (Some(toggle), Some(panel)) = (
        page.document.query(MENU_TOGGLE)?,
        page.document.query(MENU_PANEL)?,
    ) else {
        return Ok(None);
    };
    let menu = Menu { toggle, panel };

    page.add_listener(EventTarget::Node(toggle), EventKind::Click, move |page, _| {
        menu.toggle(page);
    });

    page.add_listener(EventTarget::Document, EventKind::Click, move |page, event| {
        if !menu.is_open(page) {
            return;
        }
        let inside = event.target.is_some_and(|target| {
            page.document.contains(menu.toggle, target) || page.document.contains(menu.panel, target)
        });
        if !inside {
            menu.close(page);
        }
    });

    page.add_listener(EventTarget::Document, EventKind::KeyDown, move |page, event| {
        if event.is_key("Escape") && menu.is_open(page) {
            menu.close(page);
        }
    });

    let mut submenus = 0;
    for item in page.document.query_all_in(panel, SUBMENU_ITEM)? {
        let (Some(sub_toggle), Some(submenu)) = (
            page.document.query_in(item, SUBMENU_TOGGLE)?,
            page.document.query_in(item, SUBMENU)?,
        ) else {
            continue;
        };
        page.add_listener(EventTarget::Node(sub_toggle), EventKind::Click, move |page, event| {
            event.prevent_default();
            event.stop_propagation();
            page.document.toggle_class(submenu, ACTIVE_CLASS);
            page.document.toggle_class(sub_toggle, ACTIVE_CLASS);
        });
        submenus += 1;
    }
    debug!(submenus, "mobile menu bound");

    Ok(Some(menu))
}

pub fn init(page: &mut Page) -> PageResult<bool> {
    Ok(bind(page)?.is_some())
}
