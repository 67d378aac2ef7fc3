//! Before/after image comparison slider.
//!
//! A press on the handle opens a drag session that owns four document-level
//! listeners (mouse and touch, move and release). Release detaches exactly
//! those four, so attach and detach counts on the bus stay symmetric.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::bus::ListenerId;
use crate::contract::{SLIDER, SLIDER_BEFORE, SLIDER_HANDLE};
use crate::dom::{NodeId, Rect};
use crate::error::PageResult;
use crate::events::{Event, EventKind, EventTarget};
use crate::page::Page;

/// Handle position for a pointer at client `x`, clamped to `[0, 100]`.
///
/// `None` for a slider with no width.
pub fn slider_percent(rect: Rect, x: f64) -> Option<f64> {
    if rect.width.is_nan() || rect.width <= 0.0 || !x.is_finite() {
        return None;
    }
    Some(((x - rect.left()) / rect.width * 100.0).clamp(0.0, 100.0))
}

/// The parts of one slider instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slider {
    pub root: NodeId,
    pub handle: NodeId,
    pub before: NodeId,
}

impl Slider {
    pub fn set_position(&self, page: &mut Page, percent: f64) {
        let value = format!("{percent}%");
        page.document.set_style(self.handle, "left", &value);
        page.document.set_style(self.before, "width", &value);
    }
}

/// Live drag state; present only between press and release
#[derive(Debug, Default)]
pub struct DragSession {
    listeners: Vec<ListenerId>,
}

impl DragSession {
    pub fn is_dragging(&self) -> bool {
        !self.listeners.is_empty()
    }
}

fn drag(page: &mut Page, slider: Slider, event: &mut Event) {
    let Some(point) = event.pointer() else {
        return;
    };
    let Some(percent) = slider_percent(page.client_rect(slider.root), point.x) else {
        return;
    };
    event.prevent_default();
    slider.set_position(page, percent);
}

fn start_drag(page: &mut Page, slider: Slider, session: &Rc<RefCell<DragSession>>) {
    if session.borrow().is_dragging() {
        return;
    }

    let mut listeners = Vec::with_capacity(4);
    for kind in [EventKind::MouseMove, EventKind::TouchMove] {
        listeners.push(page.add_listener(EventTarget::Document, kind, move |page, event| {
            drag(page, slider, event)
        }));
    }
    for kind in [EventKind::MouseUp, EventKind::TouchEnd] {
        let session = Rc::clone(session);
        listeners.push(page.add_listener(EventTarget::Document, kind, move |page, _| {
            stop_drag(page, &session)
        }));
    }
    debug!(slider = %slider.root, "drag started");
    session.borrow_mut().listeners = listeners;
}

fn stop_drag(page: &mut Page, session: &Rc<RefCell<DragSession>>) {
    let listeners = std::mem::take(&mut session.borrow_mut().listeners);
    for id in listeners {
        if !page.remove_listener(id) {
            warn!(%id, "drag listener was already detached");
        }
    }
}

/// Bind every complete slider; each gets its own session
pub fn bind(page: &mut Page) -> PageResult<Vec<(Slider, Rc<RefCell<DragSession>>)>> {
    let initial = page.config().slider_initial_percent;
    let mut bound = Vec::new();

    for root in page.document.query_all(SLIDER)? {
        let (Some(handle), Some(before)) = (
            page.document.query_in(root, SLIDER_HANDLE)?,
            page.document.query_in(root, SLIDER_BEFORE)?,
        ) else {
            debug!(%root, "slider is missing its handle or before layer");
            continue;
        };
        let slider = Slider { root, handle, before };
        slider.set_position(page, initial);

        let session = Rc::new(RefCell::new(DragSession::default()));
        for kind in [EventKind::MouseDown, EventKind::TouchStart] {
            let session = Rc::clone(&session);
            page.add_listener(EventTarget::Node(handle), kind, move |page, _| {
                start_drag(page, slider, &session)
            });
        }
        bound.push((slider, session));
    }

    Ok(bound)
}

pub fn init(page: &mut Page) -> PageResult<bool> {
    Ok(!bind(page)?.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, El};
    use crate::events::Point;

    fn slider_el(x: f64) -> El {
        El::new("div")
            .class("image-comparison-slider")
            .rect(Rect::new(x, 0.0, 400.0, 300.0))
            .child(El::new("div").class("before-image"))
            .child(
                El::new("div")
                    .class("slider-handle")
                    .rect(Rect::new(x + 190.0, 0.0, 20.0, 300.0)),
            )
    }

    fn slider_page() -> (Page, Slider, Rc<RefCell<DragSession>>) {
        let mut doc = Document::new();
        doc.append(doc.body(), slider_el(100.0));
        let mut page = Page::new(doc);
        let (slider, session) = bind(&mut page).unwrap().remove(0);
        (page, slider, session)
    }

    #[test]
    fn test_percent_is_clamped() {
        let rect = Rect::new(100.0, 0.0, 400.0, 300.0);
        assert_eq!(slider_percent(rect, 200.0), Some(25.0));
        assert_eq!(slider_percent(rect, -900.0), Some(0.0));
        assert_eq!(slider_percent(rect, 9000.0), Some(100.0));
        assert_eq!(slider_percent(Rect::new(0.0, 0.0, 0.0, 10.0), 5.0), None);
    }

    #[test]
    fn test_initial_position_is_centered() {
        let (page, slider, _) = slider_page();
        assert_eq!(page.document.style(slider.handle, "left"), Some("50%"));
        assert_eq!(page.document.style(slider.before, "width"), Some("50%"));
    }

    #[test]
    fn test_mouse_drag_moves_and_releases() {
        let (mut page, slider, session) = slider_page();
        let baseline = page.bus.len();

        page.mouse_down(300.0, 100.0);
        assert!(session.borrow().is_dragging());
        assert_eq!(page.bus.len(), baseline + 4);

        let outcome = page.pointer_move(200.0, 100.0);
        assert!(outcome.default_prevented);
        assert_eq!(page.document.style(slider.handle, "left"), Some("25%"));
        assert_eq!(page.document.style(slider.before, "width"), Some("25%"));

        page.mouse_up(200.0, 100.0);
        assert!(!session.borrow().is_dragging());
        assert_eq!(page.bus.len(), baseline);

        page.pointer_move(450.0, 100.0);
        assert_eq!(page.document.style(slider.handle, "left"), Some("25%"));
    }

    #[test]
    fn test_touch_drag_uses_first_touch() {
        let (mut page, slider, session) = slider_page();
        page.touch_start(slider.handle, vec![Point::new(300.0, 10.0)]);
        page.touch_move(vec![Point::new(400.0, 10.0), Point::new(120.0, 10.0)]);
        assert_eq!(page.document.style(slider.handle, "left"), Some("75%"));

        page.touch_end();
        assert!(!session.borrow().is_dragging());
        let stats = page.bus.stats();
        assert_eq!(stats.attached, 6);
        assert_eq!(stats.detached, 4);
    }

    #[test]
    fn test_second_press_attaches_nothing() {
        let (mut page, slider, _) = slider_page();
        page.mouse_down(300.0, 100.0);
        let during = page.bus.len();
        page.touch_start(slider.handle, vec![Point::new(300.0, 10.0)]);
        assert_eq!(page.bus.len(), during);
    }

    #[test]
    fn test_incomplete_instance_is_skipped() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.append(
            body,
            El::new("div")
                .class("image-comparison-slider")
                .child(El::new("div").class("slider-handle")),
        );
        doc.append(body, slider_el(600.0));
        let mut page = Page::new(doc);
        let bound = bind(&mut page).unwrap();
        assert_eq!(bound.len(), 1);
        assert_eq!(page.document.style(bound[0].0.handle, "left"), Some("50%"));
    }

    #[test]
    fn test_instances_drag_independently() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.append(body, slider_el(0.0));
        doc.append(body, slider_el(500.0));
        let mut page = Page::new(doc);
        let bound = bind(&mut page).unwrap();
        let (first, second) = (bound[0].0, bound[1].0);

        page.mouse_down(200.0, 50.0);
        page.pointer_move(100.0, 50.0);
        page.mouse_up(100.0, 50.0);

        assert_eq!(page.document.style(first.handle, "left"), Some("25%"));
        assert_eq!(page.document.style(second.handle, "left"), Some("50%"));
    }
}
