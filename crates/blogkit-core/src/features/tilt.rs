//! 3D tilt cards with a pointer-following shine.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::warn;

use crate::contract::{TILT_CARD, TILT_SHINE_CLASS};
use crate::dom::{NodeId, Rect};
use crate::error::PageResult;
use crate::events::{EventKind, EventTarget, Point};
use crate::page::Page;

const RESET_TRANSFORM: &str = "perspective(1000px) rotateX(0) rotateY(0) scale3d(1, 1, 1)";
const LEAVE_TRANSITION: &str = "transform 0.5s ease";

/// Rotation and shine position for one pointer sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tilt {
    /// Degrees, driven by vertical offset (inverted)
    pub rotate_x: f64,
    /// Degrees, driven by horizontal offset
    pub rotate_y: f64,
    /// Shine center, percent of card width
    pub shine_x: f64,
    /// Shine center, percent of card height
    pub shine_y: f64,
}

impl Tilt {
    pub const NEUTRAL: Tilt = Tilt {
        rotate_x: 0.0,
        rotate_y: 0.0,
        shine_x: 50.0,
        shine_y: 50.0,
    };

    /// Tilt for a pointer at `pointer` over a card at `rect`, both in client
    /// space. Offsets are normalized by the half extents and clamped, so
    /// both angles stay within `±max_degrees`.
    pub fn compute(rect: Rect, pointer: Point, max_degrees: f64) -> Tilt {
        let half_w = rect.width / 2.0;
        let half_h = rect.height / 2.0;
        if half_w <= 0.0 || half_h <= 0.0 {
            return Tilt::NEUTRAL;
        }
        let (cx, cy) = rect.center();
        let nx = ((pointer.x - cx) / half_w).clamp(-1.0, 1.0);
        let ny = ((pointer.y - cy) / half_h).clamp(-1.0, 1.0);
        if !nx.is_finite() || !ny.is_finite() {
            return Tilt::NEUTRAL;
        }

        Tilt {
            rotate_x: positive_zero(-ny * max_degrees),
            rotate_y: positive_zero(nx * max_degrees),
            shine_x: 50.0 + nx * 50.0,
            shine_y: 50.0 + ny * 50.0,
        }
    }

    pub fn transform(&self, scale: f64) -> String {
        format!(
            "perspective(1000px) rotateX({}deg) rotateY({}deg) scale3d({scale}, {scale}, {scale})",
            self.rotate_x, self.rotate_y
        )
    }

    pub fn shine_gradient(&self) -> String {
        format!(
            "radial-gradient(circle at {}% {}%, rgba(255,255,255,0.3) 0%, rgba(255,255,255,0) 50%)",
            self.shine_x, self.shine_y
        )
    }
}

// -0.0 would render as "-0deg"
fn positive_zero(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

/// Per-card auxiliary state: the shine overlay, created on first use
#[derive(Debug, Default)]
pub struct ShineTable {
    overlays: HashMap<NodeId, NodeId>,
}

impl ShineTable {
    pub fn get(&self, card: NodeId) -> Option<NodeId> {
        self.overlays.get(&card).copied()
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// The card's overlay, creating and attaching it at most once
    pub fn get_or_create(&mut self, page: &mut Page, card: NodeId) -> PageResult<NodeId> {
        if let Some(shine) = self.get(card) {
            return Ok(shine);
        }
        let doc = &mut page.document;
        let shine = doc.create_element("div");
        doc.add_class(shine, TILT_SHINE_CLASS);
        for (property, value) in [
            ("position", "absolute"),
            ("top", "0"),
            ("left", "0"),
            ("right", "0"),
            ("bottom", "0"),
            ("pointer-events", "none"),
            ("z-index", "1"),
        ] {
            doc.set_style(shine, property, value);
        }
        doc.append_child(card, shine)?;
        self.overlays.insert(card, shine);
        Ok(shine)
    }
}

/// Bind tilt handlers to every card; returns the shared shine table
pub fn bind(page: &mut Page) -> PageResult<Rc<RefCell<ShineTable>>> {
    let table = Rc::new(RefCell::new(ShineTable::default()));
    let config = page.config();
    let (max_degrees, scale) = (config.tilt_max_degrees, config.tilt_scale);

    for card in page.document.query_all(TILT_CARD)? {
        page.add_listener(EventTarget::Node(card), EventKind::MouseEnter, move |page, _| {
            page.document.set_style(card, "transition", "none");
        });

        let shines = Rc::clone(&table);
        page.add_listener(EventTarget::Node(card), EventKind::MouseMove, move |page, event| {
            let Some(pointer) = event.pointer() else {
                return;
            };
            let tilt = Tilt::compute(page.client_rect(card), pointer, max_degrees);
            page.document.set_style(card, "transform", &tilt.transform(scale));

            let shine = match shines.borrow_mut().get_or_create(page, card) {
                Ok(shine) => shine,
                Err(err) => {
                    warn!(%card, error = %err, "could not attach card shine");
                    return;
                }
            };
            page.document.set_style(shine, "background", &tilt.shine_gradient());
        });

        let shines = Rc::clone(&table);
        page.add_listener(EventTarget::Node(card), EventKind::MouseLeave, move |page, _| {
            page.document.set_style(card, "transition", LEAVE_TRANSITION);
            page.document.set_style(card, "transform", RESET_TRANSFORM);
            if let Some(shine) = shines.borrow().get(card) {
                page.document.set_style(shine, "background", "none");
            }
        });
    }

    Ok(table)
}

pub fn init(page: &mut Page) -> PageResult<bool> {
    if page.document.query(TILT_CARD)?.is_none() {
        return Ok(false);
    }
    bind(page)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, El};

    fn card_page() -> (Page, NodeId, Rc<RefCell<ShineTable>>) {
        let mut doc = Document::new();
        let card = doc.append(
            doc.body(),
            El::new("div")
                .class("card-3d")
                .rect(Rect::new(100.0, 100.0, 200.0, 100.0)),
        );
        let mut page = Page::new(doc);
        let table = bind(&mut page).unwrap();
        (page, card, table)
    }

    #[test]
    fn test_center_is_flat() {
        let rect = Rect::new(100.0, 100.0, 200.0, 100.0);
        let tilt = Tilt::compute(rect, Point::new(200.0, 150.0), 15.0);
        assert_eq!(tilt, Tilt::NEUTRAL);
        assert!(tilt.transform(1.05).contains("rotateX(0deg) rotateY(0deg)"));
    }

    #[test]
    fn test_corners_hit_the_limits() {
        let rect = Rect::new(100.0, 100.0, 200.0, 100.0);
        let top_right = Tilt::compute(rect, Point::new(300.0, 100.0), 15.0);
        assert_eq!(top_right.rotate_x, 15.0);
        assert_eq!(top_right.rotate_y, 15.0);
        assert_eq!(top_right.shine_x, 100.0);
        assert_eq!(top_right.shine_y, 0.0);

        let far_away = Tilt::compute(rect, Point::new(-5000.0, 9000.0), 15.0);
        assert_eq!(far_away.rotate_x, -15.0);
        assert_eq!(far_away.rotate_y, -15.0);
    }

    #[test]
    fn test_zero_size_card_is_neutral() {
        let tilt = Tilt::compute(Rect::new(0.0, 0.0, 0.0, 50.0), Point::new(10.0, 10.0), 15.0);
        assert_eq!(tilt, Tilt::NEUTRAL);
    }

    #[test]
    fn test_enter_move_leave_cycle() {
        let (mut page, card, table) = card_page();

        page.pointer_move(250.0, 125.0);
        assert_eq!(page.document.style(card, "transition"), Some("none"));
        let transform = page.document.style(card, "transform").unwrap().to_string();
        assert_eq!(
            transform,
            "perspective(1000px) rotateX(7.5deg) rotateY(7.5deg) scale3d(1.05, 1.05, 1.05)"
        );
        let shine = table.borrow().get(card).unwrap();
        assert!(page
            .document
            .style(shine, "background")
            .unwrap()
            .starts_with("radial-gradient(circle at 75% 25%"));

        page.pointer_move(900.0, 700.0);
        assert_eq!(page.document.style(card, "transition"), Some("transform 0.5s ease"));
        assert_eq!(page.document.style(card, "transform"), Some(RESET_TRANSFORM));
        assert_eq!(page.document.style(shine, "background"), Some("none"));
    }

    #[test]
    fn test_shine_created_once_per_card() {
        let (mut page, card, table) = card_page();
        for x in [110.0, 150.0, 200.0, 290.0] {
            page.pointer_move(x, 150.0);
        }
        assert_eq!(table.borrow().len(), 1);
        let shines = page.document.query_all_in(card, ".card-shine").unwrap();
        assert_eq!(shines.len(), 1);
        assert_eq!(page.document.style(shines[0], "pointer-events"), Some("none"));
    }

    #[test]
    fn test_leave_resets_transform() {
        let (mut page, card, table) = card_page();
        page.pointer_move(150.0, 150.0);
        page.pointer_move(0.0, 0.0);
        assert!(table.borrow().get(card).is_some());
        assert_eq!(page.document.style(card, "transform"), Some(RESET_TRANSFORM));
    }
}
