//! Viewport intersection observation.
//!
//! Observers are evaluated by the page on demand (after initialization and
//! after every scroll) instead of asynchronously by a rendering engine.

use std::rc::Rc;

use crate::dom::{NodeId, Rect};
use crate::page::{Page, Viewport};

/// Callback invoked with each target whose visible ratio reached the threshold
pub type ObserverCallback = Rc<dyn Fn(&mut Page, NodeId)>;

/// Handle to a registered observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

struct Observer {
    threshold: f64,
    targets: Vec<NodeId>,
    callback: ObserverCallback,
}

/// All observers registered on a page
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Observer>,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .field("targets", &self.observed_count())
            .finish()
    }
}

impl ObserverRegistry {
    pub fn create(&mut self, threshold: f64, callback: impl Fn(&mut Page, NodeId) + 'static) -> ObserverId {
        self.observers.push(Observer {
            threshold: threshold.clamp(0.0, 1.0),
            targets: Vec::new(),
            callback: Rc::new(callback),
        });
        ObserverId(self.observers.len() - 1)
    }

    pub fn observe(&mut self, id: ObserverId, target: NodeId) {
        if let Some(observer) = self.observers.get_mut(id.0) {
            if !observer.targets.contains(&target) {
                observer.targets.push(target);
            }
        }
    }

    pub fn unobserve(&mut self, id: ObserverId, target: NodeId) {
        if let Some(observer) = self.observers.get_mut(id.0) {
            observer.targets.retain(|t| *t != target);
        }
    }

    pub fn is_observing(&self, id: ObserverId, target: NodeId) -> bool {
        self.observers
            .get(id.0)
            .is_some_and(|o| o.targets.contains(&target))
    }

    /// Total targets across all observers
    pub fn observed_count(&self) -> usize {
        self.observers.iter().map(|o| o.targets.len()).sum()
    }

    /// Targets currently intersecting, with the callback to notify
    pub(crate) fn collect_hits(
        &self,
        viewport: &Viewport,
        layout: impl Fn(NodeId) -> Rect,
    ) -> Vec<(ObserverCallback, NodeId)> {
        let mut hits = Vec::new();
        for observer in &self.observers {
            for target in &observer.targets {
                let ratio = visible_ratio(&layout(*target), viewport);
                if ratio > 0.0 && ratio >= observer.threshold {
                    hits.push((Rc::clone(&observer.callback), *target));
                }
            }
        }
        hits
    }
}

/// Fraction of `rect` (document coordinates) inside the viewport.
///
/// Zero-area boxes count as fully visible when their origin lies inside the
/// viewport.
pub fn visible_ratio(rect: &Rect, viewport: &Viewport) -> f64 {
    let view_top = viewport.scroll_y;
    let view_bottom = viewport.scroll_y + viewport.height;
    let view_right = viewport.width;

    let area = rect.width * rect.height;
    if area <= 0.0 {
        let inside = rect.y >= view_top && rect.y <= view_bottom && rect.x >= 0.0 && rect.x <= view_right;
        return if inside { 1.0 } else { 0.0 };
    }

    let visible_w = (rect.right().min(view_right) - rect.left().max(0.0)).max(0.0);
    let visible_h = (rect.bottom().min(view_bottom) - rect.top().max(view_top)).max(0.0);
    (visible_w * visible_h / area).clamp(0.0, 1.0)
}
