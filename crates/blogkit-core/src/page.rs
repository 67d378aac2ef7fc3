//! The page: document, listeners, timers, observers and preferences in one
//! place.
//!
//! Every listener and timer callback receives `&mut Page`, so behaviors read
//! and write presentation state without reaching into globals. The host
//! drives a page by calling the input methods ([`Page::pointer_move`],
//! [`Page::click`], [`Page::scroll_to`], ...) and [`Page::advance_time`].

use std::rc::Rc;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::bus::{EventBus, ListenerId};
use crate::config::BehaviorConfig;
use crate::dom::{Document, NodeId, Rect};
use crate::events::{DispatchOutcome, Event, EventKind, EventTarget, Point};
use crate::observer::ObserverRegistry;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::store::{MemoryStore, PreferenceStore};

/// Window metrics in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Full scrollable height of the document
    pub document_height: f64,
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            document_height: 800.0,
            scroll_y: 0.0,
        }
    }
}

impl Viewport {
    /// Largest reachable scroll offset, never negative
    pub fn max_scroll(&self) -> f64 {
        (self.document_height - self.height).max(0.0)
    }
}

/// Optional host features behaviors may degrade without
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostCapabilities {
    pub intersection_observer: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            intersection_observer: true,
        }
    }
}

/// How the last programmatic scroll was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// A live page
pub struct Page {
    pub document: Document,
    pub bus: EventBus,
    pub scheduler: Scheduler,
    pub observers: ObserverRegistry,
    pub viewport: Viewport,
    pub capabilities: HostCapabilities,
    config: Rc<BehaviorConfig>,
    store: Arc<dyn PreferenceStore>,
    focused: Option<NodeId>,
    hovered: Option<NodeId>,
    touch_target: Option<NodeId>,
    last_scroll: Option<ScrollBehavior>,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("nodes", &self.document.node_count())
            .field("bus", &self.bus)
            .field("scheduler", &self.scheduler)
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Page over `document` with an in-memory store and default settings
    pub fn new(document: Document) -> Self {
        Self::with_store(document, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(document: Document, store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            document,
            bus: EventBus::new(),
            scheduler: Scheduler::new(),
            observers: ObserverRegistry::default(),
            viewport: Viewport::default(),
            capabilities: HostCapabilities::default(),
            config: Rc::new(BehaviorConfig::default()),
            store,
            focused: None,
            hovered: None,
            touch_target: None,
            last_scroll: None,
        }
    }

    pub fn config(&self) -> Rc<BehaviorConfig> {
        Rc::clone(&self.config)
    }

    pub fn set_config(&mut self, config: BehaviorConfig) {
        self.config = Rc::new(config);
    }

    pub fn store(&self) -> &Arc<dyn PreferenceStore> {
        &self.store
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Listener and timer plumbing
    // ═══════════════════════════════════════════════════════════════════════

    pub fn add_listener(
        &mut self,
        target: EventTarget,
        kind: EventKind,
        listener: impl Fn(&mut Page, &mut Event) + 'static,
    ) -> ListenerId {
        self.bus.add_listener(target, kind, listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.bus.remove_listener(id)
    }

    /// Fire-and-forget one-shot task
    pub fn set_timeout(&mut self, delay_ms: u64, task: impl FnOnce(&mut Page) + 'static) -> TaskHandle {
        self.scheduler.schedule(delay_ms, task)
    }

    pub fn clear_timeout(&mut self, handle: TaskHandle) -> bool {
        self.scheduler.cancel(handle)
    }

    /// Advance the virtual clock, running every task that comes due
    pub fn advance_time(&mut self, delta_ms: u64) -> usize {
        let until = self.scheduler.now_ms().saturating_add(delta_ms);
        let mut ran = 0;
        while let Some(task) = self.scheduler.pop_due(until) {
            trace!(task = %task.handle, due_ms = task.due_ms, "running task");
            (task.callback)(self);
            ran += 1;
        }
        self.scheduler.set_now(until);
        ran
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Deliver `event` at `target`.
    ///
    /// Node targets bubble through their ancestors and then the document
    /// when the kind bubbles and the node is attached. Listeners removed
    /// mid-dispatch are skipped; listeners added mid-dispatch do not see the
    /// event.
    pub fn dispatch(&mut self, target: EventTarget, mut event: Event) -> DispatchOutcome {
        let kind = event.kind;
        let path = match target {
            EventTarget::Window | EventTarget::Document => vec![target],
            EventTarget::Node(node) => {
                event.target = Some(node);
                let mut path = vec![target];
                if kind.bubbles() {
                    path.extend(self.document.ancestors(node).map(EventTarget::Node));
                    if self.document.is_connected(node) {
                        path.push(EventTarget::Document);
                    }
                }
                path
            }
        };

        let mut handled = 0;
        for step in path {
            for (id, listener) in self.bus.listeners_for(step, kind) {
                if !self.bus.is_registered(id) {
                    continue;
                }
                listener(self, &mut event);
                handled += 1;
            }
            if event.propagation_stopped() {
                break;
            }
        }
        trace!(%kind, handled, "dispatched");

        DispatchOutcome {
            default_prevented: event.default_prevented(),
            propagation_stopped: event.propagation_stopped(),
            handled,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Geometry
    // ═══════════════════════════════════════════════════════════════════════

    /// Bounding box in client coordinates
    pub fn client_rect(&self, node: NodeId) -> Rect {
        self.document.layout(node).scrolled_by(self.viewport.scroll_y)
    }

    /// Topmost attached element whose client box contains `point`.
    ///
    /// Boxes paint in document order, so the last match wins regardless of
    /// nesting depth.
    pub fn hit_test(&self, point: Point) -> Option<NodeId> {
        self.document
            .descendants(self.document.body())
            .into_iter()
            .filter(|n| self.document.is_element(*n))
            .filter(|n| {
                let r = self.client_rect(*n);
                r.width > 0.0
                    && r.height > 0.0
                    && point.x >= r.left()
                    && point.x < r.right()
                    && point.y >= r.top()
                    && point.y < r.bottom()
            })
            .last()
    }

    fn event_target_at(&self, point: Point) -> EventTarget {
        self.hit_test(point)
            .map(EventTarget::Node)
            .unwrap_or(EventTarget::Document)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Host input
    // ═══════════════════════════════════════════════════════════════════════

    /// Move the mouse to client `(x, y)`: hover transitions, then `mousemove`
    pub fn pointer_move(&mut self, x: f64, y: f64) -> DispatchOutcome {
        let point = Point::new(x, y);
        let hit = self.hit_test(point);
        self.update_hover(hit, point);
        let target = hit.map(EventTarget::Node).unwrap_or(EventTarget::Document);
        self.dispatch(target, Event::mouse(EventKind::MouseMove, x, y))
    }

    fn hover_chain(&self, node: Option<NodeId>) -> Vec<NodeId> {
        match node {
            Some(node) => std::iter::once(node)
                .chain(self.document.ancestors(node))
                .collect(),
            None => Vec::new(),
        }
    }

    fn update_hover(&mut self, next: Option<NodeId>, point: Point) {
        if next == self.hovered {
            return;
        }
        let old_chain = self.hover_chain(self.hovered);
        let new_chain = self.hover_chain(next);
        self.hovered = next;

        for node in old_chain.iter().filter(|n| !new_chain.contains(n)) {
            self.dispatch(
                EventTarget::Node(*node),
                Event::mouse(EventKind::MouseLeave, point.x, point.y),
            );
        }
        for node in new_chain.iter().rev().filter(|n| !old_chain.contains(n)) {
            self.dispatch(
                EventTarget::Node(*node),
                Event::mouse(EventKind::MouseEnter, point.x, point.y),
            );
        }
    }

    pub fn mouse_down(&mut self, x: f64, y: f64) -> DispatchOutcome {
        let target = self.event_target_at(Point::new(x, y));
        self.dispatch(target, Event::mouse(EventKind::MouseDown, x, y))
    }

    pub fn mouse_up(&mut self, x: f64, y: f64) -> DispatchOutcome {
        let target = self.event_target_at(Point::new(x, y));
        self.dispatch(target, Event::mouse(EventKind::MouseUp, x, y))
    }

    /// Start a touch on `node`; later touch events target the same node
    pub fn touch_start(&mut self, node: NodeId, touches: Vec<Point>) -> DispatchOutcome {
        self.touch_target = Some(node);
        self.dispatch(
            EventTarget::Node(node),
            Event::touch(EventKind::TouchStart, touches),
        )
    }

    pub fn touch_move(&mut self, touches: Vec<Point>) -> DispatchOutcome {
        let target = self
            .touch_target
            .map(EventTarget::Node)
            .unwrap_or(EventTarget::Document);
        self.dispatch(target, Event::touch(EventKind::TouchMove, touches))
    }

    pub fn touch_end(&mut self) -> DispatchOutcome {
        let target = self
            .touch_target
            .take()
            .map(EventTarget::Node)
            .unwrap_or(EventTarget::Document);
        self.dispatch(target, Event::touch(EventKind::TouchEnd, Vec::new()))
    }

    /// Activate `node`; the click lands at the center of its box
    pub fn click(&mut self, node: NodeId) -> DispatchOutcome {
        let (x, y) = self.client_rect(node).center();
        self.dispatch(EventTarget::Node(node), Event::mouse(EventKind::Click, x, y))
    }

    /// Press a key on the focused element, or the document
    pub fn press_key(&mut self, key: &str) -> DispatchOutcome {
        let target = self
            .focused
            .map(EventTarget::Node)
            .unwrap_or(EventTarget::Document);
        self.dispatch(target, Event::key(key))
    }

    pub fn focus(&mut self, node: NodeId) {
        self.focused = Some(node);
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Move focus away from `node`, firing `blur`
    pub fn blur(&mut self, node: NodeId) -> DispatchOutcome {
        if self.focused == Some(node) {
            self.focused = None;
        }
        self.dispatch(EventTarget::Node(node), Event::new(EventKind::Blur))
    }

    /// Replace a field's value as typing would, firing `input`
    pub fn type_text(&mut self, node: NodeId, text: &str) -> DispatchOutcome {
        self.focused = Some(node);
        self.document.set_value(node, text);
        self.dispatch(EventTarget::Node(node), Event::new(EventKind::Input))
    }

    /// Submit `form`; returns whether submission went ahead
    pub fn submit(&mut self, form: NodeId) -> bool {
        let outcome = self.dispatch(EventTarget::Node(form), Event::new(EventKind::Submit));
        !outcome.default_prevented
    }

    /// Scroll the window, firing `scroll` and re-evaluating observers
    pub fn scroll_to(&mut self, y: f64, behavior: ScrollBehavior) -> DispatchOutcome {
        let y = if y.is_finite() { y } else { 0.0 };
        self.viewport.scroll_y = y.clamp(0.0, self.viewport.max_scroll());
        self.last_scroll = Some(behavior);
        let outcome = self.dispatch(EventTarget::Window, Event::new(EventKind::Scroll));
        self.evaluate_observers();
        outcome
    }

    pub fn last_scroll_behavior(&self) -> Option<ScrollBehavior> {
        self.last_scroll
    }

    /// Notify observers of every target currently meeting its threshold
    pub fn evaluate_observers(&mut self) -> usize {
        let document = &self.document;
        let hits = self
            .observers
            .collect_hits(&self.viewport, |node| document.layout(node));
        let count = hits.len();
        for (callback, node) in hits {
            callback(self, node);
        }
        count
    }
}
