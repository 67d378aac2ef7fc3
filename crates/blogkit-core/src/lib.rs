//! blogkit core library
//!
//! Interactive behaviors for a static blog, run against a headless page.
//!
//! ## Overview
//!
//! A [`Page`] owns a [`Document`] (arena DOM with layout boxes supplied by the
//! host), an [`EventBus`], a virtual-clock [`Scheduler`], intersection
//! observers and an injected [`PreferenceStore`]. The eleven behaviors in
//! [`features`] bind listeners to it; a host then drives the page with input
//! events and time.
//!
//! ## Principles
//!
//! - **Absent markup is not an error**: a behavior whose elements are missing
//!   binds nothing
//! - **Presentation only**: listeners write classes, inline styles and child
//!   nodes, plus one persisted theme record
//! - **Deterministic time**: timers run only when the host advances the clock
//!
//! ## Quick Start
//!
//! ```ignore
//! use blogkit_core::{features, Document, El, Page, Rect};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let toggle = doc.append(body, El::new("button").class("menu-toggle"));
//! doc.append(body, El::new("nav").class("mobile-nav"));
//!
//! let mut page = Page::new(doc);
//! features::initialize(&mut page);
//!
//! page.click(toggle);
//! assert!(page.document.has_class(page.document.body(), "menu-open"));
//! page.press_key("Escape");
//! ```

pub mod bus;
pub mod config;
pub mod contract;
pub mod dom;
pub mod error;
pub mod events;
pub mod features;
pub mod logging;
pub mod observer;
pub mod page;
pub mod scenario;
pub mod scheduler;
pub mod store;

// Re-exports
pub use bus::{EventBus, ListenerId, ListenerStats};
pub use config::BehaviorConfig;
pub use contract::{audit, ContractReport, Feature, CONTRACT_VERSION};
pub use dom::{Document, El, NodeId, NodeSpec, Rect};
pub use error::{PageError, PageResult};
pub use events::{DispatchOutcome, Event, EventKind, EventTarget, Point};
pub use observer::ObserverId;
pub use page::{HostCapabilities, Page, ScrollBehavior, Viewport};
pub use scenario::{RunOptions, Scenario, ScenarioReport, Step};
pub use scheduler::{Debouncer, Scheduler, TaskHandle};
pub use store::{MemoryStore, PreferenceStore, RedbStore, UnavailableStore};
