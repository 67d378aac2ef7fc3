//! Scripted page sessions.
//!
//! A scenario is a page fixture plus a list of input steps and expectations,
//! usually loaded from JSON:
//!
//! ```json
//! {
//!   "name": "menu closes on escape",
//!   "page": { "tag": "body", "children": [
//!     { "tag": "button", "class": "menu-toggle" },
//!     { "tag": "nav", "class": "mobile-nav" }
//!   ]},
//!   "steps": [
//!     { "action": "click", "selector": ".menu-toggle" },
//!     { "action": "key", "key": "Escape" },
//!     { "action": "expect_class", "selector": "body", "class": "menu-open", "present": false }
//!   ]
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::BehaviorConfig;
use crate::contract::Feature;
use crate::dom::{Document, NodeId, NodeSpec};
use crate::error::{PageError, PageResult};
use crate::events::Point;
use crate::features;
use crate::logging::CaptureBuffer;
use crate::page::{HostCapabilities, Page, ScrollBehavior, Viewport};
use crate::store::{MemoryStore, PreferenceStore};

fn default_true() -> bool {
    true
}

/// One scripted action or check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Click {
        selector: String,
    },
    MouseMove {
        x: f64,
        y: f64,
    },
    /// Move the pointer to the element's center
    MouseEnter {
        selector: String,
    },
    /// Move the pointer off the page
    MouseLeave,
    MouseDown {
        x: f64,
        y: f64,
    },
    MouseUp {
        x: f64,
        y: f64,
    },
    TouchStart {
        selector: String,
        x: f64,
        y: f64,
    },
    TouchMove {
        x: f64,
        y: f64,
    },
    TouchEnd,
    Key {
        key: String,
    },
    Type {
        selector: String,
        text: String,
    },
    Blur {
        selector: String,
    },
    Submit {
        selector: String,
        /// Whether submission should go ahead
        #[serde(default)]
        expect_submitted: Option<bool>,
    },
    Scroll {
        y: f64,
        #[serde(default)]
        smooth: bool,
    },
    Advance {
        ms: u64,
    },
    ExpectClass {
        selector: String,
        class: String,
        #[serde(default = "default_true")]
        present: bool,
    },
    /// `value: null` expects the property to be unset
    ExpectStyle {
        selector: String,
        property: String,
        value: Option<String>,
    },
    ExpectText {
        selector: String,
        contains: String,
    },
    ExpectCount {
        selector: String,
        count: usize,
    },
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Step::Click { .. } => "click",
            Step::MouseMove { .. } => "mouse_move",
            Step::MouseEnter { .. } => "mouse_enter",
            Step::MouseLeave => "mouse_leave",
            Step::MouseDown { .. } => "mouse_down",
            Step::MouseUp { .. } => "mouse_up",
            Step::TouchStart { .. } => "touch_start",
            Step::TouchMove { .. } => "touch_move",
            Step::TouchEnd => "touch_end",
            Step::Key { .. } => "key",
            Step::Type { .. } => "type",
            Step::Blur { .. } => "blur",
            Step::Submit { .. } => "submit",
            Step::Scroll { .. } => "scroll",
            Step::Advance { .. } => "advance",
            Step::ExpectClass { .. } => "expect_class",
            Step::ExpectStyle { .. } => "expect_style",
            Step::ExpectText { .. } => "expect_text",
            Step::ExpectCount { .. } => "expect_count",
        }
    }
}

/// A page fixture with the steps to replay against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub viewport: Viewport,
    pub page: NodeSpec,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Host settings a scenario page is built with
#[derive(Clone)]
pub struct RunOptions {
    pub config: BehaviorConfig,
    pub capabilities: HostCapabilities,
    pub store: Arc<dyn PreferenceStore>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config: BehaviorConfig::default(),
            capabilities: HostCapabilities::default(),
            store: Arc::new(MemoryStore::new()),
        }
    }
}

/// What happened at one step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub action: &'static str,
    pub failure: Option<String>,
    /// Warnings logged while the step ran
    pub warnings: Vec<String>,
}

impl StepOutcome {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub bound: Vec<Feature>,
    pub steps: Vec<StepOutcome>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepOutcome::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| !s.passed())
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound: Vec<&str> = self.bound.iter().map(|b| b.name()).collect();
        writeln!(f, "scenario: {}", self.name)?;
        writeln!(f, "bound: {}", bound.join(", "))?;
        for step in &self.steps {
            match &step.failure {
                None => writeln!(f, "  [{:>3}] ok    {}", step.index, step.action)?,
                Some(reason) => writeln!(f, "  [{:>3}] FAIL  {}: {}", step.index, step.action, reason)?,
            }
            for warning in &step.warnings {
                writeln!(f, "        warn  {warning}")?;
            }
        }
        let failed = self.failures().count();
        write!(f, "{} steps, {} failed", self.steps.len(), failed)
    }
}

impl Scenario {
    pub fn from_json(json: &str) -> PageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> PageResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Mount the fixture on a fresh page; behaviors are not bound yet
    pub fn build_page(&self, options: RunOptions) -> Page {
        let mut page = Page::with_store(Document::from_spec(self.page.clone()), options.store);
        page.viewport = self.viewport;
        page.capabilities = options.capabilities;
        page.set_config(options.config);
        page
    }

    /// Initialize behaviors on `page`, then replay every step.
    ///
    /// A failing step is recorded and the run continues. Warnings reach the
    /// report only when `capture` is installed as a tracing layer.
    pub fn run(&self, page: &mut Page, capture: Option<&CaptureBuffer>) -> ScenarioReport {
        info!(scenario = %self.name, steps = self.steps.len(), "running scenario");
        let bound = features::initialize(page);
        if let Some(capture) = capture {
            capture.drain();
        }

        let mut steps = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let failure = run_step(page, step).err().map(|err| {
                warn!(index, action = step.action(), error = %err, "step failed");
                err.to_string()
            });
            let warnings = capture
                .map(|c| {
                    c.drain()
                        .into_iter()
                        .filter(|e| e.is_warning_or_worse())
                        .map(|e| e.msg)
                        .collect()
                })
                .unwrap_or_default();
            steps.push(StepOutcome {
                index,
                action: step.action(),
                failure,
                warnings,
            });
        }

        let report = ScenarioReport {
            name: self.name.clone(),
            bound,
            steps,
        };
        info!(
            scenario = %self.name,
            failed = report.failures().count(),
            "scenario finished"
        );
        report
    }
}

fn resolve(page: &Page, selector: &str) -> PageResult<NodeId> {
    page.document
        .query(selector)?
        .ok_or_else(|| PageError::NoMatch(selector.to_string()))
}

fn expect(condition: bool, describe: impl FnOnce() -> String) -> PageResult<()> {
    if condition {
        Ok(())
    } else {
        Err(PageError::Expectation(describe()))
    }
}

/// Apply one step to the page
pub fn run_step(page: &mut Page, step: &Step) -> PageResult<()> {
    match step {
        Step::Click { selector } => {
            let node = resolve(page, selector)?;
            page.click(node);
        }
        Step::MouseMove { x, y } => {
            page.pointer_move(*x, *y);
        }
        Step::MouseEnter { selector } => {
            let node = resolve(page, selector)?;
            let (x, y) = page.client_rect(node).center();
            page.pointer_move(x, y);
        }
        Step::MouseLeave => {
            page.pointer_move(-1.0, -1.0);
        }
        Step::MouseDown { x, y } => {
            page.mouse_down(*x, *y);
        }
        Step::MouseUp { x, y } => {
            page.mouse_up(*x, *y);
        }
        Step::TouchStart { selector, x, y } => {
            let node = resolve(page, selector)?;
            page.touch_start(node, vec![Point::new(*x, *y)]);
        }
        Step::TouchMove { x, y } => {
            page.touch_move(vec![Point::new(*x, *y)]);
        }
        Step::TouchEnd => {
            page.touch_end();
        }
        Step::Key { key } => {
            page.press_key(key);
        }
        Step::Type { selector, text } => {
            let node = resolve(page, selector)?;
            page.type_text(node, text);
        }
        Step::Blur { selector } => {
            let node = resolve(page, selector)?;
            page.blur(node);
        }
        Step::Submit {
            selector,
            expect_submitted,
        } => {
            let form = resolve(page, selector)?;
            let submitted = page.submit(form);
            if let Some(wanted) = expect_submitted {
                expect(submitted == *wanted, || {
                    format!("{selector} submitted={submitted}, expected {wanted}")
                })?;
            }
        }
        Step::Scroll { y, smooth } => {
            let behavior = if *smooth {
                ScrollBehavior::Smooth
            } else {
                ScrollBehavior::Instant
            };
            page.scroll_to(*y, behavior);
        }
        Step::Advance { ms } => {
            page.advance_time(*ms);
        }
        Step::ExpectClass {
            selector,
            class,
            present,
        } => {
            let node = resolve(page, selector)?;
            let has = page.document.has_class(node, class);
            expect(has == *present, || {
                let verb = if *present { "to have" } else { "not to have" };
                format!("expected {selector} {verb} class {class:?}")
            })?;
        }
        Step::ExpectStyle {
            selector,
            property,
            value,
        } => {
            let node = resolve(page, selector)?;
            let actual = page.document.style(node, property);
            expect(actual == value.as_deref(), || {
                format!("{selector} {property}: expected {value:?}, found {actual:?}")
            })?;
        }
        Step::ExpectText { selector, contains } => {
            let node = resolve(page, selector)?;
            let text = page.document.text_content(node);
            expect(text.contains(contains.as_str()), || {
                format!("{selector} text {text:?} does not contain {contains:?}")
            })?;
        }
        Step::ExpectCount { selector, count } => {
            let found = page.document.query_all(selector)?.len();
            expect(found == *count, || {
                format!("expected {count} matches for {selector}, found {found}")
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU: &str = r#"{
        "name": "menu",
        "page": { "tag": "body", "children": [
            { "tag": "button", "class": "menu-toggle" },
            { "tag": "nav", "class": "mobile-nav" }
        ]},
        "steps": [
            { "action": "click", "selector": ".menu-toggle" },
            { "action": "expect_class", "selector": "body", "class": "menu-open" },
            { "action": "key", "key": "Escape" },
            { "action": "expect_class", "selector": "body", "class": "menu-open", "present": false },
            { "action": "expect_count", "selector": ".active", "count": 1 }
        ]
    }"#;

    #[test]
    fn test_parse_and_run() {
        let scenario = Scenario::from_json(MENU).unwrap();
        assert_eq!(scenario.steps.len(), 5);
        assert_eq!(scenario.steps[2], Step::Key { key: "Escape".into() });

        let mut page = scenario.build_page(RunOptions::default());
        let report = scenario.run(&mut page, None);
        assert_eq!(report.bound, vec![Feature::MobileMenu]);

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 4);
        assert!(failures[0]
            .failure
            .as_deref()
            .unwrap()
            .contains("expected 1 matches for .active, found 0"));
        assert!(report.to_string().ends_with("5 steps, 1 failed"));
    }

    #[test]
    fn test_missing_element_fails_step() {
        let mut page = Page::new(Document::new());
        let err = run_step(
            &mut page,
            &Step::Click {
                selector: ".nowhere".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, PageError::NoMatch(_)));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let json = r#"{ "name": "x", "page": {}, "steps": [ { "action": "teleport" } ] }"#;
        assert!(matches!(Scenario::from_json(json), Err(PageError::Serialization(_))));
    }
}
