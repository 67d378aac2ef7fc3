//! Replays the bundled demo scenarios end to end.

use std::sync::Arc;

use blogkit_core::logging::{self, CaptureBuffer};
use blogkit_core::{
    Feature, HostCapabilities, MemoryStore, PreferenceStore, RunOptions, Scenario, Step,
};

const BLOG_SESSION: &str = include_str!("../../../demos/blog-session.json");
const MENU_ESCAPE: &str = include_str!("../../../demos/menu-escape.json");

fn run(json: &str, options: RunOptions) -> blogkit_core::ScenarioReport {
    logging::init_for_tests();
    let scenario = Scenario::from_json(json).unwrap();
    let mut page = scenario.build_page(options);
    scenario.run(&mut page, None)
}

#[test]
fn test_blog_session_passes() {
    let report = run(BLOG_SESSION, RunOptions::default());
    assert!(report.passed(), "{report}");
    assert_eq!(report.bound.len(), Feature::ALL.len());
}

#[test]
fn test_menu_escape_passes() {
    let report = run(MENU_ESCAPE, RunOptions::default());
    assert!(report.passed(), "{report}");
    assert_eq!(report.bound, vec![Feature::MobileMenu]);
    assert!(report.to_string().ends_with("4 steps, 0 failed"));
}

#[test]
fn test_blog_session_persists_theme() {
    let store = Arc::new(MemoryStore::new());
    let options = RunOptions {
        store: store.clone(),
        ..RunOptions::default()
    };
    assert!(run(BLOG_SESSION, options).passed());
    let saved = store.get("selectedTheme").unwrap().unwrap();
    assert!(saved.contains("#0984e3"));
}

/// Without observer support every reveal target animates at load
#[test]
fn test_reveal_without_intersection_support() {
    let mut scenario = Scenario::from_json(BLOG_SESSION).unwrap();
    scenario.steps = vec![Step::ExpectClass {
        selector: "section".to_string(),
        class: "animate".to_string(),
        present: true,
    }];
    let mut page = scenario.build_page(RunOptions {
        capabilities: HostCapabilities {
            intersection_observer: false,
        },
        ..RunOptions::default()
    });
    let report = scenario.run(&mut page, None);
    assert!(report.passed(), "{report}");
    assert!(page.document.has_class(page.document.body(), "loaded"));
    assert_eq!(page.observers.observed_count(), 0);
}

/// A wrong expectation fails its step and the run carries on
#[test]
fn test_failed_step_is_reported() {
    let mut scenario = Scenario::from_json(MENU_ESCAPE).unwrap();
    scenario.steps.insert(
        1,
        Step::ExpectCount {
            selector: ".mobile-nav".to_string(),
            count: 3,
        },
    );
    let capture = CaptureBuffer::new();
    let mut page = scenario.build_page(RunOptions::default());
    let report = scenario.run(&mut page, Some(&capture));

    assert!(!report.passed());
    let failed: Vec<_> = report.failures().map(|s| s.index).collect();
    assert_eq!(failed, vec![1]);
    assert_eq!(report.steps.len(), 5);
    assert!(report.steps[4].passed());
}
