//! Logging setup.
//!
//! Behaviors log through `tracing` macros only. Hosts pick the sink:
//!
//! ```ignore
//! use blogkit_core::logging::{self, CaptureBuffer};
//!
//! // Console output filtered by RUST_LOG, or by verbosity when unset
//! let capture = CaptureBuffer::new();
//! logging::init(1, Some(capture.clone()));
//!
//! // ... run a page ...
//! for entry in capture.drain().iter().filter(|e| e.is_warning_or_worse()) {
//!     eprintln!("{}", entry.msg);
//! }
//! ```

pub mod entry;
pub mod layer;

pub use entry::LogEntry;
pub use layer::{CaptureBuffer, CaptureLayer};

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Default filter directive for a `-v` count
pub fn filter_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info,blogkit_core=debug",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber: fmt output to stderr plus an optional
/// capture layer. `RUST_LOG` overrides the verbosity-derived filter.
///
/// Returns `false` if a global subscriber was already set.
pub fn init(verbose: u8, capture: Option<CaptureBuffer>) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for_verbosity(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(capture.map(CaptureLayer::new))
        .try_init()
        .is_ok()
}

/// Subscriber for test binaries: output goes through the test harness so it
/// only shows for failing tests. Safe to call from every test.
pub fn init_for_tests() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
