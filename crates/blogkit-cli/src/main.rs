//! blogkit CLI
//!
//! Host for the blog page behaviors: replays scripted sessions against a
//! page fixture and checks fixtures against the markup contract.
//!
//! ## Usage
//!
//! ```bash
//! # Replay a scenario, persisting the theme choice across runs
//! blogkit run demos/blog-session.json --persist
//!
//! # Same, with tuned behavior settings and no intersection support
//! blogkit run demos/blog-session.json --config tuned.json --no-intersection
//!
//! # Which behaviors would bind on this page?
//! blogkit check page.json
//!
//! # Query the built-in search corpus
//! blogkit search css
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use blogkit_core::features::search;
use blogkit_core::logging::{self, CaptureBuffer};
use blogkit_core::{
    audit, BehaviorConfig, Document, HostCapabilities, MemoryStore, NodeSpec, PreferenceStore,
    RedbStore, RunOptions, Scenario,
};
use clap::{Parser, Subcommand};
use tracing::debug;

/// Blog page behaviors - scenario runner and contract checker
#[derive(Parser)]
#[command(name = "blogkit")]
#[command(version = "0.1.0")]
#[command(about = "Blog page behaviors - scenario runner and contract checker")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario file against its page fixture
    Run {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Preference database file (implies persistence)
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Persist preferences in the default data directory
        #[arg(long, conflicts_with = "store")]
        persist: bool,

        /// Behavior settings JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run as a host without intersection observation
        #[arg(long)]
        no_intersection: bool,

        /// Print the final document after the run
        #[arg(long)]
        print_dom: bool,
    },

    /// Report which behaviors a page fixture would bind
    Check {
        /// Page fixture JSON file
        page: PathBuf,
    },

    /// Search the built-in post list
    Search {
        /// Query text (matched literally, case-insensitive)
        query: String,
    },
}

/// Default preference database (~/.blogkit/preferences.redb)
fn default_store_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".blogkit")
        .join("preferences.redb")
}

fn open_store(path: &Path) -> Result<Arc<dyn PreferenceStore>> {
    debug!(path = %path.display(), "opening preference store");
    let store = RedbStore::open(path)
        .with_context(|| format!("opening preference store {}", path.display()))?;
    Ok(Arc::new(store))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let capture = CaptureBuffer::new();
    logging::init(cli.verbose, Some(capture.clone()));

    match cli.command {
        Commands::Run {
            scenario,
            store,
            persist,
            config,
            no_intersection,
            print_dom,
        } => {
            let scenario = Scenario::from_json_file(&scenario)
                .with_context(|| format!("loading scenario {}", scenario.display()))?;

            let config = match config {
                Some(path) => BehaviorConfig::from_json_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => BehaviorConfig::default(),
            };
            let store_path = store.or_else(|| persist.then(default_store_path));
            let store: Arc<dyn PreferenceStore> = match &store_path {
                Some(path) => open_store(path)?,
                None => Arc::new(MemoryStore::new()),
            };
            let options = RunOptions {
                config,
                capabilities: HostCapabilities {
                    intersection_observer: !no_intersection,
                },
                store,
            };

            let mut page = scenario.build_page(options);
            let report = scenario.run(&mut page, Some(&capture));
            println!("{report}");
            if print_dom {
                println!();
                println!("{}", page.document.outer_html(page.document.root()));
            }

            let failed = report.failures().count();
            if failed > 0 {
                bail!("{failed} step(s) failed in scenario {:?}", report.name);
            }
        }

        Commands::Check { page } => {
            let raw = std::fs::read_to_string(&page)
                .with_context(|| format!("reading {}", page.display()))?;
            let spec: NodeSpec = serde_json::from_str(&raw)
                .with_context(|| format!("parsing page fixture {}", page.display()))?;
            let report = audit(&Document::from_spec(spec))?;
            print!("{report}");
        }

        Commands::Search { query } => {
            let config = BehaviorConfig::default();
            let query = search::normalize_query(&query);
            if query.chars().count() < config.search_min_chars {
                println!(
                    "Query too short (minimum {} characters)",
                    config.search_min_chars
                );
                return Ok(());
            }

            let matches = search::filter_entries(&search::CORPUS, &query);
            if matches.is_empty() {
                println!("No results found for \"{query}\"");
            }
            for entry in matches {
                println!(
                    "{}  [{}]  {}",
                    search::highlight_markup(entry.title, &query),
                    entry.category,
                    entry.url
                );
            }
        }
    }

    Ok(())
}
