//! Rental Scout: incremental collector for classifieds rental listings.
//!
//! Walks the filtered search results page by page, drops banned, repeated and
//! previously reported listings, and saves the rest sorted by price.

pub mod collector;
pub mod config;
pub mod filters;
pub mod history;
pub mod models;
pub mod run;
pub mod scrapers;
pub mod sink;

pub use collector::{finalize, Collector, CrawlState, RunOutcome};
pub use config::{Cli, RunConfig};
pub use models::{Listing, RawCandidate};
pub use run::{run_once, RunSummary};
