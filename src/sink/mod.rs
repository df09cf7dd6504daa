//! Result persistence.
//!
//! The artifact layout is shared with [`crate::history`]: the link sits at
//! [`LINK_COLUMN`] of every data row, below a single header row.

mod csv_sink;

pub use csv_sink::CsvSink;

use crate::models::Listing;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Header row written at the top of every artifact
pub const HEADER: [&str; 4] = ["Price", "Link", "Title", "Image"];

/// Column index holding the listing link
pub const LINK_COLUMN: usize = 1;

/// File extension of persisted artifacts
pub const ARTIFACT_EXTENSION: &str = "csv";

/// Destination for a finished run
pub trait ResultSink {
    /// Write `listings` in order to `destination`. Any failure is fatal for the run.
    fn persist(&self, listings: &[Listing], destination: &Path) -> Result<()>;
}

/// Timestamped artifact path inside `output_dir`
pub fn artifact_path(output_dir: &Path, at: DateTime<Utc>) -> PathBuf {
    output_dir.join(format!(
        "listings_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        ARTIFACT_EXTENSION
    ))
}
