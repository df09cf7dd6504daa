use super::{ResultSink, HEADER};
use crate::models::Listing;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Writes listings as a CSV table, one row per listing
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvSink;

impl CsvSink {
    pub fn new() -> Self {
        Self
    }

    fn row(listing: &Listing) -> [String; 4] {
        [
            listing.price_text.clone().unwrap_or_default(),
            listing.link.clone(),
            listing.title.clone().unwrap_or_default(),
            listing.image_refs.join(";"),
        ]
    }
}

impl ResultSink for CsvSink {
    fn persist(&self, listings: &[Listing], destination: &Path) -> Result<()> {
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory {}", parent.display())
                })?;
            }
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(destination)
            .with_context(|| format!("Failed to create {}", destination.display()))?;

        writer
            .write_record(HEADER)
            .context("Failed to write header row")?;
        for listing in listings {
            writer
                .write_record(Self::row(listing))
                .with_context(|| format!("Failed to write row for {}", listing.link))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", destination.display()))?;

        info!(
            "💾 Saved {} listings to {}",
            listings.len(),
            destination.display()
        );
        Ok(())
    }
}
