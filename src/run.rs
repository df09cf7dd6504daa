use crate::collector::{finalize, Collector, CrawlState};
use crate::config::RunConfig;
use crate::filters::KeywordClassifier;
use crate::history::load_previous_links;
use crate::models::Listing;
use crate::scrapers::{Extractor, ImageDownloader};
use crate::sink::{artifact_path, ResultSink};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;

/// What a finished run produced
#[derive(Debug)]
pub struct RunSummary {
    /// Accepted listings, cheapest first
    pub listings: Vec<Listing>,
    pub pages_fetched: u32,
    pub final_state: CrawlState,
    /// Written artifact, `None` when nothing new was found
    pub artifact: Option<PathBuf>,
}

/// One complete run: load history, collect, sort, persist.
/// Only a persistence failure makes this return an error after collection starts.
pub async fn run_once<E, S>(extractor: &E, sink: &S, config: &RunConfig) -> Result<RunSummary>
where
    E: Extractor + ?Sized,
    S: ResultSink + ?Sized,
{
    let classifier = KeywordClassifier::new(&config.banned_keywords)?;
    if !classifier.is_empty() {
        info!(
            "Skipping titles with any of: {}",
            config.banned_keywords.join(", ")
        );
    }
    let history = load_previous_links(&config.output_dir);

    let mut collector = Collector::new(extractor, config.search.clone(), history)
        .with_classifier(classifier)
        .max_pages(config.max_pages)
        .empty_page_threshold(config.empty_page_threshold);
    if let Some(image_dir) = &config.image_dir {
        collector = collector.with_images(ImageDownloader::new(image_dir)?);
    }

    let outcome = collector.run().await;
    let listings = finalize(outcome.listings);

    let artifact = if listings.is_empty() {
        info!("No new listings, nothing written");
        None
    } else {
        let destination = artifact_path(&config.output_dir, Utc::now());
        sink.persist(&listings, &destination)
            .with_context(|| format!("Failed to save results to {}", destination.display()))?;
        Some(destination)
    };

    info!(
        "Run finished: {} new listings from {} pages ({:?})",
        outcome.total_accepted, outcome.pages_fetched, outcome.final_state
    );

    Ok(RunSummary {
        listings,
        pages_fetched: outcome.pages_fetched,
        final_state: outcome.final_state,
        artifact,
    })
}
