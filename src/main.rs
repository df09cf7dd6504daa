use clap::Parser;
use rental_scout::scrapers::NjuskaloBrowserExtractor;
use rental_scout::sink::CsvSink;
use rental_scout::{run_once, Cli};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🏠 Rental Scout");
    info!("==========================================");

    let config = Cli::parse().into_config()?;
    info!(
        "Searching {} for rent up to {} (pages: {}, banned words: {})",
        config.search.base_url,
        config.search.max_price.unwrap_or_default(),
        config.max_pages,
        config.banned_keywords.len()
    );

    let extractor =
        NjuskaloBrowserExtractor::new(Duration::from_secs(config.page_load_wait_secs))?;
    let summary = run_once(&extractor, &CsvSink::new(), &config).await?;

    for (i, listing) in summary.listings.iter().enumerate() {
        println!(
            "{}. {} ({})",
            i + 1,
            listing.title.as_deref().unwrap_or("-"),
            listing.price_text.as_deref().unwrap_or("no price")
        );
        println!("   {}", listing.link);
    }

    match &summary.artifact {
        Some(path) => info!(
            "✅ {} new listings saved to {}",
            summary.listings.len(),
            path.display()
        ),
        None => info!("✅ Nothing new since the last run"),
    }

    Ok(())
}
