//! Run configuration: defaults, then an optional JSON file, then CLI flags.

use crate::collector::DEFAULT_EMPTY_PAGE_THRESHOLD;
use crate::scrapers::SearchParams;
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub search: SearchParams,
    /// Titles containing any of these words are skipped
    pub banned_keywords: Vec<String>,
    pub max_pages: u32,
    pub empty_page_threshold: u32,
    /// Where results are written and previous results are read from
    pub output_dir: PathBuf,
    /// Thumbnails are downloaded only when set
    pub image_dir: Option<PathBuf>,
    pub page_load_wait_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            search: SearchParams::default(),
            banned_keywords: Vec::new(),
            max_pages: 9,
            empty_page_threshold: DEFAULT_EMPTY_PAGE_THRESHOLD,
            output_dir: PathBuf::from("output"),
            image_dir: None,
            page_load_wait_secs: 3,
        }
    }
}

impl RunConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            bail!("max_pages must be at least 1");
        }
        if self.empty_page_threshold == 0 {
            bail!("empty_page_threshold must be at least 1");
        }
        let max_price = match self.search.max_price {
            Some(max_price) => max_price,
            None => bail!("max_price is required (set it in the config file or pass --max-price)"),
        };
        if max_price < 0 {
            bail!("max_price must not be negative");
        }
        if let Some(min_price) = self.search.min_price {
            if min_price > max_price {
                bail!("min_price ({}) is above max_price ({})", min_price, max_price);
            }
        }
        Ok(())
    }
}

/// Crawl rental listings and save the ones not reported before
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON file with a full or partial run configuration
    #[arg(long, env = "RENTAL_SCOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum monthly rent
    #[arg(long, env = "RENTAL_SCOUT_MAX_PRICE")]
    pub max_price: Option<i64>,

    /// Minimum monthly rent
    #[arg(long, env = "RENTAL_SCOUT_MIN_PRICE")]
    pub min_price: Option<i64>,

    /// Maximum living area in square meters
    #[arg(long, env = "RENTAL_SCOUT_MAX_AREA")]
    pub max_area: Option<u32>,

    /// Location id to search in (can be repeated)
    #[arg(long = "location", env = "RENTAL_SCOUT_LOCATIONS", value_delimiter = ',')]
    pub locations: Vec<String>,

    /// Skip listings whose title contains this word (can be repeated)
    #[arg(long = "ban", env = "RENTAL_SCOUT_BANNED", value_delimiter = ',')]
    pub banned_keywords: Vec<String>,

    /// Stop after this many result pages
    #[arg(long, env = "RENTAL_SCOUT_MAX_PAGES")]
    pub max_pages: Option<u32>,

    /// Stop after this many empty pages in a row
    #[arg(long, env = "RENTAL_SCOUT_EMPTY_PAGES")]
    pub empty_page_threshold: Option<u32>,

    /// Directory for result files, also used to skip listings already reported
    #[arg(long, env = "RENTAL_SCOUT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Download listing thumbnails into this directory
    #[arg(long, env = "RENTAL_SCOUT_IMAGE_DIR")]
    pub image_dir: Option<PathBuf>,

    /// Seconds to let each results page settle before reading it
    #[arg(long, env = "RENTAL_SCOUT_PAGE_WAIT")]
    pub page_load_wait_secs: Option<u64>,
}

impl Cli {
    /// Layer the flags over the config file (if any) and validate the result
    pub fn into_config(self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => RunConfig::default(),
        };

        if self.max_price.is_some() {
            config.search.max_price = self.max_price;
        }
        if self.min_price.is_some() {
            config.search.min_price = self.min_price;
        }
        if self.max_area.is_some() {
            config.search.max_area = self.max_area;
        }
        if !self.locations.is_empty() {
            config.search.locations = self.locations;
        }
        if !self.banned_keywords.is_empty() {
            config.banned_keywords = self.banned_keywords;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(threshold) = self.empty_page_threshold {
            config.empty_page_threshold = threshold;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if self.image_dir.is_some() {
            config.image_dir = self.image_dir;
        }
        if let Some(wait) = self.page_load_wait_secs {
            config.page_load_wait_secs = wait;
        }

        config.validate()?;
        Ok(config)
    }
}
