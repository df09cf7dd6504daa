//! Page-by-page collection.
//!
//! The [`Collector`] walks results pages from 1 upwards, screens each raw
//! candidate and accumulates the survivors. It stops after a run of empty
//! pages or when the page ceiling is hit, whichever comes first.

use crate::filters::{KeywordClassifier, SeenLinks};
use crate::models::{Listing, RawCandidate};
use crate::scrapers::{Extractor, ImageDownloader, SearchParams};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

/// Consecutive empty pages that end a run unless configured otherwise
pub const DEFAULT_EMPTY_PAGE_THRESHOLD: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Collecting,
    EmptyStreak,
    Done,
    MaxPagesReached,
}

impl CrawlState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CrawlState::Done | CrawlState::MaxPagesReached)
    }
}

/// Why a candidate did not make it into the run result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingLink,
    BannedKeyword(String),
    SeenThisRun,
    ReportedPreviously,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingLink => write!(f, "no link"),
            Rejection::BannedKeyword(kw) => write!(f, "banned keyword {:?}", kw),
            Rejection::SeenThisRun => write!(f, "already seen this run"),
            Rejection::ReportedPreviously => write!(f, "reported by a previous run"),
        }
    }
}

/// Result of one run, listings in crawl order
#[derive(Debug)]
pub struct RunOutcome {
    pub listings: Vec<Listing>,
    pub total_accepted: usize,
    pub pages_fetched: u32,
    pub final_state: CrawlState,
}

/// Sort listings by normalized price, unknown prices last. Ties keep their order.
pub fn finalize(mut listings: Vec<Listing>) -> Vec<Listing> {
    listings.sort_by_key(Listing::sort_key);
    listings
}

/// Drives one collection run against an [`Extractor`]
pub struct Collector<'a, E: Extractor + ?Sized> {
    extractor: &'a E,
    params: SearchParams,
    classifier: KeywordClassifier,
    history: HashSet<String>,
    seen: SeenLinks,
    images: Option<ImageDownloader>,
    max_pages: u32,
    empty_page_threshold: u32,

    state: CrawlState,
    page: u32,
    empty_pages: u32,
    pages_fetched: u32,
    results: Vec<Listing>,
}

impl<'a, E: Extractor + ?Sized> Collector<'a, E> {
    /// `history` holds the links reported by the previous run
    pub fn new(extractor: &'a E, params: SearchParams, history: HashSet<String>) -> Self {
        Self {
            extractor,
            params,
            classifier: KeywordClassifier::default(),
            history,
            seen: SeenLinks::new(),
            images: None,
            max_pages: u32::MAX,
            empty_page_threshold: DEFAULT_EMPTY_PAGE_THRESHOLD,
            state: CrawlState::Collecting,
            page: 1,
            empty_pages: 0,
            pages_fetched: 0,
            results: Vec::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: KeywordClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_images(mut self, images: ImageDownloader) -> Self {
        self.images = Some(images);
        self
    }

    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Values below 1 are treated as 1
    pub fn empty_page_threshold(mut self, threshold: u32) -> Self {
        self.empty_page_threshold = threshold.max(1);
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Fetch and process the current page, then advance. No-op once terminal.
    pub async fn step(&mut self) -> CrawlState {
        if self.state.is_terminal() {
            return self.state;
        }
        if self.page > self.max_pages {
            self.state = CrawlState::MaxPagesReached;
            return self.state;
        }

        let page = self.page;
        let candidates = self.extractor.fetch_page(&self.params, page).await;
        self.pages_fetched += 1;

        if candidates.is_empty() {
            self.empty_pages += 1;
            info!(
                "Page {} is empty ({} of {} in a row)",
                page, self.empty_pages, self.empty_page_threshold
            );
            if self.empty_pages >= self.empty_page_threshold {
                info!("🚫 No more listings. Stopping.");
                self.state = CrawlState::Done;
                return self.state;
            }
            self.state = CrawlState::EmptyStreak;
        } else {
            self.empty_pages = 0;
            self.state = CrawlState::Collecting;

            let raw = candidates.len();
            let mut accepted = 0;
            for candidate in candidates {
                if self.accept(candidate).await {
                    accepted += 1;
                }
            }
            info!(
                "✅ Page {}: {} candidates, {} accepted ({} total)",
                page,
                raw,
                accepted,
                self.results.len()
            );
        }

        self.page += 1;
        if self.page > self.max_pages {
            info!("Reached page limit of {}", self.max_pages);
            self.state = CrawlState::MaxPagesReached;
        }
        self.state
    }

    /// Run until a terminal state and hand back everything collected
    pub async fn run(mut self) -> RunOutcome {
        info!(
            "Collecting from {} (max {} pages)",
            self.extractor.source_name(),
            self.max_pages
        );
        while !self.step().await.is_terminal() {}
        debug!("{} distinct links screened", self.seen.len());

        RunOutcome {
            total_accepted: self.results.len(),
            listings: self.results,
            pages_fetched: self.pages_fetched,
            final_state: self.state,
        }
    }

    /// Apply every filter to `candidate` in order. Rejected links that got as
    /// far as the registry stay recorded there.
    pub fn screen(&mut self, candidate: &RawCandidate) -> Result<String, Rejection> {
        let link = candidate
            .link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
            .ok_or(Rejection::MissingLink)?;

        if let Some(title) = candidate.title.as_deref() {
            if let Some(keyword) = self.classifier.matched(title) {
                return Err(Rejection::BannedKeyword(keyword.to_string()));
            }
        }

        if !self.seen.add_if_new(link) {
            return Err(Rejection::SeenThisRun);
        }

        if self.history.contains(link) {
            return Err(Rejection::ReportedPreviously);
        }

        Ok(link.to_string())
    }

    async fn accept(&mut self, candidate: RawCandidate) -> bool {
        let link = match self.screen(&candidate) {
            Ok(link) => link,
            Err(reason) => {
                debug!(
                    "Skipped {}: {}",
                    candidate.link.as_deref().unwrap_or("<no link>"),
                    reason
                );
                return false;
            }
        };

        let image_url = candidate.image_url.clone();
        let mut listing = Listing::from_candidate(link, candidate);

        if let (Some(images), Some(url)) = (&self.images, image_url) {
            let name = listing.title.clone().unwrap_or_else(|| listing.link.clone());
            let saved = images.download(&url, &name, &listing.link).await;
            if let Some(path) = saved {
                listing.image_refs.push(path.display().to_string());
            }
        }

        self.results.push(listing);
        true
    }
}
