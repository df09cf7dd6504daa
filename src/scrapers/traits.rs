use crate::models::RawCandidate;
use crate::scrapers::types::SearchParams;
use async_trait::async_trait;

/// Source of raw candidates, one results page at a time.
/// Lets the collector run against a real browser or a scripted fake.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Candidates on page `page` (1-based) of the filtered search.
    /// A failed or timed out load yields an empty vector, never an error.
    async fn fetch_page(&self, params: &SearchParams, page: u32) -> Vec<RawCandidate>;

    /// Get the name of the extractor source
    fn source_name(&self) -> &'static str;
}
