//! Per-candidate decisions: price normalization, banned keywords, in-run dedup.

pub mod keywords;
pub mod price;
pub mod seen;

pub use keywords::KeywordClassifier;
pub use price::{normalize, UNKNOWN_PRICE};
pub use seen::SeenLinks;
