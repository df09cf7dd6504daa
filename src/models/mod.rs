use serde::{Deserialize, Serialize};

use crate::filters::price;

/// Raw, unvalidated record pulled off one results page. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub title: Option<String>,
    pub price_text: Option<String>,
    pub link: Option<String>,
    pub image_url: Option<String>,
}

impl RawCandidate {
    /// Candidate with only a link and a price, the minimum a listing needs
    pub fn new(link: impl Into<String>, price_text: impl Into<String>) -> Self {
        Self {
            title: None,
            price_text: Some(price_text.into()),
            link: Some(link.into()),
            image_url: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// A candidate that survived every filter. Identity is `link`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub title: Option<String>,
    pub price_text: Option<String>,
    pub price_value: Option<i64>,
    pub link: String,
    pub image_refs: Vec<String>,
}

impl Listing {
    /// Build a listing from a candidate whose link has already been resolved
    pub fn from_candidate(link: String, candidate: RawCandidate) -> Self {
        let price_value = price::known(candidate.price_text.as_deref());
        Self {
            title: candidate.title,
            price_text: candidate.price_text,
            price_value,
            link,
            image_refs: Vec::new(),
        }
    }

    /// Sort key: the normalized price, unknown prices mapped to the maximum
    pub fn sort_key(&self) -> i64 {
        price::normalize(self.price_text.as_deref())
    }
}

impl PartialEq for Listing {
    fn eq(&self, other: &Self) -> bool {
        self.link == other.link
    }
}

impl Eq for Listing {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listings_with_same_link_are_equal() {
        let a = Listing::from_candidate("https://x/1".into(), RawCandidate::new("https://x/1", "300 €"));
        let b = Listing::from_candidate(
            "https://x/1".into(),
            RawCandidate::new("https://x/1", "350 €").with_title("Stan"),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn price_value_is_derived_from_text() {
        let listing = Listing::from_candidate("l".into(), RawCandidate::new("l", "1.250,00 €"));
        assert_eq!(listing.price_value, Some(1250));

        let mut candidate = RawCandidate::new("l", "");
        candidate.price_text = None;
        let listing = Listing::from_candidate("l".into(), candidate);
        assert_eq!(listing.price_value, None);
        assert_eq!(listing.sort_key(), price::UNKNOWN_PRICE);
    }
}
