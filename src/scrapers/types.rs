use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Default listing search: apartments for rent in Zagreb
pub const DEFAULT_BASE_URL: &str = "https://www.njuskalo.hr/iznajmljivanje-stanova/zagreb";

/// Search filters embedded in every results page URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Results page without query string
    pub base_url: String,
    /// Maximum monthly rent (EUR). Required before a search can run.
    pub max_price: Option<i64>,
    /// Minimum monthly rent (EUR)
    pub min_price: Option<i64>,
    /// Maximum living area in square meters
    pub max_area: Option<u32>,
    /// Site location ids to restrict the search to
    pub locations: Vec<String>,
    pub results_per_page: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_price: None,
            min_price: None,
            max_area: None,
            locations: Vec::new(),
            results_per_page: 25,
        }
    }
}

impl SearchParams {
    /// URL of results page `page` (1-based) with every configured filter applied
    pub fn page_url(&self, page: u32) -> Result<Url> {
        let max_price = self.max_price.context("No price ceiling set")?;

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(min_price) = self.min_price {
            params.push(("price[min]", min_price.to_string()));
        }
        params.push(("price[max]", max_price.to_string()));
        if let Some(max_area) = self.max_area {
            params.push(("livingArea[max]", max_area.to_string()));
        }
        if !self.locations.is_empty() {
            params.push(("geo[locationIds]", self.locations.join(",")));
        }
        params.push(("resultsPerPage", self.results_per_page.to_string()));
        params.push(("page", page.to_string()));

        Url::parse_with_params(&self.base_url, &params)
            .with_context(|| format!("Invalid search base URL: {}", self.base_url))
    }

    /// Scheme and host of the search site, used to absolutize card links
    pub fn origin(&self) -> Option<Url> {
        let mut url = Url::parse(&self.base_url).ok()?;
        url.set_path("/");
        url.set_query(None);
        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn query(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn test_page_url_with_all_filters() {
        let params = SearchParams {
            max_price: Some(400),
            min_price: Some(300),
            max_area: Some(55),
            locations: vec!["1153".into(), "1248".into()],
            ..SearchParams::default()
        };

        let url = params.page_url(3).unwrap();
        assert_eq!(url.path(), "/iznajmljivanje-stanova/zagreb");

        let q = query(&url);
        assert_eq!(q["price[min]"], "300");
        assert_eq!(q["price[max]"], "400");
        assert_eq!(q["livingArea[max]"], "55");
        assert_eq!(q["geo[locationIds]"], "1153,1248");
        assert_eq!(q["resultsPerPage"], "25");
        assert_eq!(q["page"], "3");
    }

    #[test]
    fn test_optional_filters_are_omitted() {
        let params = SearchParams {
            max_price: Some(400),
            ..SearchParams::default()
        };
        let url = params.page_url(1).unwrap();
        let q = query(&url);
        assert!(!q.contains_key("price[min]"));
        assert!(!q.contains_key("livingArea[max]"));
        assert!(!q.contains_key("geo[locationIds]"));
        assert_eq!(q["page"], "1");
    }

    #[test]
    fn test_invalid_base_url() {
        let params = SearchParams {
            base_url: "not a url".into(),
            max_price: Some(400),
            ..SearchParams::default()
        };
        assert!(params.page_url(1).is_err());
        assert!(params.origin().is_none());
    }

    #[test]
    fn test_missing_ceiling_has_no_url() {
        assert!(SearchParams::default().page_url(1).is_err());
    }

    #[test]
    fn test_origin() {
        let origin = SearchParams::default().origin().unwrap();
        assert_eq!(origin.as_str(), "https://www.njuskalo.hr/");
    }
}
