use crate::models::RawCandidate;
use crate::scrapers::traits::Extractor;
use crate::scrapers::types::SearchParams;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Removes ad frames and trackers before the cards are read
const BLOCK_ADS_SCRIPT: &str = r#"
    var adSelectors = [
        'iframe[src*="amazon-adsystem.com"]',
        'iframe[src*="googlesyndication.com"]',
        'iframe[src*="googletagmanager.com"]',
        'iframe[src*="midas-network.com"]',
        'iframe[src*="privacy-center.org"]',
        'img[src*="defractal.com"]',
        'div[class*="ad"]',
        'script[src*="dotmetrics.net"]'
    ];
    adSelectors.forEach(function(selector) {
        document.querySelectorAll(selector).forEach(function(ad) { ad.remove(); });
    });
"#;

/// CSS selectors for one listing card and its fields
#[derive(Debug, Clone)]
pub struct CardSelectors {
    card: Selector,
    title: Selector,
    price: Selector,
    title_link: Selector,
    any_link: Selector,
    image: Selector,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {:?}: {:?}", css, e))
}

impl CardSelectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            card: selector(".EntityList-item")?,
            title: selector(".entity-title")?,
            price: selector(".price")?,
            title_link: selector(".entity-title a[href]")?,
            any_link: selector("a[href]")?,
            image: selector("img")?,
        })
    }
}

fn element_text(card: ElementRef<'_>, sel: &Selector) -> Option<String> {
    let el = card.select(sel).next()?;
    let text = el.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn absolutize(href: &str, origin: Option<&Url>) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") || href.starts_with('#') {
        return None;
    }
    match origin {
        Some(origin) => origin.join(href).ok().map(String::from),
        None => Url::parse(href).ok().map(String::from),
    }
}

fn image_source(card: ElementRef<'_>, sel: &Selector) -> Option<String> {
    let img = card.select(sel).next()?;
    let value = img.value();
    // Lazy-loaded cards carry a placeholder in src and the real image in data-src
    match (value.attr("src"), value.attr("data-src")) {
        (Some(src), Some(lazy)) if src.starts_with("data:") => Some(lazy.to_string()),
        (Some(src), _) if !src.trim().is_empty() => Some(src.to_string()),
        (_, Some(lazy)) => Some(lazy.to_string()),
        _ => None,
    }
}

/// Read every listing card in `html`. A field that cannot be found is left empty.
pub fn parse_listing_cards(
    html: &str,
    selectors: &CardSelectors,
    origin: Option<&Url>,
) -> Vec<RawCandidate> {
    let document = Html::parse_document(html);

    document
        .select(&selectors.card)
        .map(|card| {
            let link = card
                .select(&selectors.title_link)
                .chain(card.select(&selectors.any_link))
                .filter_map(|a| a.value().attr("href"))
                .find_map(|href| absolutize(href, origin));

            RawCandidate {
                title: element_text(card, &selectors.title),
                price_text: element_text(card, &selectors.price),
                link,
                image_url: image_source(card, &selectors.image)
                    .and_then(|src| absolutize(&src, origin)),
            }
        })
        .collect()
}

/// The parts of a browser tab one page load needs
pub trait PageSession {
    /// Navigate to `url`, let it settle and return the page HTML
    fn load_html(&self, url: &Url, settle: Duration) -> Result<String>;

    fn dispose(&self) -> Result<()>;
}

impl PageSession for Tab {
    fn load_html(&self, url: &Url, settle: Duration) -> Result<String> {
        self.navigate_to(url.as_str())
            .with_context(|| format!("Failed to navigate to {}", url))?;
        self.wait_until_navigated()
            .with_context(|| format!("Timed out loading {}", url))?;

        thread::sleep(settle);

        if let Err(e) = self.evaluate(BLOCK_ADS_SCRIPT, false) {
            debug!("Ad blocking script failed: {}", e);
        }

        Ok(self
            .evaluate("document.documentElement.outerHTML", false)
            .context("Failed to read page HTML")?
            .value
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default())
    }

    fn dispose(&self) -> Result<()> {
        self.close(true).map(|_| ())
    }
}

/// Load `url` in `session` and dispose of the session on every outcome
pub fn read_and_close<S: PageSession + ?Sized>(
    session: &S,
    url: &Url,
    settle: Duration,
) -> Result<String> {
    let html = session.load_html(url, settle);
    if let Err(e) = session.dispose() {
        debug!("Failed to close tab: {}", e);
    }
    html
}

/// Extractor driving headless Chrome against the classifieds site
pub struct NjuskaloBrowserExtractor {
    browser: Browser,
    selectors: Arc<CardSelectors>,
    page_load_wait: Duration,
    page_timeout: Duration,
}

impl NjuskaloBrowserExtractor {
    /// Launch the browser. `page_load_wait` is the settle time after navigation.
    pub fn new(page_load_wait: Duration) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(true)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        Ok(Self {
            browser,
            selectors: Arc::new(CardSelectors::new()?),
            page_load_wait,
            page_timeout: Duration::from_secs(20),
        })
    }

    /// Open a tab, read `url`, and close the tab again whatever the outcome
    fn load_page(
        browser: &Browser,
        selectors: &CardSelectors,
        url: &Url,
        origin: Option<&Url>,
        page_load_wait: Duration,
        page_timeout: Duration,
    ) -> Result<Vec<RawCandidate>> {
        let tab = browser.new_tab().context("Failed to open tab")?;
        tab.set_default_timeout(page_timeout);

        let html = read_and_close(&*tab, url, page_load_wait)?;
        if html.is_empty() {
            warn!("HTML is empty for {}", url);
            return Ok(Vec::new());
        }

        Ok(parse_listing_cards(&html, selectors, origin))
    }
}

#[async_trait]
impl Extractor for NjuskaloBrowserExtractor {
    async fn fetch_page(&self, params: &SearchParams, page: u32) -> Vec<RawCandidate> {
        let url = match params.page_url(page) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot build URL for page {}: {:#}", page, e);
                return Vec::new();
            }
        };
        let origin = params.origin();
        debug!("Fetching URL: {}", url);

        let browser = self.browser.clone();
        let selectors = Arc::clone(&self.selectors);
        let page_load_wait = self.page_load_wait;
        let page_timeout = self.page_timeout;

        let loaded = tokio::task::spawn_blocking(move || {
            Self::load_page(
                &browser,
                &selectors,
                &url,
                origin.as_ref(),
                page_load_wait,
                page_timeout,
            )
        })
        .await;

        match loaded {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => {
                warn!("Page {} failed to load: {:#}", page, e);
                Vec::new()
            }
            Err(e) => {
                warn!("Page {} loader panicked: {}", page, e);
                Vec::new()
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "Njuškalo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const FIXTURE: &str = r#"
        <html><body>
        <ul class="EntityList-items">
          <li class="EntityList-item EntityList-item--Regular">
            <article class="entity-body">
              <a class="entity-thumbnail" href="/nekretnine/stan-tresnjevka-oglas-111">
                <img src="data:image/gif;base64,R0lGOD" data-src="//www.njuskalo.hr/image-w300/111.jpg">
              </a>
              <h3 class="entity-title">
                <a href="/nekretnine/stan-tresnjevka-oglas-111">  Stan,
                   Trešnjevka, 38 m2 </a>
              </h3>
              <strong class="price price--eur">380&nbsp;€</strong>
            </article>
          </li>
          <li class="EntityList-item EntityList-item--Regular">
            <h3 class="entity-title"><a href="https://www.njuskalo.hr/nekretnine/stan-2">Garsonijera</a></h3>
          </li>
          <li class="EntityList-item EntityList-item--banner">
            <div>Oglas</div>
          </li>
        </ul>
        </body></html>
    "#;

    /// Session that fails or succeeds on load and counts disposals
    struct FakeSession {
        html: Option<&'static str>,
        disposed: Cell<u32>,
    }

    impl PageSession for FakeSession {
        fn load_html(&self, url: &Url, _settle: Duration) -> Result<String> {
            self.html
                .map(str::to_string)
                .ok_or_else(|| anyhow!("Timed out loading {}", url))
        }

        fn dispose(&self) -> Result<()> {
            self.disposed.set(self.disposed.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn test_session_closed_after_failed_load() {
        let session = FakeSession {
            html: None,
            disposed: Cell::new(0),
        };
        let url = SearchParams::default().origin().unwrap();

        assert!(read_and_close(&session, &url, Duration::ZERO).is_err());
        assert_eq!(session.disposed.get(), 1);
    }

    #[test]
    fn test_session_closed_after_successful_load() {
        let session = FakeSession {
            html: Some(FIXTURE),
            disposed: Cell::new(0),
        };
        let url = SearchParams::default().origin().unwrap();

        let html = read_and_close(&session, &url, Duration::ZERO).unwrap();
        assert_eq!(parse(&html).len(), 3);
        assert_eq!(session.disposed.get(), 1);
    }

    fn parse(html: &str) -> Vec<RawCandidate> {
        let selectors = CardSelectors::new().unwrap();
        let origin = SearchParams::default().origin();
        parse_listing_cards(html, &selectors, origin.as_ref())
    }

    #[test]
    fn test_full_card() {
        let cards = parse(FIXTURE);
        assert_eq!(cards.len(), 3);

        let first = &cards[0];
        assert_eq!(first.title.as_deref(), Some("Stan, Trešnjevka, 38 m2"));
        assert_eq!(first.price_text.as_deref(), Some("380 €"));
        assert_eq!(
            first.link.as_deref(),
            Some("https://www.njuskalo.hr/nekretnine/stan-tresnjevka-oglas-111")
        );
        assert_eq!(
            first.image_url.as_deref(),
            Some("https://www.njuskalo.hr/image-w300/111.jpg")
        );
    }

    #[test]
    fn test_missing_fields_are_none() {
        let cards = parse(FIXTURE);

        let second = &cards[1];
        assert_eq!(second.title.as_deref(), Some("Garsonijera"));
        assert_eq!(second.price_text, None);
        assert_eq!(second.image_url, None);
        assert_eq!(
            second.link.as_deref(),
            Some("https://www.njuskalo.hr/nekretnine/stan-2")
        );

        assert_eq!(cards[2], RawCandidate::default());
    }

    #[test]
    fn test_page_without_cards() {
        assert!(parse("<html><body><p>Nema rezultata</p></body></html>").is_empty());
        assert!(parse("").is_empty());
    }
}
