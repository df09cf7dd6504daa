use anyhow::{Context, Result};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_STEM_CHARS: usize = 50;

/// File-system-safe name: alphanumerics, space, `_` and `-` are kept, the rest
/// become `_`, cut to 50 characters
pub fn safe_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_CHARS)
        .collect()
}

/// Short id for `link`: the trailing ad number when the last path segment
/// ends in one, otherwise the first 12 hex digits of its SHA-256
pub fn link_id(link: &str) -> String {
    let path = link.split(['?', '#']).next().unwrap_or_default();
    let segment = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let digits: String = segment
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if !digits.is_empty() {
        return digits;
    }

    let hash = Sha256::digest(link.as_bytes());
    hash.iter().take(6).map(|b| format!("{:02x}", b)).collect()
}

/// Best-effort downloader for listing thumbnails
pub struct ImageDownloader {
    client: Client,
    dir: PathBuf,
}

impl ImageDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            dir: dir.into(),
        })
    }

    /// Where the image for the listing `link` titled `name` is stored
    pub fn target_path(&self, name: &str, link: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.jpg", safe_file_stem(name), link_id(link)))
    }

    /// Save the image at `url` under a name derived from `name` and `link`.
    /// Failures are logged and reported as `None`.
    pub async fn download(&self, url: &str, name: &str, link: &str) -> Option<PathBuf> {
        match self.try_download(url, name, link).await {
            Ok(path) => {
                debug!("Saved image {} to {}", url, path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Image download failed for {}: {:#}", url, e);
                None
            }
        }
    }

    async fn try_download(&self, url: &str, name: &str, link: &str) -> Result<PathBuf> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch image")?;

        if !response.status().is_success() {
            anyhow::bail!("Image request returned status: {}", response.status());
        }

        let bytes = response.bytes().await.context("Failed to read image body")?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.target_path(name, link);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("Stan, Trešnjevka 38m2"), "Stan_ Trešnjevka 38m2");
        assert_eq!(safe_file_stem("a/b\\c:d"), "a_b_c_d");
        assert_eq!(safe_file_stem(&"x".repeat(80)).chars().count(), 50);
    }

    #[test]
    fn test_link_id() {
        assert_eq!(
            link_id("https://www.njuskalo.hr/nekretnine/stan-tresnjevka-oglas-41235678"),
            "41235678"
        );
        assert_eq!(link_id("https://www.njuskalo.hr/nekretnine/stan-oglas-77/?ref=list"), "77");

        let hashed = link_id("https://www.njuskalo.hr/nekretnine/stan");
        assert_eq!(hashed.len(), 12);
        assert!(hashed.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hashed, link_id("https://www.njuskalo.hr/nekretnine/stan"));
    }

    #[test]
    fn test_target_path() {
        let downloader = ImageDownloader::new("images").unwrap();
        assert_eq!(
            downloader.target_path("Stan, Zagreb", "https://www.njuskalo.hr/nekretnine/stan-oglas-111"),
            Path::new("images/Stan_ Zagreb_111.jpg")
        );
    }

    #[test]
    fn test_same_title_different_links_get_different_files() {
        let downloader = ImageDownloader::new("images").unwrap();
        let first = downloader.target_path("Stan, Zagreb", "https://www.njuskalo.hr/nekretnine/stan-oglas-111");
        let second = downloader.target_path("Stan, Zagreb", "https://www.njuskalo.hr/nekretnine/stan-oglas-222");
        assert_ne!(first, second);

        let first = downloader.target_path("Stan", "https://a.example/stan");
        let second = downloader.target_path("Stan", "https://b.example/stan");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_failed_download_is_none() {
        let dir = TempDir::new().unwrap();
        let downloader = ImageDownloader::new(dir.path()).unwrap();

        assert!(downloader.download("not a url", "Stan", "https://x/1").await.is_none());
        assert!(!downloader.target_path("Stan", "https://x/1").exists());
    }
}
