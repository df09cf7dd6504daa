//! Cross-run deduplication.
//!
//! Links reported by the newest artifact in the output directory are loaded
//! once at run start. A missing, unreadable or malformed artifact only costs
//! the history, never the run.

use crate::sink::{ARTIFACT_EXTENSION, HEADER, LINK_COLUMN};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unexpected header in {path}: expected {expected:?} at column {column}, found {found:?}")]
    UnexpectedHeader {
        path: PathBuf,
        column: usize,
        expected: &'static str,
        found: Option<String>,
    },
}

/// Links reported by the most recent prior run stored under `storage`.
/// Returns an empty set when there is no prior artifact or it cannot be read.
pub fn load_previous_links(storage: &Path) -> HashSet<String> {
    let artifact = match latest_artifact(storage) {
        Ok(Some(path)) => path,
        Ok(None) => {
            info!("No previous results in {}, starting fresh", storage.display());
            return HashSet::new();
        }
        Err(e) => {
            warn!("Could not scan {} for previous results: {}", storage.display(), e);
            return HashSet::new();
        }
    };

    match read_links(&artifact) {
        Ok(links) => {
            info!(
                "Loaded {} previously reported links from {}",
                links.len(),
                artifact.display()
            );
            links
        }
        Err(e) => {
            warn!("Ignoring previous results: {}", e);
            HashSet::new()
        }
    }
}

/// Newest artifact in `storage` by modification time; equal times resolve to
/// the lexically greatest file name. A missing directory is not an error.
pub fn latest_artifact(storage: &Path) -> Result<Option<PathBuf>, HistoryError> {
    let entries = match std::fs::read_dir(storage) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(HistoryError::Io {
                path: storage.to_path_buf(),
                source,
            })
        }
    };

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(ARTIFACT_EXTENSION) {
            continue;
        }
        let modified = match entry.metadata() {
            Ok(meta) if meta.is_file() => match meta.modified() {
                Ok(modified) => modified,
                Err(e) => {
                    debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            },
            Ok(_) => continue,
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let is_newer = match &newest {
            None => true,
            Some((best_time, best_path)) => {
                (modified, path.file_name()) > (*best_time, best_path.file_name())
            }
        };
        if is_newer {
            newest = Some((modified, path));
        }
    }

    Ok(newest.map(|(_, path)| path))
}

/// Every link in the link column of `artifact`, header row skipped
pub fn read_links(artifact: &Path) -> Result<HashSet<String>, HistoryError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(artifact)
        .map_err(|source| csv_error(artifact, source))?;

    let header = reader
        .headers()
        .map_err(|source| csv_error(artifact, source))?;
    let found = header.get(LINK_COLUMN);
    if found != Some(HEADER[LINK_COLUMN]) {
        return Err(HistoryError::UnexpectedHeader {
            path: artifact.to_path_buf(),
            column: LINK_COLUMN,
            expected: HEADER[LINK_COLUMN],
            found: found.map(str::to_string),
        });
    }

    let mut links = HashSet::new();
    for record in reader.records() {
        let record = record.map_err(|source| csv_error(artifact, source))?;
        if let Some(link) = record.get(LINK_COLUMN).map(str::trim) {
            if !link.is_empty() {
                links.insert(link.to_string());
            }
        }
    }

    Ok(links)
}

fn csv_error(path: &Path, source: csv::Error) -> HistoryError {
    HistoryError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
