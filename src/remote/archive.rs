//! Streaming tarball extraction.
//!
//! The repository tarball is decompressed and unpacked entry by entry while
//! it downloads. Only the template's subtree is written, flattened so that
//! the target directory corresponds to `sub_path` inside the repository.

use flate2::read::GzDecoder;
use futures::TryStreamExt;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tar::EntryType;
use tokio_util::io::{StreamReader, SyncIoBridge};

use super::fetch::GitHubClient;
use super::reference::RepositoryReference;
use crate::error::{Result, ScaffoldError};

/// Counts reported by an extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Entries written to the target directory.
    pub written: usize,
    /// Entries outside the template subtree or otherwise rejected.
    pub skipped: usize,
}

/// Unpacks the subtree of a tar stream into a directory.
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    target: PathBuf,
    sub_path: String,
}

impl ArchiveExtractor {
    /// Create an extractor writing into `target`.
    ///
    /// `sub_path` selects the directory inside the repository whose contents
    /// become the root of `target`; an empty string selects the whole repository.
    pub fn new(target: impl Into<PathBuf>, sub_path: &str) -> Self {
        Self {
            target: target.into(),
            sub_path: sub_path.trim_matches('/').to_string(),
        }
    }

    /// Leading components stripped from every entry path.
    fn strip_count(&self) -> usize {
        let depth = self.sub_path.split('/').filter(|s| !s.is_empty()).count();
        depth + 1
    }

    /// Extract an uncompressed tar stream.
    pub fn extract<R: Read>(&self, reader: R) -> Result<ExtractSummary> {
        std::fs::create_dir_all(&self.target)?;

        let mut archive = tar::Archive::new(reader);
        let mut summary = ExtractSummary::default();
        let mut prefix: Option<String> = None;
        let strip = self.strip_count();

        for entry in archive.entries()? {
            let mut entry = entry?;
            let entry_type = entry.header().entry_type();

            // The hosting service emits a global pax header ahead of the real entries.
            if matches!(entry_type, EntryType::XGlobalHeader | EntryType::XHeader) {
                continue;
            }

            let raw_path = match std::str::from_utf8(&entry.path_bytes()) {
                Ok(path) => path.to_owned(),
                Err(_) => {
                    tracing::debug!("Skipping archive entry with a non UTF-8 name");
                    summary.skipped += 1;
                    continue;
                }
            };

            let prefix = prefix.get_or_insert_with(|| self.prefix_for(&raw_path));
            if !raw_path.starts_with(prefix.as_str()) {
                tracing::debug!("Skipping archive entry outside template: {raw_path}");
                summary.skipped += 1;
                continue;
            }

            let Some(relative) = contained_path(&raw_path, strip) else {
                if raw_path.trim_end_matches('/') != prefix.trim_end_matches('/') {
                    tracing::debug!("Skipping unsafe archive entry: {raw_path}");
                    summary.skipped += 1;
                }
                continue;
            };

            if entry_type.is_symlink() || entry_type.is_hard_link() {
                tracing::debug!("Skipping link entry: {raw_path}");
                summary.skipped += 1;
                continue;
            }

            let destination = self.target.join(&relative);
            if entry_type.is_dir() {
                std::fs::create_dir_all(&destination)?;
            } else if entry_type.is_file() || entry_type == EntryType::Continuous {
                if let Some(parent) = destination.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                entry.unpack(&destination)?;
                summary.written += 1;
            } else {
                summary.skipped += 1;
            }
        }

        tracing::debug!(
            "Extracted {} entries into {} ({} skipped)",
            summary.written,
            self.target.display(),
            summary.skipped
        );
        Ok(summary)
    }

    /// Extract a gzip-compressed tar stream.
    pub fn extract_gzip<R: Read>(&self, reader: R) -> Result<ExtractSummary> {
        self.extract(GzDecoder::new(reader))
    }

    /// The path prefix every kept entry must start with, given the first entry.
    fn prefix_for(&self, first_entry: &str) -> String {
        let top_level = first_entry.split('/').next().unwrap_or_default();
        if self.sub_path.is_empty() {
            format!("{top_level}/")
        } else {
            format!("{top_level}/{}/", self.sub_path)
        }
    }
}

/// Strip `strip` leading components, rejecting anything that could escape
/// the target directory. Returns `None` when nothing is left or the path is unsafe.
fn contained_path(raw: &str, strip: usize) -> Option<PathBuf> {
    let path = Path::new(raw);
    let mut kept = PathBuf::new();

    for (index, component) in path.components().enumerate() {
        match component {
            Component::Normal(part) => {
                if index >= strip {
                    kept.push(part);
                }
            }
            _ => return None,
        }
    }

    if kept.as_os_str().is_empty() {
        None
    } else {
        Some(kept)
    }
}

/// Download the repository tarball and extract the template subtree into `target`.
///
/// The target directory is created before the download starts. A failure
/// part-way through leaves already written files in place.
pub async fn download_and_extract(
    client: &GitHubClient,
    reference: &RepositoryReference,
    target: &Path,
) -> Result<ExtractSummary> {
    tokio::fs::create_dir_all(target).await?;

    let url = client.tarball_url(reference);
    tracing::info!("Downloading {reference}");
    let response = client.tarball(reference).await?;

    let stream = Box::pin(response.bytes_stream().map_err(io::Error::other));
    let reader = SyncIoBridge::new(StreamReader::new(stream));
    let extractor = ArchiveExtractor::new(target, &reference.sub_path);

    let download_failed = |message: String| ScaffoldError::DownloadFailed {
        url: url.clone(),
        message,
    };

    tokio::task::spawn_blocking(move || extractor.extract_gzip(reader))
        .await
        .map_err(|e| download_failed(e.to_string()))?
        .map_err(|e| match e {
            ScaffoldError::Io(io_err) => download_failed(io_err.to_string()),
            other => other,
        })
}
