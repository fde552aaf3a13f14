//! Recursive template copy.

use std::path::{Path, PathBuf};

use super::builtin::{BundledTemplate, TEMPLATE_MANIFEST};
use crate::error::Result;

/// Maps a template-relative path to the path written in the project.
pub type Rename = fn(&Path) -> PathBuf;

/// Switch JavaScript file extensions to their TypeScript counterparts.
pub fn to_typescript_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js") => path.with_extension("ts"),
        Some("jsx") => path.with_extension("tsx"),
        _ => path.to_path_buf(),
    }
}

fn target_path(target: &Path, relative: &Path, rename: Option<Rename>) -> PathBuf {
    match rename {
        Some(rename) => target.join(rename(relative)),
        None => target.join(relative),
    }
}

/// Copy a directory tree into `target`, returning the written paths.
///
/// Existing files are overwritten. The template manifest is not copied.
pub async fn copy_dir(source: &Path, target: &Path, rename: Option<Rename>) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let mut pending = vec![PathBuf::new()];

    while let Some(relative) = pending.pop() {
        tokio::fs::create_dir_all(target.join(&relative)).await?;

        let mut entries = tokio::fs::read_dir(source.join(&relative)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let child = relative.join(entry.file_name());
            let file_type = entry.file_type().await?;

            if file_type.is_dir() {
                pending.push(child);
            } else if file_type.is_file() && child != Path::new(TEMPLATE_MANIFEST) {
                let destination = target_path(target, &child, rename);
                tokio::fs::copy(entry.path(), &destination).await?;
                written.push(destination);
            }
        }
    }

    written.sort();
    tracing::debug!("Copied {} files from {}", written.len(), source.display());
    Ok(written)
}

/// Write the files of a bundled template into `target`.
pub async fn write_bundled(
    template: &BundledTemplate,
    target: &Path,
    rename: Option<Rename>,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for (relative, contents) in template.files() {
        let destination = target_path(target, relative, rename);
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&destination, contents).await?;
        written.push(destination);
    }

    written.sort();
    tracing::debug!("Wrote {} files from template {}", written.len(), template.name);
    Ok(written)
}
