//! Changelog discovery
//!
//! Expands the configured paths into the sorted, de-duplicated list of
//! changelog files to validate.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::document::Format;

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("changelog path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("error walking {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Collect changelog files from files and directories.
///
/// Directories are walked recursively and only files with a supported
/// extension are kept. Files named explicitly are always kept, so an
/// unsupported one is reported as a parse failure later. Paths in `skip`
/// (typically the rule and exclusion files) are left out.
pub fn collect_changelogs(
    paths: &[PathBuf],
    skip: &[PathBuf],
) -> Result<Vec<PathBuf>, DiscoverError> {
    let skip: BTreeSet<PathBuf> = skip.iter().map(|path| canonical(path)).collect();
    let mut found = BTreeSet::new();

    for root in paths {
        if !root.exists() {
            return Err(DiscoverError::NotFound(root.clone()));
        }
        if root.is_file() {
            found.insert(root.clone());
            continue;
        }
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|source| DiscoverError::Walk {
                path: root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if Format::from_path(path).is_none() {
                continue;
            }
            found.insert(path.to_path_buf());
        }
    }

    let files: Vec<PathBuf> = found
        .into_iter()
        .filter(|path| {
            let skipped = skip.contains(&canonical(path));
            if skipped {
                debug!(path = %path.display(), "skipping definition file");
            }
            !skipped
        })
        .collect();
    if files.is_empty() {
        warn!("no changelog files found");
    }
    Ok(files)
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
