//! Discovery Module
//!
//! Scans a directory for playground source files so a host can feed the File
//! Store from disk instead of bundled assets, and re-scan to pick up changes.

use indexmap::IndexMap;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::DiscoverySettings;
use crate::error::{PlaygroundError, Result};

/// Discover source files under `dir`, keyed by `/`-separated relative path.
///
/// Files are ordered by path. Unreadable files are skipped with a warning.
pub fn discover_sources(dir: &Path, settings: &DiscoverySettings) -> Result<IndexMap<String, String>> {
    if !dir.is_dir() {
        return Err(PlaygroundError::Discovery {
            path: dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let files = find_source_files(dir, &settings.extensions);
    let sources: Vec<(String, String)> = files
        .par_iter()
        .filter_map(|(name, path)| match fs::read_to_string(path) {
            Ok(text) => Some((name.clone(), text)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable source");
                None
            }
        })
        .collect();

    debug!(dir = %dir.display(), files = sources.len(), "discovered sources");
    Ok(sources.into_iter().collect())
}

/// Recursively find files with one of `extensions`, sorted by path.
fn find_source_files(dir: &Path, extensions: &[String]) -> Vec<(String, PathBuf)> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e == ext));
        if !matches {
            continue;
        }
        if let Some(name) = relative_name(dir, path) {
            files.push((name, path.to_path_buf()));
        }
    }

    files
}

fn relative_name(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    Some(parts.join("/"))
}
