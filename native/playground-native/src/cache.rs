use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::transform::TransformResult;

/// Last transform result per file, keyed by a hash of the source it came
/// from. One entry per file name, so the cache never outgrows the store.
#[derive(Debug, Default)]
pub struct TransformCache {
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    hash: String,
    result: TransformResult,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute_hash(source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn get(&self, file_name: &str, source: &str) -> Option<&TransformResult> {
        let entry = self.entries.get(file_name)?;
        if entry.hash == Self::compute_hash(source) {
            Some(&entry.result)
        } else {
            None
        }
    }

    pub fn set(&mut self, file_name: &str, source: &str, result: TransformResult) {
        let hash = Self::compute_hash(source);
        self.entries
            .insert(file_name.to_string(), CacheEntry { hash, result });
    }

    /// Drop entries for files that are no longer present.
    pub fn retain_files(&mut self, names: &[&str]) {
        self.entries.retain(|name, _| names.contains(&name.as_str()));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
