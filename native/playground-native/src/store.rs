//! File Store
//!
//! Holds the playground's virtual files in insertion order and tracks the
//! active one. Content updates are keyed lookups that overwrite in place; no
//! history is retained.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::NotFoundError;

/// Prefix that makes every file a module as far as the editor's language
/// service is concerned, so top-level declarations in one file do not clash
/// with another. The transformer strips it again.
pub const MODULE_MARKER: &str = "export {};\n";

/// Prefix `text` with [`MODULE_MARKER`] unless it already carries it.
pub fn with_module_marker(text: &str) -> String {
    if text.starts_with(MODULE_MARKER) {
        text.to_string()
    } else {
        format!("{}{}", MODULE_MARKER, text)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIRTUAL FILE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
    name: String,
    raw_source: String,
    /// Asset text the file was loaded from, before the marker was added.
    asset: String,
}

impl VirtualFile {
    fn from_asset(name: String, asset: String) -> Self {
        Self {
            raw_source: with_module_marker(&asset),
            name,
            asset,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_source(&self) -> &str {
        &self.raw_source
    }

    /// True once the content differs from what was loaded.
    pub fn is_modified(&self) -> bool {
        self.raw_source != with_module_marker(&self.asset)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE STORE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct FileStore {
    files: IndexMap<String, VirtualFile>,
    active: Option<String>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_files<I, K, V>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut store = Self::new();
        store.load(files);
        store
    }

    /// Replace all state with `files`. The first file becomes active.
    pub fn load<I, K, V>(&mut self, files: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.files = files
            .into_iter()
            .map(|(name, text)| {
                let name = name.into();
                (name.clone(), VirtualFile::from_asset(name, text.into()))
            })
            .collect();
        self.active = self.files.keys().next().cloned();

        info!(files = self.files.len(), active = ?self.active, "loaded playground files");
    }

    /// Merge a fresh asset collection into the store.
    ///
    /// A surviving file keeps its edits unless its asset text changed; files
    /// missing from `files` are dropped. The active file stays active when it
    /// survives, otherwise the first file takes over.
    pub fn reload<I, K, V>(&mut self, files: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut previous = std::mem::take(&mut self.files);
        let mut kept_edits = 0usize;

        for (name, text) in files {
            let name = name.into();
            let asset = text.into();
            let file = match previous.swap_remove(&name) {
                Some(existing) if existing.asset == asset => {
                    if existing.is_modified() {
                        kept_edits += 1;
                    }
                    existing
                }
                _ => VirtualFile::from_asset(name.clone(), asset),
            };
            self.files.insert(name, file);
        }

        let survives = self
            .active
            .as_ref()
            .is_some_and(|name| self.files.contains_key(name));
        if !survives {
            self.active = self.files.keys().next().cloned();
        }

        info!(
            files = self.files.len(),
            dropped = previous.len(),
            kept_edits,
            active = ?self.active,
            "reloaded playground files"
        );
    }

    pub fn set_active(&mut self, name: &str) -> Result<(), NotFoundError> {
        if !self.files.contains_key(name) {
            return Err(NotFoundError::new(name));
        }
        debug!(file = name, "active file changed");
        self.active = Some(name.to_string());
        Ok(())
    }

    /// Overwrite a file's content verbatim.
    pub fn update(&mut self, name: &str, new_text: String) -> Result<(), NotFoundError> {
        let file = self
            .files
            .get_mut(name)
            .ok_or_else(|| NotFoundError::new(name))?;
        file.raw_source = new_text;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&VirtualFile> {
        self.files.get(name)
    }

    pub fn get_active(&self) -> Option<&VirtualFile> {
        self.active.as_deref().and_then(|name| self.files.get(name))
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn list_files(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_files() -> FileStore {
        FileStore::from_files([("A.tsx", "const a = 1;"), ("B.tsx", "const b = 2;")])
    }

    #[test]
    fn test_load_wraps_with_marker_and_activates_first() {
        let store = two_files();
        assert_eq!(store.list_files(), vec!["A.tsx", "B.tsx"]);
        assert_eq!(store.active_name(), Some("A.tsx"));
        assert_eq!(
            store.get("A.tsx").unwrap().raw_source(),
            "export {};\nconst a = 1;"
        );
    }

    #[test]
    fn test_marker_not_doubled() {
        let store = FileStore::from_files([("A.tsx", "export {};\nlet x;")]);
        assert_eq!(store.get("A.tsx").unwrap().raw_source(), "export {};\nlet x;");
    }

    #[test]
    fn test_load_empty_leaves_active_unset() {
        let mut store = two_files();
        store.load(Vec::<(String, String)>::new());
        assert!(store.is_empty());
        assert_eq!(store.active_name(), None);
        assert!(store.get_active().is_none());
    }

    #[test]
    fn test_load_replaces_prior_state() {
        let mut store = two_files();
        store.set_active("B.tsx").unwrap();
        store.load([("C.tsx", "c")]);
        assert_eq!(store.list_files(), vec!["C.tsx"]);
        assert_eq!(store.active_name(), Some("C.tsx"));
    }

    #[test]
    fn test_set_active_unknown_keeps_active() {
        let mut store = two_files();
        let err = store.set_active("Missing.tsx").unwrap_err();
        assert_eq!(err, NotFoundError::new("Missing.tsx"));
        assert_eq!(store.active_name(), Some("A.tsx"));
    }

    #[test]
    fn test_update_is_verbatim() {
        let mut store = two_files();
        store.update("B.tsx", "no marker here".to_string()).unwrap();
        let b = store.get("B.tsx").unwrap();
        assert_eq!(b.raw_source(), "no marker here");
        assert!(b.is_modified());
        assert!(!store.get("A.tsx").unwrap().is_modified());
    }

    #[test]
    fn test_update_unknown_fails() {
        let mut store = two_files();
        assert!(store.update("Nope.tsx", String::new()).is_err());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_reload_keeps_edits_for_unchanged_assets() {
        let mut store = two_files();
        store.update("A.tsx", "edited".to_string()).unwrap();
        store.set_active("B.tsx").unwrap();

        store.reload([("A.tsx", "const a = 1;"), ("B.tsx", "const b = 3;")]);

        assert_eq!(store.get("A.tsx").unwrap().raw_source(), "edited");
        assert_eq!(
            store.get("B.tsx").unwrap().raw_source(),
            "export {};\nconst b = 3;"
        );
        assert_eq!(store.active_name(), Some("B.tsx"));
    }

    #[test]
    fn test_reload_resets_changed_asset_and_drops_vanished() {
        let mut store = two_files();
        store.update("A.tsx", "edited".to_string()).unwrap();
        store.set_active("B.tsx").unwrap();

        store.reload([("A.tsx", "const a = 42;"), ("C.tsx", "c")]);

        assert_eq!(store.list_files(), vec!["A.tsx", "C.tsx"]);
        assert_eq!(
            store.get("A.tsx").unwrap().raw_source(),
            "export {};\nconst a = 42;"
        );
        assert_eq!(store.active_name(), Some("A.tsx"));
    }
}
