//! Run Coordinator
//!
//! Drives one run per trigger through `Idle → Transforming → Presenting →
//! Idle`. Everything up to `present` is synchronous, so a trigger that
//! arrives later simply runs again and its document replaces the previous
//! one. Nothing is queued.

use indexmap::IndexMap;
use std::path::Path;
use tracing::debug;

use crate::cache::TransformCache;
use crate::config::PlaygroundConfig;
use crate::discovery::discover_sources;
use crate::document::HostBuilder;
use crate::editor::{EditorChange, EditorView};
use crate::error::Result;
use crate::renderer::{IsolatedRenderer, Surface};
use crate::store::FileStore;
use crate::transform::{SourceTransformer, TransformResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Transforming,
    Presenting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Run the active file.
    Run,
    /// Make the named file active, then run it.
    Select(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing to run; the surface was left alone.
    Skipped,
    Rendered { file: String },
    Failed { file: String, diagnostic: String },
}

pub struct RunCoordinator<S: Surface> {
    config: PlaygroundConfig,
    store: FileStore,
    transformer: SourceTransformer,
    host: HostBuilder,
    renderer: IsolatedRenderer<S>,
    cache: Option<TransformCache>,
    state: RunState,
    /// States entered during the most recent trigger.
    last_path: Vec<RunState>,
}

impl<S: Surface> RunCoordinator<S> {
    pub fn new(config: PlaygroundConfig, surface: S) -> Self {
        Self {
            transformer: SourceTransformer::new(&config),
            host: HostBuilder::new(&config),
            renderer: IsolatedRenderer::new(surface),
            cache: config.cache_transforms.then(TransformCache::new),
            store: FileStore::new(),
            state: RunState::Idle,
            last_path: Vec::new(),
            config,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FILES
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn load<I, K, V>(&mut self, files: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.store.load(files);
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }

    /// Merge a fresh asset collection, keeping edits where the asset is unchanged.
    pub fn reload<I, K, V>(&mut self, files: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.store.reload(files);
        if let Some(cache) = self.cache.as_mut() {
            cache.retain_files(&self.store.list_files());
        }
    }

    /// Discover sources under `dir` and merge them in with [`Self::reload`].
    pub fn reload_from_dir(&mut self, dir: &Path) -> Result<()> {
        let sources: IndexMap<String, String> = discover_sources(dir, &self.config.discovery)?;
        self.reload(sources);
        Ok(())
    }

    pub fn list_files(&self) -> Vec<&str> {
        self.store.list_files()
    }

    pub fn active_name(&self) -> Option<&str> {
        self.store.active_name()
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EDITOR BOUNDARY
    // ═══════════════════════════════════════════════════════════════════════════

    /// Apply a content change from the editing widget.
    ///
    /// Runs afterwards when the change is for the active file and
    /// `runOnChange` is set.
    pub fn handle_editor_change(&mut self, change: EditorChange) -> Result<Option<RunOutcome>> {
        let Some(text) = change.text else {
            return Ok(None);
        };
        self.store.update(&change.path, text)?;

        let is_active = self.store.active_name() == Some(change.path.as_str());
        if self.config.run_on_change && is_active {
            self.run().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn editor_view(&self) -> Option<EditorView> {
        let file = self.store.get_active()?;
        Some(EditorView {
            language: self.config.editor.language.clone(),
            path: file.name().to_string(),
            text: file.raw_source().to_string(),
            theme: self.config.editor.theme.clone(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TRIGGERS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn run(&mut self) -> Result<RunOutcome> {
        self.trigger(Trigger::Run)
    }

    pub fn select_and_run(&mut self, name: &str) -> Result<RunOutcome> {
        self.trigger(Trigger::Select(name.to_string()))
    }

    /// Picker selection: switch files, and run when `runOnSelect` is set.
    pub fn select(&mut self, name: &str) -> Result<Option<RunOutcome>> {
        if self.config.run_on_select {
            return self.select_and_run(name).map(Some);
        }
        self.store.set_active(name)?;
        Ok(None)
    }

    pub fn trigger(&mut self, trigger: Trigger) -> Result<RunOutcome> {
        self.last_path.clear();
        if let Trigger::Select(name) = &trigger {
            self.store.set_active(name)?;
        }

        self.transition(RunState::Transforming);
        let Some(file) = self.store.get_active() else {
            debug!("no active file; run skipped");
            self.transition(RunState::Idle);
            return Ok(RunOutcome::Skipped);
        };
        let name = file.name().to_string();
        let result = transform_cached(
            &self.transformer,
            self.cache.as_mut(),
            file.name(),
            file.raw_source(),
        );

        self.transition(RunState::Presenting);
        let (markup, outcome) = match result {
            TransformResult::Ok { executable_script } => (
                self.host.build(&executable_script),
                RunOutcome::Rendered { file: name },
            ),
            TransformResult::Failed { diagnostic } => (
                self.host.build_error(&diagnostic),
                RunOutcome::Failed {
                    file: name,
                    diagnostic,
                },
            ),
        };
        let presented = self.renderer.present(&markup);
        self.transition(RunState::Idle);

        presented?;
        Ok(outcome)
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
        self.last_path.push(next);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // OBSERVATION
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn last_path(&self) -> &[RunState] {
        &self.last_path
    }

    pub fn renderer(&self) -> &IsolatedRenderer<S> {
        &self.renderer
    }

    pub fn mount_id(&self) -> &str {
        self.host.mount_id()
    }
}

fn transform_cached(
    transformer: &SourceTransformer,
    cache: Option<&mut TransformCache>,
    name: &str,
    source: &str,
) -> TransformResult {
    let Some(cache) = cache else {
        return transformer.transform(name, source);
    };
    if let Some(hit) = cache.get(name, source) {
        debug!(file = name, "transform cache hit");
        return hit.clone();
    }
    let result = transformer.transform(name, source);
    cache.set(name, source, result.clone());
    result
}
