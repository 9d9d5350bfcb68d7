//! Isolated Renderer
//!
//! Owns the sandboxed surface that shows previews. Each `present` replaces
//! the surface's whole document; there is no patching, and nothing from a
//! previous run survives the replacement. Script execution inside the
//! surface is the surface's business and never reports back here.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::error::{PlaygroundError, Result};

/// Something that can display one standalone document at a time.
pub trait Surface {
    /// Replace the current document with `markup`.
    fn set_content(&mut self, markup: &str) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// ISOLATED RENDERER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct IsolatedRenderer<S: Surface> {
    surface: S,
    generation: u64,
}

impl<S: Surface> IsolatedRenderer<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            generation: 0,
        }
    }

    /// Hand `markup` to the surface. Returns without waiting for the
    /// document's scripts to run.
    pub fn present(&mut self, markup: &str) -> Result<()> {
        self.surface.set_content(markup)?;
        self.generation += 1;
        trace!(generation = self.generation, bytes = markup.len(), "presented document");
        Ok(())
    }

    /// Number of documents presented so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SURFACES
// ═══════════════════════════════════════════════════════════════════════════════

/// Keeps the current document in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    content: Option<String>,
    writes: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Surface for MemorySurface {
    fn set_content(&mut self, markup: &str) -> Result<()> {
        self.content = Some(markup.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Writes the current document to a file, e.g. for a browser with
/// live-reload pointed at it.
///
/// The document is written to a sibling temp file and renamed into place,
/// so readers see either the old or the new document, never a mix.
#[derive(Debug, Clone)]
pub struct FileSurface {
    path: PathBuf,
}

impl FileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Surface for FileSurface {
    fn set_content(&mut self, markup: &str) -> Result<()> {
        let temp = self.temp_path();
        fs::write(&temp, markup).map_err(|e| PlaygroundError::Surface {
            message: format!("could not write {}: {}", temp.display(), e),
        })?;
        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(PlaygroundError::Surface {
                message: format!("could not replace {}: {}", self.path.display(), e),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_replaces_whole_document() {
        let mut renderer = IsolatedRenderer::new(MemorySurface::new());
        renderer
            .present("<script>setTimeout(() => first(), 1000)</script>")
            .unwrap();
        renderer.present("<p>second</p>").unwrap();

        assert_eq!(renderer.surface().content(), Some("<p>second</p>"));
        assert!(!renderer.surface().content().unwrap().contains("first"));
        assert_eq!(renderer.generation(), 2);
        assert_eq!(renderer.surface().writes(), 2);
    }

    #[test]
    fn test_new_renderer_is_blank() {
        let renderer = IsolatedRenderer::new(MemorySurface::new());
        assert_eq!(renderer.generation(), 0);
        assert!(renderer.into_surface().content().is_none());
    }

    #[test]
    fn test_file_surface_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.html");
        let mut renderer = IsolatedRenderer::new(FileSurface::new(&path));

        renderer.present("<p>one</p>").unwrap();
        renderer.present("<p>two</p>").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>two</p>");
        assert!(!dir.path().join("preview.html.tmp").exists());
    }

    #[test]
    fn test_file_surface_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer =
            IsolatedRenderer::new(FileSurface::new(dir.path().join("nope/preview.html")));
        let err = renderer.present("<p/>").unwrap_err();
        assert!(matches!(err, PlaygroundError::Surface { .. }));
        assert_eq!(renderer.generation(), 0);
    }

    #[test]
    fn test_file_surface_failed_replace_removes_temp() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the target path makes the rename fail.
        let path = dir.path().join("preview.html");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let mut renderer = IsolatedRenderer::new(FileSurface::new(&path));
        let err = renderer.present("<p/>").unwrap_err();
        assert!(matches!(err, PlaygroundError::Surface { .. }));
        assert!(!dir.path().join("preview.html.tmp").exists());
        assert_eq!(renderer.generation(), 0);
    }
}
