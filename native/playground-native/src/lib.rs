//! # Playground Native
//!
//! The edit-to-preview pipeline of an in-browser component playground.
//!
//! ```text
//! FileStore ──▶ SourceTransformer ──▶ HostBuilder ──▶ IsolatedRenderer
//!                     │ failure                            ▲
//!                     └──────────▶ HostBuilder::build_error ┘
//! ```
//!
//! ## Pipeline Invariants
//!
//! 1. **Single pass**: a trigger reads the active file, transforms it, builds
//!    a host document and presents it, synchronously and in that order.
//!
//! 2. **Total transform**: `transform` never fails past its boundary. A
//!    broken file yields a diagnostic document, never a stale preview.
//!
//! 3. **Function scope per file**: every transformed file runs inside its own
//!    immediately-invoked function, so top-level names never collide.
//!
//! 4. **Whole-document replacement**: the sandbox surface is replaced on
//!    every run. Timers and handlers of the previous run die with it.
//!
//! 5. **Active file exists**: the store's active name, when set, is always
//!    one of its files.

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod document;
pub mod editor;
pub mod error;
pub mod logging;
pub mod renderer;
pub mod store;
pub mod transform;

#[cfg(test)]
mod scenario_tests;

pub use config::PlaygroundConfig;
pub use coordinator::{RunCoordinator, RunOutcome, RunState, Trigger};
pub use document::HostBuilder;
pub use editor::{EditorChange, EditorView};
pub use error::{NotFoundError, PlaygroundError};
pub use renderer::{FileSurface, IsolatedRenderer, MemorySurface, Surface};
pub use store::{FileStore, VirtualFile, MODULE_MARKER};
pub use transform::{transform, SourceTransformer, TransformResult};

#[cfg(feature = "napi")]
#[napi]
pub fn playground_bridge() -> String {
    logging::init(None);
    "Playground Native Bridge Connected".to_string()
}
