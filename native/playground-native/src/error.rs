//! Error types for the playground pipeline.
//!
//! Transform failures are deliberately absent here: the transformer is total
//! and reports them as a [`crate::transform::TransformResult`] value.

use std::path::PathBuf;
use thiserror::Error;

/// An operation referenced a file name the store does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no file named `{name}` in the playground")]
pub struct NotFoundError {
    pub name: String,
}

impl NotFoundError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Error)]
pub enum PlaygroundError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("invalid playground config: {message}")]
    Config { message: String },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to discover sources under {}: {message}", path.display())]
    Discovery { path: PathBuf, message: String },

    #[error("preview surface rejected content: {message}")]
    Surface { message: String },
}

impl PlaygroundError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlaygroundError>;
