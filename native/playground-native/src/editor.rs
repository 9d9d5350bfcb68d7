//! Editing-widget boundary types.
//!
//! The widget itself is external: it reports content changes and is told
//! what to display.

use serde::{Deserialize, Serialize};

/// A content-change notification from the widget. `text: None` means the
/// widget had nothing to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorChange {
    pub path: String,
    pub text: Option<String>,
}

impl EditorChange {
    pub fn new(path: impl Into<String>, text: Option<String>) -> Self {
        Self {
            path: path.into(),
            text,
        }
    }
}

/// What the widget should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorView {
    pub language: String,
    pub path: String,
    pub text: String,
    pub theme: String,
}
