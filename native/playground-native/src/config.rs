//! Playground configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PlaygroundError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// RUNTIME LIBRARIES
// ═══════════════════════════════════════════════════════════════════════════════

/// A runtime capability injected into the sandbox's global scope.
///
/// `global` is the bare name user scripts reference, `url` is where the host
/// document loads it from, and `modules` are the import specifiers that
/// resolve to it when a file imports the library explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeLibrary {
    pub global: String,
    pub url: String,
    #[serde(default)]
    pub modules: Vec<String>,
}

impl RuntimeLibrary {
    pub fn new(global: &str, url: &str, modules: &[&str]) -> Self {
        Self {
            global: global.to_string(),
            url: url.to_string(),
            modules: modules.iter().map(|m| m.to_string()).collect(),
        }
    }
}

fn default_libraries() -> Vec<RuntimeLibrary> {
    vec![
        RuntimeLibrary::new(
            "React",
            "https://unpkg.com/react@18/umd/react.development.js",
            &["react"],
        ),
        RuntimeLibrary::new(
            "ReactDOM",
            "https://unpkg.com/react-dom@18/umd/react-dom.development.js",
            &["react-dom", "react-dom/client"],
        ),
    ]
}

// ═══════════════════════════════════════════════════════════════════════════════
// SECTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsxSettings {
    pub pragma: String,
    pub pragma_frag: String,
}

impl Default for JsxSettings {
    fn default() -> Self {
        Self {
            pragma: "React.createElement".to_string(),
            pragma_frag: "React.Fragment".to_string(),
        }
    }
}

/// Display settings handed to the editing widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorSettings {
    pub language: String,
    pub theme: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            language: "typescript".to_string(),
            theme: "vs-dark".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscoverySettings {
    pub extensions: Vec<String>,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            extensions: ["tsx", "jsx", "ts", "js"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLAYGROUND CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaygroundConfig {
    pub mount_id: String,
    pub libraries: Vec<RuntimeLibrary>,
    pub jsx: JsxSettings,
    pub provide_root_handle: bool,
    /// Expression that creates a renderer root from a container element.
    pub root_factory: String,
    pub report_runtime_errors: bool,
    pub run_on_change: bool,
    pub run_on_select: bool,
    pub cache_transforms: bool,
    pub editor: EditorSettings,
    pub discovery: DiscoverySettings,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            mount_id: "root".to_string(),
            libraries: default_libraries(),
            jsx: JsxSettings::default(),
            provide_root_handle: true,
            root_factory: "ReactDOM.createRoot".to_string(),
            report_runtime_errors: true,
            run_on_change: true,
            run_on_select: true,
            cache_transforms: true,
            editor: EditorSettings::default(),
            discovery: DiscoverySettings::default(),
        }
    }
}

impl PlaygroundConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| PlaygroundError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| PlaygroundError::io(path, e))?;
        Self::from_json_str(&data)
    }

    fn validate(&self) -> Result<()> {
        if !is_html_id(&self.mount_id) {
            return Err(PlaygroundError::Config {
                message: format!("mountId `{}` is not a usable element id", self.mount_id),
            });
        }
        if self.provide_root_handle && !is_dotted_path(&self.root_factory) {
            return Err(PlaygroundError::Config {
                message: format!("rootFactory `{}` is not a dotted global path", self.root_factory),
            });
        }
        for lib in &self.libraries {
            if !is_js_identifier(&lib.global) {
                return Err(PlaygroundError::Config {
                    message: format!("library global `{}` is not an identifier", lib.global),
                });
            }
        }
        Ok(())
    }

    /// Find the runtime library an import specifier resolves to.
    pub fn library_for_module(&self, specifier: &str) -> Option<&RuntimeLibrary> {
        self.libraries
            .iter()
            .find(|lib| lib.modules.iter().any(|m| m == specifier))
    }
}

fn is_html_id(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `a.b.c` where every segment is an identifier.
pub(crate) fn is_dotted_path(s: &str) -> bool {
    s.split('.').all(is_js_identifier)
}

/// Check if string is a valid JavaScript identifier (ASCII subset)
pub(crate) fn is_js_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_object_is_default() {
        let config = PlaygroundConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PlaygroundConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = PlaygroundConfig::from_json_str(
            r#"{ "mountId": "app", "runOnChange": false, "editor": { "theme": "vs-light" } }"#,
        )
        .unwrap();
        assert_eq!(config.mount_id, "app");
        assert!(!config.run_on_change);
        assert_eq!(config.editor.theme, "vs-light");
        assert_eq!(config.editor.language, "typescript");
        assert_eq!(config.libraries.len(), 2);
    }

    #[test]
    fn test_rejects_bad_mount_id() {
        let err = PlaygroundConfig::from_json_str(r#"{ "mountId": "a b" }"#).unwrap_err();
        assert!(matches!(err, PlaygroundError::Config { .. }));
    }

    #[test]
    fn test_rejects_bad_library_global() {
        let err = PlaygroundConfig::from_json_str(
            r#"{ "libraries": [{ "global": "not-ident", "url": "x.js" }] }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not-ident"));
    }

    #[test]
    fn test_root_factory_must_be_dotted_path() {
        let err = PlaygroundConfig::from_json_str(r#"{ "rootFactory": "ReactDOM.create Root" }"#)
            .unwrap_err();
        assert!(matches!(err, PlaygroundError::Config { .. }));

        let config = PlaygroundConfig::from_json_str(
            r#"{ "rootFactory": "", "provideRootHandle": false }"#,
        )
        .unwrap();
        assert!(!config.provide_root_handle);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            PlaygroundConfig::from_json_str("{"),
            Err(PlaygroundError::Config { .. })
        ));
    }

    #[test]
    fn test_library_lookup() {
        let config = PlaygroundConfig::default();
        assert_eq!(config.library_for_module("react").unwrap().global, "React");
        assert_eq!(
            config.library_for_module("react-dom/client").unwrap().global,
            "ReactDOM"
        );
        assert!(config.library_for_module("./Button").is_none());
    }

    #[test]
    fn test_from_missing_path() {
        let err = PlaygroundConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, PlaygroundError::Io { .. }));
    }

    #[test]
    fn test_is_js_identifier() {
        assert!(is_js_identifier("React"));
        assert!(is_js_identifier("$lib_2"));
        assert!(!is_js_identifier("2lib"));
        assert!(!is_js_identifier(""));
    }

    #[test]
    fn test_is_dotted_path() {
        assert!(is_dotted_path("ReactDOM.createRoot"));
        assert!(is_dotted_path("createRoot"));
        assert!(!is_dotted_path("ReactDOM..createRoot"));
        assert!(!is_dotted_path("alert(1);x"));
    }
}
