//! # Execution Host Builder
//!
//! Assembles the standalone documents the sandbox runs. Two shapes:
//!
//! - **Run document**: runtime library `<script src>` tags in `<head>`, the
//!   mount point `<div id="{mountId}">`, an optional bootstrap block, then the
//!   transformed script inline at the end of `<body>`.
//! - **Error document**: the diagnostic as red preformatted text. No script.
//!
//! Both are pure functions of their input and the builder settings.
//!
//! ## Bootstrap
//!
//! The bootstrap block runs inside the sandbox before the user script:
//! - `error` and `unhandledrejection` listeners that swap the mount point's
//!   content for the message of any uncaught failure (the sandbox reports its
//!   own runtime failures);
//! - a global `root` handle whose `render` creates the renderer root lazily,
//!   so `root.render(<App />)` works without boilerplate.

#[cfg(feature = "napi")]
use napi_derive::napi;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::config::{is_dotted_path, PlaygroundConfig, RuntimeLibrary};

lazy_static! {
    /// Sequences that would end or confuse an inline `<script>` element.
    static ref SCRIPT_CLOSE_RE: Regex = Regex::new(r"(?i)</(script)").unwrap();
    static ref COMMENT_OPEN_RE: Regex = Regex::new(r"<!--").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOST BUILDER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct HostBuilder {
    mount_id: String,
    libraries: Vec<RuntimeLibrary>,
    root_factory: Option<String>,
    report_runtime_errors: bool,
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new(&PlaygroundConfig::default())
    }
}

impl HostBuilder {
    /// A `rootFactory` that is not a dotted global path disables the root
    /// handle rather than reaching the bootstrap script.
    pub fn new(config: &PlaygroundConfig) -> Self {
        let root_factory = match config.provide_root_handle {
            true if is_dotted_path(&config.root_factory) => Some(config.root_factory.clone()),
            true => {
                warn!(root_factory = %config.root_factory, "ignoring rootFactory; root handle disabled");
                None
            }
            false => None,
        };
        Self {
            mount_id: config.mount_id.clone(),
            libraries: config.libraries.clone(),
            root_factory,
            report_runtime_errors: config.report_runtime_errors,
        }
    }

    pub fn mount_id(&self) -> &str {
        &self.mount_id
    }

    /// Build the document that runs `executable_script`.
    pub fn build(&self, executable_script: &str) -> String {
        let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n");
        for lib in &self.libraries {
            html.push_str(&format!(
                "<script crossorigin src=\"{}\"></script>\n",
                escape_html(&lib.url)
            ));
        }
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<div id=\"{}\"></div>\n", escape_html(&self.mount_id)));

        let bootstrap = self.bootstrap();
        if !bootstrap.is_empty() {
            html.push_str("<script>\n");
            html.push_str(&bootstrap);
            html.push_str("</script>\n");
        }

        html.push_str("<script>\n");
        html.push_str(&escape_inline_script(executable_script));
        if !executable_script.ends_with('\n') {
            html.push('\n');
        }
        html.push_str("</script>\n</body>\n</html>\n");
        html
    }

    /// Build the document that shows `diagnostic` in place of a preview.
    pub fn build_error(&self, diagnostic: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n</head>\n<body>\n\
             <pre style=\"color: red; white-space: pre-wrap; font-family: monospace;\">{}</pre>\n\
             </body>\n</html>\n",
            escape_html(diagnostic)
        )
    }

    fn bootstrap(&self) -> String {
        let mut js = String::new();
        let mount_id = js_string(&self.mount_id);

        if self.report_runtime_errors {
            js.push_str(&format!(
                r#"(function () {{
  function show(message) {{
    var pre = document.createElement("pre");
    pre.style.color = "red";
    pre.style.whiteSpace = "pre-wrap";
    pre.textContent = String(message);
    var mount = document.getElementById({id});
    if (mount) {{ mount.replaceChildren(pre); }} else {{ document.body.appendChild(pre); }}
  }}
  window.addEventListener("error", function (event) {{ show(event.message || event.error); }});
  window.addEventListener("unhandledrejection", function (event) {{ show(event.reason); }});
}})();
"#,
                id = mount_id
            ));
        }

        if let Some(factory) = &self.root_factory {
            js.push_str(&format!(
                r#"var root = (function (container) {{
  var instance = null;
  return {{
    render: function (element) {{
      if (!instance) {{ instance = {factory}(container); }}
      instance.render(element);
    }},
    unmount: function () {{
      if (instance) {{ instance.unmount(); instance = null; }}
    }}
  }};
}})(document.getElementById({id}));
"#,
                factory = factory,
                id = mount_id
            ));
        }

        escape_inline_script(&js)
    }
}

/// Quote `text` as a JS string literal.
fn js_string(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

/// Escape text for element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Keep script text from terminating its enclosing `<script>` element.
fn escape_inline_script(script: &str) -> String {
    let closed = SCRIPT_CLOSE_RE.replace_all(script, r"<\/$1");
    COMMENT_OPEN_RE.replace_all(&closed, r"<\!--").to_string()
}

lazy_static! {
    static ref DEFAULT_BUILDER: HostBuilder = HostBuilder::default();
}

pub fn build(executable_script: &str) -> String {
    DEFAULT_BUILDER.build(executable_script)
}

pub fn build_error(diagnostic: &str) -> String {
    DEFAULT_BUILDER.build_error(diagnostic)
}

// ═══════════════════════════════════════════════════════════════════════════════
// INSPECTION
// ═══════════════════════════════════════════════════════════════════════════════

/// What a browser would see in a host document, minus execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub element_ids: Vec<String>,
    /// External script URLs in document order.
    pub script_sources: Vec<String>,
    /// Inline script bodies in document order.
    pub inline_scripts: Vec<String>,
    /// Text content outside `<script>`/`<style>`.
    pub text: String,
}

impl DocumentSummary {
    pub fn count_id(&self, id: &str) -> usize {
        self.element_ids.iter().filter(|i| *i == id).count()
    }

    pub fn has_scripts(&self) -> bool {
        !self.script_sources.is_empty() || !self.inline_scripts.is_empty()
    }
}

/// Parse `markup` with an HTML5 parser and summarize it.
pub fn inspect(markup: &str) -> std::io::Result<DocumentSummary> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut markup.as_bytes())?;

    let mut summary = DocumentSummary::default();
    collect(&dom.document, &mut summary);
    Ok(summary)
}

fn collect(handle: &Handle, summary: &mut DocumentSummary) {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.to_string();
            let attributes = attrs.borrow();

            for attr in attributes.iter() {
                if attr.name.local.to_string() == "id" {
                    summary.element_ids.push(attr.value.to_string());
                }
            }

            if tag == "script" {
                let src = attributes
                    .iter()
                    .find(|attr| attr.name.local.to_string() == "src");
                match src {
                    Some(attr) => summary.script_sources.push(attr.value.to_string()),
                    None => summary.inline_scripts.push(text_of(handle)),
                }
                return;
            }
            if tag == "style" {
                return;
            }
        }
        NodeData::Text { contents } => {
            summary.text.push_str(&contents.borrow().to_string());
        }
        _ => {}
    }

    for child in handle.children.borrow().iter() {
        collect(child, summary);
    }
}

fn text_of(handle: &Handle) -> String {
    let mut text = String::new();
    for child in handle.children.borrow().iter() {
        if let NodeData::Text { contents } = &child.data {
            text.push_str(&contents.borrow().to_string());
        }
    }
    text
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn build_host_native(executable_script: String) -> String {
    build(&executable_script)
}

#[cfg(feature = "napi")]
#[napi]
pub fn build_error_native(diagnostic: String) -> String {
    build_error(&diagnostic)
}
