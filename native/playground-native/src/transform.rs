//! Source Transformer
//!
//! Turns one playground file (TSX/JSX with type annotations) into a plain
//! script body that can run next to other files in a single global scope:
//!
//! 1. Strip the module-scope marker, keeping its line so diagnostics line up
//!    with the editor buffer.
//! 2. Parse with oxc using the file name to pick the dialect.
//! 3. Lower module syntax: imports of runtime libraries become bindings to
//!    the library globals, `export` wrappers are dropped. Any other import is
//!    reported, since playground files cannot import each other.
//! 4. Strip types and lower JSX (classic runtime) with `oxc_transformer`.
//! 5. Wrap the generated code in an immediately-invoked function so
//!    top-level declarations never collide across files. Files that use
//!    top-level `await` get an `async` wrapper.
//!
//! `transform` is total: every failure, including an internal panic, comes
//! back as [`TransformResult::Failed`] with a readable diagnostic.

#[cfg(feature = "napi")]
use napi_derive::napi;
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_ast_visit::{walk, Visit};
use oxc_codegen::Codegen;
use oxc_diagnostics::{GraphicalReportHandler, GraphicalTheme, NamedSource, OxcDiagnostic};
use oxc_parser::Parser;
use oxc_semantic::{Scoping, SemanticBuilder};
use oxc_span::{SourceType, SPAN};
use oxc_syntax::scope::ScopeFlags;
use oxc_transformer::{JsxOptions, JsxRuntime, TransformOptions, Transformer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::debug;

use crate::config::{is_js_identifier, PlaygroundConfig};
use crate::store::MODULE_MARKER;

// ═══════════════════════════════════════════════════════════════════════════════
// RESULT TYPE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TransformResult {
    Ok { executable_script: String },
    Failed { diagnostic: String },
}

impl TransformResult {
    fn failed(diagnostic: String) -> Self {
        Self::Failed { diagnostic }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn executable_script(&self) -> Option<&str> {
        match self {
            Self::Ok { executable_script } => Some(executable_script),
            Self::Failed { .. } => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Ok { .. } => None,
            Self::Failed { diagnostic } => Some(diagnostic),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFORMER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct SourceTransformer {
    config: PlaygroundConfig,
}

impl Default for SourceTransformer {
    fn default() -> Self {
        Self::new(&PlaygroundConfig::default())
    }
}

impl SourceTransformer {
    pub fn new(config: &PlaygroundConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn transform(&self, name: &str, raw_source: &str) -> TransformResult {
        match panic::catch_unwind(AssertUnwindSafe(|| self.transform_inner(name, raw_source))) {
            Ok(result) => result,
            Err(_) => TransformResult::failed(format!(
                "{}\n\ninternal transformer error",
                failure_header(name)
            )),
        }
    }

    fn transform_inner(&self, name: &str, raw_source: &str) -> TransformResult {
        let body = strip_module_marker(raw_source);
        let allocator = Allocator::default();
        let source_type = source_type_for(name);

        let ret = Parser::new(&allocator, &body, source_type).parse();
        if ret.panicked || !ret.errors.is_empty() {
            return self.fail(name, &body, ret.errors);
        }
        let mut program = ret.program;

        let checked = SemanticBuilder::new()
            .with_check_syntax_error(true)
            .build(&program);
        if !checked.errors.is_empty() {
            return self.fail(name, &body, checked.errors);
        }
        let type_only = type_only_imports(&program, checked.semantic.scoping());
        drop(checked);

        let ast = AstBuilder::new(&allocator);
        let mut prelude = Vec::new();
        if let Err(error) = self.lower_module_syntax(ast, &mut program, &type_only, &mut prelude) {
            return self.fail(name, &body, vec![error]);
        }

        let mut top_level_await = TopLevelAwait::default();
        top_level_await.visit_program(&program);

        // Import bindings are gone, so symbols are rebuilt for the transformer.
        let semantic = SemanticBuilder::new().build(&program);
        if !semantic.errors.is_empty() {
            return self.fail(name, &body, semantic.errors);
        }
        let scoping = semantic.semantic.into_scoping();

        let options = self.transform_options();
        let transformed = Transformer::new(&allocator, Path::new(name), &options)
            .build_with_scoping(scoping, &mut program);
        if !transformed.errors.is_empty() {
            return self.fail(name, &body, transformed.errors);
        }

        let code = Codegen::new().build(&program).code;
        TransformResult::Ok {
            executable_script: wrap_in_function_scope(&prelude, &code, top_level_await.found),
        }
    }

    fn fail(&self, name: &str, source: &str, errors: Vec<OxcDiagnostic>) -> TransformResult {
        debug!(file = name, errors = errors.len(), "transform failed");
        TransformResult::failed(render_diagnostics(name, source, errors))
    }

    fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            jsx: JsxOptions {
                runtime: JsxRuntime::Classic,
                pragma: Some(self.config.jsx.pragma.clone()),
                pragma_frag: Some(self.config.jsx.pragma_frag.clone()),
                ..JsxOptions::default()
            },
            ..TransformOptions::default()
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MODULE SYNTAX LOWERING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Remove import/export syntax from the top level of `program`.
    ///
    /// Bindings pulled from runtime libraries are appended to `prelude` as
    /// `const` declarations against the library global. Named imports listed
    /// in `type_only` are dropped.
    fn lower_module_syntax<'a>(
        &self,
        ast: AstBuilder<'a>,
        program: &mut Program<'a>,
        type_only: &HashSet<String>,
        prelude: &mut Vec<String>,
    ) -> Result<(), OxcDiagnostic> {
        for stmt in program.body.iter_mut() {
            let taken = std::mem::replace(stmt, ast.statement_empty(SPAN));
            *stmt = match taken {
                Statement::ImportDeclaration(decl) => {
                    self.rebind_import(&decl, type_only, prelude)?;
                    ast.statement_empty(SPAN)
                }
                Statement::ExportDefaultDeclaration(decl) => {
                    let ExportDefaultDeclaration { declaration, .. } = decl.unbox();
                    unwrap_default_export(ast, declaration)
                }
                Statement::ExportNamedDeclaration(decl) => {
                    if let Some(source) = &decl.source {
                        return Err(cross_file_import(&source.value, source.span));
                    }
                    let ExportNamedDeclaration { declaration, .. } = decl.unbox();
                    match declaration {
                        Some(declaration) => declaration_statement(ast, declaration),
                        None => ast.statement_empty(SPAN),
                    }
                }
                Statement::ExportAllDeclaration(decl) => {
                    return Err(cross_file_import(&decl.source.value, decl.source.span));
                }
                other => other,
            };
        }
        Ok(())
    }

    fn rebind_import(
        &self,
        decl: &ImportDeclaration<'_>,
        type_only: &HashSet<String>,
        prelude: &mut Vec<String>,
    ) -> Result<(), OxcDiagnostic> {
        if decl.import_kind.is_type() {
            return Ok(());
        }

        let specifier = decl.source.value.as_str();
        let Some(library) = self.config.library_for_module(specifier) else {
            return Err(cross_file_import(specifier, decl.source.span));
        };
        let global = library.global.as_str();

        let Some(specifiers) = &decl.specifiers else {
            return Ok(());
        };
        for item in specifiers {
            match item {
                ImportDeclarationSpecifier::ImportSpecifier(spec) => {
                    let local = spec.local.name.as_str();
                    if spec.import_kind.is_type() || type_only.contains(local) {
                        continue;
                    }
                    let imported = module_export_name(&spec.imported);
                    if imported == "default" {
                        push_global_binding(prelude, local, global);
                    } else {
                        prelude.push(format!(
                            "const {} = {}{};",
                            local,
                            global,
                            member_access(&imported)
                        ));
                    }
                }
                ImportDeclarationSpecifier::ImportDefaultSpecifier(spec) => {
                    push_global_binding(prelude, spec.local.name.as_str(), global);
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(spec) => {
                    push_global_binding(prelude, spec.local.name.as_str(), global);
                }
            }
        }
        Ok(())
    }
}

/// Named imports that are never read as values: `FC` in
/// `import { FC } from 'react'` when it only appears in annotations.
fn type_only_imports(program: &Program<'_>, scoping: &Scoping) -> HashSet<String> {
    let mut names = HashSet::new();
    for stmt in &program.body {
        let Statement::ImportDeclaration(decl) = stmt else {
            continue;
        };
        let Some(specifiers) = &decl.specifiers else {
            continue;
        };
        for item in specifiers {
            let ImportDeclarationSpecifier::ImportSpecifier(spec) = item else {
                continue;
            };
            let Some(symbol_id) = spec.local.symbol_id.get() else {
                continue;
            };
            let read_as_value = scoping
                .get_resolved_references(symbol_id)
                .any(|reference| reference.is_value());
            if !read_as_value {
                names.insert(spec.local.name.to_string());
            }
        }
    }
    names
}

/// Finds `await` outside any function body.
#[derive(Default)]
struct TopLevelAwait {
    found: bool,
}

impl<'a> Visit<'a> for TopLevelAwait {
    fn visit_await_expression(&mut self, _expr: &AwaitExpression<'a>) {
        self.found = true;
    }

    fn visit_for_of_statement(&mut self, stmt: &ForOfStatement<'a>) {
        if stmt.r#await {
            self.found = true;
        }
        walk::walk_for_of_statement(self, stmt);
    }

    // Function bodies are their own await context.
    fn visit_function(&mut self, _func: &Function<'a>, _flags: ScopeFlags) {}

    fn visit_arrow_function_expression(&mut self, _expr: &ArrowFunctionExpression<'a>) {}
}

fn push_global_binding(prelude: &mut Vec<String>, local: &str, global: &str) {
    // `const React = React;` would shadow the global with itself.
    if local != global {
        prelude.push(format!("const {} = {};", local, global));
    }
}

fn module_export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(s) => s.value.to_string(),
    }
}

fn member_access(property: &str) -> String {
    if is_js_identifier(property) {
        format!(".{}", property)
    } else {
        let quoted =
            serde_json::to_string(property).unwrap_or_else(|_| format!("\"{}\"", property));
        format!("[{}]", quoted)
    }
}

fn cross_file_import(specifier: &str, span: oxc_span::Span) -> OxcDiagnostic {
    OxcDiagnostic::error(format!(
        "Cannot import `{}`: playground files run in one shared scope and cannot import each other",
        specifier
    ))
    .with_label(span)
    .with_help("Remove the import and reference the declaration directly")
}

fn unwrap_default_export<'a>(
    ast: AstBuilder<'a>,
    declaration: ExportDefaultDeclarationKind<'a>,
) -> Statement<'a> {
    match declaration {
        ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
            if func.id.is_some() {
                Statement::FunctionDeclaration(func)
            } else {
                ast.statement_expression(SPAN, Expression::FunctionExpression(func))
            }
        }
        ExportDefaultDeclarationKind::ClassDeclaration(class) => {
            if class.id.is_some() {
                Statement::ClassDeclaration(class)
            } else {
                ast.statement_expression(SPAN, Expression::ClassExpression(class))
            }
        }
        ExportDefaultDeclarationKind::TSInterfaceDeclaration(decl) => {
            Statement::TSInterfaceDeclaration(decl)
        }
        kind if kind.is_expression() => ast.statement_expression(SPAN, kind.into_expression()),
        _ => ast.statement_empty(SPAN),
    }
}

fn declaration_statement<'a>(ast: AstBuilder<'a>, declaration: Declaration<'a>) -> Statement<'a> {
    match declaration {
        Declaration::VariableDeclaration(d) => Statement::VariableDeclaration(d),
        Declaration::FunctionDeclaration(d) => Statement::FunctionDeclaration(d),
        Declaration::ClassDeclaration(d) => Statement::ClassDeclaration(d),
        Declaration::TSTypeAliasDeclaration(d) => Statement::TSTypeAliasDeclaration(d),
        Declaration::TSInterfaceDeclaration(d) => Statement::TSInterfaceDeclaration(d),
        Declaration::TSEnumDeclaration(d) => Statement::TSEnumDeclaration(d),
        Declaration::TSModuleDeclaration(d) => Statement::TSModuleDeclaration(d),
        #[allow(unreachable_patterns)]
        _ => ast.statement_empty(SPAN),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Drop the marker prefix on an exact match, leaving its line break behind.
fn strip_module_marker(raw_source: &str) -> String {
    match raw_source.strip_prefix(MODULE_MARKER) {
        Some(rest) => format!("\n{}", rest),
        None => raw_source.to_string(),
    }
}

fn source_type_for(name: &str) -> SourceType {
    let source_type = SourceType::from_path(Path::new(name)).unwrap_or_else(|_| SourceType::tsx());
    let source_type = if source_type.is_typescript() {
        source_type
    } else {
        source_type.with_jsx(true)
    };
    source_type.with_module(true)
}

fn wrap_in_function_scope(prelude: &[String], code: &str, is_async: bool) -> String {
    let mut out = String::with_capacity(code.len() + 64);
    if is_async {
        out.push_str("(async () => {\n\"use strict\";\n");
    } else {
        out.push_str("(() => {\n\"use strict\";\n");
    }
    for line in prelude {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(code);
    if !code.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("})();\n");
    out
}

fn failure_header(name: &str) -> String {
    format!("Failed to transform {}", name)
}

fn render_diagnostics(name: &str, source: &str, errors: Vec<OxcDiagnostic>) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut out = failure_header(name);
    out.push('\n');

    for error in errors {
        let message = error.to_string();
        let report = error.with_source_code(NamedSource::new(name, source.to_string()));
        let mut rendered = String::new();
        if handler.render_report(&mut rendered, &*report).is_err() || rendered.trim().is_empty() {
            rendered = message;
        }
        out.push('\n');
        out.push_str(rendered.trim_end());
        out.push('\n');
    }

    out
}

lazy_static::lazy_static! {
    static ref DEFAULT_TRANSFORMER: SourceTransformer = SourceTransformer::default();
}

/// Transform with the default runtime libraries and JSX pragma.
pub fn transform(name: &str, raw_source: &str) -> TransformResult {
    DEFAULT_TRANSFORMER.transform(name, raw_source)
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn transform_source_native(name: String, source: String) -> napi::Result<serde_json::Value> {
    serde_json::to_value(transform(&name, &source))
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
