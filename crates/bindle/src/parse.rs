//! Thin seam over the oxc parser and code generator
//!
//! Every tree produced here lives in the caller's arena, so a `Program<'a>` can be
//! kept in the module table for as long as the allocator outlives it.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_codegen::Codegen;
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;
use serde::de::IgnoredAny;

use crate::{
    error::{BundleError, Result},
    types::SourceKind,
};

/// Parse one source file into an owned, mutable tree
///
/// Files are parsed as CommonJS scripts. Because every body is later placed inside a
/// registration function, a top-level `return` is accepted, and a leading byte order
/// mark and any hashbang line are dropped.
///
/// A JSON file becomes `module.exports = JSON.parse("<text>");` so the engine's own
/// JSON semantics apply: `__proto__` stays an own key and out-of-range numbers
/// become `Infinity`.
pub fn parse_module<'a>(
    allocator: &'a Allocator,
    path: &Path,
    source: &str,
    kind: SourceKind,
) -> Result<Program<'a>> {
    let source = source.strip_prefix(BYTE_ORDER_MARK).unwrap_or(source);
    let text = match kind {
        SourceKind::Script => allocator.alloc_str(source),
        SourceKind::Json => allocator.alloc_str(&json_module_source(path, source)?),
    };

    let mut program = parse_script(allocator, text).map_err(|message| BundleError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    program.hashbang = None;
    Ok(program)
}

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Check the JSON syntax and wrap the text in a `JSON.parse` export
fn json_module_source(path: &Path, source: &str) -> Result<String> {
    let parse_error = |e: serde_json::Error| BundleError::Parse {
        path: path.to_path_buf(),
        message: format!("invalid JSON: {e}"),
    };
    // Syntax only: numbers are skipped, not converted, so `1e400` is accepted
    serde_json::from_str::<IgnoredAny>(source).map_err(parse_error)?;
    let literal = serde_json::to_string(source.trim()).map_err(parse_error)?;
    Ok(format!("module.exports = JSON.parse({literal});\n"))
}

/// Parse arena-allocated script text, joining every diagnostic into one message
pub(crate) fn parse_script<'a>(
    allocator: &'a Allocator,
    text: &'a str,
) -> std::result::Result<Program<'a>, String> {
    let options = ParseOptions {
        allow_return_outside_function: true,
        ..ParseOptions::default()
    };
    let ret = Parser::new(allocator, text, SourceType::cjs())
        .with_options(options)
        .parse();

    if ret.panicked || !ret.errors.is_empty() {
        let message = if ret.errors.is_empty() {
            "parser aborted".to_owned()
        } else {
            ret.errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        };
        return Err(message);
    }
    Ok(ret.program)
}

/// Print a tree back to source text
pub fn print(program: &Program<'_>) -> String {
    Codegen::new().build(program).code
}
