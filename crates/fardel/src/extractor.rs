//! Asset extraction: turning one source file into specifiers plus code
//!
//! The graph builder does not care how a module's dependency specifiers are
//! discovered or how its body is compiled; it only consumes the
//! [`AssetExtractor`] contract: an ordered list of raw specifiers and a code
//! body that can run inside the emitted CommonJS-style runtime.
//!
//! The shipped implementation, [`EsModuleExtractor`], scans for top-level
//! ES-module import declarations and down-levels the source to CommonJS so
//! that the emitted runtime's `require`/`module`/`exports` triple is the
//! only module machinery the code needs. The scanner is line-pattern based
//! rather than a full parser; constructs it does not recognize pass through
//! verbatim. Multi-line import statements and `export ... from` re-exports
//! are not supported.

use std::{fmt::Write as _, fs, path::Path};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Output contract of asset extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedModule {
    /// Raw dependency specifiers in appearance order, not deduplicated
    pub specifiers: Vec<String>,
    /// Compiled body text, ready for embedding in a factory function
    pub code: String,
}

/// Capability consumed by the graph builder
///
/// Implementations must be pure functions of the file's contents: extracting
/// the same path twice yields the same result. Failures (unreadable file,
/// malformed source) propagate to the caller and abort the build.
pub trait AssetExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedModule>;
}

/// `import <bindings> from '<spec>'` or bare `import '<spec>'`
static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([ \t]*)import\s+(?:(.+?)\s+from\s+)?["']([^"']+)["'][ \t]*;?[ \t]*$"#)
        .expect("import regex is valid")
});

/// `export default <rest>`
static EXPORT_DEFAULT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([ \t]*)export\s+default\s+").expect("export default regex is valid"));

/// `export const|let|var <name> =`
static EXPORT_DECL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([ \t]*)export\s+(const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=")
        .expect("export declaration regex is valid")
});

/// `export [async] function <name>` or `export class <name>`
static EXPORT_HOISTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([ \t]*)export\s+((?:async\s+)?function\s*\*?\s*|class\s+)([A-Za-z_$][A-Za-z0-9_$]*)")
        .expect("export function/class regex is valid")
});

/// `export { a, b as c };` without a `from` clause
static EXPORT_LIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*export\s*\{([^}]*)\}[ \t]*;?[ \t]*$").expect("export list regex is valid")
});

/// ES-module import scanner and CommonJS down-leveler
///
/// Replaces what a real toolchain would do with a parser and a transform
/// pass: collect `ImportDeclaration` sources in order, then rewrite the
/// module so it speaks `require`/`exports`.
#[derive(Debug, Default)]
pub struct EsModuleExtractor;

impl EsModuleExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl AssetExtractor for EsModuleExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedModule> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read module at {}", path.display()))?;
        log::trace!("extracted {} ({} bytes)", path.display(), source.len());
        Ok(downlevel(&source))
    }
}

/// Parsed form of an import statement's binding list
#[derive(Debug, Default)]
struct ImportBindings {
    default: Option<String>,
    namespace: Option<String>,
    /// Contents between the braces of a named-import list, untranslated
    named: Option<String>,
}

fn parse_bindings(raw: &str) -> ImportBindings {
    let mut bindings = ImportBindings::default();
    let mut rest = raw.trim();

    // Leading default binding, possibly followed by `, {…}` or `, * as ns`
    if !rest.starts_with('{') && !rest.starts_with('*') {
        let end = rest.find(',').unwrap_or(rest.len());
        bindings.default = Some(rest[..end].trim().to_owned());
        rest = rest[end..].trim_start_matches(',').trim();
    }

    if let Some(inner) = rest.strip_prefix('{') {
        bindings.named = Some(inner.trim_end_matches('}').trim().to_owned());
    } else if let Some(ns) = rest.strip_prefix('*') {
        bindings.namespace = Some(ns.trim().trim_start_matches("as").trim().to_owned());
    }

    bindings
}

/// Translate `a, b as c` (import syntax) into `a, b: c` (destructuring)
fn named_to_destructuring(inner: &str) -> String {
    inner
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(" as ") {
            Some((source, local)) => format!("{}: {}", source.trim(), local.trim()),
            None => entry.to_owned(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Quote a specifier as a JavaScript double-quoted string literal
fn js_quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

/// Rewrite one import declaration as require-based declarations
fn lower_import(indent: &str, bindings: &ImportBindings, specifier: &str, seq: usize) -> String {
    let require_call = format!("require({})", js_quote(specifier));
    let mut line = String::from(indent);

    match (&bindings.default, &bindings.namespace, &bindings.named) {
        // Bare `import 's'` runs the dependency for its side effects
        (None, None, None) => {
            let _ = write!(line, "{require_call};");
        }
        (None, Some(ns), _) => {
            let _ = write!(line, "const {ns} = {require_call};");
        }
        (None, None, Some(named)) => {
            let _ = write!(line, "const {{ {} }} = {require_call};", named_to_destructuring(named));
        }
        (Some(default), None, None) => {
            let _ = write!(line, "const {default} = {require_call}.default;");
        }
        // Mixed bindings share a single require call so the dependency's
        // top-level code runs once per import statement, not once per
        // binding (the runtime re-executes on every require call).
        (Some(default), namespace, named) => {
            let shared = format!("__fardel_module_{seq}");
            let _ = write!(line, "const {shared} = {require_call};");
            let _ = write!(line, " const {default} = {shared}.default;");
            if let Some(ns) = namespace {
                let _ = write!(line, " const {ns} = {shared};");
            }
            if let Some(named) = named {
                let _ = write!(line, " const {{ {} }} = {shared};", named_to_destructuring(named));
            }
        }
    }
    line
}

/// Down-level one ES module to CommonJS, collecting specifiers in order
///
/// Pure function of the source text; does not touch the filesystem.
pub fn downlevel(source: &str) -> ExtractedModule {
    let mut specifiers = Vec::new();
    let mut lines = Vec::new();
    // `exports.f = f;` assignments for hoisted declarations, appended after
    // the whole body so the declarations exist when they run
    let mut trailing_exports = Vec::new();

    for line in source.lines() {
        if let Some(caps) = IMPORT_RE.captures(line) {
            let indent = &caps[1];
            let bindings = caps
                .get(2)
                .map_or_else(ImportBindings::default, |m| parse_bindings(m.as_str()));
            let specifier = caps[3].to_owned();
            lines.push(lower_import(indent, &bindings, &specifier, specifiers.len()));
            specifiers.push(specifier);
        } else if let Some(caps) = EXPORT_HOISTED_RE.captures(line) {
            let name = caps[3].to_owned();
            lines.push(EXPORT_HOISTED_RE.replace(line, "${1}${2}${3}").into_owned());
            trailing_exports.push(format!("exports.{name} = {name};"));
        } else if EXPORT_DECL_RE.is_match(line) {
            lines.push(
                EXPORT_DECL_RE
                    .replace(line, "${1}${2} ${3} = exports.${3} =")
                    .into_owned(),
            );
        } else if EXPORT_DEFAULT_RE.is_match(line) {
            lines.push(EXPORT_DEFAULT_RE.replace(line, "${1}exports.default = ").into_owned());
        } else if let Some(caps) = EXPORT_LIST_RE.captures(line) {
            let mut assignments = Vec::new();
            for entry in caps[1].split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
                match entry.split_once(" as ") {
                    Some((local, exported)) => {
                        assignments.push(format!("exports.{} = {};", exported.trim(), local.trim()));
                    }
                    None => assignments.push(format!("exports.{entry} = {entry};")),
                }
            }
            lines.push(assignments.join(" "));
        } else {
            lines.push(line.to_owned());
        }
    }

    lines.extend(trailing_exports);
    ExtractedModule {
        specifiers,
        code: lines.join("\n"),
    }
}
