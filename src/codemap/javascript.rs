//! JavaScript symbol extraction by pattern matching.
//!
//! No parser is involved: functions, classes and method-like constructs are
//! found with three regular expressions over the raw text. Nested braces,
//! object literals and arrow functions are not understood, so control-flow
//! keywords such as `if (x) {` come out as methods and arrow functions are
//! missed.

use std::sync::OnceLock;

use regex::Regex;

use super::{CodemapError, Dialect, Symbol};

struct Patterns {
    function: Regex,
    class: Regex,
    method: Regex,
}

static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();

fn patterns() -> Option<&'static Patterns> {
    PATTERNS
        .get_or_init(|| {
            Some(Patterns {
                function: Regex::new(r"function\s+(\w+)").ok()?,
                class: Regex::new(r"class\s+(\w+)").ok()?,
                method: Regex::new(r"(\w+)\s*\([^)]*\)\s*\{").ok()?,
            })
        })
        .as_ref()
}

/// Extract symbols from JavaScript source.
///
/// Output is grouped, not interleaved: all functions in text order, then all
/// classes, then every method-pattern match whose name is not one of the
/// functions.
pub fn extract(content: &str) -> Result<Vec<Symbol>, CodemapError> {
    let patterns = patterns().ok_or(CodemapError::PatternInit {
        dialect: Dialect::JavaScript,
    })?;

    let functions = captures(&patterns.function, content);
    let classes = captures(&patterns.class, content);
    let methods = captures(&patterns.method, content);

    let mut symbols = Vec::with_capacity(functions.len() + classes.len() + methods.len());
    symbols.extend(functions.iter().cloned().map(Symbol::Function));
    symbols.extend(classes.into_iter().map(Symbol::Class));
    symbols.extend(
        methods
            .into_iter()
            .filter(|m| !functions.contains(m))
            .map(Symbol::Method),
    );
    Ok(symbols)
}

fn captures(pattern: &Regex, content: &str) -> Vec<String> {
    pattern
        .captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
