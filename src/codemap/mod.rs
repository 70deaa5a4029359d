//! Symbol extraction from source files.
//!
//! Produces an ordered list of function, class and method names per file.
//! Python sources go through a tree-sitter parse; JavaScript sources are
//! scanned with regular expressions.

mod javascript;
mod python;

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tree_sitter::Parser;

// Thread-local parser caching to avoid re-initialization overhead.
thread_local! {
    static PYTHON_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

fn init_python_parser() -> Result<Parser, ()> {
    let mut p = Parser::new();
    p.set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|_| ())?;
    Ok(p)
}

/// Execute a function with a cached Python parser.
pub(crate) fn with_python_parser<F, R>(f: F) -> Result<R, CodemapError>
where
    F: FnOnce(&mut Parser) -> R,
{
    PYTHON_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            let parser = init_python_parser().map_err(|()| CodemapError::ParserInit {
                dialect: Dialect::Python,
            })?;
            *slot = Some(parser);
        }

        let parser = slot.as_mut().ok_or(CodemapError::ParserInit {
            dialect: Dialect::Python,
        })?;
        Ok(f(parser))
    })
}

/// Extraction strategy for a source file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `.py`: walked from a real syntax tree.
    Python,
    /// `.js`: pattern-matched over raw text.
    JavaScript,
    /// Anything else: no extraction.
    Unsupported,
}

impl Dialect {
    /// File extensions handled by this dialect.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Dialect::Python => &["py"],
            Dialect::JavaScript => &["js"],
            Dialect::Unsupported => &[],
        }
    }

    /// Pick the dialect for a file name.
    pub fn for_name(file_name: &str) -> Dialect {
        let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) else {
            return Dialect::Unsupported;
        };

        [Dialect::Python, Dialect::JavaScript]
            .into_iter()
            .find(|d| d.extensions().contains(&ext))
            .unwrap_or(Dialect::Unsupported)
    }

    pub fn is_supported(self) -> bool {
        self != Dialect::Unsupported
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Python => write!(f, "Python"),
            Dialect::JavaScript => write!(f, "JavaScript"),
            Dialect::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// A symbol discovered in a source file.
///
/// Displays as `function: name`, `class: name` or `  method: name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Function(String),
    Class(String),
    Method(String),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Function(name) | Symbol::Class(name) | Symbol::Method(name) => name,
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Function(name) => write!(f, "function: {name}"),
            Symbol::Class(name) => write!(f, "class: {name}"),
            Symbol::Method(name) => write!(f, "  method: {name}"),
        }
    }
}

/// Errors during symbol extraction.
#[derive(Debug, Error)]
pub enum CodemapError {
    #[error("failed to initialize {dialect} parser")]
    ParserInit { dialect: Dialect },

    #[error("failed to compile {dialect} patterns")]
    PatternInit { dialect: Dialect },

    #[error("{dialect} source has syntax errors")]
    Syntax { dialect: Dialect },

    #[error("no extractor for {dialect} files")]
    Unsupported { dialect: Dialect },

    #[error("failed to read file: {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Extract symbols from source text in the given dialect.
pub fn extract_symbols(content: &str, dialect: Dialect) -> Result<Vec<Symbol>, CodemapError> {
    match dialect {
        Dialect::Python => python::extract(content),
        Dialect::JavaScript => javascript::extract(content),
        Dialect::Unsupported => Err(CodemapError::Unsupported { dialect }),
    }
}

/// Read a file and extract its symbols. The dialect comes from the file name.
pub fn extract_file(path: &Path) -> Result<Vec<Symbol>, CodemapError> {
    let dialect = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(Dialect::Unsupported, Dialect::for_name);
    if !dialect.is_supported() {
        return Err(CodemapError::Unsupported { dialect });
    }

    let content = std::fs::read_to_string(path).map_err(|source| CodemapError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    extract_symbols(&content, dialect)
}
