//! Snapshot - export a project tree and its files into one text document.
//!
//! Snapshot walks a project directory, keeps the files selected by an
//! include/exclude policy (or a single glob) and a recency window, optionally
//! lists the functions, classes and methods found in Python and JavaScript
//! sources, and writes everything into one timestamped file.
//!
//! # Quick Start
//!
//! ```no_run
//! use snapshot::builder::Snapshot;
//! use snapshot::config::FileTypeSet;
//! use snapshot::output::{write_export, ExportOptions};
//! use std::path::Path;
//!
//! let tree = Snapshot::new(".")
//!     .recent(Some(60))
//!     .map_symbols(true)
//!     .build()
//!     .unwrap();
//!
//! let options = ExportOptions {
//!     categories: FileTypeSet::from_export_options("1,1,1,all"),
//!     description: "My project".to_string(),
//! };
//! write_export(&tree, Path::new("."), Path::new("backups/export.txt"), &options).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`config`] - Discovery policy, config file, export-options parsing
//! - [`filter`] - Extension classes, denylists, recency window
//! - [`walker`] - Pruned directory traversal
//! - [`codemap`] - Symbol extraction (tree-sitter for Python, patterns for JavaScript)
//! - [`tree`] - Ordered project tree and its diagram
//! - [`builder`] - Fluent API for building a tree
//! - [`output`] - Export document writer

pub mod config;
pub mod filter;
pub mod errors;
pub mod tree;
pub mod walker;
pub mod codemap;
pub mod output;
pub mod builder;

// Re-export key types at crate root for convenience
pub use builder::{Discovery, Snapshot};
pub use codemap::{CodemapError, Dialect, Symbol};
pub use config::{Category, ConfigError, DiscoveryPolicy, FileTypeSet, SnapshotConfig};
pub use errors::SnapshotError;
pub use filter::{ExtensionClass, Recency};
pub use output::{ExportOptions, ExportStats, OutputError};
pub use tree::{render_tree, Bucket, Entry, Tree};
pub use walker::WalkError;
