//! Export writer.
//!
//! Writes one snapshot document: timestamp header, optional description,
//! optional tree diagram, then file contents grouped by extension class.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Category, FileTypeSet};
use crate::filter::ExtensionClass;
use crate::tree::{render_tree, Tree};

/// Errors that can occur while writing an export.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open {path} for writing: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What goes into an export besides the tree itself.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Enabled categories.
    pub categories: FileTypeSet,
    /// Block written when [`Category::Description`] is enabled.
    pub description: String,
}

/// Counts reported after an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Files written with their content.
    pub written: usize,
    /// Files written as an "unable to read" notice.
    pub unreadable: usize,
}

/// Derive `<base without extension>_<YYYYMMDD_HHMMSS>.txt`.
pub fn timestamped_path(base: &Path, now: &DateTime<Local>) -> PathBuf {
    let mut name = base.with_extension("").into_os_string();
    name.push(format!("_{}.txt", now.format("%Y%m%d_%H%M%S")));
    PathBuf::from(name)
}

/// Timestamp written in the export header.
pub fn header_timestamp(now: &DateTime<Local>) -> String {
    now.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Write an export of `tree` to `output`, creating its parent directory.
///
/// File paths in the tree are resolved against `root`.
pub fn write_export(
    tree: &Tree,
    root: &Path,
    output: &Path,
    options: &ExportOptions,
) -> Result<ExportStats, OutputError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file = File::create(output).map_err(|source| OutputError::Create {
        path: output.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);

    let stats = format_export(
        &mut out,
        tree,
        root,
        options,
        &header_timestamp(&Local::now()),
    )?;
    out.flush()?;

    info!(
        path = %output.display(),
        written = stats.written,
        unreadable = stats.unreadable,
        "export written"
    );
    Ok(stats)
}

/// Write the export document to any writer.
pub fn format_export<W: Write>(
    out: &mut W,
    tree: &Tree,
    root: &Path,
    options: &ExportOptions,
    timestamp: &str,
) -> std::io::Result<ExportStats> {
    let categories = &options.categories;

    writeln!(out, "--- Export timestamp: {timestamp} ---\n")?;

    if categories.contains(Category::Description) {
        out.write_all(options.description.as_bytes())?;
        out.write_all(b"\n\n")?;
    }

    if categories.contains(Category::Tree) {
        out.write_all(b"Project Structure:\n")?;
        out.write_all(render_tree(tree).as_bytes())?;
        out.write_all(b"\n\n")?;
    }

    let mut stats = ExportStats::default();

    for class in ExtensionClass::EXPORT_ORDER {
        if !categories.permits_class(class) {
            debug!(%class, "class disabled");
            continue;
        }

        for (bucket, entry) in tree.files() {
            let name = entry.name();
            if ExtensionClass::classify(name) != class || !categories.permits_file(class, name) {
                continue;
            }

            let display = bucket.relative_path(name);
            let path = bucket.file_path(root, name);
            match read_text(&path) {
                Some(content) => {
                    writeln!(out, "--- Start of {display} ---")?;
                    out.write_all(content.as_bytes())?;
                    writeln!(out, "\n--- End of {display} ---\n")?;
                    stats.written += 1;
                }
                None => {
                    warn!(path = %path.display(), "unable to read file as text");
                    writeln!(out, "--- Unable to read {display} (possibly a binary file) ---\n")?;
                    stats.unreadable += 1;
                }
            }
        }
    }

    Ok(stats)
}

fn read_text(path: &Path) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    String::from_utf8(bytes).ok()
}
