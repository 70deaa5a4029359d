//! Directory traversal with pruning.
//!
//! Uses the `ignore` crate to walk one included directory. Subdirectories
//! whose names are on the prune list are cut off before they are entered.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ignore::WalkBuilder;
use thiserror::Error;

/// Errors that can occur during directory walking.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("symlink loop detected: {path}")]
    SymlinkLoop { path: PathBuf },
}

/// Options for directory walking.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Include hidden files and directories.
    pub include_hidden: bool,
    /// Respect .gitignore and .ignore patterns.
    pub respect_gitignore: bool,
    /// Directory names never descended into (below the walk root).
    pub pruned_dirs: Vec<String>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            respect_gitignore: false,
            pruned_dirs: Vec::new(),
        }
    }
}

impl WalkOptions {
    /// Set the directory names to prune.
    pub fn prune(mut self, names: &[String]) -> Self {
        self.pruned_dirs = names.to_vec();
        self
    }
}

/// Entry from directory walk.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Path to the entry.
    pub path: PathBuf,
    /// Depth from root (root = 0).
    pub depth: usize,
    /// Whether this is a file or directory.
    pub is_file: bool,
    /// Modification time (files only; `None` if the stat failed).
    pub modified: Option<SystemTime>,
}

impl WalkEntry {
    /// Final path component as a string.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Walk a directory tree in file-name order, yielding entries.
///
/// Directories are yielded before their contents. A directory whose name is
/// in `options.pruned_dirs` is neither yielded nor entered.
///
/// # Examples
///
/// ```no_run
/// use snapshot::walker::{walk, WalkOptions};
/// use std::path::Path;
///
/// let options = WalkOptions::default().prune(&["__pycache__".to_string()]);
/// for entry in walk(Path::new("app"), &options).flatten() {
///     println!("{}", entry.path.display());
/// }
/// ```
pub fn walk(
    root: &Path,
    options: &WalkOptions,
) -> impl Iterator<Item = Result<WalkEntry, WalkError>> {
    let root = root.to_path_buf();

    // Check if root exists
    if !root.exists() {
        return itertools_lite::Either::Left(std::iter::once(Err(WalkError::NotFound {
            path: root,
        })));
    }

    let mut builder = WalkBuilder::new(&root);

    builder
        .hidden(!options.include_hidden)
        .ignore(options.respect_gitignore)
        .parents(options.respect_gitignore)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name(|a, b| a.cmp(b));

    let pruned = options.pruned_dirs.clone();
    builder.filter_entry(move |entry| {
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        if !is_dir || entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        !pruned.iter().any(|p| *p == name)
    });

    let walker = builder.build();

    itertools_lite::Either::Right(walker.map(|result| match result {
        Ok(entry) => {
            let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
            let modified = if is_file {
                entry.metadata().ok().and_then(|m| m.modified().ok())
            } else {
                None
            };

            Ok(WalkEntry {
                path: entry.path().to_path_buf(),
                depth: entry.depth(),
                is_file,
                modified,
            })
        }
        Err(e) => Err(convert_error(e)),
    }))
}

fn convert_error(error: ignore::Error) -> WalkError {
    match error {
        ignore::Error::WithPath { path, err } => match *err {
            ignore::Error::Io(io_err) => io_error(path, io_err),
            other => convert_error(other),
        },
        ignore::Error::WithDepth { err, .. } => convert_error(*err),
        ignore::Error::Loop { child, .. } => WalkError::SymlinkLoop { path: child },
        ignore::Error::Io(io_err) => io_error(PathBuf::from("<walk error>"), io_err),
        other => WalkError::Io {
            path: PathBuf::from("<walk error>"),
            source: std::io::Error::other(other.to_string()),
        },
    }
}

fn io_error(path: PathBuf, source: std::io::Error) -> WalkError {
    match source.kind() {
        std::io::ErrorKind::PermissionDenied => WalkError::PermissionDenied { path },
        std::io::ErrorKind::NotFound => WalkError::NotFound { path },
        _ => WalkError::Io { path, source },
    }
}

/// Simple Either type to avoid adding itertools dependency.
mod itertools_lite {
    pub enum Either<L, R> {
        Left(L),
        Right(R),
    }

    impl<L, R, T> Iterator for Either<L, R>
    where
        L: Iterator<Item = T>,
        R: Iterator<Item = T>,
    {
        type Item = T;

        fn next(&mut self) -> Option<Self::Item> {
            match self {
                Either::Left(l) => l.next(),
                Either::Right(r) => r.next(),
            }
        }
    }
}
