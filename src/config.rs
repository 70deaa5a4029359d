//! Run configuration.
//!
//! Holds the discovery policy, the description block, the category tokens
//! that gate each export section, and the parser for the four-part
//! export-options string.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::filter::ExtensionClass;

/// Name of the config file picked up from the scan root.
pub const CONFIG_FILE_NAME: &str = ".snapshot.json";

/// Export options used when none are given or the given ones are malformed.
pub const DEFAULT_EXPORT_OPTIONS: &str = "1,1,1,all";

const DEFAULT_DESCRIPTION: &str = "# Project\nThis is the app description.";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected 4 comma-separated export options, got {parts} in {raw:?}")]
    MalformedExportOptions { raw: String, parts: usize },

    #[error("unknown file type: {0}")]
    UnknownCategory(String),

    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Whitelist/denylist discovery policy used when no glob is given.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiscoveryPolicy {
    /// Top-level directories to recurse into.
    pub included_dirs: Vec<String>,
    /// Top-level loose files to include.
    pub included_files: Vec<String>,
    /// Directory names pruned at any depth below an included directory.
    pub excluded_dirs: Vec<String>,
    /// Exact file names to skip.
    pub excluded_files: Vec<String>,
    /// File name suffixes to skip (binary images).
    pub excluded_suffixes: Vec<String>,
    /// Top-level directory holding `log_*.txt` files.
    pub logs_dir: String,
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        Self {
            included_dirs: strings(&["app", "static"]),
            included_files: strings(&["config.py", "main.py"]),
            excluded_dirs: strings(&["__pycache__", "migrations", ".upm", ".pythonlibs"]),
            excluded_files: strings(&[".gitignore", "poetry.lock"]),
            excluded_suffixes: strings(&[".png", ".jpg", ".jpeg"]),
            logs_dir: "logs".to_string(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Contents of a `.snapshot.json` file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Block written when the `description` category is enabled.
    pub description: String,
    pub discovery: DiscoveryPolicy,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            description: DEFAULT_DESCRIPTION.to_string(),
            discovery: DiscoveryPolicy::default(),
        }
    }
}

impl SnapshotConfig {
    /// Load a config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the config for a run: an explicit file wins, then
    /// `<root>/.snapshot.json`, then built-in defaults.
    pub fn resolve(explicit: Option<&Path>, root: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate = root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "loading config");
            return Self::load(&candidate);
        }

        Ok(Self::default())
    }
}

/// A content category token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Description,
    Tree,
    Py,
    Js,
    Md,
    Txt,
    Css,
    Html,
    Json,
    Other,
    All,
}

impl Category {
    /// Tokens added when "include all types" is on.
    pub const ALL_TYPES: [Category; 9] = [
        Category::All,
        Category::Py,
        Category::Js,
        Category::Md,
        Category::Txt,
        Category::Css,
        Category::Html,
        Category::Json,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Description => "description",
            Category::Tree => "tree",
            Category::Py => "py",
            Category::Js => "js",
            Category::Md => "md",
            Category::Txt => "txt",
            Category::Css => "css",
            Category::Html => "html",
            Category::Json => "json",
            Category::Other => "other",
            Category::All => "all",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "description" => Ok(Category::Description),
            "tree" => Ok(Category::Tree),
            "py" => Ok(Category::Py),
            "js" => Ok(Category::Js),
            "md" => Ok(Category::Md),
            "txt" => Ok(Category::Txt),
            "css" => Ok(Category::Css),
            "html" => Ok(Category::Html),
            "json" => Ok(Category::Json),
            "other" => Ok(Category::Other),
            "all" => Ok(Category::All),
            other => Err(ConfigError::UnknownCategory(other.to_string())),
        }
    }
}

/// The set of enabled categories for one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTypeSet(BTreeSet<Category>);

impl FileTypeSet {
    /// An empty set: header only.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn insert(&mut self, category: Category) {
        self.0.insert(category);
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().copied()
    }

    /// Whether files of `class` are written at all.
    pub fn permits_class(&self, class: ExtensionClass) -> bool {
        self.contains(Category::All)
            || self.contains(class.category())
            || (class == ExtensionClass::Other && self.contains(Category::Txt))
    }

    /// Whether a specific file of `class` is written.
    ///
    /// `txt` admits `.txt` files out of the `other` class even when `other`
    /// itself is off.
    pub fn permits_file(&self, class: ExtensionClass, file_name: &str) -> bool {
        if self.contains(Category::All) || self.contains(class.category()) {
            return true;
        }
        class == ExtensionClass::Other
            && self.contains(Category::Txt)
            && file_name.ends_with(".txt")
    }

    /// Parse an export-options string, falling back to the default with a
    /// warning when it has fewer than four parts.
    pub fn from_export_options(raw: &str) -> Self {
        match ExportChoices::parse(raw) {
            Ok(choices) => choices.into_set(),
            Err(e) => {
                warn!("invalid export options: {e}; using default {DEFAULT_EXPORT_OPTIONS}");
                Self::default()
            }
        }
    }
}

impl Default for FileTypeSet {
    fn default() -> Self {
        ExportChoices::DEFAULT.into_set()
    }
}

impl FromIterator<Category> for FileTypeSet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Decoded form of the four-part export-options string
/// `description,tree,all_types,types`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportChoices<'a> {
    pub description: bool,
    pub tree: bool,
    pub all_types: bool,
    /// Comma-separated type list, consulted only when `all_types` is off.
    pub types: Cow<'a, str>,
}

impl ExportChoices<'static> {
    /// Decoded [`DEFAULT_EXPORT_OPTIONS`].
    pub const DEFAULT: ExportChoices<'static> = ExportChoices {
        description: true,
        tree: true,
        all_types: true,
        types: Cow::Borrowed("all"),
    };
}

impl<'a> ExportChoices<'a> {
    pub fn parse(raw: &'a str) -> Result<Self, ConfigError> {
        let parts: Vec<&str> = raw.split(',').collect();
        if parts.len() < 4 {
            return Err(ConfigError::MalformedExportOptions {
                raw: raw.to_string(),
                parts: parts.len(),
            });
        }

        let types = if parts.len() == 4 {
            Cow::Borrowed(parts[3])
        } else {
            Cow::Owned(parts[3..].join(","))
        };

        Ok(Self {
            description: flag(parts[0]),
            tree: flag(parts[1]),
            all_types: flag(parts[2]),
            types,
        })
    }

    pub fn into_set(self) -> FileTypeSet {
        let mut set = FileTypeSet::empty();
        if self.description {
            set.insert(Category::Description);
        }
        if self.tree {
            set.insert(Category::Tree);
        }

        if self.all_types {
            for category in Category::ALL_TYPES {
                set.insert(category);
            }
            return set;
        }

        for token in self.types.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.parse::<Category>() {
                Ok(category) => set.insert(category),
                Err(e) => warn!("ignoring export type: {e}"),
            }
        }
        set
    }
}

fn flag(part: &str) -> bool {
    part.trim() == "1"
}
