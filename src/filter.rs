//! File classification and admission rules.
//!
//! Decides which export bucket a file belongs to, whether a file name is on
//! the denylist, and whether a modification time falls inside the recency
//! window.

use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::config::{Category, DiscoveryPolicy};

/// Export bucket a file is written under.
///
/// Every file name maps to exactly one class. Classes with a named
/// extension are written in [`ExtensionClass::EXPORT_ORDER`], `Other` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionClass {
    /// `.py`
    Source,
    /// `.html`
    Markup,
    /// `.json`
    Data,
    /// `.js`
    Script,
    /// `.css`
    Style,
    /// `.md`
    Docs,
    /// Anything without one of the extensions above.
    Other,
}

impl ExtensionClass {
    /// Order in which the export pass visits classes.
    pub const EXPORT_ORDER: [ExtensionClass; 7] = [
        ExtensionClass::Source,
        ExtensionClass::Markup,
        ExtensionClass::Data,
        ExtensionClass::Script,
        ExtensionClass::Style,
        ExtensionClass::Docs,
        ExtensionClass::Other,
    ];

    /// The extension (without dot) claimed by this class.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            ExtensionClass::Source => Some("py"),
            ExtensionClass::Markup => Some("html"),
            ExtensionClass::Data => Some("json"),
            ExtensionClass::Script => Some("js"),
            ExtensionClass::Style => Some("css"),
            ExtensionClass::Docs => Some("md"),
            ExtensionClass::Other => None,
        }
    }

    /// The category token that enables this class.
    pub fn category(self) -> Category {
        match self {
            ExtensionClass::Source => Category::Py,
            ExtensionClass::Markup => Category::Html,
            ExtensionClass::Data => Category::Json,
            ExtensionClass::Script => Category::Js,
            ExtensionClass::Style => Category::Css,
            ExtensionClass::Docs => Category::Md,
            ExtensionClass::Other => Category::Other,
        }
    }

    /// Classify a file by name.
    pub fn classify(file_name: &str) -> ExtensionClass {
        let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) else {
            return ExtensionClass::Other;
        };

        Self::EXPORT_ORDER
            .into_iter()
            .find(|class| class.extension() == Some(ext))
            .unwrap_or(ExtensionClass::Other)
    }
}

impl std::fmt::Display for ExtensionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtensionClass::Source => write!(f, "source"),
            ExtensionClass::Markup => write!(f, "markup"),
            ExtensionClass::Data => write!(f, "data"),
            ExtensionClass::Script => write!(f, "script"),
            ExtensionClass::Style => write!(f, "style"),
            ExtensionClass::Docs => write!(f, "docs"),
            ExtensionClass::Other => write!(f, "other"),
        }
    }
}

/// Check a file name against the policy's filename and suffix denylists.
pub fn is_denied_file(file_name: &str, policy: &DiscoveryPolicy) -> bool {
    policy.excluded_files.iter().any(|f| f == file_name)
        || policy
            .excluded_suffixes
            .iter()
            .any(|suffix| file_name.ends_with(suffix.as_str()))
}

/// Check whether a directory name should be pruned during recursion.
pub fn is_pruned_dir(dir_name: &str, policy: &DiscoveryPolicy) -> bool {
    policy.excluded_dirs.iter().any(|d| d == dir_name)
}

/// Recency window captured at the start of a run.
///
/// All admission checks in one run compare against the same `now`.
#[derive(Debug, Clone, Copy)]
pub struct Recency {
    now: SystemTime,
    window: Option<Duration>,
}

impl Recency {
    /// Admit every file.
    pub fn unbounded() -> Self {
        Self {
            now: SystemTime::now(),
            window: None,
        }
    }

    /// Admit files modified within the last `minutes` minutes.
    pub fn within_minutes(minutes: u64) -> Self {
        Self::at(SystemTime::now(), Some(Duration::from_secs(minutes.saturating_mul(60))))
    }

    /// Build a window against an explicit reference time.
    pub fn at(now: SystemTime, window: Option<Duration>) -> Self {
        Self { now, window }
    }

    /// Whether a file with the given mtime passes the window.
    pub fn admits(&self, modified: SystemTime) -> bool {
        let Some(window) = self.window else {
            return true;
        };
        // mtimes in the future count as age zero
        let age = self.now.duration_since(modified).unwrap_or(Duration::ZERO);
        age <= window
    }

    /// Whether a window is set at all.
    pub fn is_bounded(&self) -> bool {
        self.window.is_some()
    }
}

impl Default for Recency {
    fn default() -> Self {
        Self::unbounded()
    }
}
