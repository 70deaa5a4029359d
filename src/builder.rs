//! Fluent builder for project trees.
//!
//! Discovers files either through the whitelist/denylist policy or through a
//! single glob, applies the recency window, adds the latest log file and,
//! when asked, annotates source entries with their symbols.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::codemap::{extract_file, Dialect};
use crate::config::{ConfigError, DiscoveryPolicy};
use crate::errors::SnapshotError;
use crate::filter::{is_denied_file, Recency};
use crate::tree::{Entry, Tree, ROOT_KEY};
use crate::walker::{walk, WalkOptions};

/// How files are discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// Whitelisted top-level dirs and files, pruned by the denylists.
    Policy(DiscoveryPolicy),
    /// Exactly the files matching a glob relative to the scan root.
    Glob(String),
}

impl Default for Discovery {
    fn default() -> Self {
        Discovery::Policy(DiscoveryPolicy::default())
    }
}

/// Builder for a project [`Tree`].
///
/// # Examples
///
/// ```no_run
/// use snapshot::builder::Snapshot;
///
/// let tree = Snapshot::new(".")
///     .recent(Some(30))
///     .map_symbols(true)
///     .build()
///     .unwrap();
///
/// println!("{} files", tree.file_count());
/// ```
#[derive(Debug, Clone)]
pub struct Snapshot {
    root: PathBuf,
    discovery: Discovery,
    recency: Recency,
    map_symbols: bool,
    walk_options: WalkOptions,
}

impl Snapshot {
    /// Create a new builder for the given scan root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            discovery: Discovery::default(),
            recency: Recency::unbounded(),
            map_symbols: false,
            walk_options: WalkOptions::default(),
        }
    }

    /// Use a whitelist/denylist policy.
    pub fn policy(mut self, policy: DiscoveryPolicy) -> Self {
        self.discovery = Discovery::Policy(policy);
        self
    }

    /// Restrict the tree to files matching `pattern` (relative to the root).
    pub fn glob(mut self, pattern: impl Into<String>) -> Self {
        self.discovery = Discovery::Glob(pattern.into());
        self
    }

    pub fn discovery(mut self, discovery: Discovery) -> Self {
        self.discovery = discovery;
        self
    }

    /// Only keep files modified within the last `minutes` minutes.
    pub fn recent(mut self, minutes: Option<u64>) -> Self {
        self.recency = match minutes {
            Some(m) => Recency::within_minutes(m),
            None => Recency::unbounded(),
        };
        self
    }

    /// Use an explicit recency window.
    pub fn recency(mut self, recency: Recency) -> Self {
        self.recency = recency;
        self
    }

    /// Annotate Python and JavaScript entries with their symbols.
    pub fn map_symbols(mut self, enabled: bool) -> Self {
        self.map_symbols = enabled;
        self
    }

    /// Follow symbolic links while walking.
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.walk_options.follow_symlinks = follow;
        self
    }

    /// Respect .gitignore files while walking.
    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.walk_options.respect_gitignore = respect;
        self
    }

    /// Build the tree from the current filesystem state.
    pub fn build(self) -> Result<Tree, SnapshotError> {
        if !self.root.is_dir() {
            return Err(SnapshotError::PathNotFound(self.root));
        }

        let tree = match &self.discovery {
            Discovery::Policy(policy) => self.collect_policy(policy)?,
            Discovery::Glob(pattern) => self.collect_glob(pattern)?,
        };
        info!(
            buckets = tree.buckets().len(),
            files = tree.file_count(),
            "tree built"
        );

        if self.map_symbols {
            Ok(annotate(tree, &self.root))
        } else {
            Ok(tree)
        }
    }

    fn collect_policy(&self, policy: &DiscoveryPolicy) -> Result<Tree, SnapshotError> {
        let mut slots = BucketSlots::default();
        slots.open(ROOT_KEY);

        let mut items: Vec<_> = fs::read_dir(&self.root)?
            .filter_map(|e| e.ok())
            .collect();
        items.sort_by_key(|e| e.file_name());

        for item in items {
            let Some(name) = item.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let path = item.path();
            // fs::metadata follows symlinks, like a plain is-file/is-dir check
            let Ok(metadata) = fs::metadata(&path) else {
                debug!(path = %path.display(), "skipping vanished entry");
                continue;
            };

            if metadata.is_file() && policy.included_files.contains(&name) {
                if self.admits(metadata.modified().ok()) {
                    slots.push(ROOT_KEY, Entry::Plain(name));
                }
            } else if metadata.is_dir() && policy.included_dirs.contains(&name) {
                // the logs bucket only ever holds the latest log
                if name == policy.logs_dir {
                    debug!(dir = %name, "logs directory is not walked");
                    continue;
                }
                self.collect_directory(&path, policy, &mut slots);
            }
        }

        let mut tree = slots.into_tree();

        if let Some(log) = latest_log(&self.root, &policy.logs_dir, &self.recency) {
            tree.push(&policy.logs_dir, Entry::Plain(log));
        }

        Ok(tree)
    }

    fn collect_directory(&self, dir: &Path, policy: &DiscoveryPolicy, slots: &mut BucketSlots) {
        let options = self.walk_options.clone().prune(&policy.excluded_dirs);

        for result in walk(dir, &options) {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("skipping unreadable entry: {e}");
                    continue;
                }
            };

            if !entry.is_file {
                slots.open(&relative_key(&self.root, &entry.path));
                continue;
            }

            let Some(name) = entry.file_name() else {
                continue;
            };
            if is_denied_file(name, policy) || !self.admits(entry.modified) {
                continue;
            }

            let Some(parent) = entry.path.parent() else {
                continue;
            };
            slots.push(&relative_key(&self.root, parent), Entry::plain(name));
        }
    }

    fn collect_glob(&self, pattern: &str) -> Result<Tree, SnapshotError> {
        let full = format!(
            "{}/{}",
            glob::Pattern::escape(&self.root.to_string_lossy()),
            pattern.trim_start_matches("./")
        );
        let paths = glob::glob(&full).map_err(|source| ConfigError::InvalidGlob {
            pattern: pattern.to_string(),
            source,
        })?;

        let mut tree = Tree::new();
        for result in paths {
            let path = match result {
                Ok(path) => path,
                Err(e) => {
                    debug!("skipping unreadable glob match: {e}");
                    continue;
                }
            };

            let Ok(metadata) = fs::metadata(&path) else {
                continue;
            };
            if !metadata.is_file() || !self.admits(metadata.modified().ok()) {
                continue;
            }

            let (Some(name), Some(parent)) =
                (path.file_name().and_then(|n| n.to_str()), path.parent())
            else {
                continue;
            };
            tree.push(&relative_key(&self.root, parent), Entry::plain(name));
        }

        if tree.is_empty() {
            warn!(pattern, "glob matched no files");
        }
        Ok(tree)
    }

    fn admits(&self, modified: Option<std::time::SystemTime>) -> bool {
        match modified {
            Some(time) => self.recency.admits(time),
            // without an mtime the window cannot be checked
            None => !self.recency.is_bounded(),
        }
    }
}

/// Buckets in directory pre-order, created when the directory is reached
/// and dropped if they end up empty.
#[derive(Default)]
struct BucketSlots {
    slots: Vec<(String, Vec<Entry>)>,
    index: HashMap<String, usize>,
}

impl BucketSlots {
    fn open(&mut self, key: &str) -> usize {
        if let Some(&i) = self.index.get(key) {
            return i;
        }
        let i = self.slots.len();
        self.index.insert(key.to_string(), i);
        self.slots.push((key.to_string(), Vec::new()));
        i
    }

    fn push(&mut self, key: &str, entry: Entry) {
        let i = self.open(key);
        self.slots[i].1.push(entry);
    }

    fn into_tree(self) -> Tree {
        let mut tree = Tree::new();
        for (key, entries) in self.slots {
            for entry in entries {
                tree.push(&key, entry);
            }
        }
        tree
    }
}

/// Root-relative directory key with `/` separators; the root itself is
/// [`ROOT_KEY`].
fn relative_key(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .filter(|c| c != ".")
        .collect();

    if parts.is_empty() {
        ROOT_KEY.to_string()
    } else {
        parts.join("/")
    }
}

/// The most recently modified `log_*.txt` file in `<root>/<logs_dir>` that
/// passes the recency window.
fn latest_log(root: &Path, logs_dir: &str, recency: &Recency) -> Option<String> {
    let dir = root.join(logs_dir);
    if !dir.is_dir() {
        return None;
    }

    fs::read_dir(&dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_string();
            if !(name.starts_with("log_") && name.ends_with(".txt")) {
                return None;
            }
            let metadata = e.metadata().ok()?;
            let modified = metadata.modified().ok()?;
            (metadata.is_file() && recency.admits(modified)).then_some((modified, name))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, name)| name)
}

/// Replace every Python/JavaScript entry with an annotated one.
///
/// A file that cannot be read or parsed is logged and gets an empty symbol
/// list.
pub fn annotate(tree: Tree, root: &Path) -> Tree {
    tree.map_entries(|bucket, entry| {
        let name = entry.name().to_string();
        if !Dialect::for_name(&name).is_supported() {
            return entry;
        }

        let path = bucket.file_path(root, &name);
        let symbols = match extract_file(&path) {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!(path = %path.display(), "symbol extraction failed: {e}");
                Vec::new()
            }
        };
        Entry::Annotated { name, symbols }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codemap::Symbol;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn age(root: &Path, rel: &str, by: Duration) {
        let file = fs::File::options().write(true).open(root.join(rel)).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    fn names(tree: &Tree, key: &str) -> Vec<String> {
        tree.get(key)
            .map(|b| b.entries().iter().map(|e| e.name().to_string()).collect())
            .unwrap_or_default()
    }

    fn create_test_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write(root, "config.py", "DEBUG = True\n");
        write(root, "main.py", "print('hi')\n");
        write(root, "setup.py", "# not whitelisted\n");
        write(root, "app/x.py", "def foo():\n    ...\n");
        write(root, "app/models/user.py", "class User:\n    def save(self):\n        pass\n");
        write(root, "app/__pycache__/x.cpython-311.pyc", "bytecode");
        write(root, "app/logo.png", "png");
        write(root, "app/.gitignore", "*.pyc\n");
        write(root, "static/app.js", "function boot() {}\n");
        write(root, "docs/readme.md", "# not whitelisted\n");

        dir
    }

    #[test]
    fn test_policy_whitelists() {
        let dir = create_test_project();
        let tree = Snapshot::new(dir.path()).build().unwrap();

        let keys: Vec<_> = tree.keys().collect();
        assert_eq!(keys, vec![ROOT_KEY, "app", "app/models", "static"]);
        assert_eq!(names(&tree, ROOT_KEY), vec!["config.py", "main.py"]);
        assert_eq!(names(&tree, "app"), vec!["x.py"]);
        assert_eq!(names(&tree, "app/models"), vec!["user.py"]);
        assert_eq!(names(&tree, "static"), vec!["app.js"]);
    }

    #[test]
    fn test_policy_prunes_and_denies() {
        let dir = create_test_project();
        write(dir.path(), "app/deep/er/migrations/0001.py", "");
        write(dir.path(), "app/deep/er/ok.py", "");

        let tree = Snapshot::new(dir.path()).build().unwrap();

        for key in tree.keys() {
            assert!(!key.split('/').any(|part| part == "__pycache__" || part == "migrations"), "{key}");
        }
        assert_eq!(names(&tree, "app/deep/er"), vec!["ok.py"]);
        for (_, entry) in tree.files() {
            assert!(!entry.name().ends_with(".png"));
            assert_ne!(entry.name(), ".gitignore");
        }
    }

    #[test]
    fn test_empty_directories_are_not_recorded() {
        let dir = create_test_project();
        fs::create_dir_all(dir.path().join("app/empty/nested")).unwrap();
        write(dir.path(), "app/only_images/a.jpg", "");

        let tree = Snapshot::new(dir.path()).build().unwrap();
        assert!(tree.get("app/empty").is_none());
        assert!(tree.get("app/empty/nested").is_none());
        assert!(tree.get("app/only_images").is_none());
        assert!(tree.buckets().iter().all(|b| !b.entries().is_empty()));
    }

    #[test]
    fn test_recency_filter() {
        let dir = create_test_project();
        age(dir.path(), "config.py", Duration::from_secs(3 * 3600));
        age(dir.path(), "app/models/user.py", Duration::from_secs(20 * 60));

        let tree = Snapshot::new(dir.path()).recent(Some(10)).build().unwrap();

        assert_eq!(names(&tree, ROOT_KEY), vec!["main.py"]);
        assert!(tree.get("app/models").is_none());
        assert_eq!(names(&tree, "app"), vec!["x.py"]);

        let wide = Snapshot::new(dir.path()).recent(Some(30)).build().unwrap();
        assert_eq!(names(&wide, "app/models"), vec!["user.py"]);
    }

    #[test]
    fn test_latest_log_only() {
        let dir = create_test_project();
        write(dir.path(), "logs/log_a.txt", "a");
        write(dir.path(), "logs/log_b.txt", "b");
        write(dir.path(), "logs/log_c.txt", "c");
        write(dir.path(), "logs/other.txt", "newest but wrong name");
        age(dir.path(), "logs/log_a.txt", Duration::from_secs(60));
        age(dir.path(), "logs/log_b.txt", Duration::from_secs(5));
        age(dir.path(), "logs/log_c.txt", Duration::from_secs(600));

        let tree = Snapshot::new(dir.path()).build().unwrap();
        assert_eq!(names(&tree, "logs"), vec!["log_b.txt"]);
        assert_eq!(tree.keys().last(), Some("logs"));
    }

    #[test]
    fn test_whitelisted_logs_dir_still_holds_one_log() {
        let dir = create_test_project();
        write(dir.path(), "logs/log_a.txt", "a");
        write(dir.path(), "logs/log_b.txt", "b");
        write(dir.path(), "logs/notes.md", "not a log");
        age(dir.path(), "logs/log_a.txt", Duration::from_secs(60));
        age(dir.path(), "logs/log_b.txt", Duration::from_secs(5));

        let policy = DiscoveryPolicy {
            included_dirs: vec!["app".into(), "logs".into()],
            ..Default::default()
        };
        let tree = Snapshot::new(dir.path()).policy(policy).build().unwrap();

        assert_eq!(names(&tree, "logs"), vec!["log_b.txt"]);
        assert_eq!(tree.keys().last(), Some("logs"));
    }

    #[test]
    fn test_bucket_slots_keep_first_open_order() {
        let mut slots = BucketSlots::default();
        slots.open(ROOT_KEY);
        slots.open("app");
        slots.open("app/empty");
        slots.push("static", Entry::plain("s.css"));
        slots.push("app", Entry::plain("x.py"));
        slots.push(ROOT_KEY, Entry::plain("main.py"));

        let tree = slots.into_tree();
        let keys: Vec<_> = tree.keys().collect();
        assert_eq!(keys, vec![ROOT_KEY, "app", "static"]);
    }

    #[test]
    fn test_logs_bucket_respects_recency() {
        let dir = create_test_project();
        write(dir.path(), "logs/log_old.txt", "old");
        age(dir.path(), "logs/log_old.txt", Duration::from_secs(3600));

        let tree = Snapshot::new(dir.path()).recent(Some(5)).build().unwrap();
        assert!(tree.get("logs").is_none());
    }

    #[test]
    fn test_no_logs_dir() {
        let dir = create_test_project();
        let tree = Snapshot::new(dir.path()).build().unwrap();
        assert!(tree.get("logs").is_none());
    }

    #[test]
    fn test_glob_mode() {
        let dir = create_test_project();
        write(dir.path(), "app/models/order.py", "");
        write(dir.path(), "app/models/notes.md", "");
        write(dir.path(), "logs/log_1.txt", "");

        let tree = Snapshot::new(dir.path())
            .glob("app/models/*.py")
            .build()
            .unwrap();

        let keys: Vec<_> = tree.keys().collect();
        assert_eq!(keys, vec!["app/models"]);
        assert_eq!(names(&tree, "app/models"), vec!["order.py", "user.py"]);
    }

    #[test]
    fn test_glob_mode_recursive_and_root_files() {
        let dir = create_test_project();

        let tree = Snapshot::new(dir.path()).glob("**/*.py").build().unwrap();

        assert!(names(&tree, ROOT_KEY).contains(&"setup.py".to_string()));
        assert_eq!(names(&tree, "app/models"), vec!["user.py"]);
        assert!(tree.get("logs").is_none());
    }

    #[test]
    fn test_glob_mode_respects_recency() {
        let dir = create_test_project();
        age(dir.path(), "app/x.py", Duration::from_secs(3600));

        let tree = Snapshot::new(dir.path())
            .glob("app/*.py")
            .recent(Some(5))
            .build()
            .unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_invalid_glob() {
        let dir = create_test_project();
        let result = Snapshot::new(dir.path()).glob("app/[").build();
        assert!(matches!(
            result,
            Err(SnapshotError::Config(ConfigError::InvalidGlob { .. }))
        ));
    }

    #[test]
    fn test_missing_root() {
        let result = Snapshot::new("/nonexistent/project").build();
        assert!(matches!(result, Err(SnapshotError::PathNotFound(_))));
    }

    #[test]
    fn test_map_symbols() {
        let dir = create_test_project();
        let tree = Snapshot::new(dir.path()).map_symbols(true).build().unwrap();

        let x = &tree.get("app").unwrap().entries()[0];
        assert_eq!(x.symbols(), &[Symbol::Function("foo".into())]);

        let user = &tree.get("app/models").unwrap().entries()[0];
        assert_eq!(
            user.symbols(),
            &[
                Symbol::Class("User".into()),
                Symbol::Method("save".into()),
                Symbol::Function("save".into()),
            ]
        );

        let js = &tree.get("static").unwrap().entries()[0];
        assert_eq!(js.symbols(), &[Symbol::Function("boot".into())]);
    }

    #[test]
    fn test_map_symbols_leaves_other_files_plain() {
        let dir = create_test_project();
        write(dir.path(), "app/page.html", "<html></html>");

        let tree = Snapshot::new(dir.path()).map_symbols(true).build().unwrap();
        let page = tree
            .get("app")
            .unwrap()
            .entries()
            .iter()
            .find(|e| e.name() == "page.html")
            .unwrap();
        assert!(matches!(page, Entry::Plain(_)));
    }

    #[test]
    fn test_map_symbols_tolerates_bad_sources() {
        let dir = create_test_project();
        write(dir.path(), "app/broken.py", "def broken(:\n");
        fs::write(dir.path().join("app/binary.py"), [0xff, 0xfe, 0x00]).unwrap();

        let tree = Snapshot::new(dir.path()).map_symbols(true).build().unwrap();
        let app = tree.get("app").unwrap();

        for name in ["broken.py", "binary.py"] {
            let entry = app.entries().iter().find(|e| e.name() == name).unwrap();
            assert!(matches!(entry, Entry::Annotated { symbols, .. } if symbols.is_empty()));
        }
    }

    #[test]
    fn test_custom_policy() {
        let dir = create_test_project();
        let policy = DiscoveryPolicy {
            included_dirs: vec!["docs".into()],
            included_files: vec!["setup.py".into()],
            ..Default::default()
        };

        let tree = Snapshot::new(dir.path()).policy(policy).build().unwrap();
        let keys: Vec<_> = tree.keys().collect();
        assert_eq!(keys, vec![ROOT_KEY, "docs"]);
        assert_eq!(names(&tree, ROOT_KEY), vec!["setup.py"]);
    }

    #[test]
    fn test_relative_key() {
        let root = Path::new("/proj");
        assert_eq!(relative_key(root, Path::new("/proj")), ROOT_KEY);
        assert_eq!(relative_key(root, Path::new("/proj/app/models")), "app/models");
        assert_eq!(relative_key(Path::new("."), Path::new("./app")), "app");
    }
}
