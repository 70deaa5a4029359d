//! Project tree representation and rendering.
//!
//! A [`Tree`] maps directory keys to ordered lists of [`Entry`] values.
//! Insertion order is kept everywhere: it is both the display order of the
//! diagram and the per-class order of the export.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::codemap::Symbol;

/// Key of the bucket holding loose files directly under the scan root.
pub const ROOT_KEY: &str = "root";

/// One file reference within a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A file name with no symbol data.
    Plain(String),
    /// A file name with the symbols extracted from it.
    Annotated { name: String, symbols: Vec<Symbol> },
}

impl Entry {
    pub fn plain(name: impl Into<String>) -> Self {
        Entry::Plain(name.into())
    }

    /// The file name, whichever shape the entry has.
    pub fn name(&self) -> &str {
        match self {
            Entry::Plain(name) => name,
            Entry::Annotated { name, .. } => name,
        }
    }

    /// Extracted symbols; empty for plain entries.
    pub fn symbols(&self) -> &[Symbol] {
        match self {
            Entry::Plain(_) => &[],
            Entry::Annotated { symbols, .. } => symbols,
        }
    }
}

/// One directory's ordered list of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Root-relative directory path with `/` separators, or [`ROOT_KEY`].
    pub key: String,
    entries: Vec<Entry>,
}

impl Bucket {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_root(&self) -> bool {
        self.key == ROOT_KEY
    }

    /// Last path component of the key, used as the diagram heading.
    pub fn display_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// Root-relative path of a file in this bucket, `/`-separated.
    pub fn relative_path(&self, file_name: &str) -> String {
        if self.is_root() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.key, file_name)
        }
    }

    /// Path of a file in this bucket, joined onto `root`.
    pub fn file_path(&self, root: &std::path::Path, file_name: &str) -> PathBuf {
        let mut path = root.to_path_buf();
        if !self.is_root() {
            path.extend(self.key.split('/'));
        }
        path.push(file_name);
        path
    }
}

/// Ordered directory → entries mapping.
///
/// Buckets are created by their first entry, so a bucket is never empty.
/// Callers push each file once; the walk never yields a path twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    buckets: Vec<Bucket>,
    index: HashMap<String, usize>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the bucket for `key`, creating the bucket at the
    /// end of the tree if it does not exist yet.
    pub fn push(&mut self, key: &str, entry: Entry) {
        match self.index.get(key) {
            Some(&i) => self.buckets[i].entries.push(entry),
            None => {
                self.index.insert(key.to_string(), self.buckets.len());
                self.buckets.push(Bucket {
                    key: key.to_string(),
                    entries: vec![entry],
                });
            }
        }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn get(&self, key: &str) -> Option<&Bucket> {
        self.index.get(key).map(|&i| &self.buckets[i])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.key.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of entries across all buckets.
    pub fn file_count(&self) -> usize {
        self.buckets.iter().map(|b| b.entries.len()).sum()
    }

    /// Every (bucket, entry) pair in tree order.
    pub fn files(&self) -> impl Iterator<Item = (&Bucket, &Entry)> {
        self.buckets
            .iter()
            .flat_map(|b| b.entries.iter().map(move |e| (b, e)))
    }

    /// Rebuild the tree with every entry passed through `f`, keeping order.
    pub fn map_entries<F>(self, mut f: F) -> Tree
    where
        F: FnMut(&Bucket, Entry) -> Entry,
    {
        let Tree { buckets, index } = self;
        let buckets = buckets
            .into_iter()
            .map(|mut bucket| {
                let entries = std::mem::take(&mut bucket.entries);
                bucket.entries = entries.into_iter().map(|e| f(&bucket, e)).collect();
                bucket
            })
            .collect();
        Tree { buckets, index }
    }
}

/// Box-drawing characters for tree rendering.
const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const VERTICAL: &str = "│   ";
const SPACE: &str = "    ";

/// Render the tree as a box-drawing diagram.
///
/// Each non-root bucket becomes a `name/` heading with its entries beneath;
/// annotated entries list their symbols two levels below the bucket, without
/// a guide line back to the entry. The `root` bucket is not drawn. No sorting
/// happens here.
///
/// # Examples
///
/// ```
/// use snapshot::tree::{Entry, Tree, render_tree};
///
/// let mut tree = Tree::new();
/// tree.push("app", Entry::plain("x.py"));
///
/// assert_eq!(render_tree(&tree), "└── app/\n    └── x.py\n");
/// ```
pub fn render_tree(tree: &Tree) -> String {
    let mut output = String::with_capacity(4096);

    let buckets: Vec<&Bucket> = tree.buckets().iter().filter(|b| !b.is_root()).collect();
    let bucket_count = buckets.len();

    for (i, bucket) in buckets.into_iter().enumerate() {
        let is_last = i + 1 == bucket_count;
        output.push_str(connector(is_last));
        output.push_str(bucket.display_name());
        output.push_str("/\n");

        let prefix = continuation(is_last);
        render_entries(&mut output, bucket.entries(), prefix);
    }

    output
}

fn render_entries(output: &mut String, entries: &[Entry], prefix: &str) {
    let entry_count = entries.len();
    for (j, entry) in entries.iter().enumerate() {
        let is_last = j + 1 == entry_count;
        output.push_str(prefix);
        output.push_str(connector(is_last));
        output.push_str(entry.name());
        output.push('\n');

        // symbols sit two columns under the bucket, whatever the entry's position
        let symbols = entry.symbols();
        let symbol_prefix = format!("{prefix}{SPACE}{SPACE}");
        for (k, symbol) in symbols.iter().enumerate() {
            output.push_str(&symbol_prefix);
            output.push_str(connector(k + 1 == symbols.len()));
            output.push_str(&symbol.to_string());
            output.push('\n');
        }
    }
}

fn connector(is_last: bool) -> &'static str {
    if is_last {
        LAST_BRANCH
    } else {
        BRANCH
    }
}

fn continuation(is_last: bool) -> &'static str {
    if is_last {
        SPACE
    } else {
        VERTICAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(buckets: &[(&str, &[&str])]) -> Tree {
        let mut tree = Tree::new();
        for (key, names) in buckets {
            for name in *names {
                tree.push(key, Entry::plain(*name));
            }
        }
        tree
    }

    #[test]
    fn test_push_keeps_insertion_order() {
        let tree = tree_with(&[("static", &["b.css"]), ("app", &["z.py", "a.py"])]);
        let keys: Vec<_> = tree.keys().collect();
        assert_eq!(keys, vec!["static", "app"]);

        let names: Vec<_> = tree.get("app").unwrap().entries().iter().map(Entry::name).collect();
        assert_eq!(names, vec!["z.py", "a.py"]);
    }

    #[test]
    fn test_push_returns_to_existing_bucket() {
        let mut tree = Tree::new();
        tree.push("app", Entry::plain("a.py"));
        tree.push("static", Entry::plain("s.css"));
        tree.push("app", Entry::plain("b.py"));

        let keys: Vec<_> = tree.keys().collect();
        assert_eq!(keys, vec!["app", "static"]);
        assert_eq!(tree.get("app").unwrap().entries().len(), 2);
        assert!(tree.get("missing").is_none());
    }

    #[test]
    fn test_push_many_entries_into_one_bucket() {
        let mut tree = Tree::new();
        for i in 0..5000 {
            tree.push("data", Entry::plain(format!("f{i}.json")));
        }
        tree.push("static", Entry::plain("s.css"));

        assert_eq!(tree.buckets().len(), 2);
        assert_eq!(tree.get("data").unwrap().entries().len(), 5000);
        assert_eq!(tree.file_count(), 5001);
    }

    #[test]
    fn test_bucket_paths() {
        let tree = tree_with(&[(ROOT_KEY, &["main.py"]), ("app/models", &["user.py"])]);

        let root = tree.get(ROOT_KEY).unwrap();
        assert_eq!(root.relative_path("main.py"), "main.py");
        assert_eq!(root.file_path(std::path::Path::new("proj"), "main.py"), PathBuf::from("proj/main.py"));

        let models = tree.get("app/models").unwrap();
        assert_eq!(models.display_name(), "models");
        assert_eq!(models.relative_path("user.py"), "app/models/user.py");
        assert_eq!(
            models.file_path(std::path::Path::new("proj"), "user.py"),
            PathBuf::from("proj/app/models/user.py")
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_tree(&Tree::new()), "");
    }

    #[test]
    fn test_render_single_bucket_single_entry() {
        let tree = tree_with(&[("app", &["x.py"])]);
        assert_eq!(render_tree(&tree), "└── app/\n    └── x.py\n");
    }

    #[test]
    fn test_render_two_buckets() {
        let tree = tree_with(&[("app", &["a.py", "b.py"]), ("static", &["s.css"])]);
        let expected = "\
├── app/
│   ├── a.py
│   └── b.py
└── static/
    └── s.css
";
        assert_eq!(render_tree(&tree), expected);
    }

    #[test]
    fn test_render_many_buckets_only_last_is_terminal() {
        let tree = tree_with(&[
            ("a", &["1"]),
            ("b", &["2"]),
            ("c", &["3"]),
            ("d", &["4"]),
        ]);
        let output = render_tree(&tree);
        let headings: Vec<_> = output.lines().filter(|l| l.ends_with('/')).collect();
        assert_eq!(headings, vec!["├── a/", "├── b/", "├── c/", "└── d/"]);
    }

    #[test]
    fn test_render_omits_root_bucket() {
        let tree = tree_with(&[(ROOT_KEY, &["main.py"]), ("app", &["x.py"])]);
        let output = render_tree(&tree);
        assert!(!output.contains("main.py"));
        assert!(!output.contains("root/"));
        assert!(output.starts_with("└── app/"));
    }

    #[test]
    fn test_render_root_last_does_not_steal_terminal_connector() {
        let tree = tree_with(&[("app", &["x.py"]), (ROOT_KEY, &["main.py"])]);
        assert!(render_tree(&tree).starts_with("└── app/"));
    }

    #[test]
    fn test_render_nested_key_uses_base_name() {
        let tree = tree_with(&[("app/models", &["user.py"])]);
        assert_eq!(render_tree(&tree), "└── models/\n    └── user.py\n");
    }

    #[test]
    fn test_render_annotated_entries() {
        let mut tree = Tree::new();
        tree.push(
            "app",
            Entry::Annotated {
                name: "x.py".into(),
                symbols: vec![
                    Symbol::Function("foo".into()),
                    Symbol::Class("C".into()),
                    Symbol::Method("bar".into()),
                ],
            },
        );
        tree.push("app", Entry::plain("y.txt"));

        let expected = "\
└── app/
    ├── x.py
            ├── function: foo
            ├── class: C
            └──   method: bar
    └── y.txt
";
        assert_eq!(render_tree(&tree), expected);
    }

    #[test]
    fn test_render_symbols_under_inner_bucket() {
        let mut tree = Tree::new();
        tree.push(
            "app",
            Entry::Annotated {
                name: "x.py".into(),
                symbols: vec![Symbol::Function("foo".into())],
            },
        );
        tree.push(
            "app",
            Entry::Annotated {
                name: "y.py".into(),
                symbols: vec![Symbol::Class("C".into())],
            },
        );
        tree.push("static", Entry::plain("s.css"));

        let expected = "\
├── app/
│   ├── x.py
│           └── function: foo
│   └── y.py
│           └── class: C
└── static/
    └── s.css
";
        assert_eq!(render_tree(&tree), expected);
    }

    #[test]
    fn test_map_entries_preserves_order() {
        let tree = tree_with(&[("app", &["a.py", "b.md"]), ("static", &["c.js"])]);
        let mapped = tree.map_entries(|bucket, entry| Entry::Annotated {
            name: entry.name().to_string(),
            symbols: vec![Symbol::Class(bucket.key.clone())],
        });

        let pairs: Vec<_> = mapped
            .files()
            .map(|(b, e)| (b.key.as_str(), e.name(), e.symbols().len()))
            .collect();
        assert_eq!(pairs, vec![("app", "a.py", 1), ("app", "b.md", 1), ("static", "c.js", 1)]);
    }
}
