//! Allow-list filter for prefetch paths.

/// Case-insensitive allow list of files and folders.
///
/// Three pattern shapes are supported:
///
/// - `src/` — a folder: matches everything under it
/// - `src/gen*` — a single trailing wildcard: matches paths starting
///   with the stem
/// - `README.md` — an exact file path
///
/// An empty filter matches everything. Backslashes are normalized to
/// forward slashes before matching, since the virtualization layer hands
/// out Windows-style paths.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
enum Rule {
    Folder(String),
    Stem(String),
    Exact(String),
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").to_lowercase()
}

impl PathFilter {
    /// Builds a filter from allow-list patterns.
    ///
    /// Blank patterns are ignored.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .filter_map(|pattern| {
                let pattern = normalize(pattern.as_ref().trim());
                if pattern.is_empty() {
                    return None;
                }
                Some(if let Some(stem) = pattern.strip_suffix('*') {
                    Rule::Stem(stem.to_string())
                } else if pattern.ends_with('/') {
                    Rule::Folder(pattern)
                } else {
                    Rule::Exact(pattern)
                })
            })
            .collect();
        Self { rules }
    }

    /// Returns true when no patterns were provided, meaning every path
    /// matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Checks a path against the allow list.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        if self.rules.is_empty() {
            return true;
        }
        let path = normalize(path);
        self.rules.iter().any(|rule| match rule {
            Rule::Folder(prefix) | Rule::Stem(prefix) => path.starts_with(prefix),
            Rule::Exact(exact) => path == *exact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let filter = PathFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches("anything/at/all.txt"));
    }

    #[test]
    fn folder_pattern_matches_subtree() {
        let filter = PathFilter::new(["src/"]);
        assert!(filter.matches("src/lib.rs"));
        assert!(filter.matches("src/deep/nested/mod.rs"));
        assert!(!filter.matches("tests/lib.rs"));
        assert!(!filter.matches("srcx/lib.rs"));
    }

    #[test]
    fn trailing_wildcard_matches_stem() {
        let filter = PathFilter::new(["docs/api*"]);
        assert!(filter.matches("docs/api.md"));
        assert!(filter.matches("docs/api-v2/index.md"));
        assert!(!filter.matches("docs/readme.md"));
    }

    #[test]
    fn exact_pattern_matches_one_file() {
        let filter = PathFilter::new(["README.md"]);
        assert!(filter.matches("README.md"));
        assert!(filter.matches("readme.MD")); // case-insensitive
        assert!(!filter.matches("README.md.bak"));
    }

    #[test]
    fn backslashes_are_normalized() {
        let filter = PathFilter::new(["src\\"]);
        assert!(filter.matches("src\\main.rs"));
        assert!(filter.matches("src/main.rs"));
    }

    #[test]
    fn blank_patterns_are_ignored() {
        let filter = PathFilter::new(["", "  ", "src/"]);
        assert!(!filter.is_empty());
        assert!(filter.matches("src/a.rs"));
        assert!(!filter.matches("other/a.rs"));
    }
}
