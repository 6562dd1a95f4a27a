//! core::ignore
//!
//! Gitignore-style rules deciding which working-tree paths are skipped.
//!
//! # Rules file
//!
//! `<work_dir>/.sheafignore`, one pattern per line:
//!
//! - Blank lines and lines starting with `#` are skipped
//! - A leading `!` re-includes a path excluded by an earlier rule
//! - A trailing `/` restricts the rule to directories
//! - A pattern containing `/` matches the whole relative path, otherwise
//!   it matches the final component only
//! - `*` matches any run of characters, `?` exactly one
//! - The last matching rule wins
//!
//! A path inside an ignored directory is ignored as well.
//!
//! # Example
//!
//! ```
//! use sheaf::core::ignore::{IgnoreMatcher, IgnoreRules};
//! use sheaf::core::types::RepoPath;
//!
//! let rules = IgnoreRules::parse("*.log\n!keep.log\ntarget/\n");
//! assert!(rules.is_ignored(&RepoPath::new("debug.log").unwrap(), false));
//! assert!(!rules.is_ignored(&RepoPath::new("keep.log").unwrap(), false));
//! assert!(rules.is_ignored(&RepoPath::new("target/out.bin").unwrap(), false));
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;

use crate::core::error::{RepoError, Result};
use crate::core::types::RepoPath;

/// Name of the rules file at the working-tree root.
pub const IGNORE_FILE: &str = ".sheafignore";

/// Decides whether a path is excluded from staging.
pub trait IgnoreMatcher {
    /// `is_dir` tells directory-only rules whether they apply to `path`.
    fn is_ignored(&self, path: &RepoPath, is_dir: bool) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    pattern: String,
    negated: bool,
    dir_only: bool,
}

impl Rule {
    fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let (negated, rest) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (dir_only, rest) = match rest.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let pattern = rest.trim_start_matches('/');
        if pattern.is_empty() {
            return None;
        }

        Some(Self {
            pattern: pattern.to_string(),
            negated,
            dir_only,
        })
    }

    fn matches(&self, path: &str) -> bool {
        if self.pattern.contains('/') {
            fnmatch(self.pattern.as_bytes(), path.as_bytes())
        } else {
            let name = path.rsplit('/').next().unwrap_or(path);
            fnmatch(self.pattern.as_bytes(), name.as_bytes())
        }
    }
}

/// Ordered ignore rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    rules: Vec<Rule>,
}

impl IgnoreRules {
    /// Parse rules from file contents.
    pub fn parse(contents: &str) -> Self {
        Self {
            rules: contents.lines().filter_map(Rule::parse).collect(),
        }
    }

    /// Load `.sheafignore` from `work_dir`. A missing file means no rules.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let path = work_dir.join(IGNORE_FILE);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let rules = Self::parse(&contents);
                debug!("loaded {} ignore rules from {}", rules.len(), path.display());
                Ok(rules)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(RepoError::io(path, e)),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Verdict for exactly `path`, ignoring its parents.
    fn verdict(&self, path: &str, is_dir: bool) -> bool {
        let mut ignored = false;
        for rule in &self.rules {
            if rule.dir_only && !is_dir {
                continue;
            }
            if rule.matches(path) {
                ignored = !rule.negated;
            }
        }
        ignored
    }
}

impl IgnoreMatcher for IgnoreRules {
    fn is_ignored(&self, path: &RepoPath, is_dir: bool) -> bool {
        if self.rules.is_empty() {
            return false;
        }

        let full = path.as_str();
        let mut prefix_end = 0;
        for component in path.components() {
            prefix_end += component.len();
            if prefix_end == full.len() {
                break;
            }
            if self.verdict(&full[..prefix_end], true) {
                return true;
            }
            prefix_end += 1;
        }
        self.verdict(full, is_dir)
    }
}

/// `*` matches any run of bytes, `?` a single byte.
fn fnmatch(pattern: &[u8], name: &[u8]) -> bool {
    let mut pi = 0;
    let mut ni = 0;
    let mut star: Option<(usize, usize)> = None;

    while ni < name.len() {
        if pi < pattern.len() && (pattern[pi] == b'?' || pattern[pi] == name[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < pattern.len() && pattern[pi] == b'*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((star_pi, star_ni)) = star {
            pi = star_pi + 1;
            ni = star_ni + 1;
            star = Some((star_pi, star_ni + 1));
        } else {
            return false;
        }
    }

    while pi < pattern.len() && pattern[pi] == b'*' {
        pi += 1;
    }
    pi == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignored(rules: &IgnoreRules, p: &str) -> bool {
        rules.is_ignored(&RepoPath::new(p).unwrap(), false)
    }

    #[test]
    fn empty_rules_ignore_nothing() {
        let rules = IgnoreRules::default();
        assert!(!ignored(&rules, "anything.txt"));
    }

    #[test]
    fn comments_and_blanks_skipped() {
        let rules = IgnoreRules::parse("# comment\n\n   \n*.tmp\n");
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn basename_patterns_match_anywhere() {
        let rules = IgnoreRules::parse("*.log");
        assert!(ignored(&rules, "debug.log"));
        assert!(ignored(&rules, "deep/dir/error.log"));
        assert!(!ignored(&rules, "main.rs"));
    }

    #[test]
    fn slash_patterns_match_full_path() {
        let rules = IgnoreRules::parse("docs/*.md");
        assert!(ignored(&rules, "docs/readme.md"));
        assert!(!ignored(&rules, "readme.md"));
    }

    #[test]
    fn negation_last_match_wins() {
        let rules = IgnoreRules::parse("*.log\n!important.log");
        assert!(ignored(&rules, "debug.log"));
        assert!(!ignored(&rules, "important.log"));

        let rules = IgnoreRules::parse("!important.log\n*.log");
        assert!(ignored(&rules, "important.log"));
    }

    #[test]
    fn dir_only_rules() {
        let rules = IgnoreRules::parse("build/");
        assert!(!ignored(&rules, "build"));
        assert!(rules.is_ignored(&RepoPath::new("build").unwrap(), true));
        assert!(ignored(&rules, "build/out.o"));
        assert!(ignored(&rules, "sub/build/out.o"));
    }

    #[test]
    fn question_mark() {
        let rules = IgnoreRules::parse("file?.txt");
        assert!(ignored(&rules, "file1.txt"));
        assert!(!ignored(&rules, "file12.txt"));
    }

    #[test]
    fn fnmatch_backtracks() {
        assert!(fnmatch(b"a*b*c", b"aXXbYYc"));
        assert!(fnmatch(b"*", b""));
        assert!(!fnmatch(b"a*c", b"abd"));
    }

    #[test]
    fn load_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(IgnoreRules::load(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn load_from_work_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(temp.path().join(IGNORE_FILE), "*.bak\n").unwrap();
        let rules = IgnoreRules::load(temp.path()).unwrap();
        assert!(ignored(&rules, "x.bak"));
    }
}
