// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gitignore-style exclusion rules for space listings
//!
//! Supports the subset of gitignore syntax that matters for a notes folder:
//! comments, negation (`!`), directory-only patterns (trailing `/`), and
//! anchoring (a pattern containing `/` is relative to the space root,
//! otherwise it matches at any depth). The last matching rule wins.

use globset::{GlobBuilder, GlobMatcher};
use tracing::warn;

struct IgnoreRule {
    matcher: GlobMatcher,
    negated: bool,
    directory_only: bool,
}

/// Compiled set of ignore rules
#[derive(Default)]
pub struct IgnoreMatcher {
    rules: Vec<IgnoreRule>,
}

impl IgnoreMatcher {
    /// Compile newline-separated patterns; invalid lines are skipped
    pub fn from_lines(text: &str) -> Self {
        let rules = text
            .lines()
            .filter_map(|line| {
                let rule = compile_rule(line);
                if let Some(Err(e)) = &rule {
                    warn!(pattern = %line, error = %e, "Skipping invalid ignore pattern");
                }
                rule.and_then(Result::ok)
            })
            .collect();
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether the file at `path` (space-relative, slash separated) is ignored
    ///
    /// A file is also ignored when one of its parent directories is.
    pub fn is_ignored(&self, path: &str) -> bool {
        if self.rules.is_empty() {
            return false;
        }

        let mut ignored = false;
        for (end, _) in path.match_indices('/') {
            ignored = self.evaluate(&path[..end], true, ignored);
        }
        self.evaluate(path, false, ignored)
    }

    fn evaluate(&self, candidate: &str, is_dir: bool, mut ignored: bool) -> bool {
        for rule in &self.rules {
            if rule.directory_only && !is_dir {
                continue;
            }
            if rule.matcher.is_match(candidate) {
                ignored = !rule.negated;
            }
        }
        ignored
    }
}

fn compile_rule(line: &str) -> Option<Result<IgnoreRule, globset::Error>> {
    let line = line.trim_end();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (negated, pattern) = match line.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, line.strip_prefix('\\').unwrap_or(line)),
    };
    let (directory_only, pattern) = match pattern.strip_suffix('/') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    if pattern.is_empty() {
        return None;
    }

    let glob = if pattern.contains('/') {
        pattern.trim_start_matches('/').to_string()
    } else {
        format!("**/{}", pattern)
    };

    Some(
        GlobBuilder::new(&glob)
            .literal_separator(true)
            .build()
            .map(|glob| IgnoreRule {
                matcher: glob.compile_matcher(),
                negated,
                directory_only,
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_matcher_ignores_nothing() {
        let matcher = IgnoreMatcher::from_lines("");
        assert!(matcher.is_empty());
        assert!(!matcher.is_ignored("a.md"));
    }

    #[test]
    fn test_unanchored_pattern_matches_any_depth() {
        let matcher = IgnoreMatcher::from_lines("*.tmp\n# comment\n");
        assert!(matcher.is_ignored("scratch.tmp"));
        assert!(matcher.is_ignored("deep/down/scratch.tmp"));
        assert!(!matcher.is_ignored("notes.md"));
    }

    #[test]
    fn test_anchored_pattern() {
        let matcher = IgnoreMatcher::from_lines("/drafts/*.md");
        assert!(matcher.is_ignored("drafts/a.md"));
        assert!(!matcher.is_ignored("other/drafts/a.md"));
    }

    #[test]
    fn test_directory_pattern_ignores_contents() {
        let matcher = IgnoreMatcher::from_lines("node_modules/");
        assert!(matcher.is_ignored("node_modules/pkg/index.js"));
        assert!(matcher.is_ignored("web/node_modules/pkg/index.js"));
        assert!(!matcher.is_ignored("node_modules.md"));
    }

    #[test]
    fn test_negation_last_match_wins() {
        let matcher = IgnoreMatcher::from_lines("*.log\n!keep.log");
        assert!(matcher.is_ignored("debug.log"));
        assert!(!matcher.is_ignored("keep.log"));
    }
}
