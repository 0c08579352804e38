//! Compiled file patterns for rule applicability.

use std::fmt;

/// Pattern a rule gets when no include pattern was supplied.
pub const MATCH_ALL: &str = "**";

/// A validated glob pattern matched against project-relative paths.
///
/// The glob is compiled once at construction and reused for all match calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    raw: String,
    compiled: glob::Pattern,
}

/// Pattern construction failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid file pattern `{pattern}`: {reason}")]
pub struct PatternError {
    /// The rejected pattern.
    pub pattern: String,
    /// Why it was rejected.
    pub reason: String,
}

impl FilePattern {
    /// Compiles a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is empty or has invalid glob syntax.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if pattern.trim().is_empty() {
            return Err(PatternError {
                pattern: pattern.to_string(),
                reason: "pattern is empty".to_string(),
            });
        }
        let compiled = glob::Pattern::new(pattern).map_err(|e| PatternError {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: pattern.to_string(),
            compiled,
        })
    }

    /// The pattern that matches every path.
    #[must_use]
    pub fn match_all() -> Self {
        Self {
            raw: MATCH_ALL.to_string(),
            compiled: glob::Pattern::new(MATCH_ALL).unwrap_or_default(),
        }
    }

    /// Whether this is the match-all pattern.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.raw == MATCH_ALL
    }

    /// Tests a `/`-separated path relative to the project root.
    #[must_use]
    pub fn matches(&self, relative_path: &str) -> bool {
        if self.is_match_all() || self.compiled.matches(relative_path) {
            return true;
        }
        // `dir/**` should also cover `dir/` itself and every descendant.
        if let Some(prefix) = self.raw.strip_suffix("/**") {
            let prefix = prefix.trim_end_matches('/');
            if relative_path.starts_with(prefix)
                && relative_path
                    .as_bytes()
                    .get(prefix.len())
                    .is_some_and(|&b| b == b'/')
            {
                return true;
            }
        }
        // `**/name` should match `name` at the root.
        if let Some(suffix) = self.raw.strip_prefix("**/") {
            if let Ok(p) = glob::Pattern::new(suffix) {
                return p.matches(relative_path);
            }
        }
        false
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl serde::Serialize for FilePattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_pattern_matches_at_any_depth() {
        let p = FilePattern::new("*.service.ts").unwrap();
        assert!(p.matches("user.service.ts"));
        assert!(p.matches("src/users/user.service.ts"));
        assert!(!p.matches("foo.controller.ts"));
    }

    #[test]
    fn directory_globstar() {
        let p = FilePattern::new("src/plugins/**").unwrap();
        assert!(p.matches("src/plugins/a.ts"));
        assert!(p.matches("src/plugins/deep/b.ts"));
        assert!(!p.matches("src/pluginsx/a.ts"));
        assert!(!p.matches("lib/plugins/a.ts"));
    }

    #[test]
    fn leading_globstar_matches_root_files() {
        let p = FilePattern::new("**/*.spec.ts").unwrap();
        assert!(p.matches("a.spec.ts"));
        assert!(p.matches("src/a.spec.ts"));
        assert!(!p.matches("src/a.ts"));
    }

    #[test]
    fn match_all_matches_everything() {
        let p = FilePattern::match_all();
        assert!(p.is_match_all());
        assert!(p.matches("anything/at/all.txt"));
        assert!(p.matches("Makefile"));
    }

    #[test]
    fn rejects_malformed_and_empty_patterns() {
        assert!(FilePattern::new("src/[a-").is_err());
        assert!(FilePattern::new("").is_err());
        assert!(FilePattern::new("   ").is_err());
    }
}
