//! File collaborators: content reading and project file discovery.
//!
//! The engine only depends on the [`FileSource`] and [`FileDiscovery`] traits.
//! [`FsFileSource`] and [`WalkDiscovery`] are the default implementations.

use crate::context::ValidationContext;
use crate::pattern::{FilePattern, PatternError};

use std::path::{Path, PathBuf};

/// Reads file contents.
pub trait FileSource: Send + Sync {
    /// Returns the full text of `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error; the engine turns it into a violation.
    fn read(&self, path: &Path) -> std::io::Result<String>;
}

/// Reads from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFileSource;

impl FileSource for FsFileSource {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Include/exclude globs handed to file discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatterns {
    /// Paths must match one of these (all files when empty).
    pub include: Vec<String>,
    /// Paths matching any of these are dropped.
    pub exclude: Vec<String>,
}

impl ProjectPatterns {
    /// Creates a pattern set.
    #[must_use]
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }
}

/// File discovery errors.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DiscoveryError {
    /// A glob did not compile.
    #[error(transparent)]
    #[diagnostic(code(constraint_lint::discovery::pattern))]
    Pattern(#[from] PatternError),

    /// Walking the directory tree failed.
    #[error("failed to walk project: {0}")]
    #[diagnostic(code(constraint_lint::discovery::walk))]
    Walk(#[from] ignore::Error),
}

/// Resolves include/exclude patterns to files.
pub trait FileDiscovery: Send + Sync {
    /// Returns a sorted, deduplicated list of files under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed patterns or an unreadable tree.
    fn discover(&self, root: &Path, patterns: &ProjectPatterns) -> Result<Vec<PathBuf>, DiscoveryError>;
}

/// Walks the tree with `ignore`, honouring `.gitignore` when asked.
#[derive(Debug, Clone, Copy)]
pub struct WalkDiscovery {
    respect_gitignore: bool,
}

impl WalkDiscovery {
    /// Creates a walker.
    #[must_use]
    pub fn new(respect_gitignore: bool) -> Self {
        Self { respect_gitignore }
    }
}

impl Default for WalkDiscovery {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FileDiscovery for WalkDiscovery {
    fn discover(&self, root: &Path, patterns: &ProjectPatterns) -> Result<Vec<PathBuf>, DiscoveryError> {
        let include = compile(&patterns.include)?;
        let exclude = compile(&patterns.exclude)?;

        let mut builder = ignore::WalkBuilder::new(root);
        builder
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            let rel = ValidationContext::new(path, "", root).relative_path;
            if rel.starts_with(".git/") {
                continue;
            }

            let included = include.is_empty() || include.iter().any(|p| p.matches(&rel));
            if !included || exclude.iter().any(|p| p.matches(&rel)) {
                tracing::debug!("Excluding: {}", path.display());
                continue;
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        files.dedup();
        Ok(files)
    }
}

fn compile(patterns: &[String]) -> Result<Vec<FilePattern>, PatternError> {
    patterns.iter().map(|p| FilePattern::new(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn discovers_sorted_filtered_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/b.plugin.ts");
        touch(root, "src/a.plugin.ts");
        touch(root, "src/a.plugin.spec.ts");
        touch(root, "src/readme.md");
        touch(root, "node_modules/x/index.ts");

        let patterns = ProjectPatterns::new(
            vec!["**/*.ts".into()],
            vec!["**/*.spec.ts".into(), "node_modules/**".into()],
        );
        let files = WalkDiscovery::default().discover(root, &patterns).unwrap();
        let rel: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["src/a.plugin.ts", "src/b.plugin.ts"]);
    }

    #[test]
    fn empty_include_means_everything() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.txt");
        touch(dir.path(), "b/c.rs");
        let files = WalkDiscovery::default()
            .discover(dir.path(), &ProjectPatterns::default())
            .unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn malformed_pattern_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let patterns = ProjectPatterns::new(vec!["[".into()], vec![]);
        let err = WalkDiscovery::default().discover(dir.path(), &patterns).unwrap_err();
        assert!(matches!(err, DiscoveryError::Pattern(_)));
    }

    #[test]
    fn fs_source_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FsFileSource.read(&dir.path().join("nope.ts")).is_err());
    }
}
