//! Context types for rule evaluation.

use crate::capabilities::CapabilityIndex;
use crate::language::Language;

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Per-file data every rule is evaluated against.
///
/// Created fresh for each file on each run and dropped after evaluation.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Logical file name (last path component).
    pub file_name: String,
    /// Full text content.
    pub content: String,
    /// Path as handed over by the file discovery collaborator.
    pub path: PathBuf,
    /// Project root the run was started from.
    pub project_root: PathBuf,
    /// Path relative to the project root, with `/` separators.
    pub relative_path: String,
    /// Language detected from the extension.
    pub language: Language,
    /// Free-form caller-supplied metadata.
    pub metadata: BTreeMap<String, String>,
}

impl ValidationContext {
    /// Creates a context for `path` under `project_root`.
    #[must_use]
    pub fn new(path: &Path, content: impl Into<String>, project_root: &Path) -> Self {
        let file_name = path
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());

        Self {
            file_name,
            content: content.into(),
            path: path.to_path_buf(),
            project_root: project_root.to_path_buf(),
            relative_path: relative_path(path, project_root),
            language: Language::from_path(path),
            metadata: BTreeMap::new(),
        }
    }

    /// Replaces the metadata map.
    #[must_use]
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns the text of a 1-indexed line, if it exists.
    #[must_use]
    pub fn line(&self, line: usize) -> Option<&str> {
        line.checked_sub(1)
            .and_then(|i| self.content.lines().nth(i))
    }
}

/// Normalises `path` relative to `root` with forward slashes.
///
/// Paths outside `root` are kept as given.
fn relative_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// A [`ValidationContext`] together with its capability index.
#[derive(Debug, Clone)]
pub struct PluginContext {
    base: ValidationContext,
    capabilities: CapabilityIndex,
}

impl PluginContext {
    /// Scans the content once and wraps the base context.
    #[must_use]
    pub fn new(base: ValidationContext) -> Self {
        let capabilities = CapabilityIndex::build(&base.content);
        Self { base, capabilities }
    }

    /// The underlying context.
    #[must_use]
    pub fn base(&self) -> &ValidationContext {
        &self.base
    }

    /// The capability index.
    #[must_use]
    pub fn capabilities(&self) -> &CapabilityIndex {
        &self.capabilities
    }
}

/// What a rule's evaluator receives.
#[derive(Debug, Clone, Copy)]
pub enum Context<'a> {
    /// Plain file data.
    Basic(&'a ValidationContext),
    /// File data plus structural capability queries.
    WithCapabilities(&'a PluginContext),
}

impl<'a> Context<'a> {
    /// The file data, regardless of variant.
    #[must_use]
    pub fn base(&self) -> &'a ValidationContext {
        match *self {
            Self::Basic(ctx) => ctx,
            Self::WithCapabilities(ctx) => ctx.base(),
        }
    }

    /// The capability index, if this rule requested one.
    #[must_use]
    pub fn capabilities(&self) -> Option<&'a CapabilityIndex> {
        match *self {
            Self::Basic(_) => None,
            Self::WithCapabilities(ctx) => Some(ctx.capabilities()),
        }
    }

    /// Shorthand for `base().content`.
    #[must_use]
    pub fn content(&self) -> &'a str {
        &self.base().content
    }

    /// Shorthand for `base().path`.
    #[must_use]
    pub fn path(&self) -> &'a Path {
        &self.base().path
    }
}

/// Builds per-file contexts for one project root.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    project_root: PathBuf,
    metadata: BTreeMap<String, String>,
}

impl ContextBuilder {
    /// Creates a builder for files under `project_root`.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Metadata attached to every context this builder produces.
    #[must_use]
    pub fn metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// The configured project root.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Builds the base context.
    #[must_use]
    pub fn build(&self, path: &Path, content: String) -> ValidationContext {
        ValidationContext::new(path, content, &self.project_root).with_metadata(self.metadata.clone())
    }
}
