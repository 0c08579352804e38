//! Source language detection from file extensions.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source language of a validated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// `.ts`, `.tsx`, `.mts`, `.cts`
    TypeScript,
    /// `.js`, `.jsx`, `.mjs`, `.cjs`
    JavaScript,
    /// `.py`
    Python,
    /// `.rs`
    Rust,
    /// `.java`
    Java,
    /// `.kt`, `.kts`
    Kotlin,
    /// `.go`
    Go,
    /// `.json`
    Json,
    /// `.yaml`, `.yml`
    Yaml,
    /// `.toml`
    Toml,
    /// `.md`
    Markdown,
    /// Any other extension, or none at all.
    Unknown,
}

const EXTENSIONS: &[(&str, Language)] = &[
    ("ts", Language::TypeScript),
    ("tsx", Language::TypeScript),
    ("mts", Language::TypeScript),
    ("cts", Language::TypeScript),
    ("js", Language::JavaScript),
    ("jsx", Language::JavaScript),
    ("mjs", Language::JavaScript),
    ("cjs", Language::JavaScript),
    ("py", Language::Python),
    ("rs", Language::Rust),
    ("java", Language::Java),
    ("kt", Language::Kotlin),
    ("kts", Language::Kotlin),
    ("go", Language::Go),
    ("json", Language::Json),
    ("yaml", Language::Yaml),
    ("yml", Language::Yaml),
    ("toml", Language::Toml),
    ("md", Language::Markdown),
];

impl Language {
    /// Detects the language from a path's extension. Never fails.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(Self::Unknown, Self::from_extension)
    }

    /// Looks up an extension (without the dot), case-insensitively.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .map_or(Self::Unknown, |(_, lang)| *lang)
    }

    /// Lowercase identifier, e.g. `"typescript"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Rust => "rust",
            Self::Java => "java",
            Self::Kotlin => "kotlin",
            Self::Go => "go",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Markdown => "markdown",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_extensions() {
        assert_eq!(
            Language::from_path(Path::new("src/foo.service.ts")),
            Language::TypeScript
        );
        assert_eq!(Language::from_path(Path::new("a/b.JSX")), Language::JavaScript);
        assert_eq!(Language::from_path(Path::new("build.kts")), Language::Kotlin);
    }

    #[test]
    fn unknown_extension_is_not_an_error() {
        assert_eq!(Language::from_path(Path::new("Makefile")), Language::Unknown);
        assert_eq!(Language::from_path(Path::new("data.bin")), Language::Unknown);
    }
}
