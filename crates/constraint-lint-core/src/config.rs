//! Configuration types for constraint-lint.

use crate::pattern::{FilePattern, PatternError};
use crate::types::Severity;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Worker count used when nothing else is configured.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Top-level configuration.
///
/// Unknown top-level tables (such as `[[constraints]]`) are ignored here so the
/// same file can also carry declarative rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Per-rule configurations.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a value is out of range.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks concurrency and pattern values.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(0));
        }
        for pattern in self.engine.include.iter().chain(&self.engine.exclude) {
            FilePattern::new(pattern)?;
        }
        Ok(())
    }

    /// Checks if a rule is enabled. Rules without an entry are enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        self.rules
            .get(rule_id)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, rule_id: &str) -> Option<Severity> {
        self.rules.get(rule_id).and_then(|c| c.severity)
    }
}

/// Engine-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Project root (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns a project file must match (all files when empty).
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns excluded from project discovery.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Maximum number of files validated at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Whether results are cached by content hash.
    #[serde(default = "default_true")]
    pub cache: bool,

    /// Whether discovery honours `.gitignore` files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            include: Vec::new(),
            exclude: default_exclude(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            cache: true,
            respect_gitignore: true,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_exclude() -> Vec<String> {
    vec!["**/node_modules/**".to_string(), "**/target/**".to_string()]
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_true() -> bool {
    true
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule runs.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity applied to the rule's own violations.
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    #[diagnostic(code(constraint_lint::config::io))]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    #[diagnostic(code(constraint_lint::config::parse))]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A configured glob does not compile.
    #[error(transparent)]
    #[diagnostic(code(constraint_lint::config::invalid_pattern))]
    InvalidPattern(#[from] PatternError),

    /// Concurrency must be at least one.
    #[error("max_concurrency must be at least 1, got {0}")]
    #[diagnostic(
        code(constraint_lint::config::invalid_concurrency),
        help("omit `max_concurrency` to use the default of 4")
    )]
    InvalidConcurrency(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.engine.respect_gitignore);
        assert!(config.engine.cache);
        assert_eq!(config.engine.max_concurrency, 4);
        assert!(config.rules.is_empty());
        assert!(config.is_rule_enabled("anything"));
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[engine]
root = "./app"
include = ["src/**/*.ts"]
exclude = ["**/generated/**"]
max_concurrency = 8

[rules.must-extend-base]
enabled = true
severity = "warning"

[rules.no-console]
enabled = false

[[constraints]]
id = "ignored-here"
"#;

        let config = Config::parse(toml).expect("Failed to parse");
        assert_eq!(config.engine.root, PathBuf::from("./app"));
        assert_eq!(config.engine.max_concurrency, 8);
        assert_eq!(config.engine.exclude, vec!["**/generated/**"]);
        assert!(config.is_rule_enabled("must-extend-base"));
        assert!(!config.is_rule_enabled("no-console"));
        assert_eq!(config.rule_severity("must-extend-base"), Some(Severity::Warning));
        assert_eq!(config.rule_severity("no-console"), None);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = Config::parse("[engine]\nmax_concurrency = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConcurrency(0)));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let err = Config::parse("[engine]\ninclude = [\"src/[z-\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern(_)));
    }

    #[test]
    fn unknown_severity_is_a_parse_error() {
        let err = Config::parse("[rules.x]\nseverity = \"fatal\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
