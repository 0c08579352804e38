//! TOML deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization.
//! They are converted to domain model types via the loader.

use serde::Deserialize;

/// Raw TOML representation of a rule-set document.
///
/// Other top-level tables (`[engine]`, `[rules.*]`) are ignored, so the same
/// file can be both the engine config and a rule set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSetDocumentDto {
    /// Bundle header.
    #[serde(default)]
    pub rule_set: Option<RuleSetDto>,

    /// Declared constraints, in registration order.
    #[serde(default)]
    pub constraints: Vec<ConstraintDto>,
}

/// TOML representation of the `[rule_set]` header.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSetDto {
    /// Bundle name.
    pub name: String,
    /// Bundle version.
    #[serde(default = "default_version")]
    pub version: String,
    /// What the bundle enforces.
    #[serde(default)]
    pub description: String,
}

/// TOML representation of one `[[constraints]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ConstraintDto {
    /// Rule identifier (e.g., "must-extend-base").
    pub id: String,
    /// Display name (default: the id).
    #[serde(default)]
    pub name: Option<String>,
    /// Description (default: the message).
    #[serde(default)]
    pub description: Option<String>,
    /// Severity (default: "warning").
    #[serde(default = "default_severity_str")]
    pub severity: String,
    /// Category (default: "general").
    #[serde(default)]
    pub category: Option<String>,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Include globs (default: every file).
    #[serde(default)]
    pub files: Vec<String>,
    /// Exclude globs.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Check kind (e.g., "require-content").
    pub check: String,
    /// Text or name the check looks for.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Treat `pattern` as a regular expression.
    #[serde(default)]
    pub regex: bool,
    /// Violation message (default: derived from the check).
    #[serde(default)]
    pub message: Option<String>,
    /// Remediation hint.
    #[serde(default)]
    pub suggestion: Option<String>,
    /// Line limit for `max-lines`.
    #[serde(default)]
    pub limit: Option<usize>,
}

fn default_severity_str() -> String {
    "warning".to_string()
}

fn default_version() -> String {
    "0.0.0".to_string()
}
