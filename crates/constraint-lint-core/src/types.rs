//! Core types for violations and per-file validation results.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Severity level for rule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, never affects validity.
    Info,
    /// Warning that should be addressed, never affects validity.
    Warning,
    /// Error that makes the file invalid.
    Error,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 3] = [Severity::Error, Severity::Warning, Severity::Info];

    /// Parses a lowercase severity name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single rule failure reported for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Identifier of the rule that produced this violation.
    pub rule_id: String,
    /// Severity of this violation.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// File the violation belongs to. Filled in by the engine when a rule omits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Optional remediation hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Line number (1-indexed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Column number (1-indexed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// Source excerpt the violation points at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Violation {
    /// Creates a new violation without location information.
    #[must_use]
    pub fn new(rule_id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            file: None,
            suggestion: None,
            line: None,
            column: None,
            snippet: None,
        }
    }

    /// Sets the file this violation belongs to.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Adds a remediation hint.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Sets only the line.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Attaches a source excerpt.
    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Formats the location as `file:line:column`, omitting unknown parts.
    #[must_use]
    pub fn location(&self) -> String {
        let mut out = self
            .file
            .as_deref()
            .map_or_else(|| "<unknown>".to_string(), |f| f.display().to_string());
        if let Some(line) = self.line {
            out.push_str(&format!(":{line}"));
            if let Some(column) = self.column {
                out.push_str(&format!(":{column}"));
            }
        }
        out
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.location(),
            self.severity,
            self.rule_id,
            self.message
        )
    }
}

/// Outcome of validating one file.
///
/// `is_valid` is derived from the violations at construction and cannot drift.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    file: PathBuf,
    violations: Vec<Violation>,
    is_valid: bool,
    execution_time: Duration,
}

impl ValidationResult {
    /// Creates a result; validity is true iff no violation has `Severity::Error`.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, violations: Vec<Violation>, execution_time: Duration) -> Self {
        let is_valid = !violations.iter().any(|v| v.severity == Severity::Error);
        Self {
            file: file.into(),
            violations,
            is_valid,
            execution_time,
        }
    }

    /// The validated file.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Violations in rule registration order.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether the file passed (warnings and infos do not count).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Wall time spent on this file.
    #[must_use]
    pub fn execution_time(&self) -> Duration {
        self.execution_time
    }

    /// Replaces the recorded wall time, e.g. for a result served from cache.
    #[must_use]
    pub fn with_execution_time(mut self, elapsed: Duration) -> Self {
        self.execution_time = elapsed;
        self
    }

    /// Number of violations with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_violation(severity: Severity) -> Violation {
        Violation::new("must-extend-base", severity, "Plugin must extend BaseActionPlugin")
            .with_file("src/foo.plugin.ts")
    }

    #[test]
    fn severity_orders_by_importance() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert_eq!(Severity::parse("warning"), Some(Severity::Warning));
        assert_eq!(Severity::parse("fatal"), None);
    }

    #[test]
    fn result_with_only_warnings_is_valid() {
        let result = ValidationResult::new(
            "a.ts",
            vec![make_violation(Severity::Warning), make_violation(Severity::Info)],
            Duration::ZERO,
        );
        assert!(result.is_valid());
        assert_eq!(result.count(Severity::Warning), 1);
    }

    #[test]
    fn result_with_error_is_invalid() {
        let result = ValidationResult::new(
            "a.ts",
            vec![make_violation(Severity::Info), make_violation(Severity::Error)],
            Duration::ZERO,
        );
        assert!(!result.is_valid());
    }

    #[test]
    fn empty_result_is_valid() {
        assert!(ValidationResult::new("a.ts", vec![], Duration::ZERO).is_valid());
    }

    #[test]
    fn display_is_single_line() {
        let v = make_violation(Severity::Error).at(3, 7);
        insta::assert_snapshot!(
            v.to_string(),
            @"src/foo.plugin.ts:3:7: error [must-extend-base] Plugin must extend BaseActionPlugin"
        );
    }

    #[test]
    fn location_omits_missing_parts() {
        let v = Violation::new("r", Severity::Info, "m");
        assert_eq!(v.location(), "<unknown>");
        let v = v.with_file("x.ts").at_line(4);
        assert_eq!(v.location(), "x.ts:4");
    }
}
