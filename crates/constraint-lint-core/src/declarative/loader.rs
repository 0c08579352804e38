//! DTO → Domain model conversion with validation.

use crate::pattern::{FilePattern, PatternError};
use crate::types::Severity;

use super::config_dto::{ConstraintDto, RuleSetDocumentDto, RuleSetDto};
use super::model::{
    Check, CheckKind, Constraint, DeclarativeRuleSet, ModelError, RuleSetHeader, TextMatcher,
};

/// Errors during DTO → Domain conversion.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A field-level validation error.
    #[error("{context}: {source}")]
    Validation {
        /// Where the error occurred (e.g., "constraints[0].pattern").
        context: String,
        /// The underlying model error.
        source: ModelError,
    },

    /// A `files` or `exclude` glob does not compile.
    #[error("{context}: {source}")]
    Pattern {
        /// Where the error occurred.
        context: String,
        /// The underlying pattern error.
        source: PatternError,
    },

    /// Unknown severity string.
    #[error("{context}: unknown severity `{value}`, expected: error, warning, info")]
    UnknownSeverity {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// Cross-constraint errors from aggregate root construction.
    #[error("rule set validation errors:\n{}", format_errors(.0))]
    CrossRef(Vec<ModelError>),
}

fn format_errors(errors: &[ModelError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Converts a `RuleSetDocumentDto` to a validated `DeclarativeRuleSet`.
///
/// # Errors
///
/// Returns the first error encountered during conversion.
pub fn load(dto: RuleSetDocumentDto) -> Result<DeclarativeRuleSet, LoadError> {
    let header = dto.rule_set.map(convert_header);

    let constraints = dto
        .constraints
        .into_iter()
        .enumerate()
        .map(|(i, c)| convert_constraint(c, i))
        .collect::<Result<Vec<_>, _>>()?;

    DeclarativeRuleSet::new(header, constraints).map_err(LoadError::CrossRef)
}

fn convert_header(dto: RuleSetDto) -> RuleSetHeader {
    RuleSetHeader {
        name: dto.name,
        version: dto.version,
        description: dto.description,
    }
}

fn convert_constraint(dto: ConstraintDto, index: usize) -> Result<Constraint, LoadError> {
    let ctx = if dto.id.trim().is_empty() {
        format!("constraints[{index}]")
    } else {
        format!("constraints[{index}] '{}'", dto.id)
    };
    let invalid = |field: &str, source: ModelError| LoadError::Validation {
        context: format!("{ctx}.{field}"),
        source,
    };

    if dto.id.trim().is_empty() {
        return Err(invalid("id", ModelError::EmptyId));
    }

    let kind = CheckKind::parse(&dto.check).ok_or_else(|| {
        invalid(
            "check",
            ModelError::UnknownCheck {
                value: dto.check.clone(),
            },
        )
    })?;

    let matcher = dto
        .pattern
        .as_deref()
        .map(|p| TextMatcher::new(p, dto.regex))
        .transpose()
        .map_err(|e| invalid("pattern", e))?;
    let check = Check::new(kind, matcher, dto.limit).map_err(|e| invalid("check", e))?;

    validate_globs(&dto.files, &format!("{ctx}.files"))?;
    validate_globs(&dto.exclude, &format!("{ctx}.exclude"))?;

    let severity = parse_severity(&dto.severity, &ctx)?;
    let message = dto.message.unwrap_or_else(|| check.default_message());
    let name = dto.name.unwrap_or_else(|| dto.id.clone());
    let description = dto.description.unwrap_or_else(|| message.clone());

    Ok(Constraint {
        id: dto.id,
        name,
        description,
        severity,
        category: dto.category,
        tags: dto.tags,
        files: dto.files,
        exclude: dto.exclude,
        check,
        message,
        suggestion: dto.suggestion,
    })
}

fn validate_globs(patterns: &[String], context: &str) -> Result<(), LoadError> {
    for (i, p) in patterns.iter().enumerate() {
        FilePattern::new(p).map_err(|source| LoadError::Pattern {
            context: format!("{context}[{i}]"),
            source,
        })?;
    }
    Ok(())
}

fn parse_severity(value: &str, context: &str) -> Result<Severity, LoadError> {
    Severity::parse(value).ok_or_else(|| LoadError::UnknownSeverity {
        context: context.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_and_load(toml_str: &str) -> Result<DeclarativeRuleSet, LoadError> {
        let dto: RuleSetDocumentDto = toml::from_str(toml_str).unwrap();
        load(dto)
    }

    // -- Happy path --

    #[test]
    fn load_empty_document() {
        let set = parse_and_load("").unwrap();
        assert!(set.is_empty());
        assert!(set.header().is_none());
    }

    #[test]
    fn load_full_document() {
        let set = parse_and_load(
            r#"
[rule_set]
name = "plugin-conventions"
version = "1.0.0"
description = "Conventions for action plugins"

[[constraints]]
id = "must-extend-base"
name = "Must extend BaseActionPlugin"
severity = "error"
category = "plugins"
tags = ["plugin"]
files = ["**/*.plugin.ts"]
exclude = ["**/*.spec.ts"]
check = "require-content"
pattern = "extends BaseActionPlugin"
message = "Plugin must extend BaseActionPlugin"
suggestion = "Add `extends BaseActionPlugin`"

[[constraints]]
id = "no-console"
check = "forbid-content"
pattern = 'console\.(log|debug)'
regex = true

[[constraints]]
id = "short"
check = "max-lines"
limit = 200
"#,
        )
        .unwrap();

        let header = set.header().unwrap();
        assert_eq!(header.name, "plugin-conventions");
        assert_eq!(set.constraints().len(), 3);

        let first = &set.constraints()[0];
        assert_eq!(first.severity, Severity::Error);
        assert_eq!(first.check.kind(), CheckKind::RequireContent);
        assert_eq!(first.description, "Plugin must extend BaseActionPlugin");

        let second = &set.constraints()[1];
        assert_eq!(second.name, "no-console");
        assert_eq!(second.severity, Severity::Warning);
        assert!(matches!(second.check, Check::ForbidContent(TextMatcher::Regex(_))));
    }

    // -- Error cases --

    #[test]
    fn load_rejects_unknown_check() {
        let result = parse_and_load(
            r#"
[[constraints]]
id = "x"
check = "require-everything"
"#,
        );
        let Err(LoadError::Validation { context, source }) = result else {
            panic!("expected validation error");
        };
        assert_eq!(context, "constraints[0] 'x'.check");
        assert!(matches!(source, ModelError::UnknownCheck { .. }));
    }

    #[test]
    fn load_rejects_missing_pattern() {
        let result = parse_and_load(
            r#"
[[constraints]]
id = "x"
check = "require-class"
"#,
        );
        assert!(matches!(result, Err(LoadError::Validation { .. })));
    }

    #[test]
    fn load_rejects_bad_regex() {
        let result = parse_and_load(
            r#"
[[constraints]]
id = "x"
check = "forbid-content"
pattern = "(unclosed"
regex = true
"#,
        );
        assert!(matches!(
            result,
            Err(LoadError::Validation {
                source: ModelError::InvalidRegex { .. },
                ..
            })
        ));
    }

    #[test]
    fn load_rejects_bad_glob() {
        let result = parse_and_load(
            r#"
[[constraints]]
id = "x"
check = "max-lines"
limit = 10
files = ["src/[z-"]
"#,
        );
        assert!(matches!(result, Err(LoadError::Pattern { .. })));
    }

    #[test]
    fn load_rejects_unknown_severity() {
        let result = parse_and_load(
            r#"
[[constraints]]
id = "x"
check = "max-lines"
limit = 10
severity = "critical"
"#,
        );
        assert!(matches!(result, Err(LoadError::UnknownSeverity { .. })));
    }

    #[test]
    fn load_rejects_blank_id() {
        let result = parse_and_load(
            r#"
[[constraints]]
id = " "
check = "max-lines"
limit = 10
"#,
        );
        assert!(matches!(
            result,
            Err(LoadError::Validation {
                source: ModelError::EmptyId,
                ..
            })
        ));
    }

    #[test]
    fn load_rejects_duplicate_ids() {
        let result = parse_and_load(
            r#"
[[constraints]]
id = "x"
check = "max-lines"
limit = 10

[[constraints]]
id = "x"
check = "max-lines"
limit = 20
"#,
        );
        assert!(matches!(result, Err(LoadError::CrossRef(_))));
    }
}
