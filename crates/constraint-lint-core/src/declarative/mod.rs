//! Declarative constraint rules driven by TOML.
//!
//! Lets a project define constraints without writing Rust rule code.
//!
//! # Architecture
//!
//! ```text
//! TOML text
//!   ↓ serde (DTO layer)
//! config_dto types
//!   ↓ validate + convert
//! DeclarativeRuleSet (pure domain model)
//!   ↓ load_rules_from_toml() / load_rule_set_from_toml()
//! Vec<Rule> / RuleSet
//! ```

pub mod checks;
pub mod config_dto;
pub mod loader;
pub mod model;

use crate::rule::{Rule, RuleBuildError, RuleSet};

/// Errors from parsing TOML and loading declarative rules.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum LoadRulesError {
    /// TOML deserialization failed.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(constraint_lint::declarative::toml))]
    Toml(#[from] toml::de::Error),

    /// Domain model validation failed.
    #[error("{0}")]
    #[diagnostic(code(constraint_lint::declarative::invalid))]
    Load(#[from] loader::LoadError),

    /// A constraint could not be finalized as a rule.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] RuleBuildError),
}

/// Parses TOML content and creates one rule per `[[constraints]]` entry.
///
/// Returns `Ok(vec![])` if no constraints are present.
///
/// # Errors
///
/// Returns an error if TOML parsing or model validation fails.
pub fn load_rules_from_toml(content: &str) -> Result<Vec<Rule>, LoadRulesError> {
    Ok(load_rule_set_from_toml(content)?.into_rules())
}

/// Parses TOML content into a [`RuleSet`].
///
/// Without a `[rule_set]` header the bundle is unnamed.
///
/// # Errors
///
/// Returns an error if TOML parsing or model validation fails.
pub fn load_rule_set_from_toml(content: &str) -> Result<RuleSet, LoadRulesError> {
    let dto: config_dto::RuleSetDocumentDto = toml::from_str(content)?;
    let model = loader::load(dto)?;
    create_rule_set(model)
}

/// Creates the rule set from a validated [`model::DeclarativeRuleSet`].
///
/// # Errors
///
/// Returns an error if a constraint fails rule finalization.
pub fn create_rule_set(model: model::DeclarativeRuleSet) -> Result<RuleSet, LoadRulesError> {
    let (header, constraints) = model.into_parts();
    let mut set = header.map_or_else(RuleSet::default, |h| {
        RuleSet::new(h.name, h.version, h.description)
    });
    for constraint in constraints {
        set.rules.push(checks::build_rule(constraint)?);
    }
    tracing::debug!("Loaded {} declarative rules", set.rules.len());
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_no_rules() {
        assert!(load_rules_from_toml("").unwrap().is_empty());
    }

    #[test]
    fn rule_set_header_is_carried() {
        let set = load_rule_set_from_toml(
            r#"
[rule_set]
name = "plugin-conventions"
version = "1.0.0"
description = "Conventions for action plugins"

[[constraints]]
id = "must-extend-base"
check = "require-content"
pattern = "extends BaseActionPlugin"
"#,
        )
        .unwrap();
        assert_eq!(set.name, "plugin-conventions");
        assert_eq!(set.version, "1.0.0");
        assert_eq!(set.rules.len(), 1);
        assert_eq!(set.rules[0].id(), "must-extend-base");
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = load_rules_from_toml("[[constraints]\n").unwrap_err();
        assert!(matches!(err, LoadRulesError::Toml(_)));
    }

    #[test]
    fn validation_errors_are_reported() {
        let err = load_rules_from_toml(
            r#"
[[constraints]]
id = "x"
check = "nope"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadRulesError::Load(_)));
        assert!(err.to_string().contains("unknown check `nope`"));
    }
}
