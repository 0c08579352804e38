//! Per-file rule applicability and isolated evaluation.

use crate::context::Context;
use crate::rule::Rule;
use crate::types::{Severity, Violation};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::warn;

/// Result of running one rule against one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The evaluator ran; its violations are stamped with the file.
    Completed(Vec<Violation>),
    /// The evaluator errored or panicked; a synthetic error violation stands in.
    Failed(Violation),
}

impl RuleOutcome {
    /// Flattens the outcome into violations.
    #[must_use]
    pub fn into_violations(self) -> Vec<Violation> {
        match self {
            Self::Completed(v) => v,
            Self::Failed(v) => vec![v],
        }
    }
}

/// A rule applies iff some include pattern matches and no exclude pattern does.
#[must_use]
pub fn applies(rule: &Rule, relative_path: &str) -> bool {
    rule.include().iter().any(|p| p.matches(relative_path))
        && !rule.exclude().iter().any(|p| p.matches(relative_path))
}

/// Rules from `rules` that apply to `relative_path`, in registration order.
pub fn applicable<'r>(rules: &'r [Rule], relative_path: &'r str) -> impl Iterator<Item = &'r Rule> {
    rules.iter().filter(move |r| applies(r, relative_path))
}

/// Runs a rule's evaluator, converting any failure into a synthetic violation.
///
/// Neither an `Err` return nor a panic escapes this function.
#[must_use]
pub fn evaluate(rule: &Rule, ctx: &Context<'_>) -> RuleOutcome {
    let file = ctx.path();
    match panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(ctx))) {
        Ok(Ok(violations)) => RuleOutcome::Completed(stamp(violations, file)),
        Ok(Err(err)) => {
            warn!("Rule {} failed on {}: {}", rule.id(), file.display(), err);
            RuleOutcome::Failed(failure(rule.id(), err.message(), file))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!("Rule {} panicked on {}: {}", rule.id(), file.display(), message);
            RuleOutcome::Failed(failure(rule.id(), &message, file))
        }
    }
}

fn stamp(mut violations: Vec<Violation>, file: &Path) -> Vec<Violation> {
    for v in &mut violations {
        if v.file.is_none() {
            v.file = Some(file.to_path_buf());
        }
    }
    violations
}

fn failure(rule_id: &str, message: &str, file: &Path) -> Violation {
    Violation::new(
        rule_id,
        Severity::Error,
        format!("Rule execution failed: {message}"),
    )
    .with_file(file)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "evaluator panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ValidationContext;
    use crate::rule::EvaluationError;

    fn rule_with<F>(include: &[&str], exclude: &[&str], f: F) -> Rule
    where
        F: Fn(&Context<'_>) -> Result<Vec<Violation>, EvaluationError> + Send + Sync + 'static,
    {
        Rule::builder()
            .id("test-rule")
            .name("Test rule")
            .description("for matcher tests")
            .include(include.iter().copied())
            .exclude(exclude.iter().copied())
            .validate_with(f)
            .build()
            .unwrap()
    }

    fn ok(_: &Context<'_>) -> Result<Vec<Violation>, EvaluationError> {
        Ok(vec![])
    }

    #[test]
    fn match_all_applies_everywhere() {
        let rule = rule_with(&[], &[], ok);
        for path in ["a.ts", "src/deep/b.py", "README.md", "Makefile"] {
            assert!(applies(&rule, path), "{path}");
        }
    }

    #[test]
    fn include_must_match() {
        let rule = rule_with(&["*.service.ts"], &[], ok);
        assert!(!applies(&rule, "foo.controller.ts"));
        assert!(applies(&rule, "foo.service.ts"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let rule = rule_with(&["src/**"], &["**/*.spec.ts"], ok);
        assert!(applies(&rule, "src/a.ts"));
        assert!(!applies(&rule, "src/a.spec.ts"));
    }

    #[test]
    fn applicable_keeps_order() {
        let a = rule_with(&["*.ts"], &[], ok);
        let rules = vec![a.clone(), rule_with(&["*.py"], &[], ok), a];
        assert_eq!(applicable(&rules, "x.ts").count(), 2);
    }

    #[test]
    fn stamps_missing_file_but_keeps_explicit_one() {
        let rule = rule_with(&[], &[], |_| {
            Ok(vec![
                Violation::new("test-rule", Severity::Warning, "no file"),
                Violation::new("test-rule", Severity::Warning, "own file").with_file("other.ts"),
            ])
        });
        let base = ValidationContext::new(Path::new("a.ts"), "", Path::new("."));
        let violations = evaluate(&rule, &Context::Basic(&base)).into_violations();
        assert_eq!(violations[0].file.as_deref(), Some(Path::new("a.ts")));
        assert_eq!(violations[1].file.as_deref(), Some(Path::new("other.ts")));
    }

    #[test]
    fn error_becomes_synthetic_violation() {
        let rule = rule_with(&[], &[], |_| Err(EvaluationError::new("boom")));
        let base = ValidationContext::new(Path::new("a.ts"), "", Path::new("."));
        let outcome = evaluate(&rule, &Context::Basic(&base));
        let RuleOutcome::Failed(v) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(v.rule_id, "test-rule");
        assert_eq!(v.severity, Severity::Error);
        assert!(v.message.contains("boom"));
        assert_eq!(v.file.as_deref(), Some(Path::new("a.ts")));
    }

    #[test]
    fn panic_becomes_synthetic_violation() {
        let rule = rule_with(&[], &[], |_| panic!("validator exploded"));
        let base = ValidationContext::new(Path::new("a.ts"), "", Path::new("."));
        let violations = evaluate(&rule, &Context::Basic(&base)).into_violations();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("validator exploded"));
    }
}
