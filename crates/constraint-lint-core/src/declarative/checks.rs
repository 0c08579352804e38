//! Declarative check evaluation.
//!
//! Turns a validated [`Constraint`] into a [`Rule`] whose evaluator runs the
//! configured check against file text or the capability index.

use std::sync::Arc;

use crate::context::Context;
use crate::declarative::model::{Check, Constraint, TextMatcher};
use crate::rule::{EvaluationError, Evaluator, Rule, RuleBuildError};
use crate::types::Violation;

/// Evaluator backed by one declarative constraint.
pub struct ConstraintEvaluator {
    constraint: Arc<Constraint>,
}

impl ConstraintEvaluator {
    /// Wraps a constraint.
    #[must_use]
    pub fn new(constraint: Arc<Constraint>) -> Self {
        Self { constraint }
    }

    fn violation(&self) -> Violation {
        let c = &self.constraint;
        let v = Violation::new(c.id.clone(), c.severity, c.message.clone());
        match &c.suggestion {
            Some(s) => v.with_suggestion(s.clone()),
            None => v,
        }
    }

    fn forbid_lines(&self, content: &str, matcher: &TextMatcher) -> Vec<Violation> {
        content
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let offset = matcher.find(line)?;
                let column = line[..offset].chars().count() + 1;
                Some(
                    self.violation()
                        .at(i + 1, column)
                        .with_snippet(line.trim()),
                )
            })
            .collect()
    }

    fn require(&self, present: bool) -> Vec<Violation> {
        if present {
            Vec::new()
        } else {
            vec![self.violation()]
        }
    }
}

impl Evaluator for ConstraintEvaluator {
    fn evaluate(&self, ctx: &Context<'_>) -> Result<Vec<Violation>, EvaluationError> {
        let content = ctx.content();
        let caps = || {
            ctx.capabilities()
                .ok_or_else(|| EvaluationError::new("capability index not available"))
        };

        let violations = match &self.constraint.check {
            Check::RequireContent(m) => self.require(m.is_match(content)),
            Check::ForbidContent(m) => self.forbid_lines(content, m),
            Check::RequireClass(m) => self.require(caps()?.has_class(m.query())),
            Check::RequireMethod(m) => self.require(caps()?.has_method(m.query())),
            Check::RequireDecorator(m) => self.require(caps()?.has_decorator(m.query())),
            Check::RequireInterface(m) => self.require(caps()?.has_interface(m.query())),
            Check::RequireImport(m) => self.require(caps()?.has_import(m.query())),
            Check::ForbidImport(m) => {
                let query = m.query();
                caps()?
                    .import_captures()
                    .iter()
                    .filter(|c| query.matches(&c.name))
                    .map(|c| {
                        let v = self.violation().at(c.line, c.column);
                        match ctx.base().line(c.line) {
                            Some(line) => v.with_snippet(line.trim()),
                            None => v,
                        }
                    })
                    .collect()
            }
            Check::MaxLines(limit) => {
                let lines = content.lines().count();
                if lines > *limit {
                    vec![self.violation().at_line(limit + 1)]
                } else {
                    Vec::new()
                }
            }
        };
        Ok(violations)
    }
}

/// Builds the rule for one constraint.
///
/// # Errors
///
/// Returns a [`RuleBuildError`] if the constraint fails rule finalization.
pub fn build_rule(constraint: Constraint) -> Result<Rule, RuleBuildError> {
    let constraint = Arc::new(constraint);
    let c = &constraint;
    let mut builder = Rule::builder()
        .id(c.id.clone())
        .name(c.name.clone())
        .description(c.description.clone())
        .severity(c.severity)
        .tags(c.tags.iter().cloned())
        .include(c.files.iter().cloned())
        .exclude(c.exclude.iter().cloned());
    if let Some(category) = &c.category {
        builder = builder.category(category.clone());
    }
    if c.check.kind().needs_capabilities() {
        builder = builder.with_capabilities();
    }
    builder
        .validator(ConstraintEvaluator::new(Arc::clone(&constraint)))
        .build()
}
