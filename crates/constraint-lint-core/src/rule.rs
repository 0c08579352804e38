//! Constraint rules and the builder that finalizes them.

use crate::context::Context;
use crate::pattern::{FilePattern, PatternError};
use crate::types::{Severity, Violation};

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Category assigned when the builder was given none.
pub const DEFAULT_CATEGORY: &str = "general";

/// Severity assigned when the builder was given none.
pub const DEFAULT_SEVERITY: Severity = Severity::Warning;

/// A failure raised by an evaluator while checking a file.
///
/// The engine turns it into a synthetic `error` violation for that rule and file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EvaluationError {
    message: String,
}

impl EvaluationError {
    /// Creates an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<regex::Error> for EvaluationError {
    fn from(e: regex::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<std::io::Error> for EvaluationError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<String> for EvaluationError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for EvaluationError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// The behaviour slot of a [`Rule`].
///
/// # Example
///
/// ```ignore
/// use constraint_lint_core::{Context, EvaluationError, Evaluator, Severity, Violation};
///
/// struct MustExtendBase;
///
/// impl Evaluator for MustExtendBase {
///     fn evaluate(&self, ctx: &Context<'_>) -> Result<Vec<Violation>, EvaluationError> {
///         if ctx.content().contains("extends BaseActionPlugin") {
///             return Ok(vec![]);
///         }
///         Ok(vec![Violation::new("must-extend-base", Severity::Error, "missing base class")])
///     }
/// }
/// ```
pub trait Evaluator: Send + Sync {
    /// Checks one file and returns its violations in reporting order.
    ///
    /// # Errors
    ///
    /// Returns an error when the check itself cannot run; the engine reports it
    /// as a violation instead of aborting.
    fn evaluate(&self, ctx: &Context<'_>) -> Result<Vec<Violation>, EvaluationError>;
}

struct FnEvaluator<F>(F);

impl<F> Evaluator for FnEvaluator<F>
where
    F: Fn(&Context<'_>) -> Result<Vec<Violation>, EvaluationError> + Send + Sync,
{
    fn evaluate(&self, ctx: &Context<'_>) -> Result<Vec<Violation>, EvaluationError> {
        (self.0)(ctx)
    }
}

/// Errors raised while finalizing a rule.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum RuleBuildError {
    /// `id` was never set or is blank.
    #[error("Rule ID is required")]
    #[diagnostic(
        code(constraint_lint::rule::missing_id),
        help("call `.id(...)` before `.build()`")
    )]
    MissingId,

    /// `name` was never set or is blank.
    #[error("Rule name is required (rule `{id}`)")]
    #[diagnostic(code(constraint_lint::rule::missing_name))]
    MissingName {
        /// Rule being built.
        id: String,
    },

    /// `description` was never set or is blank.
    #[error("Rule description is required (rule `{id}`)")]
    #[diagnostic(code(constraint_lint::rule::missing_description))]
    MissingDescription {
        /// Rule being built.
        id: String,
    },

    /// No evaluator was supplied.
    #[error("Rule validator is required (rule `{id}`)")]
    #[diagnostic(
        code(constraint_lint::rule::missing_validator),
        help("supply one with `.validator(...)` or `.validate_with(...)`")
    )]
    MissingValidator {
        /// Rule being built.
        id: String,
    },

    /// Category was set to a blank string.
    #[error("Rule category must not be empty (rule `{id}`)")]
    #[diagnostic(code(constraint_lint::rule::invalid_category))]
    InvalidCategory {
        /// Rule being built.
        id: String,
    },

    /// An include or exclude pattern failed to compile.
    #[error("rule `{id}`: {source}")]
    #[diagnostic(code(constraint_lint::rule::invalid_pattern))]
    InvalidPattern {
        /// Rule being built.
        id: String,
        /// Underlying pattern error.
        source: PatternError,
    },
}

/// A finalized, immutable constraint rule.
///
/// Cloning is cheap; the evaluator is shared.
#[derive(Clone, Serialize)]
pub struct Rule {
    id: String,
    name: String,
    description: String,
    severity: Severity,
    category: String,
    tags: BTreeSet<String>,
    include: Vec<FilePattern>,
    exclude: Vec<FilePattern>,
    requires_capabilities: bool,
    #[serde(skip)]
    evaluator: Arc<dyn Evaluator>,
}

impl Rule {
    /// Starts building a rule.
    #[must_use]
    pub fn builder() -> RuleBuilder {
        RuleBuilder::new()
    }

    /// Unique identifier, e.g. `must-extend-base`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What the rule checks.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Default severity of this rule's violations.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Free-form category.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Tags, sorted and deduplicated.
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Include patterns (never empty).
    #[must_use]
    pub fn include(&self) -> &[FilePattern] {
        &self.include
    }

    /// Exclude patterns.
    #[must_use]
    pub fn exclude(&self) -> &[FilePattern] {
        &self.exclude
    }

    /// Whether the evaluator wants a [`Context::WithCapabilities`].
    #[must_use]
    pub fn requires_capabilities(&self) -> bool {
        self.requires_capabilities
    }

    /// Runs the evaluator. Callers wanting failure isolation go through the matcher.
    ///
    /// # Errors
    ///
    /// Propagates the evaluator's error.
    pub fn evaluate(&self, ctx: &Context<'_>) -> Result<Vec<Violation>, EvaluationError> {
        self.evaluator.evaluate(ctx)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("severity", &self.severity)
            .field("category", &self.category)
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .finish_non_exhaustive()
    }
}

/// Accumulates rule fields; [`RuleBuilder::build`] applies defaults and validates.
#[derive(Default)]
pub struct RuleBuilder {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    severity: Option<Severity>,
    category: Option<String>,
    tags: Vec<String>,
    include: Vec<String>,
    exclude: Vec<String>,
    requires_capabilities: bool,
    evaluator: Option<Arc<dyn Evaluator>>,
}

impl RuleBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the identifier.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the severity (default: warning).
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Sets the category (default: `general`).
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Appends tags.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Appends include patterns (default: match everything).
    #[must_use]
    pub fn include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Appends exclude patterns.
    #[must_use]
    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Requests a capability index for this rule's evaluator.
    #[must_use]
    pub fn with_capabilities(mut self) -> Self {
        self.requires_capabilities = true;
        self
    }

    /// Sets the evaluator.
    #[must_use]
    pub fn validator<E: Evaluator + 'static>(mut self, evaluator: E) -> Self {
        self.evaluator = Some(Arc::new(evaluator));
        self
    }

    /// Sets a closure as the evaluator.
    #[must_use]
    pub fn validate_with<F>(self, f: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<Vec<Violation>, EvaluationError> + Send + Sync + 'static,
    {
        self.validator(FnEvaluator(f))
    }

    /// Validates required fields, applies defaults, compiles patterns.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleBuildError`] if id, name, description or the evaluator is
    /// missing, the category is blank, or a pattern does not compile.
    pub fn build(self) -> Result<Rule, RuleBuildError> {
        let id = required(self.id).ok_or(RuleBuildError::MissingId)?;
        let name = required(self.name).ok_or_else(|| RuleBuildError::MissingName { id: id.clone() })?;
        let description = required(self.description)
            .ok_or_else(|| RuleBuildError::MissingDescription { id: id.clone() })?;
        let evaluator = self
            .evaluator
            .ok_or_else(|| RuleBuildError::MissingValidator { id: id.clone() })?;

        let category = match self.category {
            None => DEFAULT_CATEGORY.to_string(),
            Some(c) if c.trim().is_empty() => return Err(RuleBuildError::InvalidCategory { id }),
            Some(c) => c,
        };

        let compile = |patterns: Vec<String>| {
            patterns
                .iter()
                .map(|p| FilePattern::new(p))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| RuleBuildError::InvalidPattern {
                    id: id.clone(),
                    source,
                })
        };
        let mut include = compile(self.include)?;
        if include.is_empty() {
            include.push(FilePattern::match_all());
        }
        let exclude = compile(self.exclude)?;

        Ok(Rule {
            id,
            name,
            description,
            severity: self.severity.unwrap_or(DEFAULT_SEVERITY),
            category,
            tags: self.tags.into_iter().collect(),
            include,
            exclude,
            requires_capabilities: self.requires_capabilities,
            evaluator,
        })
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A named, versioned bundle of rules. Grouping only.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    /// Bundle name.
    pub name: String,
    /// Bundle version.
    pub version: String,
    /// What the bundle enforces.
    pub description: String,
    /// Rules in registration order.
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: description.into(),
            rules: Vec::new(),
        }
    }

    /// Appends a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Consumes the bundle, yielding its rules.
    #[must_use]
    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }
}
