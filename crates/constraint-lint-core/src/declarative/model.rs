//! Pure domain model for declarative constraints.
//!
//! No serde and no I/O here. Invariants are enforced at construction time.

use crate::capabilities::Query;
use crate::types::Severity;

use regex::Regex;
use std::collections::HashSet;
use std::fmt;

// ────────────────────────────────────────────
// Check kinds
// ────────────────────────────────────────────

/// The `check = "..."` vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    /// File content must contain the pattern.
    RequireContent,
    /// No line may contain the pattern.
    ForbidContent,
    /// Some declared class name must match.
    RequireClass,
    /// Some declared method name must match.
    RequireMethod,
    /// Some decorator name must match.
    RequireDecorator,
    /// Some declared interface name must match.
    RequireInterface,
    /// Some imported module must match.
    RequireImport,
    /// No imported module may match.
    ForbidImport,
    /// File must not exceed a line count.
    MaxLines,
}

impl CheckKind {
    /// Every check kind, in documentation order.
    pub const ALL: [CheckKind; 9] = [
        Self::RequireContent,
        Self::ForbidContent,
        Self::RequireClass,
        Self::RequireMethod,
        Self::RequireDecorator,
        Self::RequireInterface,
        Self::RequireImport,
        Self::ForbidImport,
        Self::MaxLines,
    ];

    /// Parses the kebab-case name used in TOML.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }

    /// The kebab-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequireContent => "require-content",
            Self::ForbidContent => "forbid-content",
            Self::RequireClass => "require-class",
            Self::RequireMethod => "require-method",
            Self::RequireDecorator => "require-decorator",
            Self::RequireInterface => "require-interface",
            Self::RequireImport => "require-import",
            Self::ForbidImport => "forbid-import",
            Self::MaxLines => "max-lines",
        }
    }

    /// Whether evaluating this check needs the capability index.
    #[must_use]
    pub fn needs_capabilities(self) -> bool {
        !matches!(
            self,
            Self::RequireContent | Self::ForbidContent | Self::MaxLines
        )
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────
// Text matching
// ────────────────────────────────────────────

/// A literal substring or a compiled regex.
#[derive(Debug, Clone)]
pub enum TextMatcher {
    /// Substring containment.
    Literal(String),
    /// Regular expression search.
    Regex(Regex),
}

impl TextMatcher {
    /// Creates a matcher.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is empty or, in regex mode, does not compile.
    pub fn new(pattern: &str, regex: bool) -> Result<Self, ModelError> {
        if pattern.is_empty() {
            return Err(ModelError::EmptyPattern);
        }
        if !regex {
            return Ok(Self::Literal(pattern.to_string()));
        }
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| ModelError::InvalidRegex {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Whether `text` contains a match.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Byte offset of the first match in `text`.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<usize> {
        match self {
            Self::Literal(needle) => text.find(needle.as_str()),
            Self::Regex(re) => re.find(text).map(|m| m.start()),
        }
    }

    /// The same matcher as a capability query.
    #[must_use]
    pub fn query(&self) -> Query<'_> {
        match self {
            Self::Literal(needle) => Query::Literal(needle),
            Self::Regex(re) => Query::Pattern(re),
        }
    }

    /// The source pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(needle) => needle,
            Self::Regex(re) => re.as_str(),
        }
    }
}

// ────────────────────────────────────────────
// Checks and constraints
// ────────────────────────────────────────────

/// A check with its validated argument.
#[derive(Debug, Clone)]
pub enum Check {
    /// See [`CheckKind::RequireContent`].
    RequireContent(TextMatcher),
    /// See [`CheckKind::ForbidContent`].
    ForbidContent(TextMatcher),
    /// See [`CheckKind::RequireClass`].
    RequireClass(TextMatcher),
    /// See [`CheckKind::RequireMethod`].
    RequireMethod(TextMatcher),
    /// See [`CheckKind::RequireDecorator`].
    RequireDecorator(TextMatcher),
    /// See [`CheckKind::RequireInterface`].
    RequireInterface(TextMatcher),
    /// See [`CheckKind::RequireImport`].
    RequireImport(TextMatcher),
    /// See [`CheckKind::ForbidImport`].
    ForbidImport(TextMatcher),
    /// See [`CheckKind::MaxLines`].
    MaxLines(usize),
}

impl Check {
    /// Pairs a kind with its argument.
    ///
    /// # Errors
    ///
    /// Returns error if the argument the kind needs is missing.
    pub fn new(
        kind: CheckKind,
        matcher: Option<TextMatcher>,
        limit: Option<usize>,
    ) -> Result<Self, ModelError> {
        let pattern = |m: Option<TextMatcher>| m.ok_or(ModelError::MissingPattern { check: kind });
        Ok(match kind {
            CheckKind::MaxLines => match limit {
                Some(0) => return Err(ModelError::ZeroLimit),
                Some(n) => Self::MaxLines(n),
                None => return Err(ModelError::MissingLimit),
            },
            CheckKind::RequireContent => Self::RequireContent(pattern(matcher)?),
            CheckKind::ForbidContent => Self::ForbidContent(pattern(matcher)?),
            CheckKind::RequireClass => Self::RequireClass(pattern(matcher)?),
            CheckKind::RequireMethod => Self::RequireMethod(pattern(matcher)?),
            CheckKind::RequireDecorator => Self::RequireDecorator(pattern(matcher)?),
            CheckKind::RequireInterface => Self::RequireInterface(pattern(matcher)?),
            CheckKind::RequireImport => Self::RequireImport(pattern(matcher)?),
            CheckKind::ForbidImport => Self::ForbidImport(pattern(matcher)?),
        })
    }

    /// The kind of this check.
    #[must_use]
    pub fn kind(&self) -> CheckKind {
        match self {
            Self::RequireContent(_) => CheckKind::RequireContent,
            Self::ForbidContent(_) => CheckKind::ForbidContent,
            Self::RequireClass(_) => CheckKind::RequireClass,
            Self::RequireMethod(_) => CheckKind::RequireMethod,
            Self::RequireDecorator(_) => CheckKind::RequireDecorator,
            Self::RequireInterface(_) => CheckKind::RequireInterface,
            Self::RequireImport(_) => CheckKind::RequireImport,
            Self::ForbidImport(_) => CheckKind::ForbidImport,
            Self::MaxLines(_) => CheckKind::MaxLines,
        }
    }

    /// Message used when the constraint does not set one.
    #[must_use]
    pub fn default_message(&self) -> String {
        match self {
            Self::RequireContent(m) => format!("Required content `{}` not found", m.as_str()),
            Self::ForbidContent(m) => format!("Forbidden content `{}` found", m.as_str()),
            Self::RequireClass(m) => format!("No class matching `{}` declared", m.as_str()),
            Self::RequireMethod(m) => format!("No method matching `{}` declared", m.as_str()),
            Self::RequireDecorator(m) => format!("No decorator matching `{}` used", m.as_str()),
            Self::RequireInterface(m) => {
                format!("No interface matching `{}` declared", m.as_str())
            }
            Self::RequireImport(m) => format!("No import matching `{}` found", m.as_str()),
            Self::ForbidImport(m) => format!("Forbidden import `{}`", m.as_str()),
            Self::MaxLines(n) => format!("File exceeds {n} lines"),
        }
    }
}

/// A fully validated declarative constraint.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Rule identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Severity of reported violations.
    pub severity: Severity,
    /// Category, if given.
    pub category: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Include globs (already validated).
    pub files: Vec<String>,
    /// Exclude globs (already validated).
    pub exclude: Vec<String>,
    /// What to check.
    pub check: Check,
    /// Violation message.
    pub message: String,
    /// Remediation hint.
    pub suggestion: Option<String>,
}

/// Rule-set header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSetHeader {
    /// Bundle name.
    pub name: String,
    /// Bundle version.
    pub version: String,
    /// What the bundle enforces.
    pub description: String,
}

/// Aggregate root: header plus constraints with unique ids.
#[derive(Debug, Clone, Default)]
pub struct DeclarativeRuleSet {
    header: Option<RuleSetHeader>,
    constraints: Vec<Constraint>,
}

impl DeclarativeRuleSet {
    /// Creates a rule set.
    ///
    /// # Errors
    ///
    /// Returns every duplicated constraint id.
    pub fn new(
        header: Option<RuleSetHeader>,
        constraints: Vec<Constraint>,
    ) -> Result<Self, Vec<ModelError>> {
        let mut seen = HashSet::new();
        let errors: Vec<ModelError> = constraints
            .iter()
            .filter(|c| !seen.insert(c.id.as_str()))
            .map(|c| ModelError::DuplicateId { id: c.id.clone() })
            .collect();
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            header,
            constraints,
        })
    }

    /// Whether no constraints are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// The `[rule_set]` header, if present.
    #[must_use]
    pub fn header(&self) -> Option<&RuleSetHeader> {
        self.header.as_ref()
    }

    /// Constraints in declaration order.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Splits into header and constraints.
    #[must_use]
    pub fn into_parts(self) -> (Option<RuleSetHeader>, Vec<Constraint>) {
        (self.header, self.constraints)
    }
}

// ────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────

/// Errors in domain model construction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// Constraint id is blank.
    #[error("constraint id must not be empty")]
    EmptyId,

    /// `check` names no known kind.
    #[error("unknown check `{value}`")]
    UnknownCheck {
        /// The rejected value.
        value: String,
    },

    /// `pattern` is empty.
    #[error("pattern must not be empty")]
    EmptyPattern,

    /// `pattern` is not a valid regex.
    #[error("invalid regex `{pattern}`: {reason}")]
    InvalidRegex {
        /// The rejected pattern.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// The check needs `pattern`.
    #[error("check `{check}` requires `pattern`")]
    MissingPattern {
        /// The check that was configured.
        check: CheckKind,
    },

    /// `max-lines` needs `limit`.
    #[error("check `max-lines` requires `limit`")]
    MissingLimit,

    /// `limit` must be positive.
    #[error("`limit` must be at least 1")]
    ZeroLimit,

    /// Two constraints share an id.
    #[error("duplicate constraint id `{id}`")]
    DuplicateId {
        /// The repeated id.
        id: String,
    },
}

// ────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────
