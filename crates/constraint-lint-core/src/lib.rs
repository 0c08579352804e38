//! # constraint-lint-core
//!
//! Rule-based constraint validation for source files.
//!
//! Rules are registered with an [`Engine`], matched to files by include and
//! exclude globs, and evaluated against a per-file [`Context`]. Rules that ask
//! for it get a [`CapabilityIndex`]: line-oriented heuristic scans for classes,
//! methods, imports, decorators and interfaces. No AST is ever built.
//!
//! This crate provides:
//!
//! - [`Rule`] and [`RuleBuilder`] for defining constraints
//! - [`Evaluator`] for the behaviour behind a rule
//! - [`Engine`] for validating files with bounded concurrency
//! - [`Violation`] and [`ValidationResult`] for reporting findings
//! - [`declarative`] for rules written in TOML
//!
//! ## Example
//!
//! ```ignore
//! use constraint_lint_core::{Engine, Rule, Severity, Violation};
//!
//! let rule = Rule::builder()
//!     .id("must-extend-base")
//!     .name("Must extend BaseActionPlugin")
//!     .description("Action plugins extend the shared base class")
//!     .severity(Severity::Error)
//!     .include(["**/*.plugin.ts"])
//!     .validate_with(|ctx| {
//!         if ctx.content().contains("extends BaseActionPlugin") {
//!             return Ok(vec![]);
//!         }
//!         Ok(vec![Violation::new("must-extend-base", Severity::Error, "Plugin must extend BaseActionPlugin")])
//!     })
//!     .build()?;
//!
//! let engine = Engine::builder().root("./app").rule(rule).build()?;
//! let results = engine.validate_project(None).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod context;
mod engine;
mod language;
mod pattern;
mod registry;
mod rule;
mod stats;
mod types;

/// Heuristic structural queries over file text.
pub mod capabilities;
/// Rules declared in TOML.
pub mod declarative;
/// Rule applicability and isolated evaluation.
pub mod matcher;
/// File reading and discovery collaborators.
pub mod source;

pub use cache::{hash_content, ResultCache};
pub use capabilities::{CapabilityIndex, Capture, Query};
pub use config::{Config, ConfigError, EngineConfig, RuleConfig, DEFAULT_MAX_CONCURRENCY};
pub use context::{Context, ContextBuilder, PluginContext, ValidationContext};
pub use declarative::{load_rule_set_from_toml, load_rules_from_toml, LoadRulesError};
pub use engine::{Engine, EngineBuilder, EngineError, FILE_READ_RULE_ID, WORKER_FAILURE_RULE_ID};
pub use language::Language;
pub use pattern::{FilePattern, PatternError, MATCH_ALL};
pub use registry::{RegistryError, RuleRegistry};
pub use rule::{
    EvaluationError, Evaluator, Rule, RuleBuildError, RuleBuilder, RuleSet, DEFAULT_CATEGORY,
    DEFAULT_SEVERITY,
};
pub use source::{
    DiscoveryError, FileDiscovery, FileSource, FsFileSource, ProjectPatterns, WalkDiscovery,
};
pub use stats::{EngineStats, StatsAggregator};
pub use types::{Severity, ValidationResult, Violation};
