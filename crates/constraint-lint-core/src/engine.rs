//! The validation engine: per-file pipeline and bounded multi-file orchestration.

use crate::cache::{hash_content, ResultCache};
use crate::config::{Config, ConfigError};
use crate::context::{Context, ContextBuilder, PluginContext, ValidationContext};
use crate::matcher::{self, RuleOutcome};
use crate::registry::{RegistryError, RuleRegistry};
use crate::rule::Rule;
use crate::source::{
    DiscoveryError, FileDiscovery, FileSource, FsFileSource, ProjectPatterns, WalkDiscovery,
};
use crate::stats::{EngineStats, StatsAggregator};
use crate::types::{Severity, ValidationResult, Violation};

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Rule id carried by the violation reported when a file cannot be read.
pub const FILE_READ_RULE_ID: &str = "file-read";

/// Rule id carried by the violation reported when a worker dies outside any rule.
pub const WORKER_FAILURE_RULE_ID: &str = "worker-failure";

/// Errors raised while building or running the engine.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum EngineError {
    /// Invalid configuration.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// Two rules share an id.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    /// Project file discovery failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Discovery(#[from] DiscoveryError),

    /// The discovery task did not complete.
    #[error("discovery task failed: {0}")]
    #[diagnostic(code(constraint_lint::engine::join))]
    Join(#[from] tokio::task::JoinError),
}

/// Builder for configuring an [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    root: Option<PathBuf>,
    rules: Vec<Rule>,
    include: Vec<String>,
    exclude: Vec<String>,
    config: Option<Config>,
    max_concurrency: Option<usize>,
    cache: Option<bool>,
    metadata: BTreeMap<String, String>,
    file_source: Option<Arc<dyn FileSource>>,
    discovery: Option<Arc<dyn FileDiscovery>>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the project root. Overrides `engine.root` from the config.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Registers a rule.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Registers rules in order.
    #[must_use]
    pub fn rules<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = Rule>,
    {
        self.rules.extend(rules);
        self
    }

    /// Adds a project include pattern on top of the config's.
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    /// Adds a project exclude pattern on top of the config's.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the worker count (default: 4).
    #[must_use]
    pub fn max_concurrency(mut self, workers: usize) -> Self {
        self.max_concurrency = Some(workers);
        self
    }

    /// Enables or disables the result cache.
    #[must_use]
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = Some(enabled);
        self
    }

    /// Metadata attached to every validation context.
    #[must_use]
    pub fn metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Replaces the file reader (default: the local file system).
    #[must_use]
    pub fn file_source<S: FileSource + 'static>(mut self, source: S) -> Self {
        self.file_source = Some(Arc::new(source));
        self
    }

    /// Replaces project discovery (default: a `.gitignore`-aware walk).
    #[must_use]
    pub fn discovery<D: FileDiscovery + 'static>(mut self, discovery: D) -> Self {
        self.discovery = Some(Arc::new(discovery));
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns an error for zero concurrency, a malformed pattern, or a
    /// duplicate rule id.
    pub fn build(self) -> Result<Engine, EngineError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let max_concurrency = self.max_concurrency.unwrap_or(config.engine.max_concurrency);
        if max_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(0).into());
        }

        let root = self.root.unwrap_or_else(|| config.engine.root.clone());

        let mut include = config.engine.include.clone();
        include.extend(self.include);
        let mut exclude = config.engine.exclude.clone();
        exclude.extend(self.exclude);
        for pattern in include.iter().chain(&exclude) {
            crate::pattern::FilePattern::new(pattern).map_err(ConfigError::from)?;
        }

        let mut registry = RuleRegistry::new();
        registry.add_rules(self.rules)?;

        let cache = self
            .cache
            .unwrap_or(config.engine.cache)
            .then(ResultCache::new);
        let discovery = self
            .discovery
            .unwrap_or_else(|| Arc::new(WalkDiscovery::new(config.engine.respect_gitignore)));

        let shared = Shared {
            contexts: ContextBuilder::new(root).metadata(self.metadata),
            source: self.file_source.unwrap_or_else(|| Arc::new(FsFileSource)),
            stats: Mutex::new(StatsAggregator::new()),
            cache,
            config,
        };

        Ok(Engine {
            registry: Arc::new(registry),
            shared: Arc::new(shared),
            discovery,
            patterns: ProjectPatterns::new(include, exclude),
            max_concurrency,
        })
    }
}

/// State every worker reads; never mutated except through interior locks.
struct Shared {
    contexts: ContextBuilder,
    source: Arc<dyn FileSource>,
    stats: Mutex<StatsAggregator>,
    cache: Option<ResultCache>,
    config: Config,
}

/// Validates files against registered rules.
///
/// Use [`Engine::builder()`] to construct an instance. Runs borrow `&self`,
/// registry changes need `&mut self`, so the two never overlap.
pub struct Engine {
    registry: Arc<RuleRegistry>,
    shared: Arc<Shared>,
    discovery: Arc<dyn FileDiscovery>,
    patterns: ProjectPatterns,
    max_concurrency: usize,
}

impl Engine {
    /// Creates a new builder for configuring an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Returns the project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.shared.contexts.project_root()
    }

    /// Returns the worker count.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Returns the configuration in effect.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Returns the registered rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        self.registry.rules()
    }

    /// Registers a rule and drops cached results.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRule`] if the id is taken.
    pub fn add_rule(&mut self, rule: Rule) -> Result<(), RegistryError> {
        let added = Arc::make_mut(&mut self.registry).add_rule(rule);
        self.invalidate_cache();
        added
    }

    /// Registers rules in order and drops cached results.
    ///
    /// # Errors
    ///
    /// Stops at the first duplicate id; earlier rules stay registered.
    pub fn add_rules<I>(&mut self, rules: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = Rule>,
    {
        let added = Arc::make_mut(&mut self.registry).add_rules(rules);
        self.invalidate_cache();
        added
    }

    /// Removes a rule by id and drops cached results.
    pub fn remove_rule(&mut self, id: &str) -> Option<Rule> {
        let removed = Arc::make_mut(&mut self.registry).remove_rule(id);
        if removed.is_some() {
            self.invalidate_cache();
        }
        removed
    }

    fn invalidate_cache(&self) {
        if let Some(cache) = &self.shared.cache {
            cache.clear();
        }
    }

    /// Validates a single file on the calling thread.
    ///
    /// Never fails: read errors and rule failures become violations.
    #[must_use]
    pub fn validate_file(&self, path: &Path) -> ValidationResult {
        validate_one(&self.shared, &self.registry, self.cache_generation(), path)
    }

    fn cache_generation(&self) -> u64 {
        self.shared.cache.as_ref().map_or(0, ResultCache::generation)
    }

    /// Validates files with at most `max_concurrency` in flight.
    ///
    /// Results come back in the order of `paths`, whatever order workers finish in.
    pub async fn validate_files(&self, paths: &[PathBuf]) -> Vec<ValidationResult> {
        info!(
            "Validating {} files with {} rules ({} workers)",
            paths.len(),
            self.registry.len(),
            self.max_concurrency
        );

        let mut slots: Vec<Option<ValidationResult>> = (0..paths.len()).map(|_| None).collect();
        let mut pending = paths.iter().cloned().enumerate();
        let mut in_flight: HashMap<tokio::task::Id, (usize, PathBuf)> = HashMap::new();
        let mut join_set = JoinSet::new();
        let generation = self.cache_generation();

        loop {
            while join_set.len() < self.max_concurrency {
                let Some((index, path)) = pending.next() else {
                    break;
                };
                let shared = Arc::clone(&self.shared);
                let registry = Arc::clone(&self.registry);
                let task_path = path.clone();
                let handle = join_set
                    .spawn_blocking(move || validate_one(&shared, &registry, generation, &task_path));
                in_flight.insert(handle.id(), (index, path));
            }

            let Some(joined) = join_set.join_next_with_id().await else {
                break;
            };
            match joined {
                Ok((id, result)) => {
                    if let Some((index, _)) = in_flight.remove(&id) {
                        slots[index] = Some(result);
                    }
                }
                Err(join_err) => {
                    if let Some((index, path)) = in_flight.remove(&join_err.id()) {
                        warn!("Worker for {} failed: {}", path.display(), join_err);
                        let result = synthetic(
                            &path,
                            WORKER_FAILURE_RULE_ID,
                            format!("Validation task failed: {join_err}"),
                            Duration::ZERO,
                        );
                        self.shared.stats.lock().record(&result, 0);
                        slots[index] = Some(result);
                    }
                }
            }
        }

        let results: Vec<ValidationResult> = slots.into_iter().flatten().collect();
        let invalid = results.iter().filter(|r| !r.is_valid()).count();
        info!("Validated {} files, {} invalid", results.len(), invalid);
        results
    }

    /// Discovers project files and validates them.
    ///
    /// `patterns` replaces the configured include/exclude globs when given.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails; per-file problems are reported as
    /// violations instead.
    pub async fn validate_project(
        &self,
        patterns: Option<ProjectPatterns>,
    ) -> Result<Vec<ValidationResult>, EngineError> {
        let patterns = patterns.unwrap_or_else(|| self.patterns.clone());
        let root = self.root().to_path_buf();
        let discovery = Arc::clone(&self.discovery);

        let files = tokio::task::spawn_blocking(move || discovery.discover(&root, &patterns)).await??;
        info!("Discovered {} files under {}", files.len(), self.root().display());

        Ok(self.validate_files(&files).await)
    }

    /// Returns cumulative statistics.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.shared.stats.lock().snapshot()
    }

    /// Zeroes the statistics. The only way they are ever reset.
    pub fn reset_stats(&self) {
        self.shared.stats.lock().reset();
    }
}

/// One file's base context, upgraded once when any applicable rule needs capabilities.
enum Prepared {
    Basic(ValidationContext),
    Plugin(PluginContext),
}

impl Prepared {
    fn context_for(&self, rule: &Rule) -> Context<'_> {
        match self {
            Self::Basic(ctx) => Context::Basic(ctx),
            Self::Plugin(ctx) if rule.requires_capabilities() => Context::WithCapabilities(ctx),
            Self::Plugin(ctx) => Context::Basic(ctx.base()),
        }
    }
}

/// `generation` is the cache generation `registry` was snapshotted in.
fn validate_one(
    shared: &Shared,
    registry: &RuleRegistry,
    generation: u64,
    path: &Path,
) -> ValidationResult {
    let start = Instant::now();
    debug!("Validating: {}", path.display());

    let content = match shared.source.read(path) {
        Ok(content) => content,
        Err(err) => {
            warn!("Failed to read {}: {}", path.display(), err);
            let result = synthetic(
                path,
                FILE_READ_RULE_ID,
                format!("Failed to read file: {err}"),
                start.elapsed(),
            );
            shared.stats.lock().record(&result, 0);
            return result;
        }
    };

    let content_hash = shared.cache.as_ref().map(|_| hash_content(&content));
    if let (Some(cache), Some(hash)) = (&shared.cache, &content_hash) {
        if let Some(hit) = cache.get(path, hash) {
            debug!("Cache hit: {}", path.display());
            let hit = hit.with_execution_time(start.elapsed());
            shared.stats.lock().record_cache_hit(&hit);
            return hit;
        }
    }

    let base = shared.contexts.build(path, content);
    let relative_path = base.relative_path.clone();
    let rules: Vec<&Rule> = matcher::applicable(registry.rules(), &relative_path)
        .filter(|rule| {
            let enabled = shared.config.is_rule_enabled(rule.id());
            if !enabled {
                debug!("Skipping disabled rule {}", rule.id());
            }
            enabled
        })
        .collect();

    let prepared = if rules.iter().any(|r| r.requires_capabilities()) {
        Prepared::Plugin(PluginContext::new(base))
    } else {
        Prepared::Basic(base)
    };

    let mut violations = Vec::new();
    for rule in &rules {
        match matcher::evaluate(rule, &prepared.context_for(rule)) {
            RuleOutcome::Completed(mut found) => {
                if let Some(severity) = shared.config.rule_severity(rule.id()) {
                    for v in &mut found {
                        v.severity = severity;
                    }
                }
                violations.extend(found);
            }
            RuleOutcome::Failed(failure) => violations.push(failure),
        }
    }

    let result = ValidationResult::new(path, violations, start.elapsed());
    if let (Some(cache), Some(hash)) = (&shared.cache, content_hash) {
        if !cache.insert(path, hash, generation, result.clone()) {
            debug!("Rules changed during validation, not caching {}", path.display());
        }
    }
    shared.stats.lock().record(&result, rules.len());
    result
}

fn synthetic(path: &Path, rule_id: &str, message: String, elapsed: Duration) -> ValidationResult {
    let violation = Violation::new(rule_id, Severity::Error, message).with_file(path);
    ValidationResult::new(path, vec![violation], elapsed)
}
