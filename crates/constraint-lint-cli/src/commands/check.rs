//! Check command implementation.

use anyhow::{Context, Result};
use constraint_lint_core::{Config, Engine};
use std::path::{Path, PathBuf};

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Options collected from the `check` command line.
#[derive(Debug)]
pub struct CheckOptions {
    /// Output format.
    pub format: OutputFormat,
    /// Extra include patterns.
    pub include: Vec<String>,
    /// Extra exclude patterns.
    pub exclude: Vec<String>,
    /// Additional rule-set files.
    pub rule_files: Vec<PathBuf>,
    /// Concurrency override.
    pub concurrency: Option<usize>,
    /// Whether the result cache is used.
    pub cache: bool,
}

/// Runs the check command.
///
/// Without an explicit `path` the configured `[engine] root` is used.
pub fn run(path: Option<&Path>, source: &ConfigSource, options: CheckOptions) -> Result<()> {
    let format = options.format;
    let engine = build_engine(path, source, options)?;
    if engine.rules().is_empty() {
        tracing::warn!("No rules configured; add [[constraints]] to the config or pass --rules");
    }

    tracing::info!(
        "Validating {} with {} rules",
        engine.root().display(),
        engine.rules().len()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    let results = runtime
        .block_on(engine.validate_project(None))
        .context("Validation failed")?;

    let stats = engine.stats();
    super::output::print(&results, &stats, format)?;

    if results.iter().any(|r| !r.is_valid()) {
        std::process::exit(1);
    }

    Ok(())
}

fn build_engine(path: Option<&Path>, source: &ConfigSource, options: CheckOptions) -> Result<Engine> {
    let config = super::load_config(source)?;
    let rules = super::load_rules(source, &options.rule_files)?;
    let root = match path {
        Some(p) => p.to_path_buf(),
        None => configured_root(&config, source),
    };

    let mut builder = Engine::builder()
        .root(root)
        .config(config)
        .rules(rules)
        .cache(options.cache);
    for pattern in options.include {
        builder = builder.include(pattern);
    }
    for pattern in options.exclude {
        builder = builder.exclude(pattern);
    }
    if let Some(workers) = options.concurrency {
        builder = builder.max_concurrency(workers);
    }

    builder.build().context("Failed to build engine")
}

/// `[engine] root`, relative to the directory holding the config file.
fn configured_root(config: &Config, source: &ConfigSource) -> PathBuf {
    let root = &config.engine.root;
    match source.path().and_then(Path::parent) {
        Some(dir) if root.is_relative() => dir.join(root),
        _ => root.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options() -> CheckOptions {
        CheckOptions {
            format: OutputFormat::Compact,
            include: vec![],
            exclude: vec![],
            rule_files: vec![],
            concurrency: None,
            cache: true,
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> (TempDir, ConfigSource) {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("constraint-lint.toml");
        write(
            &config,
            r#"
[engine]
root = "app"

[[constraints]]
id = "no-todo"
check = "forbid-content"
pattern = "TODO"
"#,
        );
        write(&tmp.path().join("app/src/a.ts"), "// TODO\n");
        write(&tmp.path().join("other/b.ts"), "// TODO\n");
        (tmp, ConfigSource::Project(config))
    }

    fn discovered(engine: &Engine) -> Vec<PathBuf> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime
            .block_on(engine.validate_project(None))
            .unwrap()
            .iter()
            .map(|r| r.file().strip_prefix(engine.root()).unwrap().to_path_buf())
            .collect()
    }

    #[test]
    fn configured_root_drives_discovery() {
        let (tmp, source) = project();
        let engine = build_engine(None, &source, options()).unwrap();
        assert_eq!(engine.root(), tmp.path().join("app"));
        assert_eq!(discovered(&engine), vec![PathBuf::from("src/a.ts")]);
    }

    #[test]
    fn explicit_path_overrides_configured_root() {
        let (tmp, source) = project();
        let other = tmp.path().join("other");
        let engine = build_engine(Some(&other), &source, options()).unwrap();
        assert_eq!(engine.root(), other);
        assert_eq!(discovered(&engine), vec![PathBuf::from("b.ts")]);
    }

    #[test]
    fn default_config_uses_its_root_as_is() {
        let config = Config::default();
        assert_eq!(
            configured_root(&config, &ConfigSource::Default),
            config.engine.root
        );
    }
}
