//! Subcommand implementations.

pub mod check;
pub mod init;
pub mod list_rules;
pub mod output;

use anyhow::{Context, Result};
use constraint_lint_core::{load_rule_set_from_toml, Config, Rule};
use std::path::{Path, PathBuf};

use crate::config_resolver::ConfigSource;

/// Loads the engine configuration from the resolved source.
pub(crate) fn load_config(source: &ConfigSource) -> Result<Config> {
    let Some(path) = source.path() else {
        tracing::debug!("No config file found, using defaults");
        return Ok(Config::default());
    };
    if source.is_global() {
        tracing::info!("Using global config: {}", path.display());
    }
    Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
}

/// Collects declarative rules from the config file and every `--rules` file.
///
/// The config file may carry `[[constraints]]` next to its `[engine]` table.
pub(crate) fn load_rules(source: &ConfigSource, rule_files: &[PathBuf]) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();
    for path in source.path().into_iter().chain(rule_files.iter().map(PathBuf::as_path)) {
        rules.extend(load_rule_file(path)?);
    }
    Ok(rules)
}

fn load_rule_file(path: &Path) -> Result<Vec<Rule>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules: {}", path.display()))?;
    let set = load_rule_set_from_toml(&content)
        .with_context(|| format!("Invalid rules in {}", path.display()))?;
    if set.rules.is_empty() {
        return Ok(Vec::new());
    }
    if set.name.is_empty() {
        tracing::debug!("Loaded {} rules from {}", set.rules.len(), path.display());
    } else {
        tracing::debug!(
            "Loaded rule set {} v{} ({} rules) from {}",
            set.name,
            set.version,
            set.rules.len(),
            path.display()
        );
    }
    Ok(set.rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONSTRAINTS: &str = r#"
[engine]
max_concurrency = 2

[[constraints]]
id = "no-todo"
check = "forbid-content"
pattern = "TODO"
"#;

    #[test]
    fn default_source_yields_default_config_and_no_rules() {
        let config = load_config(&ConfigSource::Default).unwrap();
        assert_eq!(config.engine.max_concurrency, 4);
        assert!(load_rules(&ConfigSource::Default, &[]).unwrap().is_empty());
    }

    #[test]
    fn config_file_provides_engine_settings_and_rules() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("constraint-lint.toml");
        fs::write(&path, CONSTRAINTS).unwrap();
        let source = ConfigSource::Project(path);

        assert_eq!(load_config(&source).unwrap().engine.max_concurrency, 2);
        let rules = load_rules(&source, &[]).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id(), "no-todo");
    }

    #[test]
    fn extra_rule_files_are_appended_in_order() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("constraint-lint.toml");
        fs::write(&config, CONSTRAINTS).unwrap();
        let extra = tmp.path().join("plugins.toml");
        fs::write(
            &extra,
            "[rule_set]\nname = \"plugins\"\n\n[[constraints]]\nid = \"max-size\"\ncheck = \"max-lines\"\nlimit = 300\n",
        )
        .unwrap();

        let rules = load_rules(&ConfigSource::Explicit(config), &[extra]).unwrap();
        let ids: Vec<&str> = rules.iter().map(Rule::id).collect();
        assert_eq!(ids, vec!["no-todo", "max-size"]);
    }

    #[test]
    fn missing_rule_file_is_an_error() {
        let err = load_rules(&ConfigSource::Default, &[PathBuf::from("/nonexistent/rules.toml")])
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read rules"));
    }
}
