//! List rules command implementation.

use anyhow::Result;
use constraint_lint_core::{Config, Rule};
use std::path::PathBuf;

use crate::config_resolver::ConfigSource;

/// Runs the list-rules command.
pub fn run(source: &ConfigSource, rule_files: &[PathBuf]) -> Result<()> {
    let config = super::load_config(source)?;
    let rules = super::load_rules(source, rule_files)?;

    if rules.is_empty() {
        println!("No rules configured.");
        println!("\nAdd [[constraints]] to constraint-lint.toml or pass --rules FILE.");
        return Ok(());
    }

    print!("{}", render(&rules, &config));
    Ok(())
}

fn render(rules: &[Rule], config: &Config) -> String {
    let mut out = String::from("Configured rules:\n\n");
    out.push_str(&format!(
        "{:<25} {:<9} {:<15} Name\n",
        "Id", "Severity", "Category"
    ));
    out.push_str(&"-".repeat(80));
    out.push('\n');

    for rule in rules {
        let severity = config.rule_severity(rule.id()).unwrap_or(rule.severity());
        let name = if config.is_rule_enabled(rule.id()) {
            rule.name().to_string()
        } else {
            format!("{} (disabled)", rule.name())
        };
        out.push_str(&format!(
            "{:<25} {:<9} {:<15} {}\n",
            rule.id(),
            severity.to_string(),
            rule.category(),
            name
        ));
    }
    out
}
