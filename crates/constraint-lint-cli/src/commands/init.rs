//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const CONFIG_FILE: &str = "constraint-lint.toml";

const DEFAULT_CONFIG: &str = r#"# constraint-lint configuration

[engine]
# Root directory to validate (default: current directory)
# root = "./src"

# Files to validate; empty means every file under the root
include = ["src/**/*.ts"]

# Glob patterns to exclude from validation
exclude = [
    "**/node_modules/**",
    "**/target/**",
    "**/dist/**",
]

# Files validated at once
max_concurrency = 4

# Reuse results for files whose content has not changed
cache = true

# Respect .gitignore files
respect_gitignore = true

# Per-rule overrides, keyed by rule id
# [rules.no-console]
# enabled = true
# severity = "warning"

[rule_set]
name = "project-constraints"
version = "0.1.0"
description = "Project conventions"

[[constraints]]
id = "no-console"
name = "No console output"
severity = "warning"
check = "forbid-content"
pattern = 'console\.(log|debug)'
regex = true
suggestion = "Use the project logger instead"

# [[constraints]]
# id = "must-extend-base"
# severity = "error"
# files = ["**/*.plugin.ts"]
# check = "require-content"
# pattern = "extends BaseActionPlugin"

# [[constraints]]
# id = "file-size"
# check = "max-lines"
# limit = 500
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_config(Path::new(CONFIG_FILE), force)?;

    println!("Created {CONFIG_FILE}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE} to declare constraints");
    println!("  2. Run: constraint-lint check");

    Ok(())
}

fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    Ok(())
}
