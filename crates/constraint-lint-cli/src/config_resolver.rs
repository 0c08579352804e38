//! Configuration file lookup.
//!
//! First match wins:
//!
//! 1. `--config` flag
//! 2. `{project}/constraint-lint.toml`, then `{project}/.constraint-lint.toml`
//! 3. `config.toml` in the global directory (`~/.constraint-lint/`)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

/// Project-level config file names, checked in order.
const PROJECT_CONFIG_NAMES: [&str; 2] = ["constraint-lint.toml", ".constraint-lint.toml"];

/// Config file name within the global config directory.
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Overrides the global config directory.
const CONFIG_DIR_ENV: &str = "CONSTRAINT_LINT_CONFIG_DIR";

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`; existence is not checked.
    Explicit(PathBuf),
    /// Found in the project directory.
    Project(PathBuf),
    /// Found in the global config directory.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Returns `true` if the config came from the global directory.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }
}

/// Resolves the configuration file for a project.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_with(project_dir, explicit, global_config_dir().as_deref())
}

fn resolve_with(project_dir: &Path, explicit: Option<&Path>, global_dir: Option<&Path>) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    if let Some(found) = PROJECT_CONFIG_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|candidate| candidate.is_file())
    {
        tracing::debug!("Found project config: {}", found.display());
        return ConfigSource::Project(found);
    }

    match global_dir.map(|dir| dir.join(GLOBAL_CONFIG_NAME)) {
        Some(candidate) if candidate.is_file() => {
            tracing::debug!("Found global config: {}", candidate.display());
            ConfigSource::Global(candidate)
        }
        _ => ConfigSource::Default,
    }
}

/// Returns the global config directory: `$CONSTRAINT_LINT_CONFIG_DIR`, else
/// `~/.constraint-lint/`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) => Some(PathBuf::from(dir)),
        None => home::home_dir().map(|h| h.join(".constraint-lint")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn explicit_wins_and_is_not_checked() {
        let project = TempDir::new().unwrap();
        touch(project.path(), "constraint-lint.toml");

        let missing = Path::new("/nonexistent/rules.toml");
        assert_eq!(
            resolve_with(project.path(), Some(missing), None),
            ConfigSource::Explicit(missing.to_path_buf())
        );
    }

    #[test]
    fn plain_name_preferred_over_dotfile() {
        let project = TempDir::new().unwrap();
        let dotfile = touch(project.path(), ".constraint-lint.toml");
        assert_eq!(
            resolve_with(project.path(), None, None),
            ConfigSource::Project(dotfile)
        );

        let plain = touch(project.path(), "constraint-lint.toml");
        assert_eq!(
            resolve_with(project.path(), None, None),
            ConfigSource::Project(plain)
        );
    }

    #[test]
    fn directory_named_like_config_is_ignored() {
        let project = TempDir::new().unwrap();
        fs::create_dir(project.path().join("constraint-lint.toml")).unwrap();
        assert_eq!(resolve_with(project.path(), None, None), ConfigSource::Default);
    }

    #[test]
    fn global_used_only_without_project_config() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();

        assert_eq!(
            resolve_with(project.path(), None, Some(global.path())),
            ConfigSource::Default
        );

        let global_config = touch(global.path(), GLOBAL_CONFIG_NAME);
        let resolved = resolve_with(project.path(), None, Some(global.path()));
        assert!(resolved.is_global());
        assert_eq!(resolved.path(), Some(global_config.as_path()));

        touch(project.path(), ".constraint-lint.toml");
        assert!(matches!(
            resolve_with(project.path(), None, Some(global.path())),
            ConfigSource::Project(_)
        ));
    }

    #[test]
    fn default_has_no_path() {
        assert_eq!(ConfigSource::Default.path(), None);
        assert!(!ConfigSource::Default.is_global());
        assert!(!ConfigSource::Explicit(PathBuf::from("a.toml")).is_global());
    }
}
