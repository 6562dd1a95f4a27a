//! core::config
//!
//! Author identity configuration.
//!
//! # Overview
//!
//! Sheaf has two configuration scopes:
//! - **Global**: user-level settings
//! - **Repo**: `.sheaf/config.json`
//!
//! # Precedence
//!
//! Values are resolved field by field (later overrides earlier):
//! 1. Global config file
//! 2. Repo config file
//!
//! # Global Config Location
//!
//! 1. `$SHEAF_CONFIG` if set
//! 2. `<platform config dir>/sheaf/config.json`
//!
//! Missing files are not an error. An empty file reads as an empty config.
//!
//! # Example
//!
//! ```no_run
//! use sheaf::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/work/.sheaf/config.json"))).unwrap();
//! println!("Author: {}", config.author());
//! ```

pub mod schema;

pub use schema::{ConfigFile, ConfigKey};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::metadata::{self, MetadataError};

/// Environment variable overriding the global config location.
pub const CONFIG_ENV: &str = "SHEAF_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    ReadError {
        path: PathBuf,
        source: MetadataError,
    },

    #[error("failed to write config file '{}': {source}", .path.display())]
    WriteError {
        path: PathBuf,
        source: MetadataError,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("no global config location available")]
    NoConfigDir,
}

/// Which file a setting is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Global,
    Repo,
}

/// Merged configuration from all scopes.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: ConfigFile,
    /// Repository configuration
    pub repo: ConfigFile,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load the global config and, if given, the repository config file.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load(repo_config: Option<&Path>) -> Result<Self, ConfigError> {
        let global_path = Self::global_config_path().ok();
        Self::load_from(global_path.as_deref(), repo_config)
    }

    /// Load from explicit locations.
    pub fn load_from(
        global_path: Option<&Path>,
        repo_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let global = match global_path {
            Some(path) => Self::read_file(path)?,
            None => ConfigFile::default(),
        };
        let repo = match repo_path {
            Some(path) => Self::read_file(path)?,
            None => ConfigFile::default(),
        };

        Ok(Self {
            global,
            repo,
            global_path: global_path.map(Path::to_path_buf),
            repo_path: repo_path.map(Path::to_path_buf),
        })
    }

    fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        metadata::read_json_or_default(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The global config location.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        dirs::config_dir()
            .map(|dir| dir.join("sheaf").join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Resolve a field, repo scope first.
    pub fn get(&self, key: ConfigKey) -> Option<&str> {
        self.repo.get(key).or_else(|| self.global.get(key))
    }

    pub fn name(&self) -> Option<&str> {
        self.get(ConfigKey::Name)
    }

    pub fn email(&self) -> Option<&str> {
        self.get(ConfigKey::Email)
    }

    /// Commit author string: `Name <email>`, or empty unless both are set.
    pub fn author(&self) -> String {
        match (self.name(), self.email()) {
            (Some(name), Some(email)) => format!("{name} <{email}>"),
            _ => String::new(),
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Set `key` in `scope` and write that scope's file.
    ///
    /// Returns the path written.
    pub fn set(
        &mut self,
        scope: ConfigScope,
        key: ConfigKey,
        value: &str,
    ) -> Result<PathBuf, ConfigError> {
        let (file, path) = match scope {
            ConfigScope::Global => (&mut self.global, self.global_path.clone()),
            ConfigScope::Repo => (&mut self.repo, self.repo_path.clone()),
        };
        let path = path.ok_or(ConfigError::NoConfigDir)?;

        file.set(key, value)?;
        metadata::write_json_atomic(&path, &*file).map_err(|source| ConfigError::WriteError {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_files_give_empty_config() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(
            Some(temp.path().join("global.json").as_path()),
            Some(temp.path().join("repo.json").as_path()),
        )
        .unwrap();
        assert_eq!(config.name(), None);
        assert_eq!(config.author(), "");
    }

    #[test]
    fn empty_repo_file_is_valid() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("config.json");
        fs::write(&repo, "").unwrap();
        let config = Config::load_from(None, Some(repo.as_path())).unwrap();
        assert_eq!(config.email(), None);
    }

    #[test]
    fn repo_overrides_global_per_field() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.json");
        let repo = temp.path().join("repo.json");
        fs::write(&global, r#"{"Name":"Global Name","Email":"global@example.com"}"#).unwrap();
        fs::write(&repo, r#"{"Name":"Repo Name"}"#).unwrap();

        let config = Config::load_from(Some(global.as_path()), Some(repo.as_path())).unwrap();
        assert_eq!(config.name(), Some("Repo Name"));
        assert_eq!(config.email(), Some("global@example.com"));
        assert_eq!(config.author(), "Repo Name <global@example.com>");
    }

    #[test]
    fn author_requires_both_fields() {
        let mut config = Config::default();
        config.repo.name = Some("Ada".into());
        assert_eq!(config.author(), "");
    }

    #[test]
    fn set_writes_repo_scope() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("config.json");
        let mut config = Config::load_from(None, Some(repo.as_path())).unwrap();

        let written = config
            .set(ConfigScope::Repo, ConfigKey::Email, "ada@example.com")
            .unwrap();
        assert_eq!(written, repo);

        let reloaded = Config::load_from(None, Some(repo.as_path())).unwrap();
        assert_eq!(reloaded.email(), Some("ada@example.com"));
    }

    #[test]
    fn set_without_location_fails() {
        let mut config = Config::default();
        let result = config.set(ConfigScope::Global, ConfigKey::Name, "Ada");
        assert!(matches!(result, Err(ConfigError::NoConfigDir)));
    }

    #[test]
    fn malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("config.json");
        fs::write(&repo, "{").unwrap();
        assert!(matches!(
            Config::load_from(None, Some(repo.as_path())),
            Err(ConfigError::ReadError { .. })
        ));
    }
}
