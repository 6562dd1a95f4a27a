//! core::config::schema
//!
//! Configuration file shape.
//!
//! Both scopes share one shape:
//!
//! ```json
//! { "Name": "Ada Lovelace", "Email": "ada@example.com" }
//! ```
//!
//! Every field is optional. Unknown fields are rejected so a typo such as
//! `"Emial"` fails loudly instead of being silently dropped.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// One configuration file (global or repository scope).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ConfigFile {
    /// Read a field.
    pub fn get(&self, key: ConfigKey) -> Option<&str> {
        match key {
            ConfigKey::Name => self.name.as_deref(),
            ConfigKey::Email => self.email.as_deref(),
        }
    }

    /// Set a field. Blank values are rejected.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "{} cannot be empty",
                key.as_str()
            )));
        }
        if key == ConfigKey::Email && value.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!(
                "email cannot contain whitespace: '{value}'"
            )));
        }

        let slot = match key {
            ConfigKey::Name => &mut self.name,
            ConfigKey::Email => &mut self.email,
        };
        *slot = Some(value.to_string());
        Ok(())
    }
}

/// A settable configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Name,
    Email,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 2] = [ConfigKey::Name, ConfigKey::Email];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::Name => "name",
            ConfigKey::Email => "email",
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" | "user.name" => Ok(ConfigKey::Name),
            "email" | "user.email" => Ok(ConfigKey::Email),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown config key '{other}' (expected name or email)"
            ))),
        }
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
