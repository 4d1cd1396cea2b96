//! Application configuration loaded from YAML.
//!
//! ```yaml
//! name: demo
//! version: 1.2.0
//! description: A small demo application
//! default_command: greet
//! parser:
//!   stop_on_first_arg: false
//!   strict: true
//!   strict_match_args: false
//! ```
//!
//! Every field is optional. A `parser` section replaces the parser settings
//! as a whole; keys left out of it take their defaults. Builder calls made after
//! [`AppBuilder::config`](crate::AppBuilder::config) override loaded values.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use switchboard_flags::ParserSettings;

use crate::setup::SetupError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub default_command: Option<String>,
    pub parser: Option<ParserSettings>,
}

impl AppConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SetupError> {
        // An empty document deserializes to unit, not a mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SetupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Self::from_yaml_str(&text)
    }

    fn validate(&self) -> Result<(), SetupError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(SetupError::Config("name must not be empty".into()));
            }
        }
        if let Some(command) = &self.default_command {
            if command.trim().is_empty() {
                return Err(SetupError::Config("default_command must not be empty".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_document() {
        let config = AppConfig::from_yaml_str(
            "name: demo\nversion: 1.2.0\ndefault_command: greet\nparser:\n  strict: false\n",
        )
        .unwrap();
        assert_eq!(config.name.as_deref(), Some("demo"));
        assert_eq!(config.version.as_deref(), Some("1.2.0"));
        assert_eq!(config.default_command.as_deref(), Some("greet"));
        let parser = config.parser.unwrap();
        assert!(!parser.strict);
        assert!(!parser.stop_on_first_arg);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(AppConfig::from_yaml_str("").unwrap(), AppConfig::default());
        assert!(AppConfig::default().parser.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            AppConfig::from_yaml_str("nmae: typo\n"),
            Err(SetupError::Yaml(_))
        ));
    }

    #[test]
    fn blank_values_are_rejected() {
        assert!(matches!(
            AppConfig::from_yaml_str("default_command: ' '\n"),
            Err(SetupError::Config(_))
        ));
    }
}
