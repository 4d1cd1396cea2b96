//! Environment variable access.
//!
//! Options may name an environment variable to fall back on. Lookups go
//! through [`EnvReader`] so tests can supply a [`MockEnv`] instead of touching
//! the process environment.

use std::collections::HashMap;

/// Abstraction over environment variables.
pub trait EnvReader: Send + Sync {
    /// Get an environment variable value.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealEnv;

impl EnvReader for RealEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// In-memory environment for tests.
#[derive(Debug, Clone, Default)]
pub struct MockEnv {
    vars: HashMap<String, String>,
}

impl MockEnv {
    /// Create an empty mock environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvReader for MockEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<T: EnvReader + ?Sized> EnvReader for Box<T> {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

/// Looks up `name` and treats an empty value as unset.
pub(crate) fn non_empty_var(reader: &dyn EnvReader, name: &str) -> Option<String> {
    reader.var(name).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn mock_env_with_vars() {
        let env = MockEnv::new()
            .with_var("APP_TOKEN", "secret")
            .with_var("APP_EMPTY", "");

        assert_eq!(env.var("APP_TOKEN"), Some("secret".to_string()));
        assert_eq!(non_empty_var(&env, "APP_EMPTY"), None);
        assert_eq!(env.var("MISSING"), None);
    }

    #[test]
    #[serial]
    fn real_env_reads_process_environment() {
        std::env::set_var("SWITCHBOARD_FLAGS_TEST_VAR", "42");
        assert_eq!(
            RealEnv.var("SWITCHBOARD_FLAGS_TEST_VAR"),
            Some("42".to_string())
        );
        std::env::remove_var("SWITCHBOARD_FLAGS_TEST_VAR");
        assert_eq!(RealEnv.var("SWITCHBOARD_FLAGS_TEST_VAR"), None);
    }
}
