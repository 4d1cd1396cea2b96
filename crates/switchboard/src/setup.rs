//! Error types for setup operations.

use std::path::PathBuf;

use switchboard_dispatch::RouteError;
use switchboard_flags::RuleError;

/// Error type for setup operations.
///
/// Every variant is fatal: an application that fails to build must not go on
/// to dispatch.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// A command, group or alias could not be registered.
    #[error("route error: {0}")]
    Route(#[from] RouteError),

    /// Flag rule text could not be turned into a registry.
    #[error("flag rule error: {0}")]
    Rule(#[from] RuleError),

    /// The configuration was read but is not usable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The configuration is not valid YAML for [`AppConfig`](crate::AppConfig).
    #[error("configuration parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error while reading a configuration file.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The default command names nothing registered.
    #[error("default command '{0}' is not registered")]
    UnknownDefaultCommand(String),
}
