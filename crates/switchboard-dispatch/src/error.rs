//! Error types for route registration and dispatch.

use switchboard_flags::{FlagError, ParseError};
use thiserror::Error;

use crate::dispatch::ExitCode;
use crate::hooks::HookError;

/// Errors raised while building the route table.
///
/// These are setup errors: the application must not go on to dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The name collides with a command, group, action or alias.
    #[error("name '{name}' is already registered")]
    DuplicateName { name: String },

    /// An alias points at something that is not registered.
    #[error("alias target '{target}' is not a registered command or group")]
    UnknownAliasTarget { target: String },

    /// Empty names, or names with whitespace, `:` or a leading dash.
    #[error("invalid route name '{name}'")]
    InvalidName { name: String },

    #[error("group '{group}' has no action '{action}'")]
    UnknownAction { group: String, action: String },
}

/// Why a dispatch did not complete successfully.
///
/// Each variant maps to one exit code through [`exit_code`](Self::exit_code).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("command '{name}' not found")]
    CommandNotFound {
        name: String,
        /// Registered names close to `name`, best first.
        suggestions: Vec<String>,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A handler declared an invalid flag set.
    #[error("invalid flag definition: {0}")]
    Registry(#[from] FlagError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Handler(anyhow::Error),
}

impl DispatchError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandNotFound { .. } => ExitCode::NOT_FOUND,
            Self::Parse(_) => ExitCode::USAGE_ERROR,
            Self::Registry(_) => ExitCode::REGISTRY_ERROR,
            Self::Hook(_) | Self::Handler(_) => ExitCode::HANDLER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_kind() {
        let not_found = DispatchError::CommandNotFound {
            name: "x".into(),
            suggestions: Vec::new(),
        };
        assert_eq!(not_found.exit_code(), 127);

        let parse = DispatchError::from(ParseError::MissingValue { name: "o".into() });
        assert_eq!(parse.exit_code(), 64);
        assert_eq!(parse.to_string(), "option 'o' requires a value");

        let registry = DispatchError::from(FlagError::InvalidName { name: "".into() });
        assert_eq!(registry.exit_code(), 70);

        let handler = DispatchError::Handler(anyhow::anyhow!("boom"));
        assert_eq!(handler.exit_code(), 2);
        assert_eq!(handler.to_string(), "boom");
    }
}
