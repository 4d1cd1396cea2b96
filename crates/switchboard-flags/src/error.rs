//! Error types for flag registration and parsing.

use crate::value::FlagType;

/// Errors raised while building a [`FlagRegistry`](crate::FlagRegistry).
///
/// These are setup errors: a registry that fails to build means the handler
/// declaring it is misconfigured, not that the user typed something wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlagError {
    /// An option name, shortcut or argument name is already registered.
    #[error("flag '{name}' is already defined")]
    DuplicateFlag { name: String },

    /// Arguments must be ordered as required, then optional, then one array.
    #[error("argument '{name}' cannot be declared here: {reason}")]
    InvalidFlagOrder { name: String, reason: String },

    /// Empty names, or names that carry leading dashes or whitespace.
    #[error("invalid flag name '{name}'")]
    InvalidName { name: String },

    /// Shortcuts must be a single alphanumeric character.
    #[error("invalid shortcut '{shortcut}' for '{name}'")]
    InvalidShortcut { name: String, shortcut: String },

    /// The declared default does not fit the declared type.
    #[error("invalid default for '{name}': {reason}")]
    InvalidDefault { name: String, reason: String },

    /// A required flag never falls back to a default.
    #[error("required flag '{name}' cannot declare a default")]
    RequiredWithDefault { name: String },

    /// The flag was handed to the wrong registry slot, or carries option-only
    /// settings while being an argument.
    #[error("flag '{name}' is misdeclared: {reason}")]
    KindMismatch { name: String, reason: String },
}

/// The kind of a [`ParseError`], for callers that branch on failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnknownOption,
    MissingValue,
    TypeCoercion,
    MissingRequired,
    TooManyArguments,
}

/// A failed parse. Parsing is all-or-nothing: no partial bindings escape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// One or more option tokens name nothing in the registry.
    #[error("unknown option(s): {}", .names.join(", "))]
    UnknownOptions { names: Vec<String> },

    /// A value-taking option reached the end of input, or was followed by
    /// another option.
    #[error("option '{name}' requires a value")]
    MissingValue { name: String },

    /// A value could not be converted to the declared type.
    #[error("invalid value '{value}' for '{name}': expected {expected}")]
    TypeCoercion {
        name: String,
        expected: FlagType,
        value: String,
    },

    /// Required flags that were neither given on the command line nor found
    /// in the environment. All missing names are reported together.
    #[error("missing required flag(s): {}", .names.join(", "))]
    MissingRequired { names: Vec<String> },

    /// Positional tokens beyond the declared arguments (strict argument mode).
    #[error("too many arguments: {}", .values.join(" "))]
    TooManyArguments { values: Vec<String> },
}

impl ParseError {
    /// Returns the failure category.
    pub fn kind(&self) -> ParseErrorKind {
        match self {
            Self::UnknownOptions { .. } => ParseErrorKind::UnknownOption,
            Self::MissingValue { .. } => ParseErrorKind::MissingValue,
            Self::TypeCoercion { .. } => ParseErrorKind::TypeCoercion,
            Self::MissingRequired { .. } => ParseErrorKind::MissingRequired,
            Self::TooManyArguments { .. } => ParseErrorKind::TooManyArguments,
        }
    }

    /// Returns the offending flag names (or tokens, for extra arguments).
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::UnknownOptions { names } | Self::MissingRequired { names } => {
                names.iter().map(String::as_str).collect()
            }
            Self::MissingValue { name } | Self::TypeCoercion { name, .. } => vec![name.as_str()],
            Self::TooManyArguments { values } => values.iter().map(String::as_str).collect(),
        }
    }

    pub(crate) fn coercion(name: &str, expected: FlagType, value: &str) -> Self {
        Self::TypeCoercion {
            name: name.to_string(),
            expected,
            value: value.to_string(),
        }
    }
}

/// Errors raised while reading rule text or a YAML [`FlagTable`](crate::FlagTable).
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("unknown flag type '{0}'")]
    UnknownType(String),

    #[error("invalid required marker '{value}' in rule for '{name}'")]
    InvalidRequired { name: String, value: String },

    #[error("invalid default '{value}' in rule for '{name}': expected {expected}")]
    InvalidDefault {
        name: String,
        expected: FlagType,
        value: String,
    },

    #[error(transparent)]
    Flag(#[from] FlagError),

    #[error("failed to read flag table: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_lists_every_name() {
        let err = ParseError::MissingRequired {
            names: vec!["name".into(), "opt1".into()],
        };
        assert_eq!(err.kind(), ParseErrorKind::MissingRequired);
        assert_eq!(err.names(), vec!["name", "opt1"]);
        assert_eq!(err.to_string(), "missing required flag(s): name, opt1");
    }

    #[test]
    fn coercion_message_names_expected_type() {
        let err = ParseError::coercion("age", FlagType::Int, "old");
        assert_eq!(err.kind(), ParseErrorKind::TypeCoercion);
        assert_eq!(
            err.to_string(),
            "invalid value 'old' for 'age': expected int"
        );
    }

    #[test]
    fn unknown_options_aggregate() {
        let err = ParseError::UnknownOptions {
            names: vec!["--nope".into(), "-x".into()],
        };
        assert_eq!(err.to_string(), "unknown option(s): --nope, -x");
    }
}
