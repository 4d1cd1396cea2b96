//! Declarative description of one argument or option.

use crate::error::FlagError;
use crate::value::{FlagType, FlagValue};

/// Whether a [`FlagSpec`] is positional or named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Argument,
    Option,
}

/// Description of one argument or option.
///
/// Built with a small fluent API and handed to a
/// [`FlagRegistry`](crate::FlagRegistry), which validates it:
///
/// ```
/// use switchboard_flags::{FlagSpec, FlagType};
///
/// let verbose = FlagSpec::option("verbose")
///     .ty(FlagType::Bool)
///     .shortcut('v')
///     .description("Print more");
/// assert!(verbose.is_boolean());
///
/// let files = FlagSpec::argument("files").array();
/// assert!(files.is_array());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FlagSpec {
    kind: FlagKind,
    name: String,
    description: String,
    ty: FlagType,
    required: bool,
    is_array: bool,
    default: Option<FlagValue>,
    index: usize,
    shortcuts: Vec<char>,
    env_var: Option<String>,
}

impl FlagSpec {
    fn new(kind: FlagKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: String::new(),
            ty: FlagType::String,
            required: false,
            is_array: false,
            default: None,
            index: 0,
            shortcuts: Vec::new(),
            env_var: None,
        }
    }

    /// A positional argument. Its index is assigned on registration.
    pub fn argument(name: impl Into<String>) -> Self {
        Self::new(FlagKind::Argument, name)
    }

    /// A named option, addressed as `--name`.
    pub fn option(name: impl Into<String>) -> Self {
        Self::new(FlagKind::Option, name)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the value type. `Array` implies [`array`](Self::array).
    pub fn ty(mut self, ty: FlagType) -> Self {
        self.ty = ty;
        if ty == FlagType::Array {
            self.is_array = true;
        }
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Accept repeated values. Every occurrence appends to a list.
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<FlagValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Adds a single-character alias (`-v` for `--verbose`).
    pub fn shortcut(mut self, shortcut: char) -> Self {
        self.shortcuts.push(shortcut);
        self
    }

    pub fn shortcuts(mut self, shortcuts: impl IntoIterator<Item = char>) -> Self {
        self.shortcuts.extend(shortcuts);
        self
    }

    /// Environment variable consulted when the option is absent from the
    /// command line.
    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env_var = Some(var.into());
        self
    }

    pub fn kind(&self) -> FlagKind {
        self.kind
    }

    pub fn is_option(&self) -> bool {
        self.kind == FlagKind::Option
    }

    pub fn is_argument(&self) -> bool {
        self.kind == FlagKind::Argument
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn get_type(&self) -> FlagType {
        self.ty
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn get_default(&self) -> Option<&FlagValue> {
        self.default.as_ref()
    }

    /// Position among the registry's arguments. Always 0 for options.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get_shortcuts(&self) -> &[char] {
        &self.shortcuts
    }

    pub fn env_var(&self) -> Option<&str> {
        self.env_var.as_deref()
    }

    /// A boolean option is set by its presence and consumes no value.
    pub fn is_boolean(&self) -> bool {
        self.is_option() && self.ty == FlagType::Bool && !self.is_array
    }

    /// How the flag is written on the command line: `--name` or `<name>`.
    pub fn display_name(&self) -> String {
        match self.kind {
            FlagKind::Option => format!("--{}", self.name),
            FlagKind::Argument => format!("<{}>", self.name),
        }
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Checks the invariants a single spec must hold on its own.
    pub(crate) fn validate(&self) -> Result<(), FlagError> {
        let name = self.name.as_str();
        if name.is_empty()
            || name.starts_with('-')
            || name.contains(|c: char| c.is_whitespace() || c == '=' || c == ',')
        {
            return Err(FlagError::InvalidName {
                name: name.to_string(),
            });
        }

        if self.is_argument() {
            if !self.shortcuts.is_empty() {
                return Err(FlagError::KindMismatch {
                    name: name.to_string(),
                    reason: "arguments cannot have shortcuts".to_string(),
                });
            }
            if self.env_var.is_some() {
                return Err(FlagError::KindMismatch {
                    name: name.to_string(),
                    reason: "arguments cannot read environment variables".to_string(),
                });
            }
        }

        if self.ty == FlagType::Bool && self.is_array {
            return Err(FlagError::KindMismatch {
                name: name.to_string(),
                reason: "boolean flags cannot be arrays".to_string(),
            });
        }

        for c in &self.shortcuts {
            if !c.is_ascii_alphanumeric() {
                return Err(FlagError::InvalidShortcut {
                    name: name.to_string(),
                    shortcut: c.to_string(),
                });
            }
        }

        if let Some(default) = &self.default {
            if self.required {
                return Err(FlagError::RequiredWithDefault {
                    name: name.to_string(),
                });
            }
            if self.is_boolean() && !matches!(default, FlagValue::Bool(_)) {
                return Err(FlagError::InvalidDefault {
                    name: name.to_string(),
                    reason: "boolean options default to true or false".to_string(),
                });
            }
            if !default.fits(self.ty, self.is_array) {
                return Err(FlagError::InvalidDefault {
                    name: name.to_string(),
                    reason: format!(
                        "'{default}' is not a{} {}",
                        if self.is_array { "n array of" } else { "" },
                        self.ty
                    ),
                });
            }
        }

        Ok(())
    }
}
