//! The set of flags one handler accepts.

use std::collections::HashMap;

use crate::error::FlagError;
use crate::spec::{FlagKind, FlagSpec};

/// Ordered positional arguments plus name- and shortcut-keyed options.
///
/// A registry is filled during a handler's configure step and only read
/// afterwards. Every `add_*` call validates the new spec against what is
/// already registered, so a registry that built successfully is consistent:
///
/// - option names are unique, and so are shortcut characters
/// - argument names are unique
/// - arguments are ordered required, then optional, then at most one array
#[derive(Debug, Clone, Default)]
pub struct FlagRegistry {
    arguments: Vec<FlagSpec>,
    options: Vec<FlagSpec>,
    by_name: HashMap<String, usize>,
    by_shortcut: HashMap<char, usize>,
}

impl FlagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn add_argument(&mut self, mut spec: FlagSpec) -> Result<(), FlagError> {
        if spec.kind() != FlagKind::Argument {
            return Err(FlagError::KindMismatch {
                name: spec.name().to_string(),
                reason: "options are added with add_option".to_string(),
            });
        }
        spec.validate()?;

        if self.arguments.iter().any(|a| a.name() == spec.name()) {
            return Err(FlagError::DuplicateFlag {
                name: spec.name().to_string(),
            });
        }

        if let Some(last) = self.arguments.last() {
            if last.is_array() {
                return Err(FlagError::InvalidFlagOrder {
                    name: spec.name().to_string(),
                    reason: format!("array argument '{}' must be the last one", last.name()),
                });
            }
            if spec.is_required() && !last.is_required() {
                return Err(FlagError::InvalidFlagOrder {
                    name: spec.name().to_string(),
                    reason: format!(
                        "required argument follows optional argument '{}'",
                        last.name()
                    ),
                });
            }
        }

        spec.set_index(self.arguments.len());
        tracing::trace!(name = spec.name(), index = spec.index(), "argument registered");
        self.arguments.push(spec);
        Ok(())
    }

    /// Adds a named option.
    pub fn add_option(&mut self, spec: FlagSpec) -> Result<(), FlagError> {
        if spec.kind() != FlagKind::Option {
            return Err(FlagError::KindMismatch {
                name: spec.name().to_string(),
                reason: "arguments are added with add_argument".to_string(),
            });
        }
        spec.validate()?;

        if self.by_name.contains_key(spec.name()) {
            return Err(FlagError::DuplicateFlag {
                name: spec.name().to_string(),
            });
        }
        let shortcuts = spec.get_shortcuts();
        for (i, c) in shortcuts.iter().enumerate() {
            if self.by_shortcut.contains_key(c) || shortcuts[..i].contains(c) {
                return Err(FlagError::DuplicateFlag {
                    name: format!("-{c}"),
                });
            }
        }

        let idx = self.options.len();
        self.by_name.insert(spec.name().to_string(), idx);
        for c in spec.get_shortcuts() {
            self.by_shortcut.insert(*c, idx);
        }
        tracing::trace!(name = spec.name(), "option registered");
        self.options.push(spec);
        Ok(())
    }

    /// Consuming variant of [`add_argument`](Self::add_argument) for chaining.
    pub fn with_argument(mut self, spec: FlagSpec) -> Result<Self, FlagError> {
        self.add_argument(spec)?;
        Ok(self)
    }

    /// Consuming variant of [`add_option`](Self::add_option) for chaining.
    pub fn with_option(mut self, spec: FlagSpec) -> Result<Self, FlagError> {
        self.add_option(spec)?;
        Ok(self)
    }

    /// Copies every flag of `other` into this registry, arguments after the
    /// ones already present.
    pub fn extend_from(&mut self, other: &FlagRegistry) -> Result<(), FlagError> {
        for spec in &other.arguments {
            self.add_argument(spec.clone())?;
        }
        for spec in &other.options {
            self.add_option(spec.clone())?;
        }
        Ok(())
    }

    pub fn argument_at(&self, index: usize) -> Option<&FlagSpec> {
        self.arguments.get(index)
    }

    pub fn argument(&self, name: &str) -> Option<&FlagSpec> {
        self.arguments.iter().find(|a| a.name() == name)
    }

    /// Looks up an option by its long name.
    pub fn option(&self, name: &str) -> Option<&FlagSpec> {
        self.by_name.get(name).map(|&i| &self.options[i])
    }

    pub fn option_by_shortcut(&self, shortcut: char) -> Option<&FlagSpec> {
        self.by_shortcut.get(&shortcut).map(|&i| &self.options[i])
    }

    /// Looks up an option from how it might be written: `--name`, `-s`,
    /// or bare `name` / `s` (long name tried first).
    pub fn option_by_name_or_shortcut(&self, token: &str) -> Option<&FlagSpec> {
        if let Some(name) = token.strip_prefix("--") {
            return self.option(name);
        }
        if let Some(short) = token.strip_prefix('-') {
            return single_char(short).and_then(|c| self.option_by_shortcut(c));
        }
        self.option(token)
            .or_else(|| single_char(token).and_then(|c| self.option_by_shortcut(c)))
    }

    /// Every required argument, then every required option.
    pub fn all_required(&self) -> impl Iterator<Item = &FlagSpec> {
        self.arguments
            .iter()
            .chain(self.options.iter())
            .filter(|s| s.is_required())
    }

    pub fn arguments(&self) -> &[FlagSpec] {
        &self.arguments
    }

    pub fn options(&self) -> &[FlagSpec] {
        &self.options
    }

    /// True when some shortcut is a digit, which makes `-5` an option.
    pub fn has_digit_shortcut(&self) -> bool {
        self.by_shortcut.keys().any(char::is_ascii_digit)
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty() && self.options.is_empty()
    }

    pub fn len(&self) -> usize {
        self.arguments.len() + self.options.len()
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
