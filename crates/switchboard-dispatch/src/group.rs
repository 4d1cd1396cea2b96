//! Named collections of related actions.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use switchboard_flags::{FlagError, FlagRegistry};

use crate::error::RouteError;
use crate::handler::{ConfigureFn, Handler};
use crate::route::{validate_name, RouteMeta};

pub(crate) struct ActionEntry {
    pub(crate) handler: Box<dyn Handler>,
    pub(crate) meta: RouteMeta,
}

/// A group of actions addressed as `group:action` or `group action`.
///
/// ```rust
/// use switchboard_dispatch::{CommandContext, FnHandler, Group, RouteMeta};
/// use switchboard_flags::ParsedInput;
///
/// let home = Group::new()
///     .action("index", FnHandler::new(|_: &ParsedInput, _: &CommandContext| {}))?
///     .action_with(
///         "test",
///         FnHandler::new(|_: &ParsedInput, _: &CommandContext| {}),
///         RouteMeta::new().alias("t").description("Run the tests"),
///     )?
///     .default_action("index");
///
/// assert_eq!(home.resolve_action("").as_deref(), Some("index"));
/// assert_eq!(home.resolve_action("t").as_deref(), Some("test"));
/// assert_eq!(home.resolve_action("missing"), None);
/// # Ok::<(), switchboard_dispatch::RouteError>(())
/// ```
#[derive(Default)]
pub struct Group {
    actions: BTreeMap<String, ActionEntry>,
    action_aliases: HashMap<String, String>,
    default_action: Option<String>,
    shared_flags: Option<ConfigureFn>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action<H>(self, name: impl Into<String>, handler: H) -> Result<Self, RouteError>
    where
        H: Handler + 'static,
    {
        self.action_with(name, handler, RouteMeta::default())
    }

    /// Adds an action with aliases and a description. Action names and
    /// aliases share one namespace inside the group.
    pub fn action_with<H>(
        mut self,
        name: impl Into<String>,
        handler: H,
        meta: RouteMeta,
    ) -> Result<Self, RouteError>
    where
        H: Handler + 'static,
    {
        let name = name.into();
        validate_name(&name)?;
        if self.is_taken(&name) {
            return Err(RouteError::DuplicateName { name });
        }
        for (i, alias) in meta.aliases.iter().enumerate() {
            validate_name(alias)?;
            if self.is_taken(alias) || *alias == name || meta.aliases[..i].contains(alias) {
                return Err(RouteError::DuplicateName {
                    name: alias.clone(),
                });
            }
        }

        for alias in &meta.aliases {
            self.action_aliases.insert(alias.clone(), name.clone());
        }
        self.actions.insert(
            name,
            ActionEntry {
                handler: Box::new(handler),
                meta,
            },
        );
        Ok(self)
    }

    /// The action run when the group is invoked without one. Checked when the
    /// group is registered.
    pub fn default_action(mut self, name: impl Into<String>) -> Self {
        self.default_action = Some(name.into());
        self
    }

    /// Flags added to every action's registry before the action's own.
    pub fn shared_flags<C>(mut self, configure: C) -> Self
    where
        C: Fn(&mut FlagRegistry) -> Result<(), FlagError> + 'static,
    {
        self.shared_flags = Some(Box::new(configure));
        self
    }

    /// Resolves an action name or alias to the canonical action name. An
    /// empty name resolves to the default action, if any.
    pub fn resolve_action(&self, name: &str) -> Option<String> {
        if name.is_empty() {
            return self.default_action.clone();
        }
        if self.actions.contains_key(name) {
            return Some(name.to_string());
        }
        self.action_aliases.get(name).cloned()
    }

    /// Whether `token` names an action or action alias (never the default).
    pub fn has_action(&self, token: &str) -> bool {
        !token.is_empty() && self.resolve_action(token).is_some()
    }

    pub fn get_default_action(&self) -> Option<&str> {
        self.default_action.as_deref()
    }

    /// Action names with their metadata, sorted by name.
    pub fn actions(&self) -> impl Iterator<Item = (&str, &RouteMeta)> {
        self.actions
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.meta))
    }

    pub(crate) fn entry(&self, action: &str) -> Option<&ActionEntry> {
        self.actions.get(action)
    }

    pub(crate) fn entry_mut(&mut self, action: &str) -> Option<&mut ActionEntry> {
        self.actions.get_mut(action)
    }

    pub(crate) fn configure_shared(&self, flags: &mut FlagRegistry) -> Result<(), FlagError> {
        match &self.shared_flags {
            Some(configure) => configure(flags),
            None => Ok(()),
        }
    }

    fn is_taken(&self, name: &str) -> bool {
        self.actions.contains_key(name) || self.action_aliases.contains_key(name)
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("default_action", &self.default_action)
            .field("shared_flags", &self.shared_flags.is_some())
            .finish()
    }
}
