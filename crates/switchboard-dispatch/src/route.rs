//! Route table and name resolution.
//!
//! Input command grammar:
//!
//! ```text
//! name            a command, or a group (runs its default action)
//! group:action    an action of a group
//! group action    same, space-delimited
//! alias           any of the above through the alias index
//! ```
//!
//! `:` takes precedence over a space when both appear. Names are matched
//! exactly and case-sensitively. Registration rejects every collision, so
//! resolution never has to break a tie.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use strsim::levenshtein;
use switchboard_flags::{FlagError, FlagRegistry};

use crate::error::RouteError;
use crate::group::Group;
use crate::handler::Handler;

/// Largest edit distance at which a registered name is suggested.
const SUGGESTION_DISTANCE: usize = 2;

/// A resolved route: one command, or one action of a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Command(String),
    Group { group: String, action: String },
}

impl Route {
    pub fn kind(&self) -> RouteKind {
        match self {
            Route::Command(_) => RouteKind::Command,
            Route::Group { .. } => RouteKind::Group,
        }
    }

    /// The command or group name.
    pub fn name(&self) -> &str {
        match self {
            Route::Command(name) => name,
            Route::Group { group, .. } => group,
        }
    }

    pub fn action(&self) -> Option<&str> {
        match self {
            Route::Command(_) => None,
            Route::Group { action, .. } => Some(action),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Command(name) => f.write_str(name),
            Route::Group { group, action } => write!(f, "{group}:{action}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Command,
    Group,
}

/// Aliases and description attached to a command, group or action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub aliases: Vec<String>,
    pub description: String,
}

impl RouteMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// One line of the command listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSummary {
    pub name: String,
    pub kind: RouteKind,
    pub aliases: Vec<String>,
    pub description: String,
    /// Group actions as `(name, description)`; empty for commands.
    pub actions: Vec<(String, String)>,
    pub default_action: Option<String>,
}

struct CommandEntry {
    handler: Box<dyn Handler>,
    meta: RouteMeta,
}

struct GroupEntry {
    group: Group,
    meta: RouteMeta,
}

/// Commands, groups and the alias index. Built once at setup.
#[derive(Default)]
pub struct RouteTable {
    commands: BTreeMap<String, CommandEntry>,
    groups: BTreeMap<String, GroupEntry>,
    /// alias -> canonical target, `name` or `group:action`
    aliases: HashMap<String, String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command<H>(
        &mut self,
        name: impl Into<String>,
        handler: H,
        meta: RouteMeta,
    ) -> Result<(), RouteError>
    where
        H: Handler + 'static,
    {
        let name = name.into();
        self.check_new(&name, &meta.aliases)?;
        for alias in &meta.aliases {
            self.aliases.insert(alias.clone(), name.clone());
        }
        tracing::debug!(command = %name, aliases = ?meta.aliases, "command registered");
        self.commands.insert(
            name,
            CommandEntry {
                handler: Box::new(handler),
                meta,
            },
        );
        Ok(())
    }

    pub fn add_group(
        &mut self,
        name: impl Into<String>,
        group: Group,
        meta: RouteMeta,
    ) -> Result<(), RouteError> {
        let name = name.into();
        self.check_new(&name, &meta.aliases)?;
        if let Some(default) = group.get_default_action() {
            if group.resolve_action(default).as_deref() != Some(default) {
                return Err(RouteError::UnknownAction {
                    group: name,
                    action: default.to_string(),
                });
            }
        }
        for alias in &meta.aliases {
            self.aliases.insert(alias.clone(), name.clone());
        }
        tracing::debug!(group = %name, aliases = ?meta.aliases, "group registered");
        self.groups.insert(name, GroupEntry { group, meta });
        Ok(())
    }

    /// Adds aliases for an existing `command`, `group` or `group:action`.
    ///
    /// The target must be a canonical name, not another alias. Group actions
    /// may be given by their own alias and are stored canonically.
    pub fn add_aliases<I, S>(&mut self, target: &str, aliases: I) -> Result<(), RouteError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let canonical = self.canonical_target(target)?;
        let aliases: Vec<String> = aliases.into_iter().map(Into::into).collect();
        for (i, alias) in aliases.iter().enumerate() {
            validate_name(alias)?;
            if self.is_taken(alias) || aliases[..i].contains(alias) {
                return Err(RouteError::DuplicateName {
                    name: alias.clone(),
                });
            }
        }
        for alias in aliases {
            tracing::debug!(%alias, target = %canonical, "alias registered");
            self.aliases.insert(alias, canonical.clone());
        }
        Ok(())
    }

    /// Resolves an input command string to a route.
    pub fn find(&self, input: &str) -> Option<Route> {
        let (head, action) = split_name(input);
        let resolved = self.aliases.get(head).map(String::as_str).unwrap_or(head);
        if let Some(route) = self.lookup(resolved, action) {
            tracing::trace!(input, %route, "route resolved");
            return Some(route);
        }

        // Aliases may stand for a whole `group:action` pair.
        let target = self.aliases.get(input)?;
        let (head, action) = split_name(target);
        let route = self.lookup(head, action)?;
        tracing::trace!(input, %route, "route resolved through alias");
        Some(route)
    }

    /// The group registered under `name` or one of its aliases.
    pub fn resolve_group(&self, name: &str) -> Option<(&str, &Group)> {
        let name = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.groups
            .get_key_value(name)
            .map(|(name, entry)| (name.as_str(), &entry.group))
    }

    /// Registered names and aliases close to `name`, best first.
    pub fn suggest(&self, name: &str) -> Vec<String> {
        let mut scored: Vec<(usize, &str)> = self
            .commands
            .keys()
            .chain(self.groups.keys())
            .chain(self.aliases.keys())
            .map(|candidate| (levenshtein(name, candidate), candidate.as_str()))
            .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
            .collect();
        scored.sort();
        scored.into_iter().map(|(_, c)| c.to_string()).collect()
    }

    /// Every command and group, sorted by name.
    pub fn summaries(&self) -> Vec<RouteSummary> {
        let commands = self.commands.iter().map(|(name, entry)| RouteSummary {
            name: name.clone(),
            kind: RouteKind::Command,
            aliases: self.aliases_of(name, &entry.meta),
            description: entry.meta.description.clone(),
            actions: Vec::new(),
            default_action: None,
        });
        let groups = self.groups.iter().map(|(name, entry)| RouteSummary {
            name: name.clone(),
            kind: RouteKind::Group,
            aliases: self.aliases_of(name, &entry.meta),
            description: entry.meta.description.clone(),
            actions: entry
                .group
                .actions()
                .map(|(action, meta)| (action.to_string(), meta.description.clone()))
                .collect(),
            default_action: entry.group.get_default_action().map(String::from),
        });
        let mut all: Vec<RouteSummary> = commands.chain(groups).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Description of a route: the action's own, else its group's.
    pub fn description(&self, route: &Route) -> Option<&str> {
        match route {
            Route::Command(name) => self.commands.get(name).map(|e| e.meta.description.as_str()),
            Route::Group { group, action } => {
                let entry = self.groups.get(group)?;
                let own = entry.group.entry(action)?.meta.description.as_str();
                Some(if own.is_empty() {
                    entry.meta.description.as_str()
                } else {
                    own
                })
            }
        }
    }

    /// Builds the flag registry for a route: group-shared flags first, then
    /// the handler's own.
    pub fn configure(&self, route: &Route) -> Option<Result<FlagRegistry, FlagError>> {
        let mut flags = FlagRegistry::new();
        let result = match route {
            Route::Command(name) => self.commands.get(name)?.handler.configure(&mut flags),
            Route::Group { group, action } => {
                let entry = self.groups.get(group)?;
                let handler = &entry.group.entry(action)?.handler;
                entry
                    .group
                    .configure_shared(&mut flags)
                    .and_then(|()| handler.configure(&mut flags))
            }
        };
        Some(result.map(|()| flags))
    }

    pub fn handler_mut(&mut self, route: &Route) -> Option<&mut Box<dyn Handler>> {
        match route {
            Route::Command(name) => self.commands.get_mut(name).map(|e| &mut e.handler),
            Route::Group { group, action } => self
                .groups
                .get_mut(group)?
                .group
                .entry_mut(action)
                .map(|e| &mut e.handler),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.groups.is_empty()
    }

    /// Whether `name` is taken by a command, group or alias.
    pub fn is_taken(&self, name: &str) -> bool {
        self.commands.contains_key(name)
            || self.groups.contains_key(name)
            || self.aliases.contains_key(name)
    }

    fn lookup(&self, name: &str, action: &str) -> Option<Route> {
        if self.commands.contains_key(name) {
            return action.is_empty().then(|| Route::Command(name.to_string()));
        }
        let entry = self.groups.get(name)?;
        let action = entry.group.resolve_action(action)?;
        Some(Route::Group {
            group: name.to_string(),
            action,
        })
    }

    fn check_new(&self, name: &str, aliases: &[String]) -> Result<(), RouteError> {
        validate_name(name)?;
        if self.is_taken(name) {
            return Err(RouteError::DuplicateName {
                name: name.to_string(),
            });
        }
        for (i, alias) in aliases.iter().enumerate() {
            validate_name(alias)?;
            if self.is_taken(alias) || alias == name || aliases[..i].contains(alias) {
                return Err(RouteError::DuplicateName {
                    name: alias.clone(),
                });
            }
        }
        Ok(())
    }

    fn canonical_target(&self, target: &str) -> Result<String, RouteError> {
        let unknown = || RouteError::UnknownAliasTarget {
            target: target.to_string(),
        };
        let (head, action) = split_name(target);
        if action.is_empty() {
            return if self.commands.contains_key(head) || self.groups.contains_key(head) {
                Ok(head.to_string())
            } else {
                Err(unknown())
            };
        }
        let entry = self.groups.get(head).ok_or_else(unknown)?;
        let action = entry
            .group
            .resolve_action(action)
            .ok_or_else(|| RouteError::UnknownAction {
                group: head.to_string(),
                action: action.to_string(),
            })?;
        Ok(format!("{head}:{action}"))
    }

    fn aliases_of(&self, name: &str, meta: &RouteMeta) -> Vec<String> {
        let mut aliases: Vec<String> = self
            .aliases
            .iter()
            .filter(|(alias, target)| *target == name && !meta.aliases.contains(alias))
            .map(|(alias, _)| alias.clone())
            .collect();
        aliases.sort();
        let mut all = meta.aliases.clone();
        all.extend(aliases);
        all
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("groups", &self.groups.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .finish()
    }
}

/// Splits `group:action` or `group action`; `:` wins over a space.
pub fn split_name(input: &str) -> (&str, &str) {
    let input = input.trim();
    let split = input.split_once(':').or_else(|| input.split_once(' '));
    match split {
        Some((head, action)) => (head.trim(), action.trim()),
        None => (input, ""),
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), RouteError> {
    if name.is_empty() || name.starts_with('-') || name.contains(|c: char| c == ':' || c.is_whitespace()) {
        return Err(RouteError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{CommandContext, FnHandler};
    use switchboard_flags::ParsedInput;

    fn noop() -> impl Handler {
        FnHandler::new(|_: &ParsedInput, _: &CommandContext| {})
    }

    fn table() -> RouteTable {
        let mut table = RouteTable::new();
        table
            .add_command("greet", noop(), RouteMeta::new().alias("hi").description("Say hello"))
            .unwrap();
        let home = Group::new()
            .action("index", noop())
            .unwrap()
            .action_with("test", noop(), RouteMeta::new().alias("t"))
            .unwrap()
            .default_action("index");
        table
            .add_group("home", home, RouteMeta::new().alias("hm"))
            .unwrap();
        table
    }

    fn group_route(group: &str, action: &str) -> Route {
        Route::Group {
            group: group.to_string(),
            action: action.to_string(),
        }
    }

    #[test]
    fn split_prefers_colon() {
        assert_eq!(split_name("home:test"), ("home", "test"));
        assert_eq!(split_name("home test"), ("home", "test"));
        assert_eq!(split_name("home:te st"), ("home", "te st"));
        assert_eq!(split_name("greet"), ("greet", ""));
    }

    #[test]
    fn commands_resolve_by_name_and_alias() {
        let table = table();
        assert_eq!(table.find("greet"), Some(Route::Command("greet".into())));
        assert_eq!(table.find("hi"), Some(Route::Command("greet".into())));
        assert_eq!(table.find("greet:x"), None);
    }

    #[test]
    fn groups_resolve_actions_and_defaults() {
        let table = table();
        assert_eq!(table.find("home:test"), Some(group_route("home", "test")));
        assert_eq!(table.find("home test"), Some(group_route("home", "test")));
        assert_eq!(table.find("home:t"), Some(group_route("home", "test")));
        assert_eq!(table.find("hm:t"), Some(group_route("home", "test")));
        assert_eq!(table.find("home"), Some(group_route("home", "index")));
        assert_eq!(table.find("home:nope"), None);
    }

    #[test]
    fn alias_to_group_action() {
        let mut table = table();
        table.add_aliases("home:test", ["h-test"]).unwrap();
        assert_eq!(table.find("h-test"), table.find("home:test"));
        assert_eq!(table.find("h-test"), Some(group_route("home", "test")));
    }

    #[test]
    fn alias_target_is_canonicalised() {
        let mut table = table();
        table.add_aliases("home t", ["ht"]).unwrap();
        assert_eq!(table.find("ht"), Some(group_route("home", "test")));
    }

    #[test]
    fn alias_targets_are_checked() {
        let mut table = table();
        assert_eq!(
            table.add_aliases("nothing", ["x"]),
            Err(RouteError::UnknownAliasTarget {
                target: "nothing".into()
            })
        );
        assert!(matches!(
            table.add_aliases("home:nothing", ["x"]),
            Err(RouteError::UnknownAction { .. })
        ));
        // Aliases of aliases are not followed.
        assert!(matches!(
            table.add_aliases("hi", ["hey"]),
            Err(RouteError::UnknownAliasTarget { .. })
        ));
    }

    #[test]
    fn every_collision_is_rejected() {
        let mut table = table();
        for name in ["greet", "hi", "home", "hm"] {
            assert_eq!(
                table.add_command(name, noop(), RouteMeta::new()),
                Err(RouteError::DuplicateName { name: name.into() })
            );
            assert_eq!(
                table.add_group(name, Group::new(), RouteMeta::new()),
                Err(RouteError::DuplicateName { name: name.into() })
            );
            assert_eq!(
                table.add_aliases("greet", [name]),
                Err(RouteError::DuplicateName { name: name.into() })
            );
        }
        assert!(matches!(
            table.add_command("fresh", noop(), RouteMeta::new().alias("home")),
            Err(RouteError::DuplicateName { .. })
        ));
        assert!(!table.is_taken("fresh"));
    }

    #[test]
    fn default_action_must_exist() {
        let mut table = RouteTable::new();
        let group = Group::new()
            .action("index", noop())
            .unwrap()
            .default_action("show");
        assert_eq!(
            table.add_group("pages", group, RouteMeta::new()),
            Err(RouteError::UnknownAction {
                group: "pages".into(),
                action: "show".into()
            })
        );
    }

    #[test]
    fn group_without_default_needs_action() {
        let mut table = RouteTable::new();
        let group = Group::new().action("index", noop()).unwrap();
        table.add_group("pages", group, RouteMeta::new()).unwrap();
        assert_eq!(table.find("pages"), None);
        assert_eq!(table.find("pages:index"), Some(group_route("pages", "index")));
    }

    #[test]
    fn suggestions_are_close_names() {
        let table = table();
        assert_eq!(table.suggest("gret"), vec!["greet"]);
        assert_eq!(table.suggest("hme"), vec!["hm", "home", "hi"]);
        assert!(table.suggest("completely-different").is_empty());
    }

    #[test]
    fn summaries_are_sorted_with_aliases() {
        let mut table = table();
        table.add_aliases("greet", ["hello"]).unwrap();
        let summaries = table.summaries();
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["greet", "home"]);
        assert_eq!(summaries[0].aliases, vec!["hi", "hello"]);
        assert_eq!(summaries[0].description, "Say hello");
        assert_eq!(summaries[1].kind, RouteKind::Group);
        assert_eq!(summaries[1].default_action.as_deref(), Some("index"));
        assert_eq!(summaries[1].actions.len(), 2);
    }

    #[test]
    fn route_display() {
        assert_eq!(Route::Command("greet".into()).to_string(), "greet");
        assert_eq!(group_route("home", "test").to_string(), "home:test");
        assert_eq!(group_route("home", "test").action(), Some("test"));
        assert_eq!(group_route("home", "test").name(), "home");
    }
}
