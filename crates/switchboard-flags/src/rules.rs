//! Flag definitions written as plain rule text.
//!
//! A rule is a `;`-separated string:
//!
//! ```text
//! type;description;required;default;shortcuts
//! ```
//!
//! Every field after `type` may be left empty or omitted. `type` is one of
//! `string`, `int`, `bool`, `array` or `mixed` and may end in `[]` to accept
//! repeated values. Option keys may list shortcuts after the name, so
//! `"yes,y"` declares `--yes` with shortcut `-y`.
//!
//! A [`FlagTable`] groups rules for one handler and is usually loaded from
//! YAML:
//!
//! ```
//! use switchboard_flags::FlagTable;
//!
//! let table = FlagTable::from_yaml_str(r#"
//! arguments:
//!   - name: name
//!     rule: "string;The user name;required"
//!   - name: age
//!     rule: "int;The user age;;20"
//! options:
//!   "yes,y": "bool;Skip prompts"
//!   tags: "string[];Labels to attach"
//! "#)?;
//!
//! let flags = table.into_registry()?;
//! assert_eq!(flags.argument_at(1).unwrap().name(), "age");
//! assert_eq!(flags.option_by_shortcut('y').unwrap().name(), "yes");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FlagError, RuleError};
use crate::registry::FlagRegistry;
use crate::spec::{FlagKind, FlagSpec};
use crate::value::{FlagType, FlagValue};

/// One named rule, optionally bound to an environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub name: String,
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

impl RuleEntry {
    pub fn new(name: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule: rule.into(),
            env: None,
        }
    }

    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env = Some(var.into());
        self
    }
}

/// Rule text for one handler: arguments in declaration order and options
/// keyed by `name[,shortcut...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FlagTable {
    #[serde(default)]
    arguments: Vec<RuleEntry>,
    #[serde(default, deserialize_with = "ordered_entries")]
    options: Vec<RuleEntry>,
}

impl FlagTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, RuleError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn argument(mut self, name: impl Into<String>, rule: impl Into<String>) -> Self {
        self.arguments.push(RuleEntry::new(name, rule));
        self
    }

    /// Adds an option rule. `key` may carry shortcuts: `"yes,y"`.
    pub fn option(mut self, key: impl Into<String>, rule: impl Into<String>) -> Self {
        self.options.push(RuleEntry::new(key, rule));
        self
    }

    pub fn option_entry(mut self, entry: RuleEntry) -> Self {
        self.options.push(entry);
        self
    }

    pub fn arguments(&self) -> &[RuleEntry] {
        &self.arguments
    }

    pub fn options(&self) -> &[RuleEntry] {
        &self.options
    }

    /// Adds every rule to an existing registry.
    pub fn apply(&self, registry: &mut FlagRegistry) -> Result<(), RuleError> {
        for entry in &self.arguments {
            registry.add_argument(parse_rule(FlagKind::Argument, &entry.name, &entry.rule)?)?;
        }
        for entry in &self.options {
            let mut spec = parse_rule(FlagKind::Option, &entry.name, &entry.rule)?;
            if let Some(var) = &entry.env {
                spec = spec.env(var.clone());
            }
            registry.add_option(spec)?;
        }
        Ok(())
    }

    pub fn into_registry(self) -> Result<FlagRegistry, RuleError> {
        let mut registry = FlagRegistry::new();
        self.apply(&mut registry)?;
        Ok(registry)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleValue {
    Rule(String),
    Detailed {
        rule: String,
        #[serde(default)]
        env: Option<String>,
    },
}

/// Reads a YAML mapping of `key: rule` pairs, keeping document order.
fn ordered_entries<'de, D>(deserializer: D) -> Result<Vec<RuleEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<RuleEntry>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of option keys to rule strings")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::new();
            while let Some((name, value)) = map.next_entry::<String, RuleValue>()? {
                entries.push(match value {
                    RuleValue::Rule(rule) => RuleEntry::new(name, rule),
                    RuleValue::Detailed { rule, env } => RuleEntry { name, rule, env },
                });
            }
            Ok(entries)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(EntriesVisitor)
}

/// Builds a [`FlagSpec`] from a key and a rule string.
///
/// ```
/// use switchboard_flags::rules::parse_rule;
/// use switchboard_flags::{FlagKind, FlagType, FlagValue};
///
/// let spec = parse_rule(FlagKind::Option, "id,i", "int[];Record ids;;1,2")?;
/// assert_eq!(spec.name(), "id");
/// assert_eq!(spec.get_type(), FlagType::Int);
/// assert!(spec.is_array());
/// assert_eq!(spec.get_shortcuts(), ['i']);
/// assert_eq!(spec.get_default(), Some(&FlagValue::IntArray(vec![1, 2])));
/// # Ok::<(), switchboard_flags::RuleError>(())
/// ```
pub fn parse_rule(kind: FlagKind, key: &str, rule: &str) -> Result<FlagSpec, RuleError> {
    let (name, key_shortcuts) = split_key(kind, key)?;
    let mut fields = rule.splitn(5, ';').map(str::trim);

    let type_field = fields.next().unwrap_or_default();
    let (type_name, is_array) = match type_field.strip_suffix("[]") {
        Some(base) => (base, true),
        None => (type_field, false),
    };
    let ty = FlagType::from_name(type_name)
        .ok_or_else(|| RuleError::UnknownType(type_field.to_string()))?;

    let mut spec = match kind {
        FlagKind::Argument => FlagSpec::argument(name),
        FlagKind::Option => FlagSpec::option(name),
    }
    .ty(ty);
    if is_array {
        spec = spec.array();
    }

    if let Some(description) = fields.next().filter(|d| !d.is_empty()) {
        spec = spec.description(description);
    }

    if let Some(required) = fields.next() {
        match required.to_ascii_lowercase().as_str() {
            "" | "optional" | "opt" | "false" | "no" | "0" => {}
            "required" | "req" | "true" | "yes" | "1" => spec = spec.required(),
            _ => {
                return Err(RuleError::InvalidRequired {
                    name: name.to_string(),
                    value: required.to_string(),
                })
            }
        }
    }

    if let Some(raw) = fields.next().filter(|d| !d.is_empty()) {
        let is_array = spec.is_array();
        spec = spec.default_value(parse_default(name, ty, is_array, raw)?);
    }

    spec = spec.shortcuts(key_shortcuts);
    if let Some(shortcuts) = fields.next() {
        spec = spec.shortcuts(
            shortcuts
                .chars()
                .filter(|c| !c.is_whitespace() && *c != ',' && *c != '-'),
        );
    }

    Ok(spec)
}

fn split_key(kind: FlagKind, key: &str) -> Result<(&str, Vec<char>), FlagError> {
    let mut parts = key.split(',').map(str::trim);
    let name = parts.next().unwrap_or_default();
    if kind == FlagKind::Argument {
        return Ok((key.trim(), Vec::new()));
    }

    let mut shortcuts = Vec::new();
    for part in parts {
        let part = part.trim_start_matches('-');
        let mut chars = part.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => shortcuts.push(c),
            _ => {
                return Err(FlagError::InvalidShortcut {
                    name: name.to_string(),
                    shortcut: part.to_string(),
                })
            }
        }
    }
    Ok((name, shortcuts))
}

fn parse_default(
    name: &str,
    ty: FlagType,
    is_array: bool,
    raw: &str,
) -> Result<FlagValue, RuleError> {
    let invalid = || RuleError::InvalidDefault {
        name: name.to_string(),
        expected: ty,
        value: raw.to_string(),
    };

    if !is_array {
        return ty.coerce(raw).ok_or_else(invalid);
    }

    let mut acc: Option<FlagValue> = None;
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let value = ty.coerce(item).ok_or_else(invalid)?;
        acc = Some(match acc {
            Some(current) => current.push(value),
            None => value.into_array(),
        });
    }
    acc.ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_rule() {
        let spec = parse_rule(FlagKind::Option, "yes", "bool;Skip prompts;;false;y").unwrap();
        assert_eq!(spec.name(), "yes");
        assert!(spec.is_boolean());
        assert_eq!(spec.get_description(), "Skip prompts");
        assert_eq!(spec.get_default(), Some(&FlagValue::Bool(false)));
        assert_eq!(spec.get_shortcuts(), ['y']);
    }

    #[test]
    fn type_only_rule() {
        let spec = parse_rule(FlagKind::Argument, "name", "string").unwrap();
        assert_eq!(spec.get_type(), FlagType::String);
        assert!(!spec.is_required());
        assert!(spec.get_default().is_none());

        let spec = parse_rule(FlagKind::Argument, "name", "").unwrap();
        assert_eq!(spec.get_type(), FlagType::String);
    }

    #[test]
    fn required_marker() {
        let spec = parse_rule(FlagKind::Argument, "name", "string;The name;required").unwrap();
        assert!(spec.is_required());

        let err = parse_rule(FlagKind::Argument, "name", "string;;sometimes").unwrap_err();
        assert!(matches!(err, RuleError::InvalidRequired { .. }));
    }

    #[test]
    fn unknown_type() {
        let err = parse_rule(FlagKind::Option, "ratio", "float").unwrap_err();
        assert!(matches!(err, RuleError::UnknownType(t) if t == "float"));
    }

    #[test]
    fn default_is_coerced() {
        let spec = parse_rule(FlagKind::Argument, "age", "int;;;20").unwrap();
        assert_eq!(spec.get_default(), Some(&FlagValue::Int(20)));

        let err = parse_rule(FlagKind::Argument, "age", "int;;;twenty").unwrap_err();
        assert!(matches!(err, RuleError::InvalidDefault { .. }));

        let spec = parse_rule(FlagKind::Option, "tags", "array;;;a, b").unwrap();
        assert_eq!(spec.get_default(), Some(&FlagValue::from(vec!["a", "b"])));
    }

    #[test]
    fn array_default_is_split_per_item() {
        let spec = parse_rule(FlagKind::Option, "id,i", "int[];Record ids;;1,2").unwrap();
        assert!(spec.is_array());
        assert_eq!(spec.get_default(), Some(&FlagValue::IntArray(vec![1, 2])));

        let err = parse_rule(FlagKind::Option, "id", "int[];;;1,two").unwrap_err();
        assert!(matches!(err, RuleError::InvalidDefault { .. }));
    }

    #[test]
    fn key_shortcuts() {
        let spec = parse_rule(FlagKind::Option, "output,o,O", "string").unwrap();
        assert_eq!(spec.name(), "output");
        assert_eq!(spec.get_shortcuts(), ['o', 'O']);

        let err = parse_rule(FlagKind::Option, "output,out", "string").unwrap_err();
        assert!(matches!(
            err,
            RuleError::Flag(FlagError::InvalidShortcut { .. })
        ));
    }

    #[test]
    fn table_keeps_option_order_and_env() {
        let table = FlagTable::from_yaml_str(
            r#"
options:
  zeta: "string"
  "alpha,a": "bool"
  token:
    rule: "string;API token;required"
    env: APP_TOKEN
"#,
        )
        .unwrap();

        let names: Vec<&str> = table.options().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha,a", "token"]);

        let registry = table.into_registry().unwrap();
        assert_eq!(registry.option("token").unwrap().env_var(), Some("APP_TOKEN"));
        assert!(registry.option("token").unwrap().is_required());
        assert!(registry.option_by_shortcut('a').unwrap().is_boolean());
    }

    #[test]
    fn table_surfaces_registry_errors() {
        let table = FlagTable::new()
            .option("yes,y", "bool")
            .option("year,y", "int");
        assert!(matches!(
            table.into_registry(),
            Err(RuleError::Flag(FlagError::DuplicateFlag { .. }))
        ));

        let table = FlagTable::new()
            .argument("sex", "string")
            .argument("name", "string;;required");
        assert!(matches!(
            table.into_registry(),
            Err(RuleError::Flag(FlagError::InvalidFlagOrder { .. }))
        ));
    }

    #[test]
    fn boolean_array_rule_fails_at_setup() {
        let table = FlagTable::new().option("verbose,v", "bool[];Louder");
        assert!(matches!(
            table.into_registry(),
            Err(RuleError::Flag(FlagError::KindMismatch { .. }))
        ));
    }

    #[test]
    fn bad_yaml_is_reported() {
        assert!(matches!(
            FlagTable::from_yaml_str("arguments: 12"),
            Err(RuleError::Yaml(_))
        ));
    }
}
