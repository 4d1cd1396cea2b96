//! The result of a successful parse.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::value::FlagValue;

/// Where a bound value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Given on the command line.
    Token,
    /// Read from the option's environment variable.
    Env,
    /// The declared default (or `false` for an unset boolean option).
    Default,
}

/// Bound arguments and options, plus the tokens nothing claimed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedInput {
    arguments: BTreeMap<String, FlagValue>,
    options: BTreeMap<String, FlagValue>,
    remaining: Vec<String>,
    #[serde(skip)]
    sources: BTreeMap<String, ValueSource>,
}

impl ParsedInput {
    /// An option value, falling back to an argument of the same name.
    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.options.get(name).or_else(|| self.arguments.get(name))
    }

    pub fn argument(&self, name: &str) -> Option<&FlagValue> {
        self.arguments.get(name)
    }

    pub fn option(&self, name: &str) -> Option<&FlagValue> {
        self.options.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FlagValue::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FlagValue::as_int)
    }

    /// Boolean value; an unbound name reads as `false`.
    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name).and_then(FlagValue::as_bool).unwrap_or(false)
    }

    /// Any value rendered as a list of strings.
    pub fn get_list(&self, name: &str) -> Option<Vec<String>> {
        self.get(name).map(FlagValue::to_raw)
    }

    /// Whether `name` has a bound value from any source.
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether the option was given on the command line.
    pub fn is_explicit(&self, name: &str) -> bool {
        self.source(name) == Some(ValueSource::Token)
    }

    /// Where an option's value came from.
    pub fn source(&self, name: &str) -> Option<ValueSource> {
        self.sources.get(name).copied()
    }

    /// Tokens that were not bound to any declared flag, in input order.
    pub fn remaining(&self) -> &[String] {
        &self.remaining
    }

    pub fn arguments(&self) -> &BTreeMap<String, FlagValue> {
        &self.arguments
    }

    pub fn options(&self) -> &BTreeMap<String, FlagValue> {
        &self.options
    }

    /// Re-serializes the options given on the command line as
    /// `--name=value` tokens, one per array element.
    pub fn option_tokens(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|(name, _)| self.is_explicit(name))
            .flat_map(|(name, value)| {
                value
                    .to_raw()
                    .into_iter()
                    .map(move |raw| format!("--{name}={raw}"))
            })
            .collect()
    }

    pub(crate) fn bind_argument(&mut self, name: &str, value: FlagValue) {
        self.arguments.insert(name.to_string(), value);
    }

    pub(crate) fn bind_option(&mut self, name: &str, value: FlagValue, source: ValueSource) {
        self.options.insert(name.to_string(), value);
        self.sources.insert(name.to_string(), source);
    }

    pub(crate) fn take_argument(&mut self, name: &str) -> Option<FlagValue> {
        self.arguments.remove(name)
    }

    pub(crate) fn take_option(&mut self, name: &str) -> Option<FlagValue> {
        self.options.remove(name)
    }

    pub(crate) fn push_remaining(&mut self, token: &str) {
        self.remaining.push(token.to_string());
    }
}
