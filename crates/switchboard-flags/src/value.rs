//! Flag types and bound values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagType {
    #[default]
    String,
    Int,
    Bool,
    /// A sequence of strings. Always binds a list, even for one occurrence.
    Array,
    /// Raw token text, no coercion.
    Mixed,
}

impl FlagType {
    /// Parses a type name as written in rule text.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "string" | "str" => Some(Self::String),
            "int" | "integer" => Some(Self::Int),
            "bool" | "boolean" => Some(Self::Bool),
            "array" | "arr" => Some(Self::Array),
            "mixed" => Some(Self::Mixed),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Array => "array",
            Self::Mixed => "mixed",
        }
    }

    /// Converts a single raw token to a scalar value of this type.
    ///
    /// `Array` and `Mixed` elements are kept as strings.
    pub(crate) fn coerce(&self, raw: &str) -> Option<FlagValue> {
        match self {
            Self::String | Self::Array | Self::Mixed => Some(FlagValue::Str(raw.to_string())),
            Self::Int => parse_int(raw).map(FlagValue::Int),
            Self::Bool => parse_bool(raw).map(FlagValue::Bool),
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A bound flag value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Str(String),
    Int(i64),
    Bool(bool),
    StrArray(Vec<String>),
    IntArray(Vec<i64>),
}

impl FlagValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            Self::StrArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            Self::IntArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::StrArray(_) | Self::IntArray(_))
    }

    /// Renders the value as the raw token(s) that would produce it again.
    ///
    /// Scalars yield one token, arrays one token per element.
    pub fn to_raw(&self) -> Vec<String> {
        match self {
            Self::Str(s) => vec![s.clone()],
            Self::Int(n) => vec![n.to_string()],
            Self::Bool(b) => vec![b.to_string()],
            Self::StrArray(v) => v.clone(),
            Self::IntArray(v) => v.iter().map(i64::to_string).collect(),
        }
    }

    /// Whether this value is a legal binding for a flag of `ty`.
    pub(crate) fn fits(&self, ty: FlagType, is_array: bool) -> bool {
        match (self, is_array) {
            (Self::IntArray(_), true) => ty == FlagType::Int,
            (Self::StrArray(_), true) => ty != FlagType::Int,
            (Self::Str(_), false) => matches!(ty, FlagType::String | FlagType::Mixed),
            (Self::Int(_), false) => ty == FlagType::Int,
            (Self::Bool(_), false) => ty == FlagType::Bool,
            _ => false,
        }
    }

    /// Appends a scalar to an array value, converting scalars into arrays.
    pub(crate) fn push(self, item: FlagValue) -> FlagValue {
        match (self, item) {
            (Self::IntArray(mut v), Self::Int(n)) => {
                v.push(n);
                Self::IntArray(v)
            }
            (Self::StrArray(mut v), item) => {
                v.extend(item.to_raw());
                Self::StrArray(v)
            }
            (Self::Int(a), Self::Int(b)) => Self::IntArray(vec![a, b]),
            (current, item) => {
                let mut v = current.to_raw();
                v.extend(item.to_raw());
                Self::StrArray(v)
            }
        }
    }

    /// Wraps a scalar into a one-element array of the matching kind.
    pub(crate) fn into_array(self) -> FlagValue {
        match self {
            Self::Int(n) => Self::IntArray(vec![n]),
            Self::IntArray(_) | Self::StrArray(_) => self,
            other => Self::StrArray(other.to_raw()),
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::StrArray(_) | Self::IntArray(_) => f.write_str(&self.to_raw().join(",")),
        }
    }
}

impl From<&str> for FlagValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for FlagValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for FlagValue {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<bool> for FlagValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<String>> for FlagValue {
    fn from(v: Vec<String>) -> Self {
        Self::StrArray(v)
    }
}

impl From<Vec<&str>> for FlagValue {
    fn from(v: Vec<&str>) -> Self {
        Self::StrArray(v.into_iter().map(String::from).collect())
    }
}

impl From<Vec<i64>> for FlagValue {
    fn from(v: Vec<i64>) -> Self {
        Self::IntArray(v)
    }
}

/// Parses a boolean literal: `true/false`, `yes/no`, `on/off`, `1/0`,
/// case-insensitively. Anything else is rejected.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Parses a base-10 integer with an optional sign.
pub fn parse_int(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok()
}

/// Whether `token` is a negative number such as `-5` or `-1.25`.
pub(crate) fn is_negative_number(token: &str) -> bool {
    let Some(digits) = token.strip_prefix('-') else {
        return false;
    };
    let mut seen_dot = false;
    let mut chars = digits.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => {}
        _ => return false,
    }
    for c in chars {
        match c {
            '0'..='9' => {}
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    true
}
