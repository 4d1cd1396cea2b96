//! Flag definitions and parsing for console applications.
//!
//! `switchboard-flags` turns the tokens that follow a command name into typed
//! values. A handler describes what it accepts in a [`FlagRegistry`]:
//! positional arguments in declaration order, and named options with optional
//! single-character shortcuts. [`FlagParser`] then walks the tokens once, left
//! to right, and either binds every flag or fails as a whole.
//!
//! # Quick Start
//!
//! ```
//! use switchboard_flags::{FlagParser, FlagRegistry, FlagSpec, FlagType, FlagValue};
//!
//! let mut flags = FlagRegistry::new();
//! flags.add_argument(FlagSpec::argument("name").required())?;
//! flags.add_argument(FlagSpec::argument("age").ty(FlagType::Int))?;
//! flags.add_option(FlagSpec::option("yes").ty(FlagType::Bool).shortcut('y'))?;
//!
//! let input = FlagParser::new(&flags).parse(&["john", "43", "-y"])?;
//! assert_eq!(input.get_str("name"), Some("john"));
//! assert_eq!(input.get_int("age"), Some(43));
//! assert_eq!(input.option("yes"), Some(&FlagValue::Bool(true)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Token Grammar
//!
//! ```text
//! --name=value   long option with inline value
//! --name value   long option, value taken from the next token
//! --flag         long boolean option
//! -rf            cluster of boolean shortcuts
//! -ofile         shortcut `o` takes the rest of the token as its value
//! -o=file        shortcut with inline value
//! -5             positional (negative number) unless a digit shortcut exists
//! --             everything after is positional
//! ```
//!
//! # Rule Text
//!
//! Registries can also be produced from plain rule strings
//! (`"int;The user age;required"`) or a YAML [`FlagTable`], see [`rules`].

mod error;
pub mod env;
mod input;
mod parser;
mod registry;
pub mod rules;
mod spec;
mod value;

pub use error::{FlagError, ParseError, ParseErrorKind, RuleError};
pub use input::{ParsedInput, ValueSource};
pub use parser::{FlagParser, ParserSettings};
pub use registry::FlagRegistry;
pub use rules::{FlagTable, RuleEntry};
pub use spec::{FlagKind, FlagSpec};
pub use value::{parse_bool, parse_int, FlagType, FlagValue};

pub use env::{EnvReader, MockEnv, RealEnv};
