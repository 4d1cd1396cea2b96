//! Single-pass token parser.
//!
//! The parser walks the tokens left to right exactly once. Each token is
//! classified as a separator (`--`), a positional, a long option or a short
//! option group; options are resolved against the [`FlagRegistry`] and bound
//! immediately, positionals fill the declared arguments in order.
//!
//! After the pass:
//!
//! 1. unknown options (strict mode) and surplus arguments (strict argument
//!    mode) fail the parse
//! 2. unset options with an environment variable read it
//! 3. every required flag still unbound is collected into one
//!    [`ParseError::MissingRequired`]
//! 4. defaults fill the remaining optional flags
//!
//! A failure at any step discards everything bound so far.

use serde::{Deserialize, Serialize};

use crate::env::{non_empty_var, EnvReader, RealEnv};
use crate::error::ParseError;
use crate::input::{ParsedInput, ValueSource};
use crate::registry::FlagRegistry;
use crate::spec::FlagSpec;
use crate::value::{is_negative_number, FlagValue};

static REAL_ENV: RealEnv = RealEnv;

/// Parsing mode switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Stop recognising options at the first positional token; it and every
    /// later token are treated as positionals.
    pub stop_on_first_arg: bool,
    /// Reject unknown options. When off, unknown option tokens are kept in
    /// [`ParsedInput::remaining`].
    pub strict: bool,
    /// Reject positionals beyond the declared arguments instead of keeping
    /// them in [`ParsedInput::remaining`].
    pub strict_match_args: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            stop_on_first_arg: false,
            strict: true,
            strict_match_args: false,
        }
    }
}

impl ParserSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_on_first_arg(mut self, on: bool) -> Self {
        self.stop_on_first_arg = on;
        self
    }

    pub fn strict(mut self, on: bool) -> Self {
        self.strict = on;
        self
    }

    pub fn strict_match_args(mut self, on: bool) -> Self {
        self.strict_match_args = on;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'t> {
    Separator,
    Positional,
    Long {
        name: &'t str,
        value: Option<&'t str>,
    },
    Short {
        body: &'t str,
        value: Option<&'t str>,
    },
}

#[derive(Debug, Default)]
struct State {
    input: ParsedInput,
    next_arg: usize,
    unknown: Vec<String>,
    extra: Vec<String>,
}

impl State {
    /// Boolean options stay on once switched on.
    fn set_bool(&mut self, spec: &FlagSpec, on: bool) {
        if self.input.option(spec.name()) == Some(&FlagValue::Bool(true)) {
            return;
        }
        self.input
            .bind_option(spec.name(), FlagValue::Bool(on), ValueSource::Token);
    }

    fn bind_option(&mut self, spec: &FlagSpec, raw: &str) -> Result<(), ParseError> {
        let value = coerce(spec, raw)?;
        let value = if spec.is_array() {
            match self.input.take_option(spec.name()) {
                Some(current) => current.push(value),
                None => value.into_array(),
            }
        } else {
            value
        };
        self.input
            .bind_option(spec.name(), value, ValueSource::Token);
        Ok(())
    }

    fn bind_inline(&mut self, spec: &FlagSpec, raw: &str) -> Result<(), ParseError> {
        if spec.is_boolean() {
            let on = coerce(spec, raw)?.as_bool().unwrap_or(false);
            self.set_bool(spec, on);
            Ok(())
        } else {
            self.bind_option(spec, raw)
        }
    }
}

fn coerce(spec: &FlagSpec, raw: &str) -> Result<FlagValue, ParseError> {
    spec.get_type()
        .coerce(raw)
        .ok_or_else(|| ParseError::coercion(spec.name(), spec.get_type(), raw))
}

/// Parses tokens against a [`FlagRegistry`].
///
/// ```
/// use switchboard_flags::{FlagParser, FlagRegistry, FlagSpec, FlagType, ParserSettings};
///
/// let flags = FlagRegistry::new()
///     .with_option(FlagSpec::option("force").ty(FlagType::Bool).shortcut('f'))?
///     .with_argument(FlagSpec::argument("path"))?;
///
/// let input = FlagParser::new(&flags)
///     .settings(ParserSettings::new().stop_on_first_arg(true))
///     .parse(&["-f", "src", "-x"])?;
///
/// assert!(input.get_bool("force"));
/// assert_eq!(input.get_str("path"), Some("src"));
/// assert_eq!(input.remaining(), ["-x"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct FlagParser<'a> {
    registry: &'a FlagRegistry,
    env: &'a dyn EnvReader,
    settings: ParserSettings,
}

impl<'a> FlagParser<'a> {
    /// A parser reading the real process environment.
    pub fn new(registry: &'a FlagRegistry) -> Self {
        Self::with_env(registry, &REAL_ENV)
    }

    /// A parser with a custom environment, typically a
    /// [`MockEnv`](crate::MockEnv) in tests.
    pub fn with_env(registry: &'a FlagRegistry, env: &'a dyn EnvReader) -> Self {
        Self {
            registry,
            env,
            settings: ParserSettings::default(),
        }
    }

    pub fn settings(mut self, settings: ParserSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> Result<ParsedInput, ParseError> {
        let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
        let mut state = State::default();
        let mut options_done = false;
        let mut i = 0;

        while i < tokens.len() {
            let token = tokens[i];
            i += 1;

            if options_done {
                self.positional(&mut state, token)?;
                continue;
            }

            let class = self.classify(token);
            tracing::trace!(token, ?class, "classified token");
            match class {
                Token::Separator => options_done = true,
                Token::Positional => {
                    if self.settings.stop_on_first_arg {
                        options_done = true;
                    }
                    self.positional(&mut state, token)?;
                }
                Token::Long { name, value } => {
                    i += self.long_option(&mut state, token, name, value, &tokens[i..])?;
                }
                Token::Short { body, value } => {
                    i += self.short_option(&mut state, token, body, value, &tokens[i..])?;
                }
            }
        }

        self.finish(state)
    }

    fn classify<'t>(&self, token: &'t str) -> Token<'t> {
        if token == "--" {
            return Token::Separator;
        }
        if !token.starts_with('-') || token == "-" {
            return Token::Positional;
        }
        if is_negative_number(token) && !self.registry.has_digit_shortcut() {
            return Token::Positional;
        }
        if let Some(body) = token.strip_prefix("--") {
            return match body.split_once('=') {
                Some((name, value)) => Token::Long {
                    name,
                    value: Some(value),
                },
                None => Token::Long {
                    name: body,
                    value: None,
                },
            };
        }
        let body = &token[1..];
        match body.split_once('=') {
            Some((body, value)) => Token::Short {
                body,
                value: Some(value),
            },
            None => Token::Short { body, value: None },
        }
    }

    fn looks_like_option(&self, token: &str) -> bool {
        !matches!(self.classify(token), Token::Positional)
    }

    /// How many leading tokens are scanned for options. The scan ends at
    /// `--`, and at the first positional when `stop_on_first_arg` is set.
    /// Tokens consumed as option values are never positionals.
    pub fn option_span<S: AsRef<str>>(&self, tokens: &[S]) -> usize {
        let takes_next = |next: Option<&S>| {
            usize::from(next.is_some_and(|n| !self.looks_like_option(n.as_ref())))
        };

        let mut i = 0;
        while i < tokens.len() {
            match self.classify(tokens[i].as_ref()) {
                Token::Separator => return i,
                Token::Positional if self.settings.stop_on_first_arg => return i,
                Token::Long { name, value: None } => {
                    if self.registry.option(name).is_some_and(|spec| !spec.is_boolean()) {
                        i += takes_next(tokens.get(i + 1));
                    }
                }
                Token::Short { body, value: None } => {
                    if self.cluster_ends_in_value(body) {
                        i += takes_next(tokens.get(i + 1));
                    }
                }
                _ => {}
            }
            i += 1;
        }
        tokens.len()
    }

    /// Whether a short cluster ends exactly on a value-taking shortcut.
    fn cluster_ends_in_value(&self, body: &str) -> bool {
        for (offset, c) in body.char_indices() {
            match self.registry.option_by_shortcut(c) {
                Some(spec) if spec.is_boolean() => continue,
                Some(_) => return offset + c.len_utf8() == body.len(),
                None => return false,
            }
        }
        false
    }

    /// The token after a value-taking option, if it can serve as its value.
    fn next_value<'t>(&self, spec: &FlagSpec, rest: &[&'t str]) -> Result<&'t str, ParseError> {
        match rest.first() {
            Some(next) if !self.looks_like_option(next) => Ok(next),
            _ => Err(ParseError::MissingValue {
                name: spec.name().to_string(),
            }),
        }
    }

    fn unknown(&self, state: &mut State, token: &str, names: Vec<String>) {
        if self.settings.strict {
            state.unknown.extend(names);
        } else {
            tracing::debug!(token, "keeping unknown option in remaining tokens");
            state.input.push_remaining(token);
        }
    }

    /// Handles `--name`, `--name=value` and `--name value`. Returns how many
    /// of the following tokens were consumed.
    fn long_option(
        &self,
        state: &mut State,
        token: &str,
        name: &str,
        inline: Option<&str>,
        rest: &[&str],
    ) -> Result<usize, ParseError> {
        let Some(spec) = self.registry.option(name) else {
            self.unknown(state, token, vec![format!("--{name}")]);
            return Ok(0);
        };

        if spec.is_boolean() {
            match inline {
                Some(raw) => state.bind_inline(spec, raw)?,
                None => state.set_bool(spec, true),
            }
            return Ok(0);
        }

        match inline {
            Some(raw) => {
                state.bind_option(spec, raw)?;
                Ok(0)
            }
            None => {
                let raw = self.next_value(spec, rest)?;
                state.bind_option(spec, raw)?;
                Ok(1)
            }
        }
    }

    /// Handles `-v`, `-rf`, `-ofile`, `-o file`, `-o=file` and `-name=value`.
    ///
    /// In a cluster every shortcut up to the first value-taking one is set
    /// true; that shortcut takes the rest of the token as its value, or the
    /// next token when nothing is left.
    fn short_option(
        &self,
        state: &mut State,
        token: &str,
        body: &str,
        inline: Option<&str>,
        rest: &[&str],
    ) -> Result<usize, ParseError> {
        if body.is_empty() {
            self.unknown(state, token, vec![token.to_string()]);
            return Ok(0);
        }

        if let Some(raw) = inline {
            let direct = single_char(body)
                .and_then(|c| self.registry.option_by_shortcut(c))
                .or_else(|| self.registry.option(body));
            if let Some(spec) = direct {
                state.bind_inline(spec, raw)?;
                return Ok(0);
            }
        }

        let mut plan: Vec<&FlagSpec> = Vec::new();
        let mut missing: Vec<String> = Vec::new();
        let mut value_at: Option<usize> = None;
        for (offset, c) in body.char_indices() {
            match self.registry.option_by_shortcut(c) {
                Some(spec) => {
                    plan.push(spec);
                    if !spec.is_boolean() {
                        value_at = Some(offset + c.len_utf8());
                        break;
                    }
                }
                None => missing.push(format!("-{c}")),
            }
        }

        if !missing.is_empty() {
            self.unknown(state, token, missing);
            return Ok(0);
        }

        let Some((last, leading)) = plan.split_last() else {
            return Ok(0);
        };
        for spec in leading {
            state.set_bool(spec, true);
        }

        match value_at {
            None => {
                match inline {
                    Some(raw) => state.bind_inline(last, raw)?,
                    None => state.set_bool(last, true),
                }
                Ok(0)
            }
            Some(at) => {
                // Remainder of the whole token after the value-taking shortcut.
                let remainder = &token[1 + at..];
                let remainder = remainder.strip_prefix('=').unwrap_or(remainder);
                if remainder.is_empty() {
                    let raw = self.next_value(last, rest)?;
                    state.bind_option(last, raw)?;
                    Ok(1)
                } else {
                    state.bind_option(last, remainder)?;
                    Ok(0)
                }
            }
        }
    }

    fn positional(&self, state: &mut State, token: &str) -> Result<(), ParseError> {
        match self.registry.argument_at(state.next_arg) {
            Some(spec) => {
                let value = coerce(spec, token)?;
                if spec.is_array() {
                    let value = match state.input.take_argument(spec.name()) {
                        Some(current) => current.push(value),
                        None => value.into_array(),
                    };
                    state.input.bind_argument(spec.name(), value);
                } else {
                    state.input.bind_argument(spec.name(), value);
                    state.next_arg += 1;
                }
            }
            None if self.settings.strict_match_args => state.extra.push(token.to_string()),
            None => state.input.push_remaining(token),
        }
        Ok(())
    }

    fn finish(&self, state: State) -> Result<ParsedInput, ParseError> {
        let State {
            mut input,
            unknown,
            extra,
            ..
        } = state;

        if !unknown.is_empty() {
            return Err(ParseError::UnknownOptions { names: unknown });
        }
        if !extra.is_empty() {
            return Err(ParseError::TooManyArguments { values: extra });
        }

        for spec in self.registry.options() {
            if input.option(spec.name()).is_some() {
                continue;
            }
            let Some(var) = spec.env_var() else {
                continue;
            };
            let Some(raw) = non_empty_var(self.env, var) else {
                continue;
            };
            if let Some(value) = env_value(spec, &raw)? {
                tracing::debug!(option = spec.name(), var, "option read from environment");
                input.bind_option(spec.name(), value, ValueSource::Env);
            }
        }

        let missing: Vec<String> = self
            .registry
            .all_required()
            .filter(|spec| {
                if spec.is_argument() {
                    input.argument(spec.name()).is_none()
                } else {
                    input.option(spec.name()).is_none()
                }
            })
            .map(|spec| spec.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::MissingRequired { names: missing });
        }

        for spec in self.registry.arguments() {
            if input.argument(spec.name()).is_none() {
                if let Some(default) = spec.get_default() {
                    input.bind_argument(spec.name(), default.clone());
                }
            }
        }
        for spec in self.registry.options() {
            if input.option(spec.name()).is_some() {
                continue;
            }
            if let Some(default) = spec.get_default() {
                input.bind_option(spec.name(), default.clone(), ValueSource::Default);
            } else if spec.is_boolean() {
                input.bind_option(spec.name(), FlagValue::Bool(false), ValueSource::Default);
            }
        }

        tracing::debug!(
            arguments = input.arguments().len(),
            options = input.options().len(),
            remaining = input.remaining().len(),
            "flags parsed"
        );
        Ok(input)
    }
}

/// Coerces an environment value. Array options split it on commas.
fn env_value(spec: &FlagSpec, raw: &str) -> Result<Option<FlagValue>, ParseError> {
    if !spec.is_array() {
        return coerce(spec, raw).map(Some);
    }
    let mut acc: Option<FlagValue> = None;
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let value = coerce(spec, part)?;
        acc = Some(match acc {
            Some(current) => current.push(value),
            None => value.into_array(),
        });
    }
    Ok(acc)
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MockEnv;
    use crate::error::ParseErrorKind;
    use crate::value::FlagType;

    #[test]
    fn option_span_stops_where_options_end() {
        let flags = tool_registry();
        let env = MockEnv::new();
        let parser = FlagParser::with_env(&flags, &env);
        assert_eq!(parser.option_span(&["-r", "a", "-f"]), 3);
        assert_eq!(parser.option_span(&["-r", "--", "-f"]), 1);

        let parser = parser.settings(ParserSettings::new().stop_on_first_arg(true));
        assert_eq!(parser.option_span(&["-r", "a", "-f"]), 1);
        // Option values are not the first positional.
        assert_eq!(parser.option_span(&["-o", "out.txt", "a", "-f"]), 2);
        assert_eq!(parser.option_span(&["-ro", "out.txt", "a"]), 2);
        assert_eq!(parser.option_span(&["--output", "out.txt", "a"]), 2);
        assert_eq!(parser.option_span(&["--output=out.txt", "a"]), 1);
        assert_eq!(parser.option_span(&["-oout.txt", "a"]), 1);
    }

    fn user_registry() -> FlagRegistry {
        FlagRegistry::new()
            .with_argument(FlagSpec::argument("name").required())
            .unwrap()
            .with_argument(FlagSpec::argument("sex"))
            .unwrap()
            .with_argument(FlagSpec::argument("age").ty(FlagType::Int))
            .unwrap()
            .with_option(FlagSpec::option("yes").ty(FlagType::Bool).shortcut('y'))
            .unwrap()
            .with_option(FlagSpec::option("opt1").required())
            .unwrap()
    }

    fn tool_registry() -> FlagRegistry {
        FlagRegistry::new()
            .with_option(FlagSpec::option("recursive").ty(FlagType::Bool).shortcut('r'))
            .unwrap()
            .with_option(FlagSpec::option("force").ty(FlagType::Bool).shortcut('f'))
            .unwrap()
            .with_option(FlagSpec::option("output").shortcut('o'))
            .unwrap()
            .with_option(FlagSpec::option("id").ty(FlagType::Int).array())
            .unwrap()
            .with_option(FlagSpec::option("level").ty(FlagType::Int).shortcut('l'))
            .unwrap()
            .with_argument(FlagSpec::argument("files").array())
            .unwrap()
    }

    fn parse(reg: &FlagRegistry, tokens: &[&str]) -> Result<ParsedInput, ParseError> {
        let env = MockEnv::new();
        FlagParser::with_env(reg, &env).parse(tokens)
    }

    #[test]
    fn user_scenario_binds_everything() {
        let input = parse(
            &user_registry(),
            &["john", "male", "43", "--opt1", "value1", "-y"],
        )
        .unwrap();

        assert_eq!(input.get_str("name"), Some("john"));
        assert_eq!(input.get_str("sex"), Some("male"));
        assert_eq!(input.get_int("age"), Some(43));
        assert_eq!(input.get_str("opt1"), Some("value1"));
        assert_eq!(input.option("yes"), Some(&FlagValue::Bool(true)));
        assert!(input.remaining().is_empty());
    }

    #[test]
    fn long_option_with_equals() {
        let input = parse(&user_registry(), &["john", "--opt1=a=b"]).unwrap();
        assert_eq!(input.get_str("opt1"), Some("a=b"));
    }

    #[test]
    fn long_option_missing_value_at_end() {
        let err = parse(&user_registry(), &["john", "--opt1"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingValue {
                name: "opt1".to_string()
            }
        );
    }

    #[test]
    fn long_option_value_cannot_be_another_option() {
        let err = parse(&user_registry(), &["john", "--opt1", "-y"]).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::MissingValue);
    }

    #[test]
    fn negative_number_is_a_value() {
        let input = parse(&tool_registry(), &["--level", "-3"]).unwrap();
        assert_eq!(input.get_int("level"), Some(-3));

        let input = parse(&tool_registry(), &["-5"]).unwrap();
        assert_eq!(input.get_list("files"), Some(vec!["-5".to_string()]));
    }

    #[test]
    fn negative_number_is_an_option_with_digit_shortcuts() {
        let reg = FlagRegistry::new()
            .with_option(FlagSpec::option("five").ty(FlagType::Bool).shortcut('5'))
            .unwrap();
        let input = parse(&reg, &["-5"]).unwrap();
        assert!(input.get_bool("five"));
    }

    #[test]
    fn clustered_booleans_match_separate_flags() {
        let reg = tool_registry();
        let clustered = parse(&reg, &["-rf"]).unwrap();
        let separate = parse(&reg, &["-r", "-f"]).unwrap();
        assert_eq!(clustered, separate);
        assert!(clustered.get_bool("recursive"));
        assert!(clustered.get_bool("force"));
    }

    #[test]
    fn cluster_ending_in_valued_shortcut_takes_remainder() {
        let input = parse(&tool_registry(), &["-rfoout.txt"]).unwrap();
        assert!(input.get_bool("recursive"));
        assert!(input.get_bool("force"));
        assert_eq!(input.get_str("output"), Some("out.txt"));
    }

    #[test]
    fn valued_shortcut_stops_cluster_expansion() {
        // `r` would be a boolean shortcut, but it belongs to the value of `o`.
        let input = parse(&tool_registry(), &["-or"]).unwrap();
        assert_eq!(input.get_str("output"), Some("r"));
        assert!(!input.get_bool("recursive"));
    }

    #[test]
    fn valued_shortcut_takes_next_token_when_nothing_left() {
        let input = parse(&tool_registry(), &["-fo", "out.txt"]).unwrap();
        assert!(input.get_bool("force"));
        assert_eq!(input.get_str("output"), Some("out.txt"));

        let err = parse(&tool_registry(), &["-o"]).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::MissingValue);
    }

    #[test]
    fn short_option_with_equals() {
        let input = parse(&tool_registry(), &["-o=test"]).unwrap();
        assert_eq!(input.get_str("output"), Some("test"));

        let input = parse(&tool_registry(), &["-ro=test"]).unwrap();
        assert!(input.get_bool("recursive"));
        assert_eq!(input.get_str("output"), Some("test"));
    }

    #[test]
    fn single_dash_long_name_with_value() {
        let input = parse(&tool_registry(), &["-output=x.txt"]).unwrap();
        assert_eq!(input.get_str("output"), Some("x.txt"));
    }

    #[test]
    fn boolean_with_explicit_value() {
        let reg = tool_registry();
        let input = parse(&reg, &["--force=off"]).unwrap();
        assert!(!input.get_bool("force"));
        assert!(input.is_explicit("force"));

        let err = parse(&reg, &["--force=perhaps"]).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::TypeCoercion);
    }

    #[test]
    fn boolean_stays_true_once_set() {
        let input = parse(&tool_registry(), &["-f", "--force=no"]).unwrap();
        assert!(input.get_bool("force"));
    }

    #[test]
    fn array_option_accumulates_in_order() {
        let input = parse(&tool_registry(), &["--id=23", "--id=154"]).unwrap();
        assert_eq!(input.option("id"), Some(&FlagValue::IntArray(vec![23, 154])));

        let input = parse(&tool_registry(), &["--id", "7"]).unwrap();
        assert_eq!(input.option("id"), Some(&FlagValue::IntArray(vec![7])));
    }

    #[test]
    fn scalar_option_last_write_wins() {
        let input = parse(&tool_registry(), &["-o", "a", "--output=b"]).unwrap();
        assert_eq!(input.get_str("output"), Some("b"));
    }

    #[test]
    fn int_coercion_failure_is_typed() {
        let err = parse(&tool_registry(), &["--level=high"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::TypeCoercion {
                name: "level".to_string(),
                expected: FlagType::Int,
                value: "high".to_string(),
            }
        );

        let err = parse(&user_registry(), &["john", "male", "old", "--opt1=x"]).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::TypeCoercion);
        assert_eq!(err.names(), vec!["age"]);
    }

    #[test]
    fn array_argument_collects_tail() {
        let input = parse(&tool_registry(), &["a", "-f", "b", "c"]).unwrap();
        assert_eq!(
            input.argument("files"),
            Some(&FlagValue::from(vec!["a", "b", "c"]))
        );
        assert!(input.remaining().is_empty());
    }

    #[test]
    fn surplus_positionals_go_to_remaining() {
        let input = parse(&user_registry(), &["a", "b", "1", "extra", "--opt1=x", "more"]).unwrap();
        assert_eq!(input.remaining(), ["extra", "more"]);
    }

    #[test]
    fn strict_match_args_rejects_surplus() {
        let reg = user_registry();
        let env = MockEnv::new();
        let err = FlagParser::with_env(&reg, &env)
            .settings(ParserSettings::new().strict_match_args(true))
            .parse(&["a", "b", "1", "extra", "--opt1=x"])
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::TooManyArguments {
                values: vec!["extra".to_string()]
            }
        );
    }

    #[test]
    fn stop_on_first_arg_treats_rest_as_positional() {
        let reg = tool_registry();
        let env = MockEnv::new();
        let input = FlagParser::with_env(&reg, &env)
            .settings(ParserSettings::new().stop_on_first_arg(true))
            .parse(&["-r", "src", "-f", "--id=1"])
            .unwrap();

        assert!(input.get_bool("recursive"));
        assert!(!input.get_bool("force"));
        assert_eq!(
            input.argument("files"),
            Some(&FlagValue::from(vec!["src", "-f", "--id=1"]))
        );
    }

    #[test]
    fn interleaving_is_allowed_by_default() {
        let input = parse(&tool_registry(), &["src", "-f", "dst"]).unwrap();
        assert!(input.get_bool("force"));
        assert_eq!(input.get_list("files").unwrap(), vec!["src", "dst"]);
    }

    #[test]
    fn double_dash_ends_options() {
        let input = parse(&tool_registry(), &["--", "-f", "--id=1"]).unwrap();
        assert!(!input.get_bool("force"));
        assert_eq!(input.get_list("files").unwrap(), vec!["-f", "--id=1"]);
    }

    #[test]
    fn unknown_options_are_aggregated_in_strict_mode() {
        let err = parse(&tool_registry(), &["--nope", "-rx", "-q"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownOptions {
                names: vec!["--nope".into(), "-x".into(), "-q".into()]
            }
        );
    }

    #[test]
    fn unknown_options_are_kept_in_lenient_mode() {
        let reg = tool_registry();
        let env = MockEnv::new();
        let input = FlagParser::with_env(&reg, &env)
            .settings(ParserSettings::new().strict(false))
            .parse(&["--nope=1", "-rx", "-f"])
            .unwrap();

        assert_eq!(input.remaining(), ["--nope=1", "-rx"]);
        assert!(!input.get_bool("recursive"));
        assert!(input.get_bool("force"));
    }

    #[test]
    fn missing_required_reports_every_name() {
        let err = parse(&user_registry(), &[]).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingRequired {
                names: vec!["name".into(), "opt1".into()]
            }
        );
    }

    #[test]
    fn env_fallback_satisfies_required() {
        let reg = FlagRegistry::new()
            .with_option(FlagSpec::option("token").required().env("APP_TOKEN"))
            .unwrap()
            .with_option(FlagSpec::option("tags").ty(FlagType::Array).env("APP_TAGS"))
            .unwrap();
        let env = MockEnv::new()
            .with_var("APP_TOKEN", "secret")
            .with_var("APP_TAGS", "a, b,,c");

        let input = FlagParser::with_env(&reg, &env).parse::<&str>(&[]).unwrap();
        assert_eq!(input.get_str("token"), Some("secret"));
        assert_eq!(input.source("token"), Some(ValueSource::Env));
        assert_eq!(input.option("tags"), Some(&FlagValue::from(vec!["a", "b", "c"])));

        let input = FlagParser::with_env(&reg, &env)
            .parse(&["--token=cli"])
            .unwrap();
        assert_eq!(input.get_str("token"), Some("cli"));
        assert_eq!(input.source("token"), Some(ValueSource::Token));
    }

    #[test]
    fn env_value_is_coerced() {
        let reg = FlagRegistry::new()
            .with_option(FlagSpec::option("port").ty(FlagType::Int).env("APP_PORT"))
            .unwrap();
        let env = MockEnv::new().with_var("APP_PORT", "eighty");
        let err = FlagParser::with_env(&reg, &env).parse::<&str>(&[]).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::TypeCoercion);
    }

    #[test]
    fn defaults_fill_unset_flags() {
        let reg = FlagRegistry::new()
            .with_argument(FlagSpec::argument("mode").default_value("fast"))
            .unwrap()
            .with_option(FlagSpec::option("retries").ty(FlagType::Int).default_value(3))
            .unwrap()
            .with_option(FlagSpec::option("quiet").ty(FlagType::Bool))
            .unwrap();

        let input = parse(&reg, &[]).unwrap();
        assert_eq!(input.get_str("mode"), Some("fast"));
        assert_eq!(input.get_int("retries"), Some(3));
        assert_eq!(input.option("quiet"), Some(&FlagValue::Bool(false)));
        assert_eq!(input.source("retries"), Some(ValueSource::Default));
    }

    #[test]
    fn lone_dash_is_positional() {
        let input = parse(&tool_registry(), &["-"]).unwrap();
        assert_eq!(input.get_list("files").unwrap(), vec!["-"]);
    }
}
