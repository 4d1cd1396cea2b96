//! Command handler types.
//!
//! A handler has two steps:
//!
//! - `configure` declares the flags it accepts into a fresh [`FlagRegistry`]
//! - `handle` runs with the bound [`ParsedInput`] and returns an exit code
//!
//! The registry is rebuilt for every dispatch and dropped afterwards, so a
//! handler never sees flags declared for another route.
//!
//! # State Management
//!
//! [`CommandContext`] carries two containers:
//!
//! | Field | Mutability | Lifetime | Purpose |
//! |-------|------------|----------|---------|
//! | `app_state` | Immutable (`&`) | App lifetime (shared via Rc) | Config, clients, caches |
//! | `extensions` | Mutable (`&mut`) | One dispatch | Values injected by pre-dispatch hooks |

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use switchboard_flags::{FlagError, FlagRegistry, FlagTable, ParsedInput, RuleError};

use crate::route::Route;

/// Type-keyed container for state shared with handlers.
///
/// ```rust
/// use switchboard_dispatch::Extensions;
///
/// struct ApiClient { base_url: String }
///
/// let mut state = Extensions::new();
/// state.insert(ApiClient { base_url: "https://api.example.com".into() });
///
/// let api = state.get_required::<ApiClient>()?;
/// assert_eq!(api.base_url, "https://api.example.com");
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous value of the same type.
    pub fn insert<T: 'static>(&mut self, val: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(val))
            .and_then(|boxed| boxed.downcast().ok().map(|b| *b))
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Like [`get`](Self::get), but a missing value is an error.
    pub fn get_required<T: 'static>(&self) -> Result<&T, anyhow::Error> {
        self.get::<T>().ok_or_else(|| {
            anyhow::anyhow!(
                "no value of type {} in command context",
                std::any::type_name::<T>()
            )
        })
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}

/// Context passed to handlers and hooks.
#[derive(Debug)]
pub struct CommandContext {
    /// The route being executed.
    pub route: Route,
    /// `argv[0]`, informational only.
    pub script: String,
    /// State shared by every dispatch of the application.
    pub app_state: Rc<Extensions>,
    /// Fresh for each dispatch; filled by pre-dispatch hooks.
    pub extensions: Extensions,
}

impl CommandContext {
    pub fn new(route: Route, script: impl Into<String>, app_state: Rc<Extensions>) -> Self {
        Self {
            route,
            script: script.into(),
            app_state,
            extensions: Extensions::new(),
        }
    }
}

/// The result type for command handlers: an exit code or an error.
pub type HandlerResult = Result<i32, anyhow::Error>;

/// Values a handler may return as its exit status.
pub trait IntoExitCode {
    fn into_exit_code(self) -> i32;
}

impl IntoExitCode for () {
    fn into_exit_code(self) -> i32 {
        0
    }
}

impl IntoExitCode for i32 {
    fn into_exit_code(self) -> i32 {
        self
    }
}

impl IntoExitCode for u8 {
    fn into_exit_code(self) -> i32 {
        i32::from(self)
    }
}

/// Types a handler closure may return.
///
/// Plain values become exit codes, `()` meaning 0. `Result`s map their `Ok`
/// value the same way and convert the error into [`anyhow::Error`].
///
/// ```rust
/// use switchboard_dispatch::IntoHandlerResult;
///
/// assert_eq!(().into_handler_result().unwrap(), 0);
/// assert_eq!(3_u8.into_handler_result().unwrap(), 3);
///
/// let failed: Result<(), std::io::Error> = Err(std::io::Error::other("disk full"));
/// assert!(failed.into_handler_result().is_err());
/// ```
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(0)
    }
}

impl IntoHandlerResult for i32 {
    fn into_handler_result(self) -> HandlerResult {
        Ok(self)
    }
}

impl IntoHandlerResult for u8 {
    fn into_handler_result(self) -> HandlerResult {
        Ok(i32::from(self))
    }
}

impl<T, E> IntoHandlerResult for Result<T, E>
where
    T: IntoExitCode,
    E: Into<anyhow::Error>,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map(IntoExitCode::into_exit_code).map_err(Into::into)
    }
}

/// Trait for command handlers.
///
/// # Example
///
/// ```rust
/// use switchboard_dispatch::{CommandContext, Handler, HandlerResult};
/// use switchboard_flags::{FlagError, FlagRegistry, FlagSpec, ParsedInput};
///
/// struct Greet;
///
/// impl Handler for Greet {
///     fn configure(&self, flags: &mut FlagRegistry) -> Result<(), FlagError> {
///         flags.add_argument(FlagSpec::argument("name").required())
///     }
///
///     fn handle(&mut self, input: &ParsedInput, _ctx: &CommandContext) -> HandlerResult {
///         println!("hello {}", input.get_str("name").unwrap_or_default());
///         Ok(0)
///     }
/// }
/// ```
pub trait Handler {
    /// Declares the flags this handler accepts. Accepts nothing by default.
    fn configure(&self, flags: &mut FlagRegistry) -> Result<(), FlagError> {
        let _ = flags;
        Ok(())
    }

    fn handle(&mut self, input: &ParsedInput, ctx: &CommandContext) -> HandlerResult;
}

pub(crate) type ConfigureFn = Box<dyn Fn(&mut FlagRegistry) -> Result<(), FlagError>>;

/// A [`Handler`] built from a closure.
///
/// Flags come from a [`FlagTable`], a configure closure, or both (table
/// first).
///
/// ```rust
/// use switchboard_dispatch::{CommandContext, FnHandler, Handler};
/// use switchboard_flags::{FlagSpec, FlagTable, FlagType, ParsedInput};
///
/// let handler = FnHandler::new(|input: &ParsedInput, _ctx: &CommandContext| {
///     println!("{} times", input.get_int("count").unwrap_or(1));
/// })
/// .rules(FlagTable::new().option("count,c", "int;How many times"))?
/// .flags(|flags| flags.add_option(FlagSpec::option("dry-run").ty(FlagType::Bool)));
/// # Ok::<(), switchboard_flags::RuleError>(())
/// ```
pub struct FnHandler<F, R> {
    f: F,
    table: Option<FlagRegistry>,
    configure: Option<ConfigureFn>,
    _phantom: PhantomData<fn() -> R>,
}

impl<F, R> FnHandler<F, R>
where
    F: FnMut(&ParsedInput, &CommandContext) -> R,
    R: IntoHandlerResult,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            table: None,
            configure: None,
            _phantom: PhantomData,
        }
    }

    /// Declares flags with a closure run on every dispatch.
    pub fn flags<C>(mut self, configure: C) -> Self
    where
        C: Fn(&mut FlagRegistry) -> Result<(), FlagError> + 'static,
    {
        self.configure = Some(Box::new(configure));
        self
    }

    /// Declares flags from rule text. The table is checked here, so a bad
    /// rule fails at setup instead of at dispatch.
    pub fn rules(mut self, table: FlagTable) -> Result<Self, RuleError> {
        self.table = Some(table.into_registry()?);
        Ok(self)
    }
}

impl<F, R> Handler for FnHandler<F, R>
where
    F: FnMut(&ParsedInput, &CommandContext) -> R,
    R: IntoHandlerResult,
{
    fn configure(&self, flags: &mut FlagRegistry) -> Result<(), FlagError> {
        if let Some(table) = &self.table {
            flags.extend_from(table)?;
        }
        if let Some(configure) = &self.configure {
            configure(flags)?;
        }
        Ok(())
    }

    fn handle(&mut self, input: &ParsedInput, ctx: &CommandContext) -> HandlerResult {
        (self.f)(input, ctx).into_handler_result()
    }
}
