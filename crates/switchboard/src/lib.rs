//! # Switchboard - Commands, Groups and Typed Flags for Console Applications
//!
//! Switchboard routes a command line to one handler and hands it typed
//! values. Applications register:
//!
//! - **commands**: standalone handlers, addressed by name
//! - **groups**: named sets of actions, addressed as `group:action` or
//!   `group action`, with an optional default action
//! - **aliases**: alternate names for a command, a group, or one action
//!
//! Each handler declares its positional arguments and options in a
//! [`FlagRegistry`], by hand or from rule text such as
//! `"int;The user age;;20"`. The parser binds tokens to those flags, falls
//! back to environment variables and defaults, and fails as a whole with a
//! typed [`ParseError`] when the command line does not fit.
//!
//! ## Quick Start
//!
//! ```rust
//! use switchboard::{
//!     App, CommandContext, FlagTable, FnHandler, Group, MemoryReporter, ParsedInput, RouteMeta,
//! };
//!
//! let home = Group::new()
//!     .action("index", FnHandler::new(|_: &ParsedInput, _: &CommandContext| {}))?
//!     .action(
//!         "test",
//!         FnHandler::new(|input: &ParsedInput, _: &CommandContext| {
//!             println!("level {}", input.get_int("level").unwrap_or_default());
//!         })
//!         .rules(FlagTable::new().option("level,l", "int;Test level;;1"))?,
//!     )?
//!     .default_action("index");
//!
//! let mut app = App::builder("demo")
//!     .version("1.0.0")
//!     .group_with("home", home, RouteMeta::new().description("Home pages"))?
//!     .aliases("home:test", ["h-test"])?
//!     .build()?;
//!
//! let mut reporter = MemoryReporter::new();
//! assert_eq!(app.run_with(&["demo", "h-test", "-l", "3"], &mut reporter), 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! In a binary, `main` is typically:
//!
//! ```rust,ignore
//! fn main() -> std::process::ExitCode {
//!     switchboard::logging::init();
//!     match build_app() {
//!         Ok(mut app) => app.run(),
//!         Err(e) => {
//!             eprintln!("error: {e}");
//!             std::process::ExitCode::FAILURE
//!         }
//!     }
//! }
//! ```
//!
//! ## Crates
//!
//! - `switchboard-flags`: flag model, parser, rule text
//! - `switchboard-dispatch`: route table, router, hooks, reporting, dispatcher
//! - `switchboard` (this crate): [`App`] / [`AppBuilder`], [`AppConfig`],
//!   [`logging`], and re-exports of both

mod app;
mod config;
pub mod logging;
mod setup;

pub use app::{App, AppBuilder};
pub use config::AppConfig;
pub use setup::SetupError;

// Re-export the crates for paths like `switchboard::flags::rules`.
pub use switchboard_dispatch as dispatch;
pub use switchboard_flags as flags;

pub use switchboard_dispatch::{
    format_command_help, format_command_list, format_version, AppInfo, CommandContext,
    CommandHelp, ConsoleReporter, DispatchError, Dispatcher, ExitCode, Extensions, FnHandler,
    Group, Handler, HandlerResult, HookError, HookPhase, Hooks, IntoExitCode, IntoHandlerResult,
    MemoryReporter, ReportEvent, Reporter, Route, RouteError, RouteKind, RouteMeta, RouteSummary,
    RouteTable,
};

pub use switchboard_flags::{
    EnvReader, FlagError, FlagKind, FlagParser, FlagRegistry, FlagSpec, FlagTable, FlagType,
    FlagValue, MockEnv, ParseError, ParseErrorKind, ParsedInput, ParserSettings, RealEnv,
    RuleError, ValueSource,
};
