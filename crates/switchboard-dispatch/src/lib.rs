//! Command routing and dispatch for console applications.
//!
//! `switchboard-dispatch` maps a command line to exactly one handler and
//! runs it. Flag parsing is delegated to `switchboard-flags`.
//!
//! # Features
//!
//! - **Route table**: commands, groups of actions, and aliases, with every
//!   name collision rejected at registration
//! - **Router**: `name`, `group:action`, `group action` and alias lookups,
//!   with close-match suggestions when nothing matches
//! - **Handlers**: the [`Handler`] trait, or closures through [`FnHandler`]
//! - **Hooks**: pre-dispatch and post-dispatch callbacks
//! - **Reporting**: user-facing output goes through a [`Reporter`], never
//!   straight to the terminal
//!
//! # Usage
//!
//! ```rust
//! use switchboard_dispatch::{
//!     CommandContext, Dispatcher, ExitCode, FnHandler, Group, MemoryReporter, RouteMeta,
//!     RouteTable,
//! };
//! use switchboard_flags::ParsedInput;
//!
//! let mut routes = RouteTable::new();
//! let home = Group::new()
//!     .action("index", FnHandler::new(|_: &ParsedInput, _: &CommandContext| {}))?
//!     .action("test", FnHandler::new(|_: &ParsedInput, _: &CommandContext| ExitCode::SUCCESS))?
//!     .default_action("index");
//! routes.add_group("home", home, RouteMeta::new().description("Home pages"))?;
//! routes.add_aliases("home:test", ["h-test"])?;
//!
//! let mut dispatcher = Dispatcher::new(routes);
//! let mut reporter = MemoryReporter::new();
//! assert_eq!(dispatcher.dispatch(&["app", "h-test"], &mut reporter), ExitCode::SUCCESS);
//! assert_eq!(dispatcher.dispatch(&["app", "nope"], &mut reporter), ExitCode::NOT_FOUND);
//! # Ok::<(), switchboard_dispatch::RouteError>(())
//! ```

mod dispatch;
mod error;
mod group;
mod handler;
mod hooks;
mod report;
mod route;

pub use dispatch::{Dispatcher, ExitCode};

pub use error::{DispatchError, RouteError};

pub use group::Group;

pub use handler::{
    CommandContext, Extensions, FnHandler, Handler, HandlerResult, IntoExitCode,
    IntoHandlerResult,
};

pub use hooks::{HookError, HookPhase, Hooks, PostDispatchFn, PreDispatchFn};

pub use report::{
    format_command_help, format_command_list, format_version, AppInfo, CommandHelp,
    ConsoleReporter, MemoryReporter, ReportEvent, Reporter,
};

pub use route::{split_name, Route, RouteKind, RouteMeta, RouteSummary, RouteTable};
