//! Reporting dispatch outcomes to the user.
//!
//! The dispatcher never prints. Everything user-facing goes through a
//! [`Reporter`]: [`ConsoleReporter`] writes plain text, [`MemoryReporter`]
//! records events so tests can assert on them.

use std::cell::RefCell;
use std::io::{self, Stderr, Stdout, Write};
use std::rc::Rc;

use switchboard_flags::{FlagRegistry, FlagSpec, FlagType, ParseError};

use crate::error::DispatchError;
use crate::route::{Route, RouteKind, RouteSummary};

/// Application identity shown in listings and version output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub version: Option<String>,
    pub description: String,
}

impl AppInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Everything needed to render one command's help.
#[derive(Debug, Clone, Copy)]
pub struct CommandHelp<'a> {
    pub app: &'a AppInfo,
    pub route: &'a Route,
    pub description: &'a str,
    pub flags: &'a FlagRegistry,
}

/// Receives user-facing dispatch outcomes.
pub trait Reporter {
    fn command_not_found(&mut self, name: &str, suggestions: &[String]);

    fn parse_failed(&mut self, route: &Route, error: &ParseError);

    /// A handler, hook or flag definition failed.
    fn handler_failed(&mut self, route: &Route, error: &DispatchError);

    fn command_list(&mut self, app: &AppInfo, routes: &[RouteSummary]);

    fn command_help(&mut self, help: &CommandHelp<'_>);

    fn version(&mut self, app: &AppInfo);
}

/// Writes plain text: listings, help and version to `out`, failures to `err`.
#[derive(Debug)]
pub struct ConsoleReporter<O: Write, E: Write> {
    out: O,
    err: E,
}

impl ConsoleReporter<Stdout, Stderr> {
    /// Reporter bound to the process's stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> ConsoleReporter<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn write_out(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write to output");
        }
    }

    fn write_err(&mut self, text: &str) {
        if let Err(e) = self.err.write_all(text.as_bytes()).and_then(|()| self.err.flush()) {
            tracing::warn!(error = %e, "failed to write to error output");
        }
    }
}

impl<O: Write, E: Write> Reporter for ConsoleReporter<O, E> {
    fn command_not_found(&mut self, name: &str, suggestions: &[String]) {
        let mut text = format!("error: command '{name}' not found\n");
        if !suggestions.is_empty() {
            text.push_str(&format!("\nDid you mean: {}?\n", suggestions.join(", ")));
        }
        self.write_err(&text);
    }

    fn parse_failed(&mut self, route: &Route, error: &ParseError) {
        self.write_err(&format!(
            "error: {error}\n\nRun with --help to see the flags of '{route}'.\n"
        ));
    }

    fn handler_failed(&mut self, route: &Route, error: &DispatchError) {
        let mut text = format!("error: {route}: {error}\n");
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            text.push_str(&format!("  caused by: {cause}\n"));
            source = cause.source();
        }
        self.write_err(&text);
    }

    fn command_list(&mut self, app: &AppInfo, routes: &[RouteSummary]) {
        self.write_out(&format_command_list(app, routes));
    }

    fn command_help(&mut self, help: &CommandHelp<'_>) {
        self.write_out(&format_command_help(help));
    }

    fn version(&mut self, app: &AppInfo) {
        self.write_out(&format_version(app));
    }
}

/// A recorded [`Reporter`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    CommandNotFound {
        name: String,
        suggestions: Vec<String>,
    },
    ParseFailed {
        route: Route,
        error: ParseError,
    },
    HandlerFailed {
        route: Route,
        message: String,
        exit_code: i32,
    },
    CommandList {
        names: Vec<String>,
    },
    CommandHelp {
        route: Route,
        text: String,
    },
    Version {
        text: String,
    },
}

/// Records events in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    events: Rc<RefCell<Vec<ReportEvent>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.borrow().clone()
    }

    pub fn last(&self) -> Option<ReportEvent> {
        self.events.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: ReportEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl Reporter for MemoryReporter {
    fn command_not_found(&mut self, name: &str, suggestions: &[String]) {
        self.push(ReportEvent::CommandNotFound {
            name: name.to_string(),
            suggestions: suggestions.to_vec(),
        });
    }

    fn parse_failed(&mut self, route: &Route, error: &ParseError) {
        self.push(ReportEvent::ParseFailed {
            route: route.clone(),
            error: error.clone(),
        });
    }

    fn handler_failed(&mut self, route: &Route, error: &DispatchError) {
        self.push(ReportEvent::HandlerFailed {
            route: route.clone(),
            message: error.to_string(),
            exit_code: error.exit_code(),
        });
    }

    fn command_list(&mut self, _app: &AppInfo, routes: &[RouteSummary]) {
        self.push(ReportEvent::CommandList {
            names: routes.iter().map(|r| r.name.clone()).collect(),
        });
    }

    fn command_help(&mut self, help: &CommandHelp<'_>) {
        self.push(ReportEvent::CommandHelp {
            route: help.route.clone(),
            text: format_command_help(help),
        });
    }

    fn version(&mut self, app: &AppInfo) {
        self.push(ReportEvent::Version {
            text: format_version(app),
        });
    }
}

/// `name version`, or just `name` when no version is set.
pub fn format_version(app: &AppInfo) -> String {
    match &app.version {
        Some(version) => format!("{} {}\n", app.name, version),
        None => format!("{}\n", app.name),
    }
}

/// The top-level listing of commands and groups.
pub fn format_command_list(app: &AppInfo, routes: &[RouteSummary]) -> String {
    let mut out = String::new();
    match &app.version {
        Some(version) => out.push_str(&format!("{} {}\n", app.name, version)),
        None => out.push_str(&format!("{}\n", app.name)),
    }
    if !app.description.trim().is_empty() {
        out.push_str(app.description.trim_end());
        out.push('\n');
    }
    out.push_str(&format!("\nUsage: {} <command> [arguments] [options]\n", app.name));

    let mut rows: Vec<(String, String)> = Vec::new();
    for route in routes {
        let mut left = route.name.clone();
        if !route.aliases.is_empty() {
            left.push_str(&format!(" ({})", route.aliases.join(", ")));
        }
        rows.push((left, route.description.trim().to_string()));

        if route.kind == RouteKind::Group {
            for (action, description) in &route.actions {
                let mut left = format!("  {}:{}", route.name, action);
                if route.default_action.as_deref() == Some(action.as_str()) {
                    left.push_str(" *");
                }
                rows.push((left, description.trim().to_string()));
            }
        }
    }

    if !rows.is_empty() {
        out.push_str("\nCommands:\n");
        push_rows(&mut out, &rows);
    }
    out
}

/// Help for one command: usage line, description, arguments and options.
pub fn format_command_help(help: &CommandHelp<'_>) -> String {
    let flags = help.flags;
    let mut out = String::new();

    let mut usage = format!("Usage: {} {}", help.app.name, help.route);
    for spec in flags.arguments() {
        let n = spec.name();
        let shown = match (spec.is_required(), spec.is_array()) {
            (true, true) => format!(" <{n}>..."),
            (true, false) => format!(" <{n}>"),
            (false, true) => format!(" [{n}]..."),
            (false, false) => format!(" [{n}]"),
        };
        usage.push_str(&shown);
    }
    if !flags.options().is_empty() {
        usage.push_str(" [options]");
    }
    out.push_str(&usage);
    out.push('\n');

    if !help.description.trim().is_empty() {
        out.push('\n');
        out.push_str(help.description.trim_end());
        out.push('\n');
    }

    if !flags.arguments().is_empty() {
        out.push_str("\nArguments:\n");
        let rows: Vec<(String, String)> = flags
            .arguments()
            .iter()
            .map(|spec| (spec.name().to_string(), flag_help(spec)))
            .collect();
        push_rows(&mut out, &rows);
    }

    if !flags.options().is_empty() {
        out.push_str("\nOptions:\n");
        let rows: Vec<(String, String)> = flags
            .options()
            .iter()
            .map(|spec| (option_left(spec), flag_help(spec)))
            .collect();
        push_rows(&mut out, &rows);
    }
    out
}

fn option_left(spec: &FlagSpec) -> String {
    let mut names: Vec<String> = spec.get_shortcuts().iter().map(|c| format!("-{c}")).collect();
    names.push(format!("--{}", spec.name()));
    let mut out = names.join(", ");
    if !spec.is_boolean() {
        let value = match spec.get_type() {
            FlagType::Int => "int",
            _ => "value",
        };
        out.push_str(&format!(" <{value}>"));
        if spec.is_array() {
            out.push_str("...");
        }
    }
    out
}

fn flag_help(spec: &FlagSpec) -> String {
    let mut out = spec.get_description().trim().to_string();
    let mut notes: Vec<String> = Vec::new();
    if spec.is_required() {
        notes.push("(required)".to_string());
    }
    if let Some(default) = spec.get_default() {
        notes.push(format!("[default: {default}]"));
    }
    if let Some(var) = spec.env_var() {
        notes.push(format!("[env: {var}]"));
    }
    for note in notes {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&note);
    }
    out
}

fn push_rows(out: &mut String, rows: &[(String, String)]) {
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {left}\n"));
        } else {
            out.push_str(&format!("  {left:width$}  {help}\n"));
        }
    }
}
