//! The dispatcher: argv in, exit code out.
//!
//! One dispatch runs these steps in order:
//!
//! 1. builtins: the command listing, `help <command>`, `--version`
//! 2. route resolution, including the space-delimited `group action` form
//! 3. building the route's [`FlagRegistry`] (group-shared flags, then the
//!    handler's own)
//! 4. per-command `-h` / `--help`
//! 5. parsing the remaining tokens
//! 6. pre-dispatch hooks, the handler, post-dispatch hooks
//!
//! Failures become a [`DispatchError`]. [`Dispatcher::dispatch`] reports
//! them through the [`Reporter`] and maps them to an exit code.

use std::rc::Rc;

use switchboard_flags::{EnvReader, FlagParser, FlagRegistry, ParserSettings, RealEnv};

use crate::error::DispatchError;
use crate::handler::{CommandContext, Extensions};
use crate::hooks::Hooks;
use crate::report::{AppInfo, CommandHelp, Reporter};
use crate::route::{Route, RouteTable};

/// Process exit codes used by the dispatcher.
pub struct ExitCode;

impl ExitCode {
    pub const SUCCESS: i32 = 0;
    /// A handler or hook failed.
    pub const HANDLER_ERROR: i32 = 2;
    /// The command line did not match the command's flags.
    pub const USAGE_ERROR: i32 = 64;
    /// A handler declared an invalid flag set.
    pub const REGISTRY_ERROR: i32 = 70;
    /// No command, group or alias matched.
    pub const NOT_FOUND: i32 = 127;
}

/// A failed dispatch, with the route when one had been resolved.
struct Failure {
    route: Option<Route>,
    error: DispatchError,
}

impl Failure {
    fn at(route: &Route, error: impl Into<DispatchError>) -> Self {
        Self {
            route: Some(route.clone()),
            error: error.into(),
        }
    }
}

/// Resolves argv to a handler and runs it.
///
/// ```rust
/// use switchboard_dispatch::{
///     CommandContext, Dispatcher, FnHandler, MemoryReporter, RouteMeta, RouteTable,
/// };
/// use switchboard_flags::{FlagSpec, ParsedInput};
///
/// let mut routes = RouteTable::new();
/// routes.add_command(
///     "greet",
///     FnHandler::new(|input: &ParsedInput, _: &CommandContext| {
///         println!("hello {}", input.get_str("name").unwrap_or("world"));
///     })
///     .flags(|flags| flags.add_argument(FlagSpec::argument("name"))),
///     RouteMeta::new().alias("hi"),
/// )?;
///
/// let mut dispatcher = Dispatcher::new(routes);
/// let mut reporter = MemoryReporter::new();
/// assert_eq!(dispatcher.dispatch(&["app", "hi", "bob"], &mut reporter), 0);
/// assert_eq!(dispatcher.dispatch(&["app", "nope"], &mut reporter), 127);
/// # Ok::<(), switchboard_dispatch::RouteError>(())
/// ```
pub struct Dispatcher {
    routes: RouteTable,
    hooks: Hooks,
    settings: ParserSettings,
    env: Box<dyn EnvReader>,
    app_state: Rc<Extensions>,
    info: AppInfo,
    default_command: Option<String>,
}

impl Dispatcher {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes,
            hooks: Hooks::new(),
            settings: ParserSettings::default(),
            env: Box::new(RealEnv),
            app_state: Rc::new(Extensions::new()),
            info: AppInfo::default(),
            default_command: None,
        }
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn settings(mut self, settings: ParserSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Where options with an env fallback read from. Defaults to the
    /// process environment.
    pub fn env<E: EnvReader + 'static>(mut self, env: E) -> Self {
        self.env = Box::new(env);
        self
    }

    pub fn app_state(mut self, state: Extensions) -> Self {
        self.app_state = Rc::new(state);
        self
    }

    pub fn info(mut self, info: AppInfo) -> Self {
        self.info = info;
        self
    }

    /// The command run when argv names none, or starts with an option.
    pub fn default_command(mut self, name: impl Into<String>) -> Self {
        self.default_command = Some(name.into());
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn get_info(&self) -> &AppInfo {
        &self.info
    }

    pub fn get_settings(&self) -> &ParserSettings {
        &self.settings
    }

    /// Dispatches `argv` and returns the exit code. Failures are reported
    /// through `reporter` first.
    pub fn dispatch<S: AsRef<str>>(&mut self, argv: &[S], reporter: &mut dyn Reporter) -> i32 {
        match self.run(argv, reporter) {
            Ok(code) => code,
            Err(Failure { route, error }) => {
                let code = error.exit_code();
                match (&error, &route) {
                    (DispatchError::CommandNotFound { name, suggestions }, _) => {
                        reporter.command_not_found(name, suggestions)
                    }
                    (DispatchError::Parse(parse), Some(route)) => {
                        reporter.parse_failed(route, parse)
                    }
                    (_, Some(route)) => reporter.handler_failed(route, &error),
                    (_, None) => {
                        let unknown = Route::Command(String::new());
                        reporter.handler_failed(&unknown, &error)
                    }
                }
                code
            }
        }
    }

    /// Dispatches `argv`, returning failures instead of reporting them.
    /// Listings, help and version output still go to `reporter`.
    pub fn try_dispatch<S: AsRef<str>>(
        &mut self,
        argv: &[S],
        reporter: &mut dyn Reporter,
    ) -> Result<i32, DispatchError> {
        self.run(argv, reporter).map_err(|failure| failure.error)
    }

    fn run<S: AsRef<str>>(
        &mut self,
        argv: &[S],
        reporter: &mut dyn Reporter,
    ) -> Result<i32, Failure> {
        let script = argv.first().map(|s| s.as_ref()).unwrap_or_default();
        let mut tokens: Vec<&str> = argv.iter().skip(1).map(|s| s.as_ref()).collect();
        tracing::debug!(script, ?tokens, "dispatching");

        if let Some(code) = self.builtin(&tokens, reporter)? {
            return Ok(code);
        }

        let starts_with_option = tokens.first().map_or(true, |t| t.starts_with('-'));
        if starts_with_option {
            if let Some(default) = &self.default_command {
                tracing::debug!(command = %default, "using default command");
                tokens.insert(0, default.as_str());
            }
        }

        let (route, rest) = self.resolve(&tokens)?;
        tracing::debug!(%route, "route selected");

        let flags = self.registry(&route)?;
        let parser =
            FlagParser::with_env(&flags, self.env.as_ref()).settings(self.settings.clone());
        if wants_help(&parser, &flags, rest) {
            self.report_help(&route, &flags, reporter);
            return Ok(ExitCode::SUCCESS);
        }

        let input = parser.parse(rest).map_err(|e| Failure::at(&route, e))?;

        let mut ctx = CommandContext::new(route.clone(), script, Rc::clone(&self.app_state));
        self.hooks
            .run_pre_dispatch(&input, &mut ctx)
            .map_err(|e| Failure::at(&route, e))?;

        let Some(handler) = self.routes.handler_mut(&route) else {
            let error = DispatchError::CommandNotFound {
                name: route.to_string(),
                suggestions: Vec::new(),
            };
            return Err(Failure::at(&route, error));
        };
        let code = handler
            .handle(&input, &ctx)
            .map_err(|e| Failure::at(&route, DispatchError::Handler(e)))?;

        let code = self
            .hooks
            .run_post_dispatch(&ctx, code)
            .map_err(|e| Failure::at(&route, e))?;
        tracing::debug!(%route, code, "dispatch finished");
        Ok(code)
    }

    /// Handles the listing, `help <command>` and `--version`. Returns `None`
    /// when argv is meant for a command.
    fn builtin(&self, tokens: &[&str], reporter: &mut dyn Reporter) -> Result<Option<i32>, Failure> {
        let first = tokens.first().copied();
        match first {
            None if self.default_command.is_none() => {
                reporter.command_list(&self.info, &self.routes.summaries());
                Ok(Some(ExitCode::SUCCESS))
            }
            Some("-h" | "--help") if self.default_command.is_none() => {
                reporter.command_list(&self.info, &self.routes.summaries());
                Ok(Some(ExitCode::SUCCESS))
            }
            Some("-V" | "--version") if self.info.version.is_some() => {
                reporter.version(&self.info);
                Ok(Some(ExitCode::SUCCESS))
            }
            Some("help") if !self.routes.is_taken("help") => match tokens.get(1) {
                None => {
                    reporter.command_list(&self.info, &self.routes.summaries());
                    Ok(Some(ExitCode::SUCCESS))
                }
                Some(_) => {
                    let (route, _) = self.resolve(&tokens[1..])?;
                    let flags = self.registry(&route)?;
                    self.report_help(&route, &flags, reporter);
                    Ok(Some(ExitCode::SUCCESS))
                }
            },
            _ => Ok(None),
        }
    }

    /// Resolves the leading token(s) to a route, returning the route and the
    /// tokens left for the parser.
    fn resolve<'t>(&self, tokens: &'t [&'t str]) -> Result<(Route, &'t [&'t str]), Failure> {
        let Some(&name) = tokens.first() else {
            return Err(not_found(&self.routes, ""));
        };

        // `group action`, when the second token names one of the group's actions.
        if !name.contains(':') {
            if let Some((group_name, group)) = self.routes.resolve_group(name) {
                let next = tokens.get(1).copied().unwrap_or_default();
                if group.has_action(next) {
                    if let Some(action) = group.resolve_action(next) {
                        let route = Route::Group {
                            group: group_name.to_string(),
                            action,
                        };
                        return Ok((route, &tokens[2..]));
                    }
                }
            }
        }

        match self.routes.find(name) {
            Some(route) => Ok((route, &tokens[1..])),
            None => Err(not_found(&self.routes, name)),
        }
    }

    fn registry(&self, route: &Route) -> Result<FlagRegistry, Failure> {
        match self.routes.configure(route) {
            Some(Ok(flags)) => Ok(flags),
            Some(Err(e)) => {
                tracing::debug!(%route, error = %e, "flag definition rejected");
                Err(Failure::at(route, e))
            }
            None => Err(not_found(&self.routes, route.name())),
        }
    }

    fn report_help(&self, route: &Route, flags: &FlagRegistry, reporter: &mut dyn Reporter) {
        let description = self.routes.description(route).unwrap_or_default();
        reporter.command_help(&CommandHelp {
            app: &self.info,
            route,
            description,
            flags,
        });
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes)
            .field("hooks", &self.hooks)
            .field("settings", &self.settings)
            .field("info", &self.info)
            .field("default_command", &self.default_command)
            .finish_non_exhaustive()
    }
}

fn not_found(routes: &RouteTable, name: &str) -> Failure {
    let suggestions = if name.is_empty() {
        Vec::new()
    } else {
        routes.suggest(name)
    };
    tracing::debug!(name, ?suggestions, "command not found");
    Failure {
        route: None,
        error: DispatchError::CommandNotFound {
            name: name.to_string(),
            suggestions,
        },
    }
}

/// `-h` or `--help` where the parser still reads options, unless the command
/// defines them itself.
fn wants_help(parser: &FlagParser<'_>, flags: &FlagRegistry, tokens: &[&str]) -> bool {
    let own_long = flags.option("help").is_some();
    let own_short = flags.option_by_shortcut('h').is_some();
    tokens[..parser.option_span(tokens)]
        .iter()
        .any(|t| (*t == "--help" && !own_long) || (*t == "-h" && !own_short))
}
