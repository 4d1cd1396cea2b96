//! The application: registration at setup, dispatch at run time.

use std::path::Path;
use std::process;

use switchboard_dispatch::{
    AppInfo, ConsoleReporter, DispatchError, Dispatcher, Extensions, Group, Handler, Hooks,
    Reporter, RouteMeta, RouteTable,
};
use switchboard_flags::{EnvReader, ParserSettings};

use crate::config::AppConfig;
use crate::setup::SetupError;

/// A built application, ready to dispatch.
#[derive(Debug)]
pub struct App {
    dispatcher: Dispatcher,
}

impl App {
    /// Starts building an application named `name`.
    pub fn builder(name: impl Into<String>) -> AppBuilder {
        AppBuilder::new(name)
    }

    /// Dispatches the process arguments with console output and returns the
    /// process exit code.
    pub fn run(&mut self) -> process::ExitCode {
        let argv: Vec<String> = std::env::args().collect();
        let mut reporter = ConsoleReporter::stdio();
        let code = self.run_with(&argv, &mut reporter);
        process::ExitCode::from(u8::try_from(code).unwrap_or(1))
    }

    /// Dispatches `argv` (script name first) and returns the exit code.
    pub fn run_with<S: AsRef<str>>(&mut self, argv: &[S], reporter: &mut dyn Reporter) -> i32 {
        self.dispatcher.dispatch(argv, reporter)
    }

    /// Like [`run_with`](Self::run_with), but failures are returned instead
    /// of reported.
    pub fn try_run_with<S: AsRef<str>>(
        &mut self,
        argv: &[S],
        reporter: &mut dyn Reporter,
    ) -> Result<i32, DispatchError> {
        self.dispatcher.try_dispatch(argv, reporter)
    }

    pub fn info(&self) -> &AppInfo {
        self.dispatcher.get_info()
    }

    pub fn routes(&self) -> &RouteTable {
        self.dispatcher.routes()
    }

    pub fn settings(&self) -> &ParserSettings {
        self.dispatcher.get_settings()
    }
}

/// Builder for an [`App`].
///
/// Registration methods fail as soon as a name collides, so a builder that
/// reaches [`build`](Self::build) holds a consistent route table.
///
/// ```rust
/// use switchboard::{App, CommandContext, FnHandler, FlagSpec, MemoryReporter, ParsedInput};
///
/// let mut app = App::builder("demo")
///     .version("1.0.0")
///     .command(
///         "greet",
///         FnHandler::new(|input: &ParsedInput, _: &CommandContext| {
///             println!("hello {}", input.get_str("name").unwrap_or("world"));
///         })
///         .flags(|flags| flags.add_argument(FlagSpec::argument("name"))),
///     )?
///     .aliases("greet", ["hi"])?
///     .build()?;
///
/// let mut reporter = MemoryReporter::new();
/// assert_eq!(app.run_with(&["demo", "hi", "ann"], &mut reporter), 0);
/// # Ok::<(), switchboard::SetupError>(())
/// ```
pub struct AppBuilder {
    info: AppInfo,
    routes: RouteTable,
    hooks: Hooks,
    settings: ParserSettings,
    state: Extensions,
    default_command: Option<String>,
    env: Option<Box<dyn EnvReader>>,
}

impl AppBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: AppInfo::new(name),
            routes: RouteTable::new(),
            hooks: Hooks::new(),
            settings: ParserSettings::default(),
            state: Extensions::new(),
            default_command: None,
            env: None,
        }
    }

    /// Applies loaded configuration. Fields absent from `config` keep their
    /// current values; a `parser` section replaces the parser settings.
    pub fn config(mut self, config: AppConfig) -> Self {
        if let Some(name) = config.name {
            self.info.name = name;
        }
        if let Some(version) = config.version {
            self.info.version = Some(version);
        }
        if let Some(description) = config.description {
            self.info.description = description;
        }
        if let Some(command) = config.default_command {
            self.default_command = Some(command);
        }
        if let Some(parser) = config.parser {
            self.settings = parser;
        }
        self
    }

    /// Loads and applies a YAML configuration file.
    pub fn config_file(self, path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let config = AppConfig::from_file(path)?;
        Ok(self.config(config))
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.info.version = Some(version.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.info.description = description.into();
        self
    }

    pub fn command<H>(self, name: impl Into<String>, handler: H) -> Result<Self, SetupError>
    where
        H: Handler + 'static,
    {
        self.command_with(name, handler, RouteMeta::default())
    }

    /// Registers a command with aliases and a description.
    pub fn command_with<H>(
        mut self,
        name: impl Into<String>,
        handler: H,
        meta: RouteMeta,
    ) -> Result<Self, SetupError>
    where
        H: Handler + 'static,
    {
        self.routes.add_command(name, handler, meta)?;
        Ok(self)
    }

    pub fn group(self, name: impl Into<String>, group: Group) -> Result<Self, SetupError> {
        self.group_with(name, group, RouteMeta::default())
    }

    /// Registers a group with aliases and a description.
    pub fn group_with(
        mut self,
        name: impl Into<String>,
        group: Group,
        meta: RouteMeta,
    ) -> Result<Self, SetupError> {
        self.routes.add_group(name, group, meta)?;
        Ok(self)
    }

    /// Adds aliases for `command`, `group` or `group:action`.
    pub fn aliases<I, S>(mut self, target: &str, aliases: I) -> Result<Self, SetupError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routes.add_aliases(target, aliases)?;
        Ok(self)
    }

    /// Adds hooks. May be called more than once; hooks run in the order added.
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks.extend(hooks);
        self
    }

    /// Adds a value to the state shared with every handler through
    /// `ctx.app_state`. A second value of the same type replaces the first.
    pub fn app_state<T: 'static>(mut self, value: T) -> Self {
        self.state.insert(value);
        self
    }

    pub fn settings(mut self, settings: ParserSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Environment used for option env fallbacks. Defaults to the process
    /// environment.
    pub fn env<E: EnvReader + 'static>(mut self, env: E) -> Self {
        self.env = Some(Box::new(env));
        self
    }

    pub fn default_command(mut self, name: impl Into<String>) -> Self {
        self.default_command = Some(name.into());
        self
    }

    pub fn build(self) -> Result<App, SetupError> {
        if let Some(command) = &self.default_command {
            if self.routes.find(command).is_none() {
                return Err(SetupError::UnknownDefaultCommand(command.clone()));
            }
        }
        tracing::debug!(
            app = %self.info.name,
            routes = self.routes.summaries().len(),
            "application built"
        );

        let mut dispatcher = Dispatcher::new(self.routes)
            .hooks(self.hooks)
            .settings(self.settings)
            .app_state(self.state)
            .info(self.info);
        if let Some(env) = self.env {
            dispatcher = dispatcher.env(env);
        }
        if let Some(command) = self.default_command {
            dispatcher = dispatcher.default_command(command);
        }
        Ok(App { dispatcher })
    }
}

impl std::fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppBuilder")
            .field("info", &self.info)
            .field("routes", &self.routes)
            .field("hooks", &self.hooks)
            .field("settings", &self.settings)
            .field("default_command", &self.default_command)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_dispatch::{CommandContext, FnHandler, MemoryReporter, ReportEvent};
    use switchboard_flags::{FlagSpec, MockEnv, ParsedInput};

    fn noop() -> impl Handler {
        FnHandler::new(|_: &ParsedInput, _: &CommandContext| {})
    }

    #[test]
    fn config_fills_unset_fields_and_builder_overrides() {
        let config = AppConfig::from_yaml_str(
            "name: from-config\nversion: 0.9.0\ndescription: Configured\nparser:\n  strict: false\n",
        )
        .unwrap();
        let app = App::builder("demo")
            .config(config)
            .version("1.0.0")
            .command("run", noop())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(app.info().name, "from-config");
        assert_eq!(app.info().version.as_deref(), Some("1.0.0"));
        assert_eq!(app.info().description, "Configured");
        assert!(!app.settings().strict);
    }

    #[test]
    fn config_without_parser_keeps_earlier_settings() {
        let config = AppConfig::from_yaml_str("name: from-config\n").unwrap();
        let app = App::builder("demo")
            .settings(ParserSettings::new().stop_on_first_arg(true).strict(false))
            .config(config)
            .command("run", noop())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(app.info().name, "from-config");
        assert!(app.settings().stop_on_first_arg);
        assert!(!app.settings().strict);
    }

    #[test]
    fn default_command_must_exist() {
        let result = App::builder("demo")
            .command("run", noop())
            .unwrap()
            .default_command("walk")
            .build();
        assert!(matches!(result, Err(SetupError::UnknownDefaultCommand(name)) if name == "walk"));
    }

    #[test]
    fn collisions_surface_as_setup_errors() {
        let result = App::builder("demo")
            .command("run", noop())
            .unwrap()
            .command("run", noop());
        assert!(matches!(result, Err(SetupError::Route(_))));
    }

    #[test]
    fn app_state_and_env_reach_handlers() {
        struct Prefix(&'static str);

        let mut app = App::builder("demo")
            .app_state(Prefix(">>"))
            .env(MockEnv::new().with_var("DEMO_NAME", "env-name"))
            .command(
                "show",
                FnHandler::new(|input: &ParsedInput, ctx: &CommandContext| {
                    let prefix = ctx.app_state.get_required::<Prefix>()?.0;
                    anyhow::ensure!(prefix == ">>", "wrong prefix");
                    anyhow::ensure!(input.get_str("name") == Some("env-name"), "wrong name");
                    Ok::<i32, anyhow::Error>(5)
                })
                .flags(|flags| flags.add_option(FlagSpec::option("name").env("DEMO_NAME"))),
            )
            .unwrap()
            .build()
            .unwrap();

        let mut reporter = MemoryReporter::new();
        assert_eq!(app.run_with(&["demo", "show"], &mut reporter), 5);
        assert!(reporter.events().is_empty());
    }

    #[test]
    fn version_flag_uses_configured_version() {
        let mut app = App::builder("demo")
            .version("2.1.0")
            .command("run", noop())
            .unwrap()
            .build()
            .unwrap();
        let mut reporter = MemoryReporter::new();
        assert_eq!(app.run_with(&["demo", "-V"], &mut reporter), 0);
        assert_eq!(
            reporter.last(),
            Some(ReportEvent::Version {
                text: "demo 2.1.0\n".into()
            })
        );
    }
}
