use serde::Serialize;
use std::collections::BTreeMap;
use switchboard::{
    App, AppBuilder, AppConfig, CommandContext, FlagError, FlagRegistry, FlagSpec, FlagTable,
    FlagType, FlagValue, FnHandler, Group, Handler, HandlerResult, Hooks, ParsedInput, RouteMeta,
    SetupError,
};

const CONFIG: &str = include_str!("demo.yaml");
const USER_FLAGS: &str = include_str!("flags/user.yaml");

/// Pages listed by `home:index`.
struct Pages(Vec<&'static str>);

pub fn build_app() -> Result<App, SetupError> {
    builder()?.build()
}

pub fn builder() -> Result<AppBuilder, SetupError> {
    App::builder("sbdemo")
        .config(AppConfig::from_yaml_str(CONFIG)?)
        .app_state(Pages(vec!["about", "contact", "news"]))
        .hooks(Hooks::new().post_dispatch(|ctx, code| {
            tracing::debug!(route = %ctx.route, code, "command finished");
            Ok(code)
        }))
        .command_with(
            "greet",
            greet(),
            RouteMeta::new().alias("hi").description("Say hello"),
        )?
        .command_with(
            "user",
            UserCommand::from_yaml(USER_FLAGS)?,
            RouteMeta::new().description("Register a user"),
        )?
        .command_with(
            "dump",
            dump()?,
            RouteMeta::new().description("Print the parsed input as JSON"),
        )?
        .group_with(
            "home",
            home()?,
            RouteMeta::new().alias("h").description("Home pages"),
        )?
        .aliases("home:test", ["h-test"])
}

fn greet() -> impl Handler {
    FnHandler::new(|input: &ParsedInput, _: &CommandContext| {
        let name = input.get_str("name").unwrap_or("world");
        let mut line = format!("Hello, {name}!");
        if input.get_bool("loud") {
            line = line.to_uppercase();
        }
        for _ in 0..input.get_int("times").unwrap_or(1) {
            println!("{line}");
        }
    })
    .flags(|flags| {
        flags.add_argument(FlagSpec::argument("name").description("Who to greet"))?;
        flags.add_option(
            FlagSpec::option("times")
                .ty(FlagType::Int)
                .shortcut('t')
                .default_value(1)
                .env("SBDEMO_TIMES")
                .description("How many times"),
        )?;
        flags.add_option(
            FlagSpec::option("loud")
                .ty(FlagType::Bool)
                .shortcut('l')
                .description("Shout"),
        )
    })
}

/// Registers a user. Flags come from a YAML rule table.
struct UserCommand {
    flags: FlagRegistry,
}

impl UserCommand {
    fn from_yaml(yaml: &str) -> Result<Self, SetupError> {
        let flags = FlagTable::from_yaml_str(yaml)?.into_registry()?;
        Ok(Self { flags })
    }
}

impl Handler for UserCommand {
    fn configure(&self, flags: &mut FlagRegistry) -> Result<(), FlagError> {
        flags.extend_from(&self.flags)
    }

    fn handle(&mut self, input: &ParsedInput, _ctx: &CommandContext) -> HandlerResult {
        let name = input.get_str("name").unwrap_or_default();
        let mut line = format!("user {name}");
        if let Some(sex) = input.get_str("sex") {
            line.push_str(&format!(", {sex}"));
        }
        if let Some(age) = input.get_int("age") {
            line.push_str(&format!(", {age}"));
        }
        println!("{line} (opt1={})", input.get_str("opt1").unwrap_or_default());
        if !input.get_bool("yes") {
            println!("dry run, pass -y to confirm");
        }
        Ok(0)
    }
}

#[derive(Serialize)]
struct Dump<'a> {
    route: String,
    arguments: &'a BTreeMap<String, FlagValue>,
    options: &'a BTreeMap<String, FlagValue>,
    remaining: &'a [String],
}

fn dump() -> Result<impl Handler, SetupError> {
    let handler = FnHandler::new(|input: &ParsedInput, ctx: &CommandContext| {
        let dump = Dump {
            route: ctx.route.to_string(),
            arguments: input.arguments(),
            options: input.options(),
            remaining: input.remaining(),
        };
        println!("{}", serde_json::to_string_pretty(&dump)?);
        Ok::<(), anyhow::Error>(())
    })
    .rules(
        FlagTable::new()
            .argument("values", "string[];Values to echo")
            .option("tag,t", "string[];Tags")
            .option("count,c", "int;A number"),
    )?;
    Ok(handler)
}

fn home() -> Result<Group, SetupError> {
    let group = Group::new()
        .shared_flags(|flags| {
            flags.add_option(
                FlagSpec::option("verbose")
                    .ty(FlagType::Bool)
                    .shortcut('v')
                    .description("Show more"),
            )
        })
        .action_with(
            "index",
            FnHandler::new(|input: &ParsedInput, ctx: &CommandContext| {
                let pages = &ctx.app_state.get_required::<Pages>()?.0;
                for page in pages {
                    if input.get_bool("verbose") {
                        println!("{page} (/{page})");
                    } else {
                        println!("{page}");
                    }
                }
                Ok::<(), anyhow::Error>(())
            }),
            RouteMeta::new().alias("ls").description("List pages"),
        )?
        .action_with(
            "test",
            FnHandler::new(|input: &ParsedInput, _: &CommandContext| {
                let files = input.get_list("file").unwrap_or_default();
                let mode = if input.get_bool("fast") { "fast" } else { "full" };
                println!("testing {} file(s), {mode} run", files.len());
            })
            .rules(
                FlagTable::new()
                    .argument("file", "string[];Files to test")
                    .option("fast,f", "bool;Skip slow tests"),
            )?,
            RouteMeta::new().description("Run page tests"),
        )?
        .default_action("test");
    Ok(group)
}
