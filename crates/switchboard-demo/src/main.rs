//! `sbdemo`: a worked example of a switchboard application.
//!
//! ```text
//! sbdemo greet ann -t 2         a command with an argument and an int option
//! sbdemo hi ann --loud          the same command through its alias
//! sbdemo user john male 43 --opt1 value1 -y
//! sbdemo home                   a group, running its default action
//! sbdemo home:index -v          a group action, with a group-wide flag
//! sbdemo h-test src/a.rs -f     an alias for `home:test`
//! sbdemo dump a b --tag x -c 3  prints the parsed input as JSON
//! ```
//!
//! Set `SWITCHBOARD_LOG=debug` to see routing and parsing decisions.

mod commands;

use std::process::ExitCode;

fn main() -> ExitCode {
    switchboard::logging::init();
    match commands::build_app() {
        Ok(mut app) => app.run(),
        Err(e) => {
            eprintln!("sbdemo: {e}");
            ExitCode::FAILURE
        }
    }
}
