//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`validate`], or [`health`]. Each handler
//! lives in its own submodule.

pub mod health;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::PassthruError;

pub async fn dispatch(cli: Cli) -> Result<(), PassthruError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Validate(ref args)) => validate::execute(args).await,
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  passthru v{version} \u{2014} thin streaming HTTP forwarding proxy\n\n  \
         No command provided. To get started:\n\n    \
         passthru run --base-url http://localhost:8080    Forward every request to a backend\n    \
         passthru run -c passthru.yaml                    Start with a config file\n    \
         passthru --help                                  See all commands and options\n"
    );
}
