pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use valet_core::config::AppConfig;

#[derive(Debug, Parser)]
#[command(
    name = "valet",
    about = "Valet operator CLI",
    long_about = "Operate the mall parking concierge: config inspection, readiness checks, and one-shot find-car runs.",
    after_help = "Examples:\n  valet doctor --json\n  valet config\n  valet find-car --venue 702 --user user-42 --text \"辽A66D6J在哪\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with secrets redacted")]
    Config,
    #[command(about = "Validate config, prompt templates, registry wiring, and the session store")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(name = "find-car", about = "Run the find-car flow once and print the reply")]
    FindCar {
        #[arg(long, help = "Venue id to query")]
        venue: u32,
        #[arg(long = "user", help = "User id the plates are bound to")]
        user_id: String,
        #[arg(long, help = "The visitor's utterance")]
        text: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::FindCar { venue, user_id, text } => {
            commands::find_car::run(venue, &user_id, &text)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

pub(crate) fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use valet_core::config::LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}
