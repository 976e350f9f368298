// Lexbrief command-line entry point

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use lexbrief::commands::{self, RunRequest};
use lexbrief::{AppResult, AppState, CommandResponse};

#[derive(Parser, Debug)]
#[command(name = "lexbrief", version, about = "Legal document analysis pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Runtime config file (default: ~/.lexbrief/config.json)
    #[arg(long, global = true, env = "LEXBRIEF_CONFIG")]
    config: Option<PathBuf>,

    /// Preference overrides file (default: ~/.lexbrief/user_preferences.json)
    #[arg(long, global = true, env = "LEXBRIEF_PREFERENCES")]
    preferences: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a document
    Run(RunArgs),
    /// Show or change stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Document to analyze
    #[arg(long, short)]
    input: PathBuf,

    /// What to do with the document, e.g. "summarize"
    #[arg(long, short)]
    request: Option<String>,

    /// JSON object of preference overrides for this run
    #[arg(long)]
    overrides: Option<String>,

    /// Results file from an earlier run to build on
    #[arg(long)]
    prior: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    /// Print the effective preferences
    Show,
    /// Store options for one category, given as a JSON object
    Set { category: String, options: String },
    /// Remove every stored override
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let state = AppState::open(cli.config.clone(), cli.preferences.clone())
        .context("failed to open lexbrief configuration")?;

    let success = match cli.command {
        Command::Run(args) => {
            let request = RunRequest {
                input: args.input,
                request: args.request,
                overrides: args.overrides,
                prior: args.prior,
            };
            print_response(commands::run_document(&state, &request).await)?
        }
        Command::Prefs { action } => {
            let store = state.preferences();
            let result = match action {
                PrefsAction::Show => commands::show_preferences(store),
                PrefsAction::Set { category, options } => {
                    commands::set_preferences(store, &category, &options)
                }
                PrefsAction::Reset => commands::reset_preferences(store),
            };
            print_response(result)?
        }
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(default_level).context("invalid log level")?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Print the result as a JSON envelope. Returns whether it succeeded.
fn print_response<T: Serialize>(result: AppResult<T>) -> anyhow::Result<bool> {
    let response: CommandResponse<T> = result.into();
    let success = response.success;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(success)
}
