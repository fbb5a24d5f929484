mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
#[cfg(test)]
mod testing;
mod workflow;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::classify::{self as classify_cmd, ClassifyArgs};
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::domain::prompt::build_prompt;
use crate::error::AppResult;

#[derive(Parser)]
#[command(name = "triage", author, version, about = "Classify support tickets with a local LLM")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify tickets and print category, tags, priority, eta and response.
    Classify(ClassifyArgs),
    /// Print the prompt that would be sent for a ticket.
    Prompt(PromptArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct PromptArgs {
    /// Ticket text to embed.
    ticket: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(error) = run(cli.command).await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = std::env::var("TRIAGE_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Commands) -> AppResult<()> {
    match command {
        Commands::Classify(args) => classify_cmd::run(args).await,
        Commands::Prompt(args) => {
            print!("{}", build_prompt(&args.ticket));
            Ok(())
        }
        Commands::Config(args) => {
            config_cmd::run(args.command)?;
            Ok(())
        }
    }
}
