use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use clap::{Args, Subcommand};

use crate::config::{
    DEFAULT_CONCURRENCY, DEFAULT_MODEL, DEFAULT_OLLAMA_HOST, DEFAULT_TIMEOUT_SECS, StoredConfig,
    config_file_path,
};
use crate::domain::ticket::EtaPolicy;
use crate::error::{AppError, AppResult};

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration.
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring triage.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!();

    let stdin = io::stdin();
    Wizard::new(stdin.lock(), io::stdout()).configure(&mut cfg)?;

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!(
        "Ollama base URL: {}",
        display_value(&cfg.ollama_host, DEFAULT_OLLAMA_HOST)
    );
    println!("Model: {}", display_value(&cfg.model, DEFAULT_MODEL));
    println!(
        "Completion timeout: {}",
        display_value(&cfg.timeout_secs, DEFAULT_TIMEOUT_SECS)
    );
    println!(
        "Concurrency: {}",
        display_value(&cfg.concurrency, DEFAULT_CONCURRENCY)
    );
    println!(
        "ETA policy: {}",
        display_value(&cfg.eta_policy, EtaPolicy::default().as_str())
    );

    Ok(())
}

/// Line-oriented prompts over any reader/writer pair.
struct Wizard<R, W> {
    input: R,
    output: W,
    closed: bool,
}

impl<R: BufRead, W: Write> Wizard<R, W> {
    fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            closed: false,
        }
    }

    fn configure(&mut self, cfg: &mut StoredConfig) -> AppResult<()> {
        self.ask(
            "Ollama base URL (e.g., http://localhost:11434)",
            &mut cfg.ollama_host,
        )?;
        self.ask("Model", &mut cfg.model)?;
        self.ask("Completion timeout in seconds", &mut cfg.timeout_secs)?;
        self.ask("Tickets classified at once", &mut cfg.concurrency)?;
        loop {
            self.ask("ETA policy (model/priority)", &mut cfg.eta_policy)?;
            match cfg.eta_policy.as_deref() {
                Some(policy) if EtaPolicy::from_str(policy).is_none() => {
                    if self.closed {
                        return Err(AppError::Configuration(format!(
                            "input ended while eta policy is '{policy}' (expected 'model' or 'priority')"
                        )));
                    }
                    writeln!(self.output, "Expected 'model' or 'priority'.")?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Once input is exhausted every field keeps its current value.
    fn ask<T>(&mut self, field: &str, target: &mut Option<T>) -> AppResult<()>
    where
        T: FromStr + Display,
    {
        loop {
            let current = target.as_ref().map(ToString::to_string);
            match self.prompt(field, current.as_deref())? {
                PromptAction::Keep | PromptAction::Closed => return Ok(()),
                PromptAction::Clear => {
                    *target = None;
                    return Ok(());
                }
                PromptAction::Set(value) => match value.parse::<T>() {
                    Ok(parsed) => {
                        *target = Some(parsed);
                        return Ok(());
                    }
                    Err(_) => {
                        writeln!(self.output, "'{value}' is not a valid value for this field.")?
                    }
                },
            }
        }
    }

    fn prompt(&mut self, field: &str, current: Option<&str>) -> AppResult<PromptAction> {
        if self.closed {
            return Ok(PromptAction::Closed);
        }

        match current {
            Some(value) => write!(
                self.output,
                "{field} [{value}] (Enter to keep, '-' to clear): "
            )?,
            None => write!(self.output, "{field} (Enter to skip): ")?,
        }
        self.output.flush()?;

        let mut input = String::new();
        if self.input.read_line(&mut input)? == 0 {
            self.closed = true;
            writeln!(self.output)?;
            return Ok(PromptAction::Closed);
        }
        Ok(PromptAction::from_input(&input))
    }
}

fn display_value<T: Display, D: Display>(value: &Option<T>, default: D) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| format!("<not set, default {default}>"))
}

#[derive(Debug, PartialEq, Eq)]
enum PromptAction {
    Keep,
    Clear,
    Set(String),
    Closed,
}

impl PromptAction {
    fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            PromptAction::Keep
        } else if trimmed == "-" {
            PromptAction::Clear
        } else {
            PromptAction::Set(trimmed.to_string())
        }
    }
}
