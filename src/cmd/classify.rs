use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use tokio::io::{self, AsyncReadExt};
use tracing::info;

use crate::config::{AppConfig, ConfigOverrides};
use crate::context::AppContext;
use crate::domain::ticket::{ResultRow, RowStatus};
use crate::error::{AppError, AppResult};
use crate::infra::ollama::OllamaClient;
use crate::workflow::classify::classify_all;

pub const SAMPLE_TICKET: &str =
    "Urgent help! My laptop won't turn on and I have a deadline today.";

const COLUMNS: [&str; 6] = ["ticket", "category", "tags", "priority", "eta", "response"];
const MAX_CELL_WIDTH: usize = 48;

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// Ticket texts to classify, in order.
    pub tickets: Vec<String>,
    /// Read tickets from a file, one per line ('-' for stdin). Without this
    /// or positional tickets, a built-in sample ticket is classified.
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    /// Ollama base URL.
    #[arg(long)]
    pub host: Option<String>,
    /// Model name to run.
    #[arg(short, long)]
    pub model: Option<String>,
    /// Per-ticket completion timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Number of tickets classified at once.
    #[arg(short, long)]
    pub concurrency: Option<usize>,
    /// Where eta comes from: 'model' or 'priority'.
    #[arg(long)]
    pub eta_policy: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

pub async fn run(args: ClassifyArgs) -> AppResult<()> {
    let mut config = AppConfig::load()?;
    config.apply(ConfigOverrides {
        ollama_host: args.host.clone(),
        model: args.model.clone(),
        timeout_secs: args.timeout,
        concurrency: args.concurrency,
        eta_policy: args.eta_policy.clone(),
    })?;

    let tickets = collect_tickets(&args).await?;
    let client = OllamaClient::new(
        &config.ollama_host,
        config.model.clone(),
        config.completion_timeout,
    )?;
    info!(
        model = client.model(),
        host = %config.ollama_host,
        tickets = tickets.len(),
        concurrency = config.concurrency,
        "classifying tickets"
    );

    let context = AppContext::new(config, Arc::new(client));
    let rows = classify_all(&context, &tickets).await;

    let output = match args.format {
        OutputFormat::Table => render_table(&rows),
        OutputFormat::Json => serde_json::to_string_pretty(&rows)
            .map_err(|err| AppError::Configuration(format!("failed to encode rows: {err}")))?,
    };
    println!("{output}");

    let failed = rows
        .iter()
        .filter(|row| row.status != RowStatus::Classified)
        .count();
    if failed > 0 {
        eprintln!("Warning: {failed} of {} tickets could not be classified.", rows.len());
    }

    Ok(())
}

async fn collect_tickets(args: &ClassifyArgs) -> AppResult<Vec<String>> {
    let mut tickets = args.tickets.clone();

    if let Some(path) = &args.file {
        let contents = if path.as_os_str() == "-" {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).await?;
            buffer
        } else {
            fs::read_to_string(path).map_err(|err| {
                AppError::Configuration(format!("cannot read {}: {err}", path.display()))
            })?
        };
        tickets.extend(split_tickets(&contents));
    }

    if tickets.is_empty() && args.file.is_none() {
        tickets.push(SAMPLE_TICKET.to_string());
    }
    Ok(tickets)
}

fn split_tickets(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn render_table(rows: &[ResultRow]) -> String {
    let cells: Vec<[String; 6]> = rows
        .iter()
        .map(|row| {
            [
                row.ticket.clone(),
                row.category.clone(),
                format!("[{}]", row.tags.join(", ")),
                row.priority.clone(),
                row.eta.clone(),
                row.response.clone(),
            ]
            .map(|cell| truncate(&cell, MAX_CELL_WIDTH))
        })
        .collect();

    let mut widths = COLUMNS.map(|name| name.chars().count());
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &COLUMNS.map(str::to_string), &widths);
    for line in &cells {
        push_line(&mut out, line, &widths);
    }
    out.truncate(out.trim_end().len());
    out
}

fn push_line(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate(value: &str, max: usize) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max {
        return flat;
    }
    let kept: String = flat.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
