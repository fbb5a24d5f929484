use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::stream::{self, StreamExt};
use tokio::time::timeout;
use tracing::{Instrument, debug, warn, warn_span};

use crate::context::AppContext;
use crate::domain::prompt::build_prompt;
use crate::domain::response::{parse, sanitize};
use crate::domain::ticket::{ResultRow, ResultSet, RowStatus};
use crate::error::{AppError, AppResult};

/// Classifies every ticket, returning one row per ticket in input order.
///
/// At most `config.concurrency` pipelines are in flight; with the default of 1
/// tickets are processed strictly one after another. A failing ticket yields an
/// empty row and never stops the batch.
pub async fn classify_all(ctx: &AppContext, tickets: &[String]) -> ResultSet {
    let limit = ctx.config.concurrency.max(1);

    stream::iter(tickets.iter().enumerate())
        .map(|(position, ticket)| classify_ticket(ctx, position, ticket))
        .buffered(limit)
        .collect()
        .await
}

/// Runs the pipeline for the ticket at `position` in its batch.
///
/// The span is at `warn` so every diagnostic for this ticket carries its
/// position and text at the default log level.
pub async fn classify_ticket(ctx: &AppContext, position: usize, ticket: &str) -> ResultRow {
    let span = warn_span!("ticket", position, ticket);
    async {
        let completion = AssertUnwindSafe(request_completion(ctx, ticket))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(panic_error(payload)));

        match completion {
            Ok(raw) => {
                let sanitized = sanitize(&raw);
                debug!(text = %sanitized, "sanitized completion");
                let record = parse(&sanitized);
                let status = if record.is_empty() {
                    RowStatus::Malformed
                } else {
                    RowStatus::Classified
                };
                let row = ResultRow::from_record(ticket, &record, status, ctx.config.eta_policy);
                if status == RowStatus::Classified && !row.is_known_category() {
                    warn!(category = %row.category, "category outside the known set");
                }
                row
            }
            Err(err) => {
                warn!(error = %err, "classification unavailable");
                ResultRow::unavailable(ticket)
            }
        }
    }
    .instrument(span)
    .await
}

async fn request_completion(ctx: &AppContext, ticket: &str) -> AppResult<String> {
    let prompt = build_prompt(ticket);
    let limit = ctx.config.completion_timeout;

    timeout(limit, ctx.completion.complete(&prompt))
        .await
        .map_err(|_| AppError::Timeout(limit))?
}

fn panic_error(payload: Box<dyn Any + Send>) -> AppError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    AppError::LanguageModel(format!("completion panicked: {message}"))
}
