use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt, stream};
use portfolio_common::delivery::{LOAD_FAILED_MESSAGE, ToolOutput};
use portfolio_common::event::StreamPart;
use tokio::sync::mpsc;
use tracing::{Instrument, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::display::{DisplayPortfolioRequest, ToolErrorBody, validate_display_request};
use crate::state::AppState;

/// SSE event closing a successful display, carrying the `ToolOutput`.
pub const TOOL_OUTPUT_EVENT: &str = "tool-output";
/// SSE event closing a display that hit an infrastructure fault.
pub const TOOL_ERROR_EVENT: &str = "tool-error";

#[utoipa::path(
    post,
    path = "/portfolio",
    tag = "Display",
    operation_id = "displayPortfolio",
    summary = "Show a portfolio in the artifact panel",
    description = "Resolves `portfolio_name` against the caller's portfolios and streams the panel \
        events as Server-Sent Events. Each frame's `event` is the part type (`data-kind`, \
        `data-id`, `data-title`, `data-clear`, `data-portfolioDelta`, `data-finish`) and its \
        `data` is the JSON part. A final `tool-output` frame carries the tool result, or \
        `tool-error` when the portfolio store could not be read.",
    request_body = DisplayPortfolioRequest,
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = String),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, attempted_name = %payload.portfolio_name))]
pub async fn display_portfolio(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<DisplayPortfolioRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    validate_display_request(&payload)?;

    let pipeline = state.display_pipeline();
    let scope = auth_user.scope();
    // Matched as typed: the exact step compares the raw mention.
    let attempted_name = payload.portfolio_name;
    let (tx, rx) = mpsc::unbounded_channel::<StreamPart>();

    // The sender lives in the task, so the part stream ends once delivery does.
    let task = tokio::spawn(
        async move { pipeline.deliver(&attempted_name, &scope, &tx).await }
            .instrument(tracing::Span::current()),
    );

    let parts = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|part| (part, rx))
    })
    .map(|part| Event::default().event(&part.part_type).json_data(&part));

    let closing = stream::once(async move {
        match task.await {
            Ok(Ok(output)) => tool_output_event(&output),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "display finished with a fault");
                tool_error_event()
            }
            Err(e) => {
                tracing::error!(error = %e, "display task panicked");
                tool_error_event()
            }
        }
    });

    Ok(Sse::new(parts.chain(closing)).keep_alive(KeepAlive::default()))
}

fn tool_output_event(output: &ToolOutput) -> Result<Event, axum::Error> {
    Event::default().event(TOOL_OUTPUT_EVENT).json_data(output)
}

fn tool_error_event() -> Result<Event, axum::Error> {
    Event::default()
        .event(TOOL_ERROR_EVENT)
        .json_data(ToolErrorBody {
            message: LOAD_FAILED_MESSAGE.to_string(),
        })
}
