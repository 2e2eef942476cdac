use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::envelope::{FailurePayload, PortfolioEnvelope, PortfolioPayload};
use crate::event::{EventSink, PORTFOLIO_KIND, PanelEvent};
use crate::resolver::{ResolutionFailure, resolve_visible};
use crate::scope::CallerScope;
use crate::source::{ImageSource, PortfolioSource, SourceError};

/// Message shown in the panel when the store itself failed.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load portfolio data. Please try again later.";

/// Produces the identifier of each display instance.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random UUIDv4 identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Result handed back to the assistant after a display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ToolOutput {
    /// Display instance id, same as the `data-id` event.
    pub id: String,
    /// Resolved portfolio name, or the mention when nothing matched.
    pub title: String,
    pub kind: String,
    /// Instructions for the assistant's follow-up message.
    pub content: String,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Resolves a portfolio mention and streams it to a panel.
///
/// Every call writes, in order: `kind`, `id`, `title`, `clear`, exactly one
/// `portfolioDelta` envelope, and `finish`. That holds on the store-fault
/// path too; the fault is returned only after `finish` went out.
#[derive(Clone)]
pub struct DisplayPipeline {
    portfolios: Arc<dyn PortfolioSource>,
    images: Arc<dyn ImageSource>,
    ids: Arc<dyn IdGenerator>,
}

impl DisplayPipeline {
    pub fn new(portfolios: Arc<dyn PortfolioSource>, images: Arc<dyn ImageSource>) -> Self {
        Self {
            portfolios,
            images,
            ids: Arc::new(UuidGenerator),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    #[instrument(skip(self, scope, sink), fields(display_id = tracing::field::Empty))]
    pub async fn deliver(
        &self,
        attempted_name: &str,
        scope: &CallerScope,
        sink: &dyn EventSink,
    ) -> Result<ToolOutput, DeliveryError> {
        let id = self.ids.generate();
        tracing::Span::current().record("display_id", id.as_str());

        let mut out = Emitter::new(sink);
        out.send(PanelEvent::Kind(PORTFOLIO_KIND.to_string())).await;
        out.send(PanelEvent::Id(id.clone())).await;
        out.send(PanelEvent::Title(attempted_name.to_string())).await;
        out.send(PanelEvent::Clear).await;

        let (envelope, outcome) = match self.load(attempted_name, scope).await {
            Ok(Ok(payload)) => {
                info!(
                    portfolio_id = %payload.id,
                    images = payload.images.len(),
                    "portfolio displayed"
                );
                let output = self.displayed(id, &payload.name);
                (PortfolioEnvelope::Success(payload), Ok(output))
            }
            Ok(Err(failure)) => {
                info!(reason = %failure, "portfolio mention not resolved");
                let output = self.not_displayed(id, &failure);
                (
                    PortfolioEnvelope::Failure(FailurePayload::from(&failure)),
                    Ok(output),
                )
            }
            Err(fault) => {
                warn!(error = %fault, "portfolio display failed");
                (
                    PortfolioEnvelope::Failure(FailurePayload::new(
                        LOAD_FAILED_MESSAGE,
                        attempted_name,
                    )),
                    Err(DeliveryError::from(fault)),
                )
            }
        };

        out.send(PanelEvent::PortfolioDelta(encode(&envelope, attempted_name)))
            .await;
        out.send(PanelEvent::Finish).await;

        outcome
    }

    async fn load(
        &self,
        attempted_name: &str,
        scope: &CallerScope,
    ) -> Result<Result<PortfolioPayload, ResolutionFailure>, SourceError> {
        let resolved = match resolve_visible(&*self.portfolios, attempted_name, scope).await? {
            Ok(resolved) => resolved,
            Err(failure) => return Ok(Err(failure)),
        };

        // A record deleted since the lookup just comes back without images.
        let images = self.images.list_images(resolved.record.id).await?;
        Ok(Ok(PortfolioPayload::new(resolved.record, images)))
    }

    fn displayed(&self, id: String, name: &str) -> ToolOutput {
        ToolOutput {
            id,
            title: name.to_string(),
            kind: PORTFOLIO_KIND.to_string(),
            content: format!(
                "Portfolio \"{name}\" is now displayed in the artifact panel. Give a brief \
                 2-3 sentence summary of the project, then suggest 3 specific follow-up \
                 questions about its technical details, challenges, impact, or future \
                 improvements."
            ),
        }
    }

    fn not_displayed(&self, id: String, failure: &ResolutionFailure) -> ToolOutput {
        let name = failure.attempted_name();
        ToolOutput {
            id,
            title: name.to_string(),
            kind: PORTFOLIO_KIND.to_string(),
            content: format!(
                "Portfolio \"{name}\" could not be displayed: {failure} Let the user know and \
                 help them pick one of their existing projects."
            ),
        }
    }
}

fn encode(envelope: &PortfolioEnvelope, attempted_name: &str) -> String {
    envelope.to_json().unwrap_or_else(|e| {
        warn!(error = %e, "envelope encoding failed");
        json!({
            "error": true,
            "message": LOAD_FAILED_MESSAGE,
            "attemptedName": attempted_name,
        })
        .to_string()
    })
}

/// Writes events to a sink, carrying on when the consumer has gone away.
struct Emitter<'a> {
    sink: &'a dyn EventSink,
    closed: bool,
}

impl<'a> Emitter<'a> {
    fn new(sink: &'a dyn EventSink) -> Self {
        Self {
            sink,
            closed: false,
        }
    }

    async fn send(&mut self, event: PanelEvent) {
        if self.sink.emit(event.to_stream_part()).await.is_err() && !self.closed {
            self.closed = true;
            warn!(
                event = event.part_type(),
                "display consumer disconnected; finishing without it"
            );
        }
    }
}
