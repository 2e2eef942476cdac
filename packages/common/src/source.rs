use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::portfolio::{PortfolioImage, PortfolioRecord};
use crate::scope::CallerScope;

/// Infrastructure failure while reading portfolio data.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("portfolio store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to portfolio records.
#[async_trait]
pub trait PortfolioSource: Send + Sync {
    /// Records visible to `scope`, newest first.
    async fn list_visible(&self, scope: &CallerScope) -> Result<Vec<PortfolioRecord>, SourceError>;
}

/// Read access to portfolio images.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Images of one portfolio, oldest first. Unknown ids yield an empty list.
    async fn list_images(&self, portfolio_id: Uuid) -> Result<Vec<PortfolioImage>, SourceError>;
}
