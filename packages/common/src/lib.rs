//! Core of the portfolio assistant: resolving free-text project mentions
//! and streaming the resolved portfolio to the chat panel.

pub mod config;
pub mod delivery;
pub mod envelope;
pub mod event;
#[cfg(test)]
mod panel;
pub mod portfolio;
pub mod resolver;
pub mod scope;
pub mod source;
pub mod storage;

pub use delivery::{DeliveryError, DisplayPipeline, ToolOutput};
pub use envelope::PortfolioEnvelope;
pub use scope::CallerScope;
