use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Artifact kind announced by the first event of every display.
pub const PORTFOLIO_KIND: &str = "portfolio";

/// One event of a portfolio display, in the order the panel expects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// Switch the panel to the given artifact kind and make it visible.
    Kind(String),
    /// Identifier of this display instance.
    Id(String),
    /// Provisional title (the name as the user mentioned it).
    Title(String),
    /// Drop whatever the panel rendered before.
    Clear,
    /// JSON-encoded `PortfolioEnvelope`.
    PortfolioDelta(String),
    Finish,
}

impl PanelEvent {
    pub const KIND: &'static str = "data-kind";
    pub const ID: &'static str = "data-id";
    pub const TITLE: &'static str = "data-title";
    pub const CLEAR: &'static str = "data-clear";
    pub const PORTFOLIO_DELTA: &'static str = "data-portfolioDelta";
    pub const FINISH: &'static str = "data-finish";

    /// Wire name of the event.
    pub fn part_type(&self) -> &'static str {
        match self {
            Self::Kind(_) => Self::KIND,
            Self::Id(_) => Self::ID,
            Self::Title(_) => Self::TITLE,
            Self::Clear => Self::CLEAR,
            Self::PortfolioDelta(_) => Self::PORTFOLIO_DELTA,
            Self::Finish => Self::FINISH,
        }
    }

    pub fn to_stream_part(&self) -> StreamPart {
        let data = match self {
            Self::Kind(s) | Self::Id(s) | Self::Title(s) | Self::PortfolioDelta(s) => {
                Value::String(s.clone())
            }
            Self::Clear | Self::Finish => Value::Null,
        };
        StreamPart {
            part_type: self.part_type().to_string(),
            data,
            transient: true,
        }
    }
}

/// Serialized form of an event as written to the output channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamPart {
    #[serde(rename = "type")]
    pub part_type: String,
    pub data: Value,
    /// Transient parts are rendered but not persisted with the chat history.
    #[serde(default)]
    pub transient: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidPart {
    #[error("unknown part type: {0}")]
    UnknownType(String),
    #[error("part {0} expects a string payload")]
    ExpectedString(&'static str),
}

impl TryFrom<StreamPart> for PanelEvent {
    type Error = InvalidPart;

    fn try_from(part: StreamPart) -> Result<Self, Self::Error> {
        fn text(part_type: &'static str, data: Value) -> Result<String, InvalidPart> {
            match data {
                Value::String(s) => Ok(s),
                _ => Err(InvalidPart::ExpectedString(part_type)),
            }
        }

        let StreamPart {
            part_type, data, ..
        } = part;
        match part_type.as_str() {
            Self::KIND => text(Self::KIND, data).map(Self::Kind),
            Self::ID => text(Self::ID, data).map(Self::Id),
            Self::TITLE => text(Self::TITLE, data).map(Self::Title),
            Self::CLEAR => Ok(Self::Clear),
            Self::PORTFOLIO_DELTA => text(Self::PORTFOLIO_DELTA, data).map(Self::PortfolioDelta),
            Self::FINISH => Ok(Self::Finish),
            other => Err(InvalidPart::UnknownType(other.to_string())),
        }
    }
}

/// The receiving side of a sink has gone away.
#[derive(Debug, Error)]
#[error("event sink closed")]
pub struct SinkClosed;

/// Append-only, order-preserving destination for stream parts.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, part: StreamPart) -> Result<(), SinkClosed>;
}

#[async_trait]
impl EventSink for mpsc::UnboundedSender<StreamPart> {
    async fn emit(&self, part: StreamPart) -> Result<(), SinkClosed> {
        self.send(part).map_err(|_| SinkClosed)
    }
}

#[async_trait]
impl EventSink for mpsc::Sender<StreamPart> {
    async fn emit(&self, part: StreamPart) -> Result<(), SinkClosed> {
        self.send(part).await.map_err(|_| SinkClosed)
    }
}
