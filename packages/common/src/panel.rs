//! Consumer-side view of a display stream.
//!
//! `PanelTracker` replays events the way the chat panel reacts to them and
//! rejects any sequence the panel could not render: opening events out of
//! order, a second envelope, or anything after `finish`.

use thiserror::Error;

use crate::envelope::PortfolioEnvelope;
use crate::event::PanelEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelState {
    Idle,
    /// Opening events received so far (`kind`, `id`, `title`, `clear`).
    Opening(u8),
    AwaitingData,
    Resolved(PortfolioEnvelope),
    Errored(PortfolioEnvelope),
    Finished { errored: bool },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PanelContractError {
    #[error("unexpected {event} while {state}")]
    Unexpected { event: &'static str, state: String },
    #[error("envelope is not valid JSON: {0}")]
    BadEnvelope(String),
}

/// Opening events, in the only order the panel accepts.
const OPENING: [&str; 4] = [
    PanelEvent::KIND,
    PanelEvent::ID,
    PanelEvent::TITLE,
    PanelEvent::CLEAR,
];

#[derive(Debug)]
pub struct PanelTracker {
    state: PanelState,
    display_id: Option<String>,
    title: Option<String>,
}

impl PanelTracker {
    pub fn new() -> Self {
        Self {
            state: PanelState::Idle,
            display_id: None,
            title: None,
        }
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn display_id(&self) -> Option<&str> {
        self.display_id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The delivered envelope, once one has arrived.
    pub fn envelope(&self) -> Option<&PortfolioEnvelope> {
        match &self.state {
            PanelState::Resolved(e) | PanelState::Errored(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, PanelState::Finished { .. })
    }

    pub fn apply(&mut self, event: &PanelEvent) -> Result<&PanelState, PanelContractError> {
        let seen = match self.state {
            PanelState::Idle => Some(0),
            PanelState::Opening(n) => Some(n as usize),
            _ => None,
        };

        let next = match (seen, event) {
            (Some(n), _) if n < OPENING.len() && OPENING[n] == event.part_type() => {
                match event {
                    PanelEvent::Id(id) => self.display_id = Some(id.clone()),
                    PanelEvent::Title(title) => self.title = Some(title.clone()),
                    _ => {}
                }
                if n + 1 == OPENING.len() {
                    PanelState::AwaitingData
                } else {
                    PanelState::Opening(n as u8 + 1)
                }
            }
            (None, PanelEvent::PortfolioDelta(json)) if self.state == PanelState::AwaitingData => {
                let envelope: PortfolioEnvelope = serde_json::from_str(json)
                    .map_err(|e| PanelContractError::BadEnvelope(e.to_string()))?;
                if envelope.is_error() {
                    PanelState::Errored(envelope)
                } else {
                    PanelState::Resolved(envelope)
                }
            }
            (None, PanelEvent::Finish) => match &self.state {
                PanelState::Resolved(_) => PanelState::Finished { errored: false },
                PanelState::Errored(_) => PanelState::Finished { errored: true },
                _ => return Err(self.unexpected(event)),
            },
            _ => return Err(self.unexpected(event)),
        };

        self.state = next;
        Ok(&self.state)
    }

    fn unexpected(&self, event: &PanelEvent) -> PanelContractError {
        let state = match &self.state {
            PanelState::Idle => "idle".to_string(),
            PanelState::Opening(n) => format!("opening ({n} of {} events)", OPENING.len()),
            PanelState::AwaitingData => "awaiting data".to_string(),
            PanelState::Resolved(_) => "resolved".to_string(),
            PanelState::Errored(_) => "errored".to_string(),
            PanelState::Finished { .. } => "finished".to_string(),
        };
        PanelContractError::Unexpected {
            event: event.part_type(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::FailurePayload;
    use crate::event::PORTFOLIO_KIND;

    fn opening() -> Vec<PanelEvent> {
        vec![
            PanelEvent::Kind(PORTFOLIO_KIND.into()),
            PanelEvent::Id("display-1".into()),
            PanelEvent::Title("ReX".into()),
            PanelEvent::Clear,
        ]
    }

    fn failure_delta() -> PanelEvent {
        let envelope = PortfolioEnvelope::Failure(FailurePayload::new("nope", "ReX"));
        PanelEvent::PortfolioDelta(envelope.to_json().unwrap())
    }

    #[test]
    fn full_sequence_reaches_finished() {
        let mut tracker = PanelTracker::new();
        for event in opening() {
            tracker.apply(&event).unwrap();
        }
        assert_eq!(tracker.state(), &PanelState::AwaitingData);
        assert_eq!(tracker.display_id(), Some("display-1"));
        assert_eq!(tracker.title(), Some("ReX"));

        tracker.apply(&failure_delta()).unwrap();
        assert!(matches!(tracker.state(), PanelState::Errored(_)));
        assert!(tracker.envelope().is_some_and(|e| e.is_error()));

        tracker.apply(&PanelEvent::Finish).unwrap();
        assert_eq!(tracker.state(), &PanelState::Finished { errored: true });
    }

    #[test]
    fn opening_cannot_be_skipped() {
        let mut tracker = PanelTracker::new();
        let err = tracker.apply(&failure_delta()).unwrap_err();
        assert!(matches!(err, PanelContractError::Unexpected { event: "data-portfolioDelta", .. }));
    }

    #[test]
    fn opening_must_be_in_order() {
        let mut tracker = PanelTracker::new();
        tracker.apply(&PanelEvent::Kind(PORTFOLIO_KIND.into())).unwrap();
        assert!(tracker.apply(&PanelEvent::Title("ReX".into())).is_err());
    }

    #[test]
    fn second_envelope_is_rejected() {
        let mut tracker = PanelTracker::new();
        for event in opening() {
            tracker.apply(&event).unwrap();
        }
        tracker.apply(&failure_delta()).unwrap();
        assert!(tracker.apply(&failure_delta()).is_err());
    }

    #[test]
    fn finish_without_envelope_is_rejected() {
        let mut tracker = PanelTracker::new();
        for event in opening() {
            tracker.apply(&event).unwrap();
        }
        assert!(tracker.apply(&PanelEvent::Finish).is_err());
    }

    #[test]
    fn malformed_envelope_is_reported() {
        let mut tracker = PanelTracker::new();
        for event in opening() {
            tracker.apply(&event).unwrap();
        }
        let err = tracker
            .apply(&PanelEvent::PortfolioDelta("not json".into()))
            .unwrap_err();
        assert!(matches!(err, PanelContractError::BadEnvelope(_)));
    }
}
