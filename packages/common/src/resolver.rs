//! Maps a free-text project mention onto one stored portfolio.
//!
//! Matching is a fixed cascade rather than a scored search: every step scans
//! the candidates in stored order (newest first) and the first hit wins.
//!
//! 1. exact name
//! 2. case-insensitive name (both sides trimmed and lowercased)
//! 3. candidate name contains the mention
//! 4. mention contains the candidate name

use std::fmt;

use thiserror::Error;

use crate::portfolio::PortfolioRecord;
use crate::scope::CallerScope;
use crate::source::{PortfolioSource, SourceError};

/// Cascade step that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    CaseInsensitive,
    Contains,
    ContainedIn,
}

impl MatchKind {
    /// Steps in the order they are tried.
    pub const CASCADE: [MatchKind; 4] = [
        MatchKind::Exact,
        MatchKind::CaseInsensitive,
        MatchKind::Contains,
        MatchKind::ContainedIn,
    ];

    fn matches(self, attempted: &str, needle: &str, candidate: &str) -> bool {
        match self {
            MatchKind::Exact => candidate == attempted,
            MatchKind::CaseInsensitive => normalize(candidate) == needle,
            // Every name contains "", so a blank mention never gets here.
            MatchKind::Contains => !needle.is_empty() && normalize(candidate).contains(needle),
            MatchKind::ContainedIn => {
                let candidate = normalize(candidate);
                !candidate.is_empty() && needle.contains(&candidate)
            }
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchKind::Exact => "exact",
            MatchKind::CaseInsensitive => "case_insensitive",
            MatchKind::Contains => "contains",
            MatchKind::ContainedIn => "contained_in",
        };
        f.write_str(s)
    }
}

/// A mention that could not be mapped onto a portfolio.
///
/// These are expected, user-facing outcomes. The `Display` text is what the
/// panel shows, and the two variants are told apart by their wording.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionFailure {
    #[error("No portfolios found. Create a portfolio first, then ask about it again.")]
    NoPortfolios { attempted_name: String },

    #[error("Portfolio \"{attempted_name}\" not found. Available portfolios: {available}", available = .candidates.join(", "))]
    NotFound {
        attempted_name: String,
        candidates: Vec<String>,
    },
}

impl ResolutionFailure {
    pub fn attempted_name(&self) -> &str {
        match self {
            Self::NoPortfolios { attempted_name } | Self::NotFound { attempted_name, .. } => {
                attempted_name
            }
        }
    }

    /// Names the caller could have meant. Empty for `NoPortfolios`.
    pub fn candidates(&self) -> &[String] {
        match self {
            Self::NoPortfolios { .. } => &[],
            Self::NotFound { candidates, .. } => candidates,
        }
    }
}

/// Owned result of a store-backed resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPortfolio {
    pub record: PortfolioRecord,
    pub matched_by: MatchKind,
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Resolve `attempted_name` against `candidates` (stored order, newest first).
pub fn resolve<'a>(
    attempted_name: &str,
    candidates: &'a [PortfolioRecord],
) -> Result<(&'a PortfolioRecord, MatchKind), ResolutionFailure> {
    if candidates.is_empty() {
        return Err(ResolutionFailure::NoPortfolios {
            attempted_name: attempted_name.to_string(),
        });
    }

    let needle = normalize(attempted_name);
    for kind in MatchKind::CASCADE {
        if let Some(record) = candidates
            .iter()
            .find(|c| kind.matches(attempted_name, &needle, &c.name))
        {
            return Ok((record, kind));
        }
    }

    Err(ResolutionFailure::NotFound {
        attempted_name: attempted_name.to_string(),
        candidates: candidates.iter().map(|c| c.name.clone()).collect(),
    })
}

/// Fetch the records visible to `scope` and resolve `attempted_name` among them.
///
/// The outer `Result` carries store faults; the inner one the resolution outcome.
pub async fn resolve_visible(
    source: &dyn PortfolioSource,
    attempted_name: &str,
    scope: &CallerScope,
) -> Result<Result<ResolvedPortfolio, ResolutionFailure>, SourceError> {
    let candidates = source.list_visible(scope).await?;
    let resolved = resolve(attempted_name, &candidates).map(|(record, matched_by)| {
        tracing::debug!(
            attempted_name,
            matched = %record.name,
            %matched_by,
            "resolved portfolio mention"
        );
        ResolvedPortfolio {
            record: record.clone(),
            matched_by,
        }
    });
    Ok(resolved)
}
