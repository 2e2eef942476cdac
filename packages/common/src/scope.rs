use crate::portfolio::{OwnerId, PortfolioRecord};

/// Visibility boundary applied to a portfolio lookup.
///
/// Built once from the authenticated caller and passed down explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerScope {
    /// Only records owned by this user are visible.
    Owner(OwnerId),
    /// Every record is visible (guest callers).
    Unscoped,
}

impl CallerScope {
    /// Returns the owner filter, or `None` when the scope sees everything.
    pub fn owner(&self) -> Option<OwnerId> {
        match self {
            Self::Owner(id) => Some(*id),
            Self::Unscoped => None,
        }
    }

    pub fn can_see(&self, record: &PortfolioRecord) -> bool {
        match self {
            Self::Owner(id) => record.owner == Some(*id),
            Self::Unscoped => true,
        }
    }
}
