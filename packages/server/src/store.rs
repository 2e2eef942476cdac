use async_trait::async_trait;
use portfolio_common::portfolio::{PortfolioImage, PortfolioRecord};
use portfolio_common::scope::CallerScope;
use portfolio_common::source::{ImageSource, PortfolioSource, SourceError};
use sea_orm::*;
use uuid::Uuid;

use crate::entity::{portfolio, portfolio_image};

/// Read side of the portfolio tables, as seen by the display pipeline.
#[derive(Clone)]
pub struct DbPortfolioStore {
    db: DatabaseConnection,
}

impl DbPortfolioStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn unavailable(err: DbErr) -> SourceError {
    SourceError::Unavailable(err.to_string())
}

/// Portfolios visible in `scope`, newest first.
pub(crate) async fn visible_portfolios<C: ConnectionTrait>(
    db: &C,
    scope: &CallerScope,
) -> Result<Vec<portfolio::Model>, DbErr> {
    let mut query = portfolio::Entity::find();
    if let Some(owner) = scope.owner() {
        query = query.filter(portfolio::Column::UserId.eq(owner));
    }

    query
        .order_by_desc(portfolio::Column::CreatedAt)
        .order_by_desc(portfolio::Column::Id)
        .all(db)
        .await
}

/// Images of one portfolio, oldest first.
pub(crate) async fn images_of<C: ConnectionTrait>(
    db: &C,
    portfolio_id: Uuid,
) -> Result<Vec<portfolio_image::Model>, DbErr> {
    portfolio_image::Entity::find()
        .filter(portfolio_image::Column::PortfolioId.eq(portfolio_id))
        .order_by_asc(portfolio_image::Column::CreatedAt)
        .order_by_asc(portfolio_image::Column::Id)
        .all(db)
        .await
}

#[async_trait]
impl PortfolioSource for DbPortfolioStore {
    async fn list_visible(&self, scope: &CallerScope) -> Result<Vec<PortfolioRecord>, SourceError> {
        let models = visible_portfolios(&self.db, scope).await.map_err(unavailable)?;

        Ok(models.into_iter().map(PortfolioRecord::from).collect())
    }
}

#[async_trait]
impl ImageSource for DbPortfolioStore {
    async fn list_images(&self, portfolio_id: Uuid) -> Result<Vec<PortfolioImage>, SourceError> {
        let models = images_of(&self.db, portfolio_id).await.map_err(unavailable)?;

        Ok(models.into_iter().map(PortfolioImage::from).collect())
    }
}
