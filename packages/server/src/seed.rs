use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{portfolio, portfolio_image};

/// Ensure the indexes schema-sync cannot express exist.
///
/// Failures are logged and skipped; the service still works without them,
/// only slower and without the per-owner name guarantee.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // One name per owner. Backs the 409 on duplicate portfolio names.
    let by_owner_name = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_portfolio_user_name")
        .table(portfolio::Entity)
        .col(portfolio::Column::UserId)
        .col(portfolio::Column::Name)
        .to_owned();

    // Newest-first listing per owner.
    let by_owner_created = Index::create()
        .if_not_exists()
        .name("idx_portfolio_user_created")
        .table(portfolio::Entity)
        .col(portfolio::Column::UserId)
        .col(portfolio::Column::CreatedAt)
        .to_owned();

    // SELECT * FROM portfolio_image WHERE portfolio_id = ? ORDER BY created_at
    let images_by_portfolio = Index::create()
        .if_not_exists()
        .name("idx_portfolio_image_portfolio_created")
        .table(portfolio_image::Entity)
        .col(portfolio_image::Column::PortfolioId)
        .col(portfolio_image::Column::CreatedAt)
        .to_owned();

    for (name, stmt) in [
        ("idx_portfolio_user_name", by_owner_name),
        ("idx_portfolio_user_created", by_owner_created),
        ("idx_portfolio_image_portfolio_created", images_by_portfolio),
    ] {
        create_index(db, name, stmt).await;
    }

    Ok(())
}

async fn create_index(db: &DatabaseConnection, name: &str, stmt: IndexCreateStatement) {
    match db.execute_unprepared(&stmt.to_string(PostgresQueryBuilder)).await {
        Ok(_) => info!("Ensured index {name} exists"),
        Err(e) => warn!("Failed to create index {name}: {e}"),
    }
}
