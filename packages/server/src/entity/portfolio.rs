use portfolio_common::portfolio::PortfolioRecord;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "portfolio")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// NULL for portfolios imported without an owner.
    pub user_id: Option<i32>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: Option<super::user::Entity>,

    /// Unique per owner (see `seed::ensure_indexes`).
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Background for the assistant, never rendered in the dashboard.
    #[sea_orm(column_type = "Text", nullable)]
    pub ai_context: Option<String>,

    #[sea_orm(has_many)]
    pub images: HasMany<super::portfolio_image::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PortfolioRecord {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            owner: model.user_id,
            name: model.name,
            description: model.description,
            ai_context: model.ai_context,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
