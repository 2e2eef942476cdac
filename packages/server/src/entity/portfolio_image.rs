use portfolio_common::portfolio::PortfolioImage;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "portfolio_image")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub portfolio_id: Uuid,
    #[sea_orm(belongs_to, from = "portfolio_id", to = "id")]
    pub portfolio: HasOne<super::portfolio::Entity>,

    /// Public URL handed out by the blob store at upload time.
    pub image_url: String,
    /// Original upload filename.
    pub image_name: String,
    pub content_type: String,
    /// Blob store key, used to remove the object with the row.
    pub blob_key: String,
    pub size: i64,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PortfolioImage {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            portfolio_id: model.portfolio_id,
            image_url: model.image_url,
            image_name: model.image_name,
            content_type: model.content_type,
            created_at: model.created_at,
        }
    }
}
