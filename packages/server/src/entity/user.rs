use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account kind. Guests are created on demand and browse every portfolio
/// read-only.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[sea_orm(string_value = "regular")]
    Regular,
    #[sea_orm(string_value = "guest")]
    Guest,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    pub password: String,
    pub user_type: UserType,

    #[sea_orm(has_many)]
    pub portfolios: HasMany<super::portfolio::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
