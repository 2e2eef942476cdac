use std::sync::Arc;

use portfolio_common::DisplayPipeline;
use portfolio_common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::store::DbPortfolioStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub blob_store: Arc<dyn BlobStore>,
}

impl AppState {
    /// Display pipeline reading from this state's database.
    pub fn display_pipeline(&self) -> DisplayPipeline {
        let store = Arc::new(DbPortfolioStore::new(self.db.clone()));
        DisplayPipeline::new(store.clone(), store)
    }
}
