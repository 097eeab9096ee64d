use std::sync::Arc;

use crate::db::connector::MongoConnector;
use crate::db::models::{BlogPost, Destination, TourPackage};
use crate::db::repository::{EntityRepository, MongoEntityRepository};
use crate::error::AppError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<MongoConnector>,
    pub destinations: Arc<dyn EntityRepository<Destination>>,
    pub packages: Arc<dyn EntityRepository<TourPackage>>,
    pub posts: Arc<dyn EntityRepository<BlogPost>>,
}

impl AppState {
    /// MongoDB-backed repositories sharing one connector.
    pub fn new(connector: Arc<MongoConnector>) -> Self {
        Self {
            destinations: Arc::new(MongoEntityRepository::new(connector.clone())),
            packages: Arc::new(MongoEntityRepository::new(connector.clone())),
            posts: Arc::new(MongoEntityRepository::new(connector.clone())),
            connector,
        }
    }

    /// Create indexes for every collection.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        self.destinations.ensure_indexes().await?;
        self.packages.ensure_indexes().await?;
        self.posts.ensure_indexes().await?;
        Ok(())
    }
}
