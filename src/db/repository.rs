use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::api::query::{FilterSpec, ListQuery};
use crate::db::connector::MongoConnector;
use crate::db::models::{Entity, Stored};
use crate::error::AppError;

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// One page of results plus the number of documents matching the filter.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<Stored<T>>,
    pub total: u64,
}

/// Repository trait for catalog entities.
///
/// This trait allows mocking the database layer in tests.
#[async_trait]
pub trait EntityRepository<T: Entity>: Send + Sync {
    /// Persist a new entity, assigning its identifier and timestamps.
    async fn insert(&self, entity: T) -> Result<Stored<T>, AppError>;

    /// Fetch the requested page and count every match of the filter.
    async fn find_page(&self, query: &ListQuery) -> Result<Page<T>, AppError>;

    /// Find the first entity matching the filter.
    async fn find_one(&self, filter: &FilterSpec) -> Result<Option<Stored<T>>, AppError>;

    /// Count entities matching the filter.
    async fn count(&self, filter: &FilterSpec) -> Result<u64, AppError>;

    /// Create the collection's indexes ahead of first use. Safe to call
    /// repeatedly.
    async fn ensure_indexes(&self) -> Result<(), AppError>;
}

/// MongoDB implementation of the EntityRepository, one collection per entity.
///
/// Indexes are created on first use of the collection. A failed attempt is
/// not remembered, so the next call tries again.
pub struct MongoEntityRepository<T> {
    connector: Arc<MongoConnector>,
    indexed: OnceCell<()>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> MongoEntityRepository<T> {
    pub fn new(connector: Arc<MongoConnector>) -> Self {
        Self {
            connector,
            indexed: OnceCell::new(),
            _entity: PhantomData,
        }
    }

    /// Whether this collection's indexes have been created.
    pub fn is_indexed(&self) -> bool {
        self.indexed.initialized()
    }

    async fn collection(&self) -> Result<mongodb::Collection<Stored<T>>, AppError> {
        let collection = self.connector.database().await?.collection(T::COLLECTION);
        self.indexed
            .get_or_try_init(|| create_indexes(&collection))
            .await?;
        Ok(collection)
    }
}

async fn create_indexes<T: Entity>(
    collection: &mongodb::Collection<Stored<T>>,
) -> Result<(), AppError> {
    let indexes = T::indexes();
    if indexes.is_empty() {
        return Ok(());
    }

    collection.create_indexes(indexes).await?;
    tracing::info!(collection = T::COLLECTION, "Indexes ensured");
    Ok(())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

#[async_trait]
impl<T: Entity> EntityRepository<T> for MongoEntityRepository<T> {
    async fn insert(&self, entity: T) -> Result<Stored<T>, AppError> {
        let collection = self.collection().await?;
        let stored = Stored::new(entity);

        collection.insert_one(&stored).await.map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict(T::CONFLICT_MESSAGE.to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        tracing::debug!(collection = T::COLLECTION, id = %stored.id, "Inserted document");
        Ok(stored)
    }

    async fn find_page(&self, query: &ListQuery) -> Result<Page<T>, AppError> {
        use futures::TryStreamExt;
        use mongodb::options::FindOptions;

        let collection = self.collection().await?;
        let filter = query.filter.to_document();
        let options = FindOptions::builder()
            .sort(query.sort.to_document())
            .skip(query.window.skip())
            .limit(query.window.limit)
            .build();

        tracing::debug!(collection = T::COLLECTION, %filter, "Listing documents");

        // Page fetch and total count are independent; run them together.
        let fetch = async {
            collection
                .find(filter.clone())
                .with_options(options)
                .await?
                .try_collect::<Vec<_>>()
                .await
        };
        let count = async { collection.count_documents(filter.clone()).await };

        let (items, total) = tokio::try_join!(fetch, count)?;

        Ok(Page { items, total })
    }

    async fn find_one(&self, filter: &FilterSpec) -> Result<Option<Stored<T>>, AppError> {
        let collection = self.collection().await?;
        Ok(collection.find_one(filter.to_document()).await?)
    }

    async fn count(&self, filter: &FilterSpec) -> Result<u64, AppError> {
        let collection = self.collection().await?;
        Ok(collection.count_documents(filter.to_document()).await?)
    }

    async fn ensure_indexes(&self) -> Result<(), AppError> {
        self.collection().await.map(|_| ())
    }
}
