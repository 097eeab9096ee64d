use std::sync::atomic::{AtomicUsize, Ordering};

use mongodb::bson::doc;
use tokio::sync::OnceCell;

use crate::error::AppError;

/// Lazily established, process-wide MongoDB handle.
///
/// The first caller of [`MongoConnector::database`] creates the client and
/// pings the server. Callers arriving while that is in flight wait on the same
/// initialization instead of opening their own connection. A failed attempt is
/// not cached, so a later request tries again.
pub struct MongoConnector {
    uri: String,
    database_name: String,
    database: OnceCell<mongodb::Database>,
    connections_opened: AtomicUsize,
}

impl MongoConnector {
    pub fn new(uri: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database_name: database_name.into(),
            database: OnceCell::new(),
            connections_opened: AtomicUsize::new(0),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Return the shared database handle, connecting on first use.
    pub async fn database(&self) -> Result<&mongodb::Database, AppError> {
        self.database.get_or_try_init(|| self.connect()).await
    }

    /// Whether a connection has already been established.
    pub fn is_connected(&self) -> bool {
        self.database.initialized()
    }

    /// Number of clients successfully created over the connector's lifetime.
    pub fn connections_opened(&self) -> usize {
        self.connections_opened.load(Ordering::SeqCst)
    }

    /// Round-trip to the server, connecting first if needed.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.database().await?.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn connect(&self) -> Result<mongodb::Database, AppError> {
        tracing::debug!(database = %self.database_name, "Connecting to MongoDB");

        let client = mongodb::Client::with_uri_str(&self.uri)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create MongoDB client: {e}")))?;
        let database = client.database(&self.database_name);

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AppError::Database(format!("MongoDB ping failed: {e}")))?;

        self.connections_opened.fetch_add(1, Ordering::SeqCst);
        tracing::info!(database = %self.database_name, "Connected to MongoDB");

        Ok(database)
    }
}
