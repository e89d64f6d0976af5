use std::sync::Arc;

use quotes_db::Database;
use tracing::error;

use crate::error::ApiError;
use crate::token::TokenKeys;

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    pub fn new(db: Database, tokens: TokenKeys) -> Self {
        Self {
            db: Arc::new(db),
            tokens: Arc::new(tokens),
        }
    }

    /// Run a blocking database call off the async runtime.
    pub async fn db_call<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Internal(anyhow::anyhow!("database task failed"))
            })?
            .map_err(ApiError::Internal)
    }
}
