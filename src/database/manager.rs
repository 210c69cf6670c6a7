use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("{0}")]
    ConnectionError(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Lazily established, process-wide connection pool.
///
/// The pool is created on first use, verified with a ping, and bootstrap
/// statements run once right after. A failed attempt is not cached, so the
/// next request tries again.
pub struct DatabaseManager {
    url: String,
    max_connections: u32,
    connect_timeout: Duration,
    bootstrap: Vec<String>,
    pool: OnceCell<PgPool>,
}

impl DatabaseManager {
    pub fn new(url: impl Into<String>, max_connections: u32, connect_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            max_connections,
            connect_timeout,
            bootstrap: Vec::new(),
            pool: OnceCell::new(),
        }
    }

    /// Statements executed once after the first successful connection
    pub fn with_bootstrap(mut self, statements: Vec<String>) -> Self {
        self.bootstrap = statements;
        self
    }

    /// Get the pool, connecting on first use
    pub async fn pool(&self) -> Result<&PgPool, DatabaseError> {
        self.pool.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<PgPool, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.connect_timeout)
            .connect(&self.url)
            .await
            .map_err(|e| self.connection_error(e))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| self.connection_error(e))?;

        for statement in &self.bootstrap {
            sqlx::query(statement).execute(&pool).await?;
        }

        info!("Connected to database: {}", redact_url(&self.url));
        Ok(pool)
    }

    fn connection_error(&self, e: sqlx::Error) -> DatabaseError {
        let message = format!(
            "Could not connect to database at {}. Is it running? {}",
            redact_url(&self.url),
            e
        );
        error!("{}", message);
        DatabaseError::ConnectionError(message)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        let pool = self.pool().await?;
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Close the pool if it was ever opened (e.g., on shutdown)
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("Closed database pool: {}", redact_url(&self.url));
        }
    }

    /// Quote SQL identifier to prevent injection
    pub fn quote_identifier(name: &str) -> Result<String, DatabaseError> {
        if !Self::is_valid_identifier(name) {
            return Err(DatabaseError::InvalidIdentifier(name.to_string()));
        }
        Ok(format!("\"{}\"", name))
    }

    /// Plain identifiers only: a letter or underscore followed by letters,
    /// digits and underscores, at most 63 bytes.
    fn is_valid_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

/// Connection string with any password replaced, for logs and error messages
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.into()
        }
        Err(_) => "<invalid database url>".to_string(),
    }
}
