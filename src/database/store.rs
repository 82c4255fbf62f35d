use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::database::record::PlateauMonitorRecord;
use crate::error::RecorderError;

/// Source of short-lived database sessions, one per request
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Open a new session. Failures are `RecorderError::Connection`.
    async fn open(&self) -> Result<Box<dyn StoreSession>, RecorderError>;
}

/// An open database session. Dropping it releases the connection; `close`
/// does so gracefully.
#[async_trait]
pub trait StoreSession: Send {
    /// Insert one row, returning the number of affected rows
    async fn insert(&mut self, record: &PlateauMonitorRecord) -> Result<u64, RecorderError>;

    async fn ping(&mut self) -> Result<(), RecorderError>;

    async fn close(self: Box<Self>);
}

/// MySQL-backed store; connects fresh on every `open`, no pooling
pub struct MySqlStore {
    options: MySqlConnectOptions,
    connect_timeout: Duration,
    insert_sql: String,
}

impl MySqlStore {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            options: config.connect_options(),
            connect_timeout: config.connect_timeout(),
            insert_sql: PlateauMonitorRecord::insert_sql(&config.quoted_table()),
        }
    }
}

#[async_trait]
impl RecordStore for MySqlStore {
    async fn open(&self) -> Result<Box<dyn StoreSession>, RecorderError> {
        let conn = tokio::time::timeout(self.connect_timeout, self.options.connect())
            .await
            .map_err(|_| RecorderError::connect_timeout(self.connect_timeout))?
            .map_err(|e| RecorderError::connection(&e))?;

        debug!("opened database connection");
        Ok(Box::new(MySqlSession {
            conn,
            insert_sql: self.insert_sql.clone(),
        }))
    }
}

struct MySqlSession {
    conn: MySqlConnection,
    insert_sql: String,
}

#[async_trait]
impl StoreSession for MySqlSession {
    async fn insert(&mut self, record: &PlateauMonitorRecord) -> Result<u64, RecorderError> {
        let result = sqlx::query(&self.insert_sql)
            .bind(record.plateau_number)
            .bind(record.duration_seconds)
            .execute(&mut self.conn)
            .await
            .map_err(|e| RecorderError::insert(&e))?;

        Ok(result.rows_affected())
    }

    async fn ping(&mut self) -> Result<(), RecorderError> {
        sqlx::query("SELECT 1")
            .execute(&mut self.conn)
            .await
            .map_err(|e| RecorderError::connection(&e))?;
        Ok(())
    }

    async fn close(self: Box<Self>) {
        let session = *self;
        match session.conn.close().await {
            Ok(()) => debug!("closed database connection"),
            Err(e) => warn!("error while closing database connection: {}", e),
        }
    }
}
