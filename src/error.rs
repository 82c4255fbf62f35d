// Recorder and configuration error types
use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::time::Duration;
use thiserror::Error;

/// Outcome of a failed recording attempt. The `Display` form of each variant
/// is exactly the plain-text body returned to the client.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The database could not be reached or refused the login. Nothing was written.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The connection was open but the insert was rejected.
    #[error("Error: {0}")]
    Insert(String),
}

impl RecorderError {
    pub fn connection(err: &sqlx::Error) -> Self {
        tracing::error!("database connection failed: {:?}", err);
        RecorderError::Connection(database_text(err))
    }

    pub fn connect_timeout(after: Duration) -> Self {
        tracing::error!("database connection timed out after {:?}", after);
        RecorderError::Connection(format!("timed out after {} seconds", after.as_secs()))
    }

    pub fn insert(err: &sqlx::Error) -> Self {
        tracing::error!("insert failed: {:?}", err);
        RecorderError::Insert(database_text(err))
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            RecorderError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            RecorderError::Insert(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The server's own message when the driver carries one (what a MySQL client
/// would print), otherwise the driver's description of the failure.
pub fn database_text(err: &sqlx::Error) -> String {
    match err.as_database_error() {
        Some(db_err) => db_err.message().to_string(),
        None => err.to_string(),
    }
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for RecorderError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status_code(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

/// Startup configuration problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),
}
