//! # App Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ConfigError (ledger.toml, env)  ──┐                                    │
//! │  DbError     (simledger-db)      ──┼──► AppError ──► ErrorReport        │
//! │  usage / JSON output             ──┘                 stderr + exit code │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures are printed as one JSON object on stderr so scripts reading the
//! report can tell them apart from output:
//! ```json
//! { "code": "NOT_FOUND", "message": "Sale order not found: 8f0c..." }
//! ```

use serde::Serialize;
use simledger_core::CoreError;
use simledger_db::DbError;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// No platform data directory and no explicit database path.
    #[error("Could not determine data directory; set SIMLEDGER_DB_PATH")]
    NoDataDir,
}

/// Top-level error of the command-line app.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),

    /// Bad command line.
    #[error("{0}")]
    Usage(String),
}

impl AppError {
    pub fn usage(message: impl Into<String>) -> Self {
        AppError::Usage(message.into())
    }

    /// Process exit code: 2 for usage errors, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Usage(_) => 2,
            _ => 1,
        }
    }
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    Conflict,
    ConfigError,
    DatabaseError,
    UsageError,
    Internal,
}

/// What gets printed for a failed command.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&AppError> for ErrorReport {
    fn from(err: &AppError) -> Self {
        let code = match err {
            AppError::Config(_) => ErrorCode::ConfigError,
            AppError::Usage(_) => ErrorCode::UsageError,
            AppError::Output(_) => ErrorCode::Internal,
            AppError::Db(db) => match db {
                DbError::NotFound { .. } => ErrorCode::NotFound,
                DbError::Conflict { .. } => ErrorCode::Conflict,
                DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. }
                | DbError::CheckViolation(_) => ErrorCode::ValidationError,
                DbError::Core(CoreError::OrderNotFound(_)) => ErrorCode::NotFound,
                DbError::Core(CoreError::InvalidConfig(_)) => ErrorCode::ConfigError,
                DbError::Core(CoreError::Validation(_)) => ErrorCode::ValidationError,
                _ => ErrorCode::DatabaseError,
            },
        };

        ErrorReport {
            code,
            message: err.to_string(),
        }
    }
}
