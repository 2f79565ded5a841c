use thiserror::Error;

pub type RecordResult<T> = std::result::Result<T, RecordError>;

/// Failures surfaced by the record operations. Each variant maps onto one
/// stable IPC error code so the front end can decide how to re-prompt.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A required field was missing or a value could not be parsed.
    #[error("{0}")]
    Validation(String),

    /// A uniqueness constraint (admission number, username) was violated.
    #[error("{0}")]
    Conflict(String),

    /// A referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Bad credentials, or an action that needs a logged-in user.
    #[error("{0}")]
    Unauthorized(String),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl RecordError {
    pub fn validation(message: impl Into<String>) -> Self {
        RecordError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        RecordError::NotFound(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            RecordError::Validation(_) => "validation",
            RecordError::Conflict(_) => "conflict",
            RecordError::NotFound(_) => "not_found",
            RecordError::Unauthorized(_) => "unauthorized",
            RecordError::Db(_) => "db_query_failed",
        }
    }
}

/// Translate a UNIQUE constraint failure into `Conflict`, leaving every
/// other database error untouched.
pub fn map_unique(e: rusqlite::Error, message: &str) -> RecordError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RecordError::Conflict(message.to_string())
        }
        _ => RecordError::Db(e),
    }
}
