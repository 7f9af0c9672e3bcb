use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds the database lock
    #[error("The brief database is locked by another process. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) all surface as lock errors.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("database is locked")
        || lower.contains("database table is locked")
        || lower.contains("sqlite_busy")
        || lower.contains("sqlite_locked")
        || lower.contains("unable to open database file")
}

/// Errors surfaced by the key-value backed stores (categories, briefs).
///
/// Category readers treat unparseable values as empty. The brief collection
/// is never rewritten from a value it could not read, so it reports
/// [`StorageError::Decode`] instead.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying key-value backend failed to read or write.
    #[error("Storage backend failed for key '{key}': {source}")]
    Backend {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// A stored value exists but is not the expected JSON shape. The value is
    /// left untouched.
    #[error("Stored value for key '{key}' is unreadable: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("Failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn backend(key: &str, source: anyhow::Error) -> Self {
        StorageError::Backend {
            key: key.to_owned(),
            source,
        }
    }
}
