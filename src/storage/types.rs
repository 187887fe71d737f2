use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Storage-layer errors with user-facing messages.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Another process has the database locked.
    #[error("The database is locked by another sift process. Close it and try again.")]
    Locked,

    /// A UNIQUE constraint rejected the write (duplicate user name, feed
    /// URL, or follow pair).
    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl StorageError {
    /// Classify a sqlx error, mapping SQLite lock conditions to `Locked`.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return StorageError::Locked;
        }

        StorageError::Other(err)
    }

    /// Error mapper for INSERTs guarded by a UNIQUE constraint: constraint
    /// violations become `AlreadyExists(entity)`, everything else goes
    /// through the usual classification.
    pub(crate) fn on_conflict(entity: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StorageError::AlreadyExists(entity)
            }
            _ => StorageError::from_sqlx(err),
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A registered account. `name` is unique across the database.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A subscribed feed.
///
/// `url` is globally unique. `last_fetched_at` stays null until the
/// aggregator completes a fetch, which is what makes a new feed maximally
/// stale to the selector.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_fetched_at: Option<i64>,
}

/// A (user, feed) subscription. At most one row per pair.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FeedFollow {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One entry in a user's subscription list (follow joined to its feed).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FollowedFeed {
    pub feed_name: String,
    pub feed_url: String,
}
