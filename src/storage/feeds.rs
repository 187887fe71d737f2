use chrono::Utc;

use super::schema::Database;
use super::types::{Feed, StorageError};

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Register a feed owned by `user_id`. The URL is globally unique.
    pub async fn create_feed(
        &self,
        name: &str,
        url: &str,
        user_id: i64,
    ) -> Result<Feed, StorageError> {
        let now = Utc::now().timestamp();
        sqlx::query_as(
            r#"
            INSERT INTO feeds (name, url, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, url, user_id, created_at, updated_at, last_fetched_at
            "#,
        )
        .bind(name)
        .bind(url)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::on_conflict("feed"))
    }

    pub async fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>, StorageError> {
        sqlx::query_as(
            r#"
            SELECT id, name, url, user_id, created_at, updated_at, last_fetched_at
            FROM feeds
            WHERE url = ?
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)
    }

    /// All feeds in registration order.
    pub async fn list_feeds(&self) -> Result<Vec<Feed>, StorageError> {
        sqlx::query_as(
            r#"
            SELECT id, name, url, user_id, created_at, updated_at, last_fetched_at
            FROM feeds
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)
    }

    /// The feed the aggregator should fetch next: oldest `last_fetched_at`
    /// first, with never-fetched feeds ahead of everything else. Ties fall
    /// back to the id so selection is reproducible across runs.
    /// `None` when no feeds are registered.
    pub async fn next_stale_feed(&self) -> Result<Option<Feed>, StorageError> {
        sqlx::query_as(
            r#"
            SELECT id, name, url, user_id, created_at, updated_at, last_fetched_at
            FROM feeds
            ORDER BY last_fetched_at ASC NULLS FIRST, id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)
    }

    /// Record a successful fetch of `feed_id` at `fetched_at` (unix epoch
    /// seconds). Called strictly after the HTTP fetch succeeds, never before.
    pub async fn mark_feed_fetched(
        &self,
        feed_id: i64,
        fetched_at: i64,
    ) -> Result<(), StorageError> {
        sqlx::query("UPDATE feeds SET last_fetched_at = ?, updated_at = ? WHERE id = ?")
            .bind(fetched_at)
            .bind(fetched_at)
            .bind(feed_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
