use chrono::Utc;

use super::schema::Database;
use super::types::{StorageError, User};

impl Database {
    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a user. Duplicate names are rejected by the UNIQUE constraint.
    pub async fn create_user(&self, name: &str) -> Result<User, StorageError> {
        let now = Utc::now().timestamp();
        sqlx::query_as(
            r#"
            INSERT INTO users (name, created_at, updated_at)
            VALUES (?, ?, ?)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::on_conflict("user"))
    }

    pub async fn get_user_by_name(&self, name: &str) -> Result<Option<User>, StorageError> {
        sqlx::query_as("SELECT id, name, created_at, updated_at FROM users WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, StorageError> {
        sqlx::query_as("SELECT id, name, created_at, updated_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)
    }

    /// All users in name order.
    pub async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        sqlx::query_as("SELECT id, name, created_at, updated_at FROM users ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)
    }

    /// Delete every user. Their feeds and follows cascade away with them.
    /// Returns the number of users removed.
    pub async fn delete_all_users(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)?;
        Ok(result.rows_affected())
    }
}

// ============================================================================
// Tests
// ============================================================================
