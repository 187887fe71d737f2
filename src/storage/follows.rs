use chrono::Utc;

use super::schema::Database;
use super::types::{FeedFollow, FollowedFeed, StorageError};

impl Database {
    // ========================================================================
    // Follow Operations
    // ========================================================================

    /// Subscribe a user to a feed. The (user, feed) pair is unique, so
    /// following the same feed twice is a conflict, not a silent no-op.
    pub async fn create_feed_follow(
        &self,
        user_id: i64,
        feed_id: i64,
    ) -> Result<FeedFollow, StorageError> {
        let now = Utc::now().timestamp();
        sqlx::query_as(
            r#"
            INSERT INTO feed_follows (user_id, feed_id, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, feed_id, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(feed_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::on_conflict("follow"))
    }

    /// Remove a subscription. Returns whether a row was actually deleted.
    pub async fn delete_feed_follow(
        &self,
        user_id: i64,
        feed_id: i64,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = ? AND feed_id = ?")
            .bind(user_id)
            .bind(feed_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    /// The feeds `user_id` follows, in feed-name order.
    pub async fn list_follows_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<FollowedFeed>, StorageError> {
        sqlx::query_as(
            r#"
            SELECT f.name AS feed_name, f.url AS feed_url
            FROM feed_follows ff
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.user_id = ?
            ORDER BY f.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::storage::{Database, Feed, StorageError, User};
    use pretty_assertions::assert_eq;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    async fn setup(db: &Database) -> (User, Feed) {
        let user = db.create_user("alice").await.unwrap();
        let feed = db
            .create_feed("blog", "https://example.com/rss", user.id)
            .await
            .unwrap();
        (user, feed)
    }

    #[tokio::test]
    async fn test_follow_and_list() {
        let db = test_db().await;
        let (user, feed) = setup(&db).await;

        let follow = db.create_feed_follow(user.id, feed.id).await.unwrap();
        assert_eq!(follow.user_id, user.id);
        assert_eq!(follow.feed_id, feed.id);

        let follows = db.list_follows_for_user(user.id).await.unwrap();
        assert_eq!(follows.len(), 1);
        assert_eq!(follows[0].feed_name, "blog");
        assert_eq!(follows[0].feed_url, "https://example.com/rss");
    }

    #[tokio::test]
    async fn test_duplicate_follow_conflicts() {
        let db = test_db().await;
        let (user, feed) = setup(&db).await;

        db.create_feed_follow(user.id, feed.id).await.unwrap();
        let err = db.create_feed_follow(user.id, feed.id).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists("follow")));
    }

    #[tokio::test]
    async fn test_two_users_can_follow_the_same_feed() {
        let db = test_db().await;
        let (alice, feed) = setup(&db).await;
        let bob = db.create_user("bob").await.unwrap();

        db.create_feed_follow(alice.id, feed.id).await.unwrap();
        db.create_feed_follow(bob.id, feed.id).await.unwrap();

        assert_eq!(db.list_follows_for_user(alice.id).await.unwrap().len(), 1);
        assert_eq!(db.list_follows_for_user(bob.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_follow_reports_whether_it_existed() {
        let db = test_db().await;
        let (user, feed) = setup(&db).await;

        db.create_feed_follow(user.id, feed.id).await.unwrap();
        assert!(db.delete_feed_follow(user.id, feed.id).await.unwrap());
        assert!(!db.delete_feed_follow(user.id, feed.id).await.unwrap());
        assert!(db.list_follows_for_user(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follows_listed_in_feed_name_order() {
        let db = test_db().await;
        let user = db.create_user("alice").await.unwrap();
        let zebra = db
            .create_feed("zebra", "https://z.example/rss", user.id)
            .await
            .unwrap();
        let acorn = db
            .create_feed("acorn", "https://a.example/rss", user.id)
            .await
            .unwrap();

        db.create_feed_follow(user.id, zebra.id).await.unwrap();
        db.create_feed_follow(user.id, acorn.id).await.unwrap();

        let names: Vec<String> = db
            .list_follows_for_user(user.id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.feed_name)
            .collect();
        assert_eq!(names, vec!["acorn", "zebra"]);
    }
}
