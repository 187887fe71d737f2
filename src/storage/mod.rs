mod feeds;
mod follows;
mod schema;
mod types;
mod users;

pub use schema::Database;
pub use types::{Feed, FeedFollow, FollowedFeed, StorageError, User};
