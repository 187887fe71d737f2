//! Integration tests for command dispatch: registration, sessions, feed
//! management, and the auth gate, end to end through the registry.
//!
//! Each test gets its own in-memory database and its own config file
//! under a throwaway temp directory, removed again at the end.

use sift::app::App;
use sift::command::{build_registry, AuthError, Command, CommandError, CommandRegistry};
use sift::config::ConfigStore;
use sift::storage::{Database, StorageError};
use std::path::{Path, PathBuf};

async fn test_app(name: &str) -> (App, CommandRegistry, PathBuf) {
    let dir = std::env::temp_dir().join(format!("sift-flow-{name}"));
    // Wipe leftovers from an earlier aborted run.
    let _ = std::fs::remove_dir_all(&dir);

    let db = Database::open(":memory:").await.unwrap();
    let config = ConfigStore::load(dir.join("config.toml")).unwrap();
    (App::new(db, config), build_registry(), dir)
}

fn cleanup(dir: &Path) {
    let _ = std::fs::remove_dir_all(dir);
}

async fn run(
    registry: &CommandRegistry,
    app: &mut App,
    name: &str,
    args: &[&str],
) -> Result<(), CommandError> {
    let cmd = Command::new(name, args.iter().map(|s| s.to_string()).collect());
    registry.run(app, &cmd).await
}

// ============================================================================
// Users and Sessions
// ============================================================================

#[tokio::test]
async fn register_creates_user_and_persists_session() {
    let (mut app, registry, dir) = test_app("register").await;

    run(&registry, &mut app, "register", &["alice"])
        .await
        .unwrap();

    assert!(app.db.get_user_by_name("alice").await.unwrap().is_some());
    assert_eq!(app.config.current_user(), Some("alice"));

    // The session survives a reload from disk.
    let reloaded = ConfigStore::load(dir.join("config.toml")).unwrap();
    assert_eq!(reloaded.current_user(), Some("alice"));
    cleanup(&dir);
}

#[tokio::test]
async fn register_rejects_duplicate_names() {
    let (mut app, registry, dir) = test_app("register-dup").await;

    run(&registry, &mut app, "register", &["alice"])
        .await
        .unwrap();
    let err = run(&registry, &mut app, "register", &["alice"])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CommandError::Storage(StorageError::AlreadyExists("user"))
    ));
    cleanup(&dir);
}

#[tokio::test]
async fn login_switches_the_session() {
    let (mut app, registry, dir) = test_app("login").await;

    run(&registry, &mut app, "register", &["alice"])
        .await
        .unwrap();
    run(&registry, &mut app, "register", &["bob"])
        .await
        .unwrap();
    assert_eq!(app.config.current_user(), Some("bob"));

    run(&registry, &mut app, "login", &["alice"])
        .await
        .unwrap();
    assert_eq!(app.config.current_user(), Some("alice"));
    cleanup(&dir);
}

#[tokio::test]
async fn login_with_unknown_name_keeps_the_session() {
    let (mut app, registry, dir) = test_app("login-unknown").await;

    run(&registry, &mut app, "register", &["alice"])
        .await
        .unwrap();
    let err = run(&registry, &mut app, "login", &["mallory"])
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::UnknownUser(name) if name == "mallory"));
    assert_eq!(app.config.current_user(), Some("alice"));
    cleanup(&dir);
}

// ============================================================================
// Feeds and Follows
// ============================================================================

#[tokio::test]
async fn addfeed_registers_and_follows_in_one_step() {
    let (mut app, registry, dir) = test_app("addfeed").await;

    run(&registry, &mut app, "register", &["alice"])
        .await
        .unwrap();
    run(
        &registry,
        &mut app,
        "addfeed",
        &["blog", "https://blog.example.com/rss"],
    )
    .await
    .unwrap();

    let feed = app
        .db
        .get_feed_by_url("https://blog.example.com/rss")
        .await
        .unwrap()
        .expect("feed should exist");
    assert_eq!(feed.name, "blog");

    let alice = app.db.get_user_by_name("alice").await.unwrap().unwrap();
    let follows = app.db.list_follows_for_user(alice.id).await.unwrap();
    assert_eq!(follows.len(), 1);
    assert_eq!(follows[0].feed_name, "blog");
    cleanup(&dir);
}

#[tokio::test]
async fn addfeed_rejects_non_http_urls() {
    let (mut app, registry, dir) = test_app("addfeed-url").await;

    run(&registry, &mut app, "register", &["alice"])
        .await
        .unwrap();
    let err = run(
        &registry,
        &mut app,
        "addfeed",
        &["evil", "file:///etc/passwd"],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CommandError::InvalidUrl(_)));
    assert!(app.db.list_feeds().await.unwrap().is_empty());
    cleanup(&dir);
}

#[tokio::test]
async fn follow_joins_an_existing_feed() {
    let (mut app, registry, dir) = test_app("follow").await;

    run(&registry, &mut app, "register", &["alice"])
        .await
        .unwrap();
    run(
        &registry,
        &mut app,
        "addfeed",
        &["blog", "https://blog.example.com/rss"],
    )
    .await
    .unwrap();

    run(&registry, &mut app, "register", &["bob"])
        .await
        .unwrap();
    run(
        &registry,
        &mut app,
        "follow",
        &["https://blog.example.com/rss"],
    )
    .await
    .unwrap();

    let bob = app.db.get_user_by_name("bob").await.unwrap().unwrap();
    let follows = app.db.list_follows_for_user(bob.id).await.unwrap();
    assert_eq!(follows.len(), 1);
    assert_eq!(follows[0].feed_url, "https://blog.example.com/rss");
    cleanup(&dir);
}

#[tokio::test]
async fn follow_twice_is_a_conflict() {
    let (mut app, registry, dir) = test_app("follow-dup").await;

    run(&registry, &mut app, "register", &["alice"])
        .await
        .unwrap();
    run(
        &registry,
        &mut app,
        "addfeed",
        &["blog", "https://blog.example.com/rss"],
    )
    .await
    .unwrap();

    // addfeed already follows, so following again must conflict.
    let err = run(
        &registry,
        &mut app,
        "follow",
        &["https://blog.example.com/rss"],
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        CommandError::Storage(StorageError::AlreadyExists("follow"))
    ));
    cleanup(&dir);
}

#[tokio::test]
async fn follow_unknown_url_is_reported() {
    let (mut app, registry, dir) = test_app("follow-unknown").await;

    run(&registry, &mut app, "register", &["alice"])
        .await
        .unwrap();
    let err = run(
        &registry,
        &mut app,
        "follow",
        &["https://nowhere.example.com/rss"],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CommandError::UnknownFeed(_)));
    cleanup(&dir);
}

#[tokio::test]
async fn unfollow_removes_only_the_follow() {
    let (mut app, registry, dir) = test_app("unfollow").await;

    run(&registry, &mut app, "register", &["alice"])
        .await
        .unwrap();
    run(
        &registry,
        &mut app,
        "addfeed",
        &["blog", "https://blog.example.com/rss"],
    )
    .await
    .unwrap();

    run(
        &registry,
        &mut app,
        "unfollow",
        &["https://blog.example.com/rss"],
    )
    .await
    .unwrap();

    let alice = app.db.get_user_by_name("alice").await.unwrap().unwrap();
    assert!(app
        .db
        .list_follows_for_user(alice.id)
        .await
        .unwrap()
        .is_empty());
    // The feed itself stays registered for other users.
    assert_eq!(app.db.list_feeds().await.unwrap().len(), 1);

    // A second unfollow has nothing to remove.
    let err = run(
        &registry,
        &mut app,
        "unfollow",
        &["https://blog.example.com/rss"],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CommandError::NotFollowing(_)));
    cleanup(&dir);
}

// ============================================================================
// Gate and Dispatch
// ============================================================================

#[tokio::test]
async fn authed_commands_require_a_session() {
    let (mut app, registry, dir) = test_app("gate").await;

    for (name, args) in [
        ("addfeed", vec!["blog", "https://blog.example.com/rss"]),
        ("follow", vec!["https://blog.example.com/rss"]),
        ("following", vec![]),
        ("unfollow", vec!["https://blog.example.com/rss"]),
    ] {
        let err = run(&registry, &mut app, name, &args).await.unwrap_err();
        assert!(
            matches!(err, CommandError::Auth(AuthError::NoActiveSession)),
            "{name} should demand a session"
        );
    }
    assert!(app.db.list_feeds().await.unwrap().is_empty());
    cleanup(&dir);
}

#[tokio::test]
async fn unknown_commands_are_rejected() {
    let (mut app, registry, dir) = test_app("unknown").await;

    let err = run(&registry, &mut app, "frobnicate", &[])
        .await
        .unwrap_err();

    assert!(matches!(err, CommandError::CommandNotFound(name) if name == "frobnicate"));
    cleanup(&dir);
}

#[tokio::test]
async fn missing_arguments_are_usage_errors() {
    let (mut app, registry, dir) = test_app("usage").await;

    let err = run(&registry, &mut app, "register", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Usage(_)));

    run(&registry, &mut app, "register", &["alice"])
        .await
        .unwrap();
    let err = run(&registry, &mut app, "addfeed", &["blog"])
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Usage(_)));
    cleanup(&dir);
}

#[tokio::test]
async fn agg_rejects_malformed_intervals() {
    let (mut app, registry, dir) = test_app("agg-interval").await;

    let err = run(&registry, &mut app, "agg", &["soon"]).await.unwrap_err();
    assert!(matches!(err, CommandError::Usage(_)));

    // "0s" parses cleanly but the aggregator refuses to spin that fast.
    let err = run(&registry, &mut app, "agg", &["0s"]).await.unwrap_err();
    assert!(matches!(err, CommandError::Other(_)));
    cleanup(&dir);
}

// ============================================================================
// Reset
// ============================================================================

#[tokio::test]
async fn reset_clears_users_feeds_and_follows() {
    let (mut app, registry, dir) = test_app("reset").await;

    run(&registry, &mut app, "register", &["alice"])
        .await
        .unwrap();
    run(
        &registry,
        &mut app,
        "addfeed",
        &["blog", "https://blog.example.com/rss"],
    )
    .await
    .unwrap();

    run(&registry, &mut app, "reset", &[]).await.unwrap();

    assert!(app.db.list_users().await.unwrap().is_empty());
    assert!(app.db.list_feeds().await.unwrap().is_empty());
    cleanup(&dir);
}
