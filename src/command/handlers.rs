//! The command set: session management, feed registration, and the
//! aggregation entry point.

use crate::aggregator::{Aggregator, ConsoleSink};
use crate::app::App;
use crate::command::{AuthedHandler, Command, CommandError, CommandRegistry, Handler, LoggedIn};
use crate::feed::FeedFetcher;
use crate::storage::User;
use crate::util::{parse_interval, validate_feed_url};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// `login <name>`: switch the session to an existing user.
///
/// An unknown name leaves the current session untouched, so a typo never
/// logs anyone out.
struct Login;

#[async_trait]
impl Handler for Login {
    async fn run(&self, app: &mut App, cmd: &Command) -> Result<(), CommandError> {
        let name = cmd.arg(0, "login <name>")?;
        let user = app
            .db
            .get_user_by_name(name)
            .await?
            .ok_or_else(|| CommandError::UnknownUser(name.to_owned()))?;
        app.config.set_current_user(&user.name)?;
        println!("Logged in as {}", user.name);
        Ok(())
    }
}

/// `register <name>`: create a user and log them in.
struct Register;

#[async_trait]
impl Handler for Register {
    async fn run(&self, app: &mut App, cmd: &Command) -> Result<(), CommandError> {
        let name = cmd.arg(0, "register <name>")?;
        let user = app.db.create_user(name).await?;
        app.config.set_current_user(&user.name)?;
        println!("Created user {}", user.name);
        Ok(())
    }
}

/// `reset`: delete every user, and with them every feed and follow.
struct Reset;

#[async_trait]
impl Handler for Reset {
    async fn run(&self, app: &mut App, _cmd: &Command) -> Result<(), CommandError> {
        let removed = app.db.delete_all_users().await?;
        println!("Removed {removed} user(s)");
        Ok(())
    }
}

/// `users`: list all users, marking the active session.
struct Users;

#[async_trait]
impl Handler for Users {
    async fn run(&self, app: &mut App, _cmd: &Command) -> Result<(), CommandError> {
        let users = app.db.list_users().await?;
        let current = app.config.current_user();
        for user in &users {
            if current == Some(user.name.as_str()) {
                println!("* {} (current)", user.name);
            } else {
                println!("* {}", user.name);
            }
        }
        Ok(())
    }
}

/// `agg <interval>`: poll feeds until Ctrl-C.
struct Agg;

#[async_trait]
impl Handler for Agg {
    async fn run(&self, app: &mut App, cmd: &Command) -> Result<(), CommandError> {
        let raw = cmd.arg(0, "agg <interval>")?;
        let interval = parse_interval(raw)
            .map_err(|e| CommandError::Usage(format!("usage: agg <interval>: {e}")))?;

        let fetcher = FeedFetcher::new().map_err(anyhow::Error::from)?;
        let aggregator = Aggregator::new(app.db.clone(), fetcher, Arc::new(ConsoleSink), interval)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            let _ = shutdown_tx.send(true);
        });

        aggregator.run(shutdown_rx).await;
        Ok(())
    }
}

/// `addfeed <name> <url>`: register a feed and follow it in one step.
struct AddFeed;

#[async_trait]
impl AuthedHandler for AddFeed {
    async fn run(&self, app: &mut App, cmd: &Command, user: &User) -> Result<(), CommandError> {
        let name = cmd.arg(0, "addfeed <name> <url>")?.to_owned();
        let url = validate_feed_url(cmd.arg(1, "addfeed <name> <url>")?)?;

        let feed = app.db.create_feed(&name, url.as_str(), user.id).await?;
        app.db.create_feed_follow(user.id, feed.id).await?;
        println!("Added {} ({})", feed.name, feed.url);
        Ok(())
    }
}

/// `feeds`: list every registered feed with its owner.
struct Feeds;

#[async_trait]
impl Handler for Feeds {
    async fn run(&self, app: &mut App, _cmd: &Command) -> Result<(), CommandError> {
        let feeds = app.db.list_feeds().await?;
        for feed in &feeds {
            let owner = app
                .db
                .get_user_by_id(feed.user_id)
                .await?
                .map(|u| u.name)
                .unwrap_or_else(|| "unknown".to_owned());
            println!("* {} ({}) added by {}", feed.name, feed.url, owner);
        }
        Ok(())
    }
}

/// `follow <url>`: follow a feed someone already registered.
struct Follow;

#[async_trait]
impl AuthedHandler for Follow {
    async fn run(&self, app: &mut App, cmd: &Command, user: &User) -> Result<(), CommandError> {
        let url = validate_feed_url(cmd.arg(0, "follow <url>")?)?;
        let feed = app
            .db
            .get_feed_by_url(url.as_str())
            .await?
            .ok_or_else(|| CommandError::UnknownFeed(url.to_string()))?;
        app.db.create_feed_follow(user.id, feed.id).await?;
        println!("{} is now following {}", user.name, feed.name);
        Ok(())
    }
}

/// `following`: list the feeds the active user follows.
struct Following;

#[async_trait]
impl AuthedHandler for Following {
    async fn run(&self, app: &mut App, _cmd: &Command, user: &User) -> Result<(), CommandError> {
        let follows = app.db.list_follows_for_user(user.id).await?;
        for follow in &follows {
            println!("{}", follow.feed_name);
        }
        Ok(())
    }
}

/// `unfollow <url>`: drop a follow; complains if it never existed.
struct Unfollow;

#[async_trait]
impl AuthedHandler for Unfollow {
    async fn run(&self, app: &mut App, cmd: &Command, user: &User) -> Result<(), CommandError> {
        let url = validate_feed_url(cmd.arg(0, "unfollow <url>")?)?;
        let feed = app
            .db
            .get_feed_by_url(url.as_str())
            .await?
            .ok_or_else(|| CommandError::UnknownFeed(url.to_string()))?;
        let removed = app.db.delete_feed_follow(user.id, feed.id).await?;
        if !removed {
            return Err(CommandError::NotFollowing(url.to_string()));
        }
        println!("{} unfollowed {}", user.name, feed.name);
        Ok(())
    }
}

/// Builds the full command set.
///
/// Commands that touch a user's subscriptions are wrapped in [`LoggedIn`];
/// the rest run without a session.
pub fn build_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register("login", Login);
    registry.register("register", Register);
    registry.register("reset", Reset);
    registry.register("users", Users);
    registry.register("agg", Agg);
    registry.register("addfeed", LoggedIn(AddFeed));
    registry.register("feeds", Feeds);
    registry.register("follow", LoggedIn(Follow));
    registry.register("following", LoggedIn(Following));
    registry.register("unfollow", LoggedIn(Unfollow));
    registry
}
