//! Command dispatch: a string-keyed registry of named handlers.
//!
//! The registry maps command names to boxed [`Handler`] trait objects.
//! Handlers that require a logged-in user are wrapped in the
//! [`gate::LoggedIn`] decorator at registration time, so by the time a
//! wrapped handler runs it holds a resolved [`crate::storage::User`].

pub mod gate;
pub mod handlers;

pub use gate::{AuthError, AuthedHandler, LoggedIn};
pub use handlers::build_registry;

use crate::app::App;
use crate::config::ConfigError;
use crate::storage::StorageError;
use crate::util::UrlError;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Errors surfaced by command dispatch and the handlers themselves.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No handler is registered under the given name.
    #[error("unknown command: {0}")]
    CommandNotFound(String),
    /// The command was invoked with missing or malformed arguments.
    #[error("{0}")]
    Usage(String),
    /// A user name that does not exist in the database.
    #[error("unknown user: {0}")]
    UnknownUser(String),
    /// A feed URL that no feed is registered under.
    #[error("no feed registered at {0}")]
    UnknownFeed(String),
    /// An unfollow for a feed the user does not follow.
    #[error("not following {0}")]
    NotFollowing(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    InvalidUrl(#[from] UrlError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A parsed invocation: the command name plus its positional arguments.
#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Returns positional argument `index`, or a usage error showing the
    /// expected form.
    pub fn arg(&self, index: usize, usage: &str) -> Result<&str, CommandError> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CommandError::Usage(format!("usage: {usage}")))
    }
}

/// A named command implementation.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn run(&self, app: &mut App, cmd: &Command) -> Result<(), CommandError>;
}

/// Maps command names to handlers and dispatches by name.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Box<dyn Handler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`.
    ///
    /// Re-registering a name replaces the previous handler silently; the
    /// last registration wins.
    pub fn register<H>(&mut self, name: &str, handler: H)
    where
        H: Handler + 'static,
    {
        self.handlers.insert(name.to_owned(), Box::new(handler));
    }

    /// Dispatches `cmd` to the handler registered under its exact name.
    ///
    /// There is no partial matching and no fallback handler.
    pub async fn run(&self, app: &mut App, cmd: &Command) -> Result<(), CommandError> {
        let handler = self
            .handlers
            .get(&cmd.name)
            .ok_or_else(|| CommandError::CommandNotFound(cmd.name.clone()))?;
        handler.run(app, cmd).await
    }
}
