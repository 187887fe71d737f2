//! Session gate: resolves the active user before a handler runs.

use crate::app::App;
use crate::command::{Command, CommandError, Handler};
use crate::storage::User;
use async_trait::async_trait;
use thiserror::Error;

/// Raised when a command needs a logged-in user and none can be resolved.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No user is set in the config, or the configured name matches no
    /// database row.
    #[error("no active session: run `register <name>` or `login <name>` first")]
    NoActiveSession,
}

/// A command implementation that additionally needs the active user.
#[async_trait]
pub trait AuthedHandler: Send + Sync {
    async fn run(&self, app: &mut App, cmd: &Command, user: &User) -> Result<(), CommandError>;
}

/// Decorator turning an [`AuthedHandler`] into a plain [`Handler`].
///
/// The session is resolved freshly on every invocation: the config's
/// current user name is read, then looked up in the database. No name
/// set, or a name with no matching row, short-circuits with
/// [`AuthError::NoActiveSession`] before the wrapped handler runs. Real
/// database failures propagate as storage errors instead of masquerading
/// as a missing session.
pub struct LoggedIn<H>(pub H);

#[async_trait]
impl<H> Handler for LoggedIn<H>
where
    H: AuthedHandler,
{
    async fn run(&self, app: &mut App, cmd: &Command) -> Result<(), CommandError> {
        let name = match app.config.current_user() {
            Some(name) => name.to_owned(),
            None => return Err(AuthError::NoActiveSession.into()),
        };
        let user = app
            .db
            .get_user_by_name(&name)
            .await?
            .ok_or(AuthError::NoActiveSession)?;
        self.0.run(app, cmd, &user).await
    }
}
