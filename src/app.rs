//! Shared handler state.

use crate::config::ConfigStore;
use crate::storage::Database;

/// Everything a command handler needs: the open database and the
/// configuration store backing the session.
///
/// Handlers receive `&mut App` because login and register rewrite the
/// config file; the database handle itself is a cheap clone.
pub struct App {
    pub db: Database,
    pub config: ConfigStore,
}

impl App {
    pub fn new(db: Database, config: ConfigStore) -> Self {
        Self { db, config }
    }
}
