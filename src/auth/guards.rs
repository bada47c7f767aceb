use tracing::warn;

use super::extractors::Caller;
use crate::{
    error::{AppError, AppResult},
    users::repo_types::Role,
};

/// One predicate a route may accept; a route accepts any of its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability<'a> {
    Admin,
    Nutritionist,
    Client,
    SameUser(&'a str),
}

impl Caller {
    pub fn has(&self, capability: Capability<'_>) -> bool {
        match capability {
            Capability::Admin => self.role == Role::Admin,
            Capability::Nutritionist => self.role == Role::Nutritionist,
            Capability::Client => self.role == Role::Client,
            Capability::SameUser(username) => self.username == username,
        }
    }

    /// Passes when any capability holds. An empty list only requires a valid token.
    pub fn require_any(&self, capabilities: &[Capability<'_>]) -> AppResult<()> {
        if capabilities.is_empty() || capabilities.iter().any(|c| self.has(*c)) {
            return Ok(());
        }
        warn!(username = %self.username, role = %self.role, required = ?capabilities, "forbidden");
        Err(AppError::Forbidden("Forbidden".into()))
    }

    pub fn require_logged_in(&self) -> AppResult<()> {
        self.require_any(&[])
    }

    pub fn is_admin(&self) -> bool {
        self.has(Capability::Admin)
    }
}
