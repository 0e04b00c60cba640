use serde::Serialize;
use uuid::Uuid;

use super::claims::Claims;
use crate::error::AppError;

/// Identity handed over by the provider for one signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub owner: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl Session {
    /// First word of the display name, or "User".
    pub fn first_name(&self) -> &str {
        self.display_name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
            .unwrap_or("User")
    }
}

impl From<Claims> for Session {
    fn from(c: Claims) -> Self {
        let meta = c.user_metadata;
        Self {
            owner: c.sub,
            email: c.email,
            display_name: meta.full_name.or(meta.name),
            avatar_url: meta.avatar_url.or(meta.picture),
        }
    }
}

/// Where the provider session currently stands. Screens receive this
/// explicitly instead of looking the user up themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Absent,
    Present(Session),
}

impl SessionState {
    pub fn require(self) -> Result<Session, AppError> {
        match self {
            SessionState::Present(s) => Ok(s),
            SessionState::Absent => Err(AppError::Unauthenticated),
            SessionState::Loading => Err(AppError::SessionPending),
        }
    }
}
