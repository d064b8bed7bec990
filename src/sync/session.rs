//! Session provider: who is signed in and with which credential.
//!
//! Credential issuance is not handled here; a session is either configured or absent.

use crate::config::SessionConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

pub trait SessionProvider: Send + Sync {
    /// The active session, or `None` when signed out.
    fn current(&self) -> Option<Session>;
}

/// A session fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    session: Option<Session>,
}

impl StaticSession {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            session: Some(Session {
                user_id: user_id.into(),
                token: token.into(),
            }),
        }
    }

    pub fn signed_out() -> Self {
        Self { session: None }
    }

    /// Both `user_id` and a non-empty `token` are required.
    pub fn from_config(config: &SessionConfig) -> Self {
        match (&config.user_id, &config.token) {
            (Some(user), Some(token)) if !token.trim().is_empty() => Self::new(user, token),
            _ => Self::signed_out(),
        }
    }
}

impl SessionProvider for StaticSession {
    fn current(&self) -> Option<Session> {
        self.session.clone()
    }
}
