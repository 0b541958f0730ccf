//! Administrator sessions.
//!
//! An administrator exchanges credentials for an opaque session token. Tokens
//! are kept in memory and never expire while the process runs.

use core::error::Error;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

use api_types::UserRecord;
use error_stack::Report;
use error_stack::ResultExt;
use serde::Deserialize;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use crate::users::UserStore;
use crate::users::ADMIN_ROLE;

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum AuthError {
    #[display("Invalid credentials or insufficient permissions")]
    Unauthorized,
    #[display("Authentication backend failed: {message}")]
    Backend { message: String },
}

impl Error for AuthError {}

/// Login form fields
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: UserRecord,
}

pub trait AuthProvider: Send + Sync {
    /// Check `credentials` and issue a session for an administrator.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthorized`] if the user is unknown, the password is
    ///   wrong, or the user is not an administrator
    /// - [`AuthError::Backend`] if the user store cannot be read
    fn issue_session(&self, credentials: &Credentials) -> Result<Session, Report<AuthError>>;

    /// Username owning `token`, if the session is known.
    fn validate_session(&self, token: &str) -> Option<String>;
}

/// [`AuthProvider`] that checks credentials against a [`UserStore`].
pub struct StoreAuthProvider {
    users: Arc<dyn UserStore>,
    sessions: RwLock<HashMap<String, String>>,
}

impl StoreAuthProvider {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            users,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl AuthProvider for StoreAuthProvider {
    fn issue_session(&self, credentials: &Credentials) -> Result<Session, Report<AuthError>> {
        let user = self
            .users
            .find_by_username(&credentials.username)
            .change_context(AuthError::Backend {
                message: "failed to look up user".to_string(),
            })?;

        let Some(user) = user else {
            warn!(username = %credentials.username, "Login attempt for unknown user");
            return Err(Report::new(AuthError::Unauthorized));
        };
        if user.password != credentials.password || user.role != ADMIN_ROLE {
            warn!(username = %credentials.username, "Rejected login attempt");
            return Err(Report::new(AuthError::Unauthorized));
        }

        let token = Uuid::new_v4().simple().to_string();
        self.sessions
            .write()
            .map_err(|_| {
                Report::new(AuthError::Backend {
                    message: "session table lock poisoned".to_string(),
                })
            })?
            .insert(token.clone(), user.username.clone());

        info!(username = %user.username, "Administrator logged in");
        Ok(Session { token, user })
    }

    fn validate_session(&self, token: &str) -> Option<String> {
        let sessions = self.sessions.read().ok()?;
        sessions.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::users::InMemoryUserStore;

    fn provider() -> StoreAuthProvider {
        let store = InMemoryUserStore::new();
        for (username, role) in [("root", ADMIN_ROLE), ("viewer", 0)] {
            store
                .create(UserRecord {
                    id: String::new(),
                    username: username.to_string(),
                    password: "secret".to_string(),
                    email: String::new(),
                    role,
                })
                .expect("should seed user");
        }
        StoreAuthProvider::new(Arc::new(store))
    }

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn admin_login_issues_a_valid_session() {
        let auth = provider();

        let session = auth
            .issue_session(&credentials("root", "secret"))
            .expect("admin should log in");

        assert_eq!(session.token.len(), 32);
        assert!(session.token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(session.user.username, "root");
        assert_eq!(
            auth.validate_session(&session.token),
            Some("root".to_string())
        );
    }

    #[test]
    fn each_login_gets_a_fresh_token() {
        let auth = provider();

        let first = auth.issue_session(&credentials("root", "secret")).expect("should log in");
        let second = auth.issue_session(&credentials("root", "secret")).expect("should log in");

        assert_ne!(first.token, second.token);
        assert!(auth.validate_session(&first.token).is_some());
    }

    #[test]
    fn bad_credentials_and_non_admins_are_unauthorized() {
        let auth = provider();

        for (username, password) in [("root", "wrong"), ("nobody", "secret"), ("viewer", "secret")]
        {
            let report = auth
                .issue_session(&credentials(username, password))
                .expect_err("login should be rejected");
            assert_eq!(report.current_context(), &AuthError::Unauthorized);
        }
    }

    #[test]
    fn unknown_tokens_do_not_validate() {
        let auth = provider();

        assert_eq!(auth.validate_session("deadbeef"), None);
        assert_eq!(auth.validate_session(""), None);
    }
}
