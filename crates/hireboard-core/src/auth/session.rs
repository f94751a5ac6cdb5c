//! The client's single authenticated session.
//!
//! `SessionStore` owns the current [`Session`] and mirrors it into durable
//! storage on every change. Storage is only read once, by `initialize`, at
//! startup; after that the in-memory copy is authoritative.
//!
//! Mutating operations take `&mut self`, so two logins can never race on
//! the same store. The session is only written once a login response has
//! been fully resolved, which means a login future dropped halfway leaves
//! the store exactly as it was.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, AuthApi, LoginResponse};
use crate::models::{Credentials, Registration, Role, User, UserId};

use super::storage::{SessionStorage, StorageError, TOKEN_KEY, USER_KEY};
use super::token;

/// Shown when a login fails and the server gave no message
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your credentials.";

/// Shown when a registration fails and the server gave no message
pub const REGISTRATION_FAILED_MESSAGE: &str = "Registration failed. Please try again.";

/// A bearer token together with the identity it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    /// Expiry read from the token's `exp` claim, if present
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        token::expires_at(&self.token)
    }

    /// Whether the token's own expiry has passed. Tokens without an `exp`
    /// claim never expire on the client; the server has the final say.
    pub fn is_expired(&self) -> bool {
        self.expires_at().is_some_and(|exp| Utc::now() > exp)
    }
}

/// Failure of a session operation, carrying the message to show the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthFailure {
    pub message: String,
}

impl AuthFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Prefer the server's own message, else `fallback`.
    fn from_error(err: &anyhow::Error, fallback: &str) -> Self {
        let message = err
            .downcast_ref::<ApiError>()
            .and_then(ApiError::server_message)
            .unwrap_or(fallback);
        Self::new(message)
    }
}

pub type AuthResult = std::result::Result<(), AuthFailure>;

pub struct SessionStore<A> {
    api: A,
    storage: Box<dyn SessionStorage>,
    current: Option<Session>,
    loading: bool,
}

impl<A: AuthApi> SessionStore<A> {
    pub fn new(api: A, storage: impl SessionStorage + 'static) -> Self {
        Self {
            api,
            storage: Box::new(storage),
            current: None,
            loading: true,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Restore the persisted session, if there is a complete one.
    ///
    /// A half-written or unreadable pair is removed from storage and the
    /// store starts empty. Never touches the network.
    pub fn initialize(&mut self) {
        self.current = self.restore();
        self.loading = false;
        debug!(authenticated = self.current.is_some(), "Session initialized");
    }

    fn restore(&self) -> Option<Session> {
        let stored = self
            .storage
            .get_item(TOKEN_KEY)
            .and_then(|token| Ok((token, self.storage.get_item(USER_KEY)?)));

        let (token, user) = match stored {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session");
                return None;
            }
        };

        match (token, user) {
            (None, None) => None,
            (Some(token), Some(user)) if !token.is_empty() => {
                match serde_json::from_str::<User>(&user) {
                    Ok(user) => {
                        debug!(username = %user.username, "Restored persisted session");
                        Some(Session { token, user })
                    }
                    Err(e) => {
                        warn!(error = %e, "Discarding persisted session with unreadable user");
                        self.clear_storage_logged();
                        None
                    }
                }
            }
            _ => {
                warn!("Discarding incomplete persisted session");
                self.clear_storage_logged();
                None
            }
        }
    }

    /// Log in and replace the current session.
    ///
    /// On failure the current session is left untouched.
    pub async fn login(&mut self, credentials: &Credentials) -> AuthResult {
        let response = match self.api.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, username = %credentials.username, "Login failed");
                return Err(AuthFailure::from_error(&e, LOGIN_FAILED_MESSAGE));
            }
        };

        let session = match session_from_response(response) {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, username = %credentials.username, "Login response rejected");
                return Err(AuthFailure::new(LOGIN_FAILED_MESSAGE));
            }
        };

        if let Err(e) = self.persist(&session) {
            warn!(error = %e, "Failed to persist session, it will not survive a restart");
        }

        info!(
            user_id = %session.user.id,
            username = %session.user.username,
            role = %session.user.role,
            "Login successful"
        );
        self.current = Some(session);
        Ok(())
    }

    /// Create an account. The new user still has to log in.
    pub async fn register(&self, registration: &Registration) -> AuthResult {
        match self.api.register(registration).await {
            Ok(()) => {
                info!(username = %registration.username, role = %registration.role, "Registration successful");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, username = %registration.username, "Registration failed");
                Err(AuthFailure::from_error(&e, REGISTRATION_FAILED_MESSAGE))
            }
        }
    }

    /// Drop the session from memory and storage.
    pub fn logout(&mut self) {
        if let Some(session) = self.current.take() {
            info!(username = %session.user.username, "Logged out");
        }
        self.clear_storage_logged();
    }

    pub fn session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// True until `initialize` has run
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Write token and user together; on failure neither is left behind.
    fn persist(&self, session: &Session) -> Result<()> {
        let user = serde_json::to_string(&session.user).context("Failed to serialize user")?;

        let written = self
            .storage
            .set_item(TOKEN_KEY, &session.token)
            .and_then(|()| self.storage.set_item(USER_KEY, &user));

        if let Err(e) = written {
            self.clear_storage_logged();
            return Err(e.into());
        }
        Ok(())
    }

    fn clear_storage(&self) -> std::result::Result<(), StorageError> {
        let token = self.storage.remove_item(TOKEN_KEY);
        let user = self.storage.remove_item(USER_KEY);
        token.and(user)
    }

    fn clear_storage_logged(&self) {
        if let Err(e) = self.clear_storage() {
            warn!(error = %e, "Failed to clear persisted session");
        }
    }
}

/// Turn a login response into a session.
///
/// A user supplied by the server is preferred; otherwise the identity comes
/// from the token claims.
fn session_from_response(response: LoginResponse) -> Result<Session> {
    let (token, user) = match response {
        LoginResponse::Token(token) => (token, None),
        LoginResponse::Structured { token, user } => (token, user),
    };

    if token.trim().is_empty() {
        anyhow::bail!("Login response carried an empty token");
    }

    let user = match user {
        Some(user) => {
            if user.username.trim().is_empty() {
                anyhow::bail!("Login response user has no username");
            }
            user_with_id(user.id, user.username, user.role)
        }
        None => user_from_token(&token)?,
    };

    Ok(Session { token, user })
}

fn user_from_token(token: &str) -> Result<User> {
    let identity = token::decode(token).context("Invalid token")?;
    let role: Role = identity.role.parse()?;
    Ok(user_with_id(identity.id.map(UserId::new), identity.username, role))
}

/// The auth service has shipped identities without any id; until that is
/// fixed the username doubles as the account id.
fn user_with_id(id: Option<UserId>, username: String, role: Role) -> User {
    let id = match id {
        Some(id) => id,
        None => {
            warn!(%username, "Login identity has no user id, using username as id");
            UserId::new(username.clone())
        }
    };
    User { id, username, role }
}
