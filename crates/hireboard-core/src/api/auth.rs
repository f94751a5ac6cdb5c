//! The authentication seam consumed by `SessionStore`.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::models::{Credentials, Registration, Role, UserId};

use super::ApiError;

/// What the authentication endpoint hands back.
///
/// Current servers answer with the bare token as the response body; some
/// deployments wrap it in an object that may also carry a pre-built user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Token(String),
    Structured {
        #[serde(alias = "accessToken", alias = "jwt")]
        token: String,
        #[serde(default, deserialize_with = "lenient_user")]
        user: Option<LoginUser>,
    },
}

/// User object embedded in a structured login response. Unlike a persisted
/// [`User`](crate::models::User), the id may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    pub id: Option<UserId>,
    pub username: String,
    pub role: Role,
}

impl LoginResponse {
    /// Parse a login response body, which may be plain text or JSON.
    pub fn parse(body: &str) -> Result<Self, ApiError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ApiError::InvalidResponse("Empty login response".to_string()));
        }

        match serde_json::from_str(body) {
            Ok(response) => Ok(response),
            // A raw token is not valid JSON
            Err(_) if !body.starts_with('{') && !body.starts_with('"') => {
                Ok(LoginResponse::Token(body.to_string()))
            }
            Err(e) => Err(ApiError::InvalidResponse(format!(
                "Failed to parse login response: {}",
                e
            ))),
        }
    }

    pub fn token(&self) -> &str {
        match self {
            LoginResponse::Token(token) => token,
            LoginResponse::Structured { token, .. } => token,
        }
    }
}

/// A user object the client cannot understand is treated as absent, so the
/// identity falls back to the token claims.
fn lenient_user<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<LoginUser>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value(value) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable user in login response");
                None
            }
        },
    })
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a bearer token.
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse>;

    /// Create an account. Does not log in.
    async fn register(&self, registration: &Registration) -> Result<()>;
}
