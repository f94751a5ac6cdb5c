//! Bearer token decoding.
//!
//! Tokens are compact `header.payload.signature` structures. Only the payload
//! is read; the signature is never checked on the client. The auth service
//! has changed its claim layout several times (subject-only tokens, explicit
//! `userId`, `roles` arrays, Spring `authorities`), so each identity field is
//! resolved from an ordered list of claim names.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::Role;

/// Raw token payload: claim name to value. Untrusted.
pub type Claims = Map<String, Value>;

/// Claims that have carried the account identifier, in priority order
const ID_CLAIMS: [&str; 4] = ["userId", "id", "_id", "user_id"];

/// Claims that have carried the login name, in priority order
const USERNAME_CLAIMS: [&str; 2] = ["username", "sub"];

/// Role assumed when a token carries no role-shaped claim
pub const DEFAULT_ROLE: &str = "JOB_SEEKER";

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Expected 3 token segments, found {0}")]
    Malformed(usize),

    #[error("Invalid base64url payload: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Invalid payload JSON: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Token payload is not a JSON object")]
    NotAnObject,
}

/// Identity normalized from whatever claim layout the token used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedIdentity {
    pub id: Option<String>,
    pub username: String,
    pub role: String,
}

/// Extract the claims map from a token without verifying it.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Malformed(segments.len()));
    }

    // Some issuers leave padding on the payload segment
    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(payload)?;

    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(claims) => Ok(claims),
        _ => Err(TokenError::NotAnObject),
    }
}

/// Decode a token into an identity.
///
/// Returns `None` when the token cannot be read or names no user at all.
/// Callers treat that as an invalid credential.
pub fn decode(token: &str) -> Option<DecodedIdentity> {
    let claims = match decode_claims(token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!(error = %e, "Failed to decode bearer token");
            return None;
        }
    };

    debug!(?claims, "Decoded token claims");
    identity_from_claims(&claims)
}

/// Normalize an already-decoded claims map.
pub fn identity_from_claims(claims: &Claims) -> Option<DecodedIdentity> {
    let Some(username) = resolve_username(claims) else {
        warn!("Token carries neither a username nor a subject claim");
        return None;
    };

    let id = resolve_id(claims);
    if id.is_none() {
        warn!(%username, "Token carries no user identifier claim");
    }

    Some(DecodedIdentity {
        id,
        username,
        role: resolve_role(claims),
    })
}

pub fn resolve_id(claims: &Claims) -> Option<String> {
    first_present(claims, &ID_CLAIMS)
}

pub fn resolve_username(claims: &Claims) -> Option<String> {
    first_present(claims, &USERNAME_CLAIMS)
}

/// `roles[0]`, then `role`, then `authorities[0]`, then [`DEFAULT_ROLE`],
/// with any `ROLE_` prefix removed.
pub fn resolve_role(claims: &Claims) -> String {
    let raw = first_listed(claims, "roles")
        .or_else(|| claims.get("role").and_then(role_text))
        .or_else(|| first_listed(claims, "authorities"))
        .unwrap_or_else(|| DEFAULT_ROLE.to_string());

    Role::strip_prefix(&raw).to_string()
}

/// Expiry (`exp` claim) of a token, if it has one.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let claims = decode_claims(token).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}

fn first_present(claims: &Claims, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| claims.get(*name).and_then(claim_text))
}

fn first_listed(claims: &Claims, name: &str) -> Option<String> {
    claims.get(name)?.as_array()?.first().and_then(role_text)
}

fn claim_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Role entries are plain strings, or `{"authority": "..."}` when Spring
/// serializes its `GrantedAuthority` objects directly.
fn role_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(obj) => obj
            .get("authority")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Build an unsigned token around `payload`, for tests.
#[cfg(test)]
pub(crate) fn encode_unsigned(payload: &Value) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_user_id_claim() {
        let token = encode_unsigned(&json!({"userId": "65f0c0ffee", "sub": "alice"}));
        let identity = decode(&token).unwrap();
        assert_eq!(identity.id.as_deref(), Some("65f0c0ffee"));
        assert_eq!(identity.username, "alice");
    }

    #[test]
    fn test_id_claim_priority() {
        let token = encode_unsigned(&json!({"sub": "a", "user_id": "4", "_id": "3", "id": "2"}));
        assert_eq!(decode(&token).unwrap().id.as_deref(), Some("2"));

        let token = encode_unsigned(&json!({"sub": "a", "user_id": "4", "_id": "3"}));
        assert_eq!(decode(&token).unwrap().id.as_deref(), Some("3"));

        let token = encode_unsigned(&json!({"sub": "a", "user_id": 42}));
        assert_eq!(decode(&token).unwrap().id.as_deref(), Some("42"));
    }

    #[test]
    fn test_missing_id_stays_none() {
        let token = encode_unsigned(&json!({"roles": ["ROLE_JOB_SEEKER"], "sub": "alice"}));
        assert_eq!(
            decode(&token),
            Some(DecodedIdentity {
                id: None,
                username: "alice".to_string(),
                role: "JOB_SEEKER".to_string(),
            })
        );
    }

    #[test]
    fn test_username_prefers_username_claim() {
        let token = encode_unsigned(&json!({"username": "bob", "sub": "bob@example.com"}));
        assert_eq!(decode(&token).unwrap().username, "bob");
    }

    #[test]
    fn test_role_resolution_order() {
        let claims = |v: Value| v.as_object().cloned().unwrap();

        assert_eq!(resolve_role(&claims(json!({"roles": ["ROLE_RECRUITER"]}))), "RECRUITER");
        assert_eq!(
            resolve_role(&claims(json!({"roles": [], "role": "RECRUITER"}))),
            "RECRUITER"
        );
        assert_eq!(
            resolve_role(&claims(json!({"authorities": ["ROLE_RECRUITER"]}))),
            "RECRUITER"
        );
        assert_eq!(
            resolve_role(&claims(json!({"authorities": [{"authority": "ROLE_RECRUITER"}]}))),
            "RECRUITER"
        );
        assert_eq!(
            resolve_role(&claims(json!({"role": "JOB_SEEKER", "authorities": ["ROLE_RECRUITER"]}))),
            "JOB_SEEKER"
        );
        assert_eq!(resolve_role(&claims(json!({"sub": "x"}))), DEFAULT_ROLE);
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(decode("").is_none());
        assert!(decode("not-a-token").is_none());
        assert!(decode("a.b").is_none());
        assert!(decode("a.!!!.c").is_none());
        assert!(matches!(decode_claims("a.b.c.d"), Err(TokenError::Malformed(4))));

        // Valid base64url, but not JSON
        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode("hello"));
        assert!(matches!(decode_claims(&not_json), Err(TokenError::Payload(_))));

        // JSON, but not an object
        let array = format!("h.{}.s", URL_SAFE_NO_PAD.encode("[1,2]"));
        assert!(matches!(decode_claims(&array), Err(TokenError::NotAnObject)));
    }

    #[test]
    fn test_no_username_is_no_identity() {
        let token = encode_unsigned(&json!({"userId": "1", "roles": ["ROLE_RECRUITER"]}));
        assert!(decode(&token).is_none());
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        // {"sub":"abcd"} encodes with one padding character
        let token = "h.eyJzdWIiOiJhYmNkIn0.s";
        assert_eq!(decode(token).unwrap().username, "abcd");
        let padded = "h.eyJzdWIiOiJhYmNkIn0=.s";
        assert_eq!(decode(padded).unwrap().username, "abcd");
    }

    #[test]
    fn test_expires_at() {
        // Header: {"alg":"HS256","typ":"JWT"}
        // Payload: {"exp":1234567890,"sub":"test"}
        let token = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJleHAiOjEyMzQ1Njc4OTAsInN1YiI6InRlc3QifQ.signature";
        assert_eq!(expires_at(token).map(|t| t.timestamp()), Some(1234567890));
        assert_eq!(decode(token).unwrap().username, "test");

        let no_exp = encode_unsigned(&json!({"sub": "x"}));
        assert!(expires_at(&no_exp).is_none());
    }
}
