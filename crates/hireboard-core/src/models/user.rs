use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Prefix Spring Security puts in front of authority names.
const ROLE_PREFIX: &str = "ROLE_";

/// Coarse-grained authorization category used for UI gating.
///
/// Serialized by wire name; deserialized through [`FromStr`], so any case
/// and a `ROLE_` prefix are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Role {
    Recruiter,
    JobSeeker,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 2] = [Role::Recruiter, Role::JobSeeker];

    /// Wire name, as used in tokens and persisted user records
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Recruiter => "RECRUITER",
            Role::JobSeeker => "JOB_SEEKER",
        }
    }

    /// Human-readable label for the navigation bar
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Recruiter => "Recruiter",
            Role::JobSeeker => "Job Seeker",
        }
    }

    /// Strip a literal `ROLE_` prefix, if present.
    pub fn strip_prefix(raw: &str) -> &str {
        raw.strip_prefix(ROLE_PREFIX).unwrap_or(raw)
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Accepts `RECRUITER`, `ROLE_RECRUITER`, `job_seeker` and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = Role::strip_prefix(s.trim());
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable account identifier.
///
/// The auth service issues Mongo object ids (strings) but structured login
/// responses have been seen carrying plain integers, so both are accepted.
/// Always serialized as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => UserId(s),
            RawId::Signed(n) => UserId(n.to_string()),
            RawId::Unsigned(n) => UserId(n.to_string()),
        })
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId(s)
    }
}

/// The identity half of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl User {
    pub fn is_recruiter(&self) -> bool {
        self.role == Role::Recruiter
    }

    pub fn is_job_seeker(&self) -> bool {
        self.role == Role::JobSeeker
    }
}

/// Login request body
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration request body
#[derive(Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: String,
    pub role: Role,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("email", &self.email)
            .field("role", &self.role)
            .finish()
    }
}

/// Account details as returned by `GET /users/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetails {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!("RECRUITER".parse::<Role>(), Ok(Role::Recruiter));
        assert_eq!("ROLE_JOB_SEEKER".parse::<Role>(), Ok(Role::JobSeeker));
        assert_eq!("job_seeker".parse::<Role>(), Ok(Role::JobSeeker));
        assert!("ADMIN".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_names() {
        assert_eq!(serde_json::to_string(&Role::JobSeeker).unwrap(), "\"JOB_SEEKER\"");
        let role: Role = serde_json::from_str("\"ROLE_RECRUITER\"").unwrap();
        assert_eq!(role, Role::Recruiter);
        let role: Role = serde_json::from_str("\"recruiter\"").unwrap();
        assert_eq!(role, Role::Recruiter);
        let role: Role = serde_json::from_str("\"Job_Seeker\"").unwrap();
        assert_eq!(role, Role::JobSeeker);
        assert!(serde_json::from_str::<Role>("\"ADMIN\"").is_err());
    }

    #[test]
    fn test_user_id_accepts_numbers_and_strings() {
        let user: User =
            serde_json::from_str(r#"{"id": 7, "username": "bob", "role": "RECRUITER"}"#).unwrap();
        assert_eq!(user.id, UserId::new("7"));

        let user: User = serde_json::from_str(
            r#"{"id": "65f0c0ffee", "username": "alice", "role": "JOB_SEEKER"}"#,
        )
        .unwrap();
        assert_eq!(user.id.as_str(), "65f0c0ffee");

        // Persisted form is always a string
        let json = serde_json::to_value(&User {
            id: UserId::new("7"),
            username: "bob".to_string(),
            role: Role::Recruiter,
        })
        .unwrap();
        assert_eq!(json["id"], "7");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }
}
