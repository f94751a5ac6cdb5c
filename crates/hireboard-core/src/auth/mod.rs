//! Authentication module: the client-side session and role gating.
//!
//! This module provides:
//! - `token`: bearer token decoding, tolerant of old claim layouts
//! - `SessionStore`: the current session, its persistence, login/register/logout
//! - `SessionStorage`: file, keychain and in-memory session backends
//! - `guard`: role checks for routes and navigation
//!
//! Tokens are decoded, never verified. The server enforces permissions.

pub mod guard;
pub mod session;
pub mod storage;
pub mod token;

pub use guard::{authorize, Access, Route};
pub use session::{
    AuthFailure, AuthResult, Session, SessionStore, LOGIN_FAILED_MESSAGE,
    REGISTRATION_FAILED_MESSAGE,
};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, SessionStorage, StorageError};
pub use token::{DecodedIdentity, TokenError};
