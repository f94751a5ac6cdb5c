//! Core library for the hireboard job board client.
//!
//! The heart of the crate is the client-side session layer in [`auth`]:
//! bearer token decoding, a persisted [`auth::SessionStore`] and role gates
//! for routes. [`api`] talks to the gateway; [`models`] holds the wire types.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, AuthApi, LoginResponse};
pub use auth::{Access, AuthFailure, Route, Session, SessionStore};
pub use config::Config;
pub use models::{Credentials, Registration, Role, User, UserId};
