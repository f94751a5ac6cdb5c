//! REST API client module for the job board gateway.
//!
//! This module provides the `ApiClient` for the authentication, job and
//! candidate endpoints, and the `AuthApi` trait through which the session
//! layer talks to the authentication endpoints.
//!
//! Authenticated endpoints take the bearer token obtained from `/login`.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{AuthApi, LoginResponse, LoginUser};
pub use client::ApiClient;
pub use error::{ApiError, ErrorBody};
