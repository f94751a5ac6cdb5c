//! Application state for the command line client.
//!
//! `App` owns the configuration and the one `SessionStore` of this process;
//! commands receive it explicitly.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use hireboard_core::auth::{authorize, Access, Route, SessionStore};
use hireboard_core::{ApiClient, Config, Role, User};

pub struct App {
    pub config: Config,
    pub store: SessionStore<ApiClient>,
}

impl App {
    /// Load configuration and restore any persisted session
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let base_url = config.api_base_url();
        debug!(%base_url, storage = ?config.storage, "Config loaded");

        let api = ApiClient::new(&base_url)?;
        let storage = config
            .session_storage()
            .context("Failed to open session storage")?;

        let mut store = SessionStore::new(api, storage);
        store.initialize();

        if let Some(session) = store.session() {
            if session.is_expired() {
                warn!(username = %session.user.username, "Stored session token has expired");
            }
        }

        Ok(Self { config, store })
    }

    /// API client carrying the session token, if there is one
    pub fn api(&self) -> ApiClient {
        match self.store.token() {
            Some(token) => self.store.api().with_token(token.to_string()),
            None => self.store.api().clone(),
        }
    }

    /// Refuse to continue unless the current user may open `route`
    pub fn guard(&self, route: Route) -> Result<()> {
        access_result(route.title(), route.check(self.store.user()))
    }

    /// Refuse an action that is not a page of its own unless the current
    /// user holds one of `allowed`
    pub fn require(&self, action: &str, allowed: &[Role]) -> Result<()> {
        access_result(action, authorize(self.store.user(), allowed))
    }

    /// The signed-in user, after a guard has passed
    pub fn user(&self) -> Result<&User> {
        self.store
            .user()
            .ok_or_else(|| anyhow::anyhow!("Not signed in. Run `hireboard login`."))
    }
}

fn access_result(what: &str, access: Access) -> Result<()> {
    match access {
        Access::Granted => Ok(()),
        Access::Unauthenticated => anyhow::bail!(
            "{} requires you to sign in first. Run `hireboard login`.",
            what
        ),
        Access::Forbidden { role } => anyhow::bail!(
            "{} is not available to {} accounts.",
            what,
            role.display_name()
        ),
    }
}

/// Read one line from stdin, offering `default` when given
pub fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) if !d.is_empty() => print!("{} [{}]: ", label, d),
        _ => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match default {
        Some(d) if input.is_empty() => d.to_string(),
        _ => input.to_string(),
    })
}

pub fn prompt_password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("{}: ", label))?;
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_result_messages() {
        assert!(access_result("Post a Job", Access::Granted).is_ok());

        let err = access_result("My Profile", Access::Unauthenticated).unwrap_err();
        assert_eq!(
            err.to_string(),
            "My Profile requires you to sign in first. Run `hireboard login`."
        );

        let err = access_result(
            "Applying to a job",
            authorize(None, &[Role::JobSeeker]),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Applying to a job requires you to sign in"));

        let err = access_result(
            "Post a Job",
            Access::Forbidden {
                role: Role::JobSeeker,
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Post a Job is not available to Job Seeker accounts.");
    }
}
