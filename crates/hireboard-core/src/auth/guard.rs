//! Role-based gating for routes and navigation.
//!
//! These checks only decide what the client offers; the gateway enforces
//! the real permissions on every request.

use std::fmt;

use crate::models::{Role, User};

const RECRUITERS: &[Role] = &[Role::Recruiter];
const JOB_SEEKERS: &[Role] = &[Role::JobSeeker];

/// Outcome of a role check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// No session: send the user to the login page
    Unauthenticated,
    /// Logged in, but with a role outside the allow-list
    Forbidden { role: Role },
}

impl Access {
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted)
    }
}

/// Check a user against an allow-list. An empty allow-list admits any
/// logged-in user.
pub fn authorize(user: Option<&User>, allowed: &[Role]) -> Access {
    match user {
        None => Access::Unauthenticated,
        Some(user) if allowed.is_empty() || allowed.contains(&user.role) => Access::Granted,
        Some(user) => Access::Forbidden { role: user.role },
    }
}

/// Pages of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    Jobs,
    JobDetails,
    PostJob,
    Profile,
}

impl Route {
    /// Roles allowed on this route, `None` for public routes
    pub fn allowed_roles(&self) -> Option<&'static [Role]> {
        match self {
            Route::PostJob => Some(RECRUITERS),
            Route::Profile => Some(JOB_SEEKERS),
            Route::Home | Route::Login | Route::Register | Route::Jobs | Route::JobDetails => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Login => "Sign In",
            Route::Register => "Sign Up",
            Route::Jobs => "Job Vacancy",
            Route::JobDetails => "Job Details",
            Route::PostJob => "Post a Job",
            Route::Profile => "My Profile",
        }
    }

    pub fn check(&self, user: Option<&User>) -> Access {
        match self.allowed_roles() {
            None => Access::Granted,
            Some(allowed) => authorize(user, allowed),
        }
    }

    /// Routes shown in the navigation bar for this user
    pub fn nav_items(user: Option<&User>) -> Vec<Route> {
        let mut items = vec![Route::Jobs];
        match user {
            Some(user) => match user.role {
                Role::Recruiter => items.push(Route::PostJob),
                Role::JobSeeker => items.push(Route::Profile),
            },
            None => items.extend([Route::Login, Route::Register]),
        }
        items
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
