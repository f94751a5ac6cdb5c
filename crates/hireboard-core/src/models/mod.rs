//! Data models for the job board.
//!
//! - `User`, `Role`, `UserId`: the session identity
//! - `Credentials`, `Registration`: auth request bodies
//! - `JobPosting`, `NewJobPosting`: job service records
//! - `CandidateProfile`: candidate service records

pub mod candidate;
pub mod job;
pub mod user;

pub use candidate::CandidateProfile;
pub use job::{JobPosting, NewJobPosting};
pub use user::{Credentials, Registration, Role, UnknownRole, User, UserDetails, UserId};
