//! Command parsing and dispatch.
//!
//! Every command is a small form bound to one gateway call, gated by the
//! same route table the web client used.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::warn;

use hireboard_core::auth::Route;
use hireboard_core::models::{CandidateProfile, NewJobPosting};
use hireboard_core::utils::{format_expiry, format_optional, single_line, truncate_string};
use hireboard_core::{Credentials, Registration, Role};

use crate::app::{prompt, prompt_password, App};

/// Environment variables that pre-fill the login form
const USERNAME_ENV: &str = "HIREBOARD_USERNAME";
const PASSWORD_ENV: &str = "HIREBOARD_PASSWORD";

/// Width of the role column in job listings
const ROLE_COLUMN_WIDTH: usize = 28;

/// Width of the skills column in job listings
const SKILLS_COLUMN_WIDTH: usize = 36;

pub const USAGE: &str = "\
Usage: hireboard <command>

Commands:
  login [username]   Sign in
  register           Create an account
  logout             Sign out and forget the stored session
  whoami             Show the current session
  jobs [keyword]     List job vacancies, optionally filtered by keyword
  job <id>           Show one job posting
  apply <id>         Apply to a job posting (job seekers)
  post-job           Publish a job posting (recruiters)
  profile [edit]     Show or edit your candidate profile (job seekers)
  help               Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: Option<String> },
    Register,
    Logout,
    WhoAmI,
    Jobs { keyword: Option<String> },
    Job { id: String },
    Apply { id: String },
    PostJob,
    Profile { edit: bool },
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        let command = match name.as_str() {
            "login" => Command::Login {
                username: rest.first().cloned(),
            },
            "register" => Command::Register,
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            "jobs" => {
                let keyword = rest.join(" ");
                Command::Jobs {
                    keyword: Some(keyword).filter(|k| !k.trim().is_empty()),
                }
            }
            "job" => Command::Job {
                id: required_id(rest, "job")?,
            },
            "apply" => Command::Apply {
                id: required_id(rest, "apply")?,
            },
            "post-job" => Command::PostJob,
            "profile" => match rest.first().map(String::as_str) {
                None => Command::Profile { edit: false },
                Some("edit") => Command::Profile { edit: true },
                Some(other) => anyhow::bail!("Unknown profile action: {}", other),
            },
            "help" | "--help" | "-h" => Command::Help,
            other => anyhow::bail!("Unknown command: {}", other),
        };
        Ok(command)
    }
}

fn required_id(rest: &[String], command: &str) -> Result<String> {
    rest.first()
        .filter(|id| !id.trim().is_empty())
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("`{}` needs a job id", command))
}

pub async fn run(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Login { username } => login(app, username).await,
        Command::Register => register(app).await,
        Command::Logout => {
            app.store.logout();
            println!("Signed out.");
            Ok(())
        }
        Command::WhoAmI => {
            whoami(app).await;
            Ok(())
        }
        Command::Jobs { keyword } => list_jobs(app, keyword).await,
        Command::Job { id } => show_job(app, &id).await,
        Command::Apply { id } => apply(app, &id).await,
        Command::PostJob => post_job(app).await,
        Command::Profile { edit } => profile(app, edit).await,
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

// ===== Session =====

async fn login(app: &mut App, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| std::env::var(USERNAME_ENV).ok()) {
        Some(username) => username,
        None => prompt("Username", app.config.last_username.as_deref())?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => password,
        _ => prompt_password("Password")?,
    };

    if username.is_empty() || password.is_empty() {
        anyhow::bail!("Username and password required");
    }

    println!("Signing in...");
    app.store.login(&Credentials::new(username.clone(), password)).await?;

    app.config.last_username = Some(username);
    if let Err(e) = app.config.save() {
        warn!(error = %e, "Failed to save config");
    }

    if let Some(user) = app.store.user() {
        println!("Signed in as {} ({}).", user.username, user.role.display_name());
    }
    Ok(())
}

async fn register(app: &App) -> Result<()> {
    let username = prompt("Username", None)?;
    let email = prompt("Email", None)?;
    let password = prompt_password("Password")?;
    if prompt_password("Confirm password")? != password {
        anyhow::bail!("Passwords do not match");
    }
    let role = parse_role(&prompt("Role (recruiter/job seeker)", Some("job seeker"))?)?;

    app.store
        .register(&Registration {
            username,
            password,
            email,
            role,
        })
        .await?;

    println!("Registration successful. Run `hireboard login` to sign in.");
    Ok(())
}

fn parse_role(input: &str) -> Result<Role> {
    let normalized = input.trim().replace([' ', '-'], "_");
    normalized
        .parse()
        .with_context(|| format!("Choose `recruiter` or `job seeker`, not `{}`", input.trim()))
}

async fn whoami(app: &App) {
    let Some(session) = app.store.session() else {
        println!("Not signed in.");
        return;
    };
    let user = &session.user;

    let email = match app.api().fetch_user(user.id.as_str()).await {
        Ok(details) => details.email,
        Err(e) => {
            warn!(error = %e, "Failed to load account details");
            None
        }
    };

    println!("Username: {}", user.username);
    println!("User id:  {}", user.id);
    println!("Email:    {}", format_optional(&email, "-"));
    println!("Role:     {}", user.role.display_name());
    if let Some(expires_at) = session.expires_at() {
        println!("Token:    {}", format_expiry(expires_at, Utc::now()));
    }

    let menu: Vec<&str> = Route::nav_items(Some(user)).iter().map(Route::title).collect();
    println!("Menu:     {}", menu.join(" | "));
}

// ===== Jobs =====

async fn list_jobs(app: &App, keyword: Option<String>) -> Result<()> {
    let api = app.api();

    let jobs = match keyword {
        Some(ref keyword) => api
            .search_jobs(keyword.trim())
            .await
            .context("Failed to search jobs. Please try again.")?,
        None => api
            .fetch_jobs()
            .await
            .context("Failed to load jobs. Please try again later.")?,
    };

    if jobs.is_empty() {
        println!("No jobs found.");
        return Ok(());
    }

    for job in &jobs {
        println!(
            "{:<26} {:<role_w$} {:<12} {}",
            job.id,
            truncate_string(&job.role, ROLE_COLUMN_WIDTH),
            job.experience_display(),
            truncate_string(&job.skills_display(), SKILLS_COLUMN_WIDTH),
            role_w = ROLE_COLUMN_WIDTH,
        );
    }
    Ok(())
}

async fn show_job(app: &App, id: &str) -> Result<()> {
    let job = app.api().fetch_job(id).await.context("Failed to load job details")?;

    println!("{}", job.role);
    println!("Experience: {}", job.experience_display());
    println!("Skills:     {}", job.skills_display());
    println!();
    println!("{}", single_line(&job.description));

    if app.store.user().is_some_and(|u| u.is_job_seeker()) {
        println!();
        println!("Run `hireboard apply {}` to apply.", job.id);
    }
    Ok(())
}

async fn apply(app: &App, id: &str) -> Result<()> {
    app.require("Applying to a job", &[Role::JobSeeker])?;

    app.api()
        .apply_for_job(id)
        .await
        .context("Failed to apply for the job. Please try again.")?;
    println!("Application submitted.");
    Ok(())
}

async fn post_job(app: &App) -> Result<()> {
    app.guard(Route::PostJob)?;
    let user = app.user()?;

    let role = prompt("Job title", None)?;
    let description = prompt("Description", None)?;
    let experience = prompt("Years of experience", Some("0"))?
        .parse::<u32>()
        .context("Experience must be a whole, non-negative number")?;
    let skill_set = NewJobPosting::parse_skills(&prompt("Skills (comma separated)", None)?);

    let job = NewJobPosting {
        role,
        description,
        experience,
        skill_set,
        recruiter_id: user.id.to_string(),
    };
    job.validate().map_err(anyhow::Error::msg)?;

    let created = app
        .api()
        .create_job(&job)
        .await
        .context("Failed to post job. Please try again.")?;
    println!("Job posted with id {}.", created.id);
    Ok(())
}

// ===== Candidate profile =====

async fn profile(app: &App, edit: bool) -> Result<()> {
    app.guard(Route::Profile)?;
    let user = app.user()?;
    let api = app.api();

    let existing = match api.fetch_profile(user.id.as_str()).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(error = %e, "Failed to load candidate profile");
            None
        }
    };

    if !edit {
        match existing {
            Some(ref profile) => print_profile(profile),
            None => println!("No profile yet. Run `hireboard profile edit` to create one."),
        }
        return Ok(());
    }

    let current = existing.unwrap_or_default();
    let experience_default = current.total_experience.to_string();
    let skills_default = current.skills.join(", ");

    let updated = CandidateProfile {
        id: current.id.clone(),
        user_id: user.id.to_string(),
        full_name: prompt("Full name", Some(&current.full_name))?,
        email: prompt("Email", Some(&current.email))?,
        total_experience: prompt("Years of experience", Some(&experience_default))?
            .parse()
            .context("Experience must be a whole, non-negative number")?,
        skills: NewJobPosting::parse_skills(&prompt("Skills (comma separated)", Some(&skills_default))?),
        resume_url: Some(prompt("Resume URL", current.resume_url.as_deref())?),
    };
    updated.validate().map_err(anyhow::Error::msg)?;

    let saved = api
        .save_profile(&updated)
        .await
        .context("Failed to save profile. Please try again.")?;
    println!("Profile saved.");
    print_profile(&saved);
    Ok(())
}

fn print_profile(profile: &CandidateProfile) {
    println!("Name:       {}", profile.full_name);
    println!("Email:      {}", profile.email);
    println!("Experience: {} years", profile.total_experience);
    println!("Skills:     {}", profile.skills.join(", "));
    println!("Resume:     {}", format_optional(&profile.resume_url, "-"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Help);
        assert_eq!(
            Command::parse(&args(&["login", "alice"])).unwrap(),
            Command::Login {
                username: Some("alice".to_string())
            }
        );
        assert_eq!(
            Command::parse(&args(&["jobs", "rust", "backend"])).unwrap(),
            Command::Jobs {
                keyword: Some("rust backend".to_string())
            }
        );
        assert_eq!(
            Command::parse(&args(&["jobs"])).unwrap(),
            Command::Jobs { keyword: None }
        );
        assert_eq!(
            Command::parse(&args(&["profile", "edit"])).unwrap(),
            Command::Profile { edit: true }
        );
        assert_eq!(
            Command::parse(&args(&["apply", "6650a1"])).unwrap(),
            Command::Apply {
                id: "6650a1".to_string()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse(&args(&["job"])).is_err());
        assert!(Command::parse(&args(&["profile", "delete"])).is_err());
        assert!(Command::parse(&args(&["hire"])).is_err());
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("recruiter").unwrap(), Role::Recruiter);
        assert_eq!(parse_role("Job Seeker").unwrap(), Role::JobSeeker);
        assert_eq!(parse_role("job-seeker").unwrap(), Role::JobSeeker);
        assert!(parse_role("admin").is_err());
    }
}
