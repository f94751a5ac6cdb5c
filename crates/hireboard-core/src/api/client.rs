//! API client for the job board gateway.
//!
//! All services sit behind one gateway: authentication (`/login`,
//! `/register`, `/users`), the job service (`/posts`) and the candidate
//! service (`/candidate`).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{
    CandidateProfile, Credentials, JobPosting, NewJobPosting, Registration, UserDetails,
};

use super::{ApiError, AuthApi, LoginResponse};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the job board.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    initial_backoff_ms: u64,
}

impl ApiClient {
    /// Create a new API client for the gateway at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot carry a path: {}", base_url);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: None,
            initial_backoff_ms: INITIAL_BACKOFF_MS,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
            initial_backoff_ms: self.initial_backoff_ms,
        }
    }

    #[cfg(test)]
    fn with_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.initial_backoff_ms = backoff_ms;
        self
    }

    /// Build an endpoint URL, escaping each path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send a request, retrying with exponential backoff while rate limited.
    async fn send(&self, build: impl Fn() -> RequestBuilder, url: &Url) -> Result<reqwest::Response> {
        let mut retries = 0;
        let mut backoff_ms = self.initial_backoff_ms;

        loop {
            let response = self
                .authorize(build())
                .send()
                .await
                .with_context(|| format!("Failed to send request to {}", url))?;

            if response.status().as_u16() != 429 {
                return Self::check_response(response).await;
            }

            retries += 1;
            if retries > MAX_RATE_LIMIT_RETRIES {
                return Err(ApiError::RateLimited.into());
            }
            warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms *= 2; // Exponential backoff
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.send(|| self.client.get(url.clone()), &url).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<T> {
        let response = self
            .send(|| self.client.post(url.clone()).json(body), &url)
            .await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    // ===== Authentication =====

    /// Exchange credentials for a bearer token
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let url = self.endpoint(&["login"])?;
        let response = self
            .send(|| self.client.post(url.clone()).json(credentials), &url)
            .await?;

        let body = response
            .text()
            .await
            .context("Failed to read login response")?;
        debug!(bytes = body.len(), "Login response received");

        Ok(LoginResponse::parse(&body)?)
    }

    /// Create a new account
    pub async fn register_user(&self, registration: &Registration) -> Result<()> {
        let url = self.endpoint(&["register"])?;
        let response = self
            .send(|| self.client.post(url.clone()).json(registration), &url)
            .await?;

        let body = response.text().await.unwrap_or_default();
        debug!(response = %body.trim(), "Registration accepted");
        Ok(())
    }

    /// Fetch account details by user id
    pub async fn fetch_user(&self, user_id: &str) -> Result<UserDetails> {
        self.get(self.endpoint(&["users", user_id])?).await
    }

    // ===== Job Postings =====

    pub async fn fetch_jobs(&self) -> Result<Vec<JobPosting>> {
        self.get(self.endpoint(&["posts", "all"])?).await
    }

    /// Server-side keyword search over role, description and skills
    pub async fn search_jobs(&self, keyword: &str) -> Result<Vec<JobPosting>> {
        self.get(self.endpoint(&["posts", "search", keyword])?).await
    }

    pub async fn fetch_job(&self, job_id: &str) -> Result<JobPosting> {
        self.get(self.endpoint(&["posts", job_id])?).await
    }

    /// Publish a job posting (recruiters only)
    pub async fn create_job(&self, job: &NewJobPosting) -> Result<JobPosting> {
        self.post(self.endpoint(&["posts", "add"])?, job).await
    }

    /// Apply the current user to a job posting (job seekers only)
    pub async fn apply_for_job(&self, job_id: &str) -> Result<()> {
        let url = self.endpoint(&["posts", "apply", job_id])?;
        let response = self.send(|| self.client.post(url.clone()), &url).await?;

        let body = response.text().await.unwrap_or_default();
        debug!(job_id, response = %body.trim(), "Application submitted");
        Ok(())
    }

    // ===== Candidate Profiles =====

    /// Create or replace the candidate profile
    pub async fn save_profile(&self, profile: &CandidateProfile) -> Result<CandidateProfile> {
        self.post(self.endpoint(&["candidate", "profile"])?, profile).await
    }

    /// Fetch a candidate profile, `None` if the user has not created one yet
    pub async fn fetch_profile(&self, user_id: &str) -> Result<Option<CandidateProfile>> {
        match self.get(self.endpoint(&["candidate", "profile", user_id])?).await {
            Ok(profile) => Ok(Some(profile)),
            Err(e) if e.downcast_ref::<ApiError>().is_some_and(ApiError::is_not_found) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        self.authenticate(credentials).await
    }

    async fn register(&self, registration: &Registration) -> Result<()> {
        self.register_user(registration).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use mockito::Matcher;

    #[test]
    fn test_endpoint_escapes_segments() {
        let api = ApiClient::new("http://localhost:8080/api/").unwrap();
        let url = api.endpoint(&["posts", "search", "rust dev/ops"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/posts/search/rust%20dev%2Fops"
        );

        let api = ApiClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            api.endpoint(&["login"]).unwrap().as_str(),
            "http://localhost:8080/login"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
        assert!(ApiClient::new("mailto:jobs@example.com").is_err());
    }

    #[tokio::test]
    async fn test_authenticate_plain_text_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/login")
            .match_body(Matcher::Json(
                serde_json::json!({"username": "alice", "password": "secret"}),
            ))
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body("aaa.bbb.ccc")
            .create_async()
            .await;

        let api = ApiClient::new(&server.url()).unwrap();
        let response = api
            .authenticate(&Credentials::new("alice", "secret"))
            .await
            .unwrap();

        assert_eq!(response, LoginResponse::Token("aaa.bbb.ccc".to_string()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_authenticate_rejected_credentials() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/login")
            .with_status(401)
            .with_body("Invalid credentials")
            .create_async()
            .await;

        let api = ApiClient::new(&server.url()).unwrap();
        let err = api
            .authenticate(&Credentials::new("alice", "wrong"))
            .await
            .unwrap_err();

        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert!(matches!(api_err, ApiError::Unauthorized(_)));
        assert_eq!(api_err.server_message(), None);
    }

    #[tokio::test]
    async fn test_register_error_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/register")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "Error: Username is already taken!"}"#)
            .create_async()
            .await;

        let api = ApiClient::new(&server.url()).unwrap();
        let registration = Registration {
            username: "alice".to_string(),
            password: "secret".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::JobSeeker,
        };
        let err = api.register_user(&registration).await.unwrap_err();

        assert_eq!(
            err.downcast_ref::<ApiError>().and_then(ApiError::server_message),
            Some("Error: Username is already taken!")
        );
    }

    #[tokio::test]
    async fn test_fetch_jobs_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/posts/all")
            .match_header("authorization", "Bearer t1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"1","role":"Backend Engineer","experience":2,"skillSet":["Rust"]}]"#)
            .create_async()
            .await;

        let api = ApiClient::new(&server.url()).unwrap().with_token("t1".to_string());
        let jobs = api.fetch_jobs().await.unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].role, "Backend Engineer");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_user_details() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/65f0")
            .match_header("authorization", "Bearer t1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"65f0","username":"alice","email":"alice@example.com","role":"job_seeker"}"#)
            .create_async()
            .await;

        let api = ApiClient::new(&server.url()).unwrap().with_token("t1".to_string());
        let details = api.fetch_user("65f0").await.unwrap();

        assert_eq!(details.username, "alice");
        assert_eq!(details.email.as_deref(), Some("alice@example.com"));
        assert_eq!(details.role, Some(Role::JobSeeker));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_profile_not_found_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/candidate/profile/65f0")
            .with_status(404)
            .create_async()
            .await;

        let api = ApiClient::new(&server.url()).unwrap();
        assert!(api.fetch_profile("65f0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up_after_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/posts/all")
            .with_status(429)
            .expect((MAX_RATE_LIMIT_RETRIES + 1) as usize)
            .create_async()
            .await;

        let api = ApiClient::new(&server.url()).unwrap().with_backoff_ms(1);
        let err = api.fetch_jobs().await.unwrap_err();

        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::RateLimited)));
        mock.assert_async().await;
    }
}
