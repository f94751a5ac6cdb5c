use serde::{Deserialize, Serialize};

/// A job seeker's professional profile. One per user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub total_experience: u32,
    #[serde(default)]
    pub skills: Vec<String>,
    pub resume_url: Option<String>,
}

impl CandidateProfile {
    /// Form validation, mirroring what the server expects
    pub fn validate(&self) -> Result<(), &'static str> {
        let resume_missing = self
            .resume_url
            .as_deref()
            .map_or(true, |url| url.trim().is_empty());
        if self.full_name.trim().is_empty() || self.email.trim().is_empty() || resume_missing {
            return Err("Please fill in all fields");
        }
        if self.skills.is_empty() {
            return Err("Please enter at least one skill");
        }
        Ok(())
    }
}
