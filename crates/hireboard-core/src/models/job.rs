use serde::{Deserialize, Serialize};

/// A job posting as stored by the job service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub experience: u32,
    #[serde(rename = "skillSet", default)]
    pub skill_set: Vec<String>,
    #[serde(rename = "recruiterId")]
    pub recruiter_id: Option<String>,
}

impl JobPosting {
    /// Required experience for display
    pub fn experience_display(&self) -> String {
        match self.experience {
            0 => "Entry level".to_string(),
            1 => "1 year".to_string(),
            n => format!("{} years", n),
        }
    }

    pub fn skills_display(&self) -> String {
        if self.skill_set.is_empty() {
            "-".to_string()
        } else {
            self.skill_set.join(", ")
        }
    }
}

/// Request body for `POST /posts/add`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJobPosting {
    pub role: String,
    pub description: String,
    pub experience: u32,
    #[serde(rename = "skillSet")]
    pub skill_set: Vec<String>,
    #[serde(rename = "recruiterId")]
    pub recruiter_id: String,
}

impl NewJobPosting {
    /// Form validation, mirroring what the server expects
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.role.trim().is_empty() || self.description.trim().is_empty() {
            return Err("Please fill in all fields");
        }
        if self.skill_set.is_empty() {
            return Err("Please enter at least one skill");
        }
        Ok(())
    }

    /// Split a comma separated skill list, dropping blanks
    pub fn parse_skills(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_posting() {
        let json = r#"{"id":"6650a1","role":"Backend Engineer","description":"Build APIs","experience":3,"skillSet":["Java","Spring"],"recruiterId":"65f0"}"#;
        let job: JobPosting = serde_json::from_str(json).unwrap();
        assert_eq!(job.role, "Backend Engineer");
        assert_eq!(job.skill_set, vec!["Java", "Spring"]);
        assert_eq!(job.recruiter_id.as_deref(), Some("65f0"));
        assert_eq!(job.experience_display(), "3 years");
        assert_eq!(job.skills_display(), "Java, Spring");
    }

    #[test]
    fn test_parse_job_posting_sparse() {
        let job: JobPosting = serde_json::from_str(r#"{"id":"1","role":"Intern"}"#).unwrap();
        assert_eq!(job.experience_display(), "Entry level");
        assert_eq!(job.skills_display(), "-");
        assert!(job.recruiter_id.is_none());
    }

    #[test]
    fn test_new_job_validation() {
        let mut job = NewJobPosting {
            role: "Backend Engineer".to_string(),
            description: "Build APIs".to_string(),
            experience: 2,
            skill_set: vec!["Rust".to_string()],
            recruiter_id: "65f0".to_string(),
        };
        assert!(job.validate().is_ok());

        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["recruiterId"], "65f0");
        assert_eq!(json["skillSet"][0], "Rust");

        job.skill_set.clear();
        assert_eq!(job.validate(), Err("Please enter at least one skill"));

        job.description = "  ".to_string();
        assert_eq!(job.validate(), Err("Please fill in all fields"));
    }

    #[test]
    fn test_parse_skills() {
        assert_eq!(
            NewJobPosting::parse_skills(" Rust, SQL ,,Docker "),
            vec!["Rust", "SQL", "Docker"]
        );
        assert!(NewJobPosting::parse_skills("  ").is_empty());
    }
}
