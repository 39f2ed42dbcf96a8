use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub status: JobStatus,
    pub company: String,
    pub recruiter_id: String,
    pub recruiter_name: String,
    pub created_at: DateTime<Utc>,
    /// URL of an uploaded job-description document, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description_url: Option<String>,
}
