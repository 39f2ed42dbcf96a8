use crate::models::question::Question;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Answer slot value meaning "no option selected".
pub const UNANSWERED: i32 = -1;

pub const MIN_DURATION_MINUTES: u32 = 15;
pub const MAX_DURATION_MINUTES: u32 = 120;
pub const MIN_PASSING_SCORE: u32 = 50;
pub const MAX_PASSING_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::InProgress => "in-progress",
            AssignmentStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// A candidate-specific skill-assessment record combining generated
/// questions, timing, and outcome. Written exclusively by the candidate's
/// session during its `InProgress` window; read by both roles at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub job_id: String,
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
    pub candidate_id: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub questions: Vec<Question>,
    /// Minutes, 15..=120.
    pub duration: u32,
    /// Percentage, 50..=100.
    pub passing_score: u32,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// One selected-option index per question, `-1` = unanswered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<i32>>,
    /// 0..=100, present iff status is completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<u32>,
}

impl Assignment {
    pub fn is_completed(&self) -> bool {
        self.status == AssignmentStatus::Completed
    }
}

/// Range checks on recruiter-supplied exam parameters.
pub fn validate_exam_params(duration: u32, passing_score: u32) -> std::result::Result<(), String> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration) {
        return Err(format!(
            "duration must be {}..={} minutes",
            MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
        ));
    }
    if !(MIN_PASSING_SCORE..=MAX_PASSING_SCORE).contains(&passing_score) {
        return Err(format!(
            "passing score must be {}..={} percent",
            MIN_PASSING_SCORE, MAX_PASSING_SCORE
        ));
    }
    Ok(())
}
