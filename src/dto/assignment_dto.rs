use crate::models::assignment::AssignmentStatus;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Recruiter request: generate questions for the job and send the resulting
/// assessment to the applicant.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    #[validate(length(min = 1))]
    pub application_id: String,
    /// Minutes, 15..=120.
    #[serde(default = "default_duration")]
    pub duration: u32,
    /// Percent, 50..=100.
    #[serde(default = "default_passing_score")]
    pub passing_score: u32,
}

fn default_duration() -> u32 {
    30
}

fn default_passing_score() -> u32 {
    70
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRequest {
    /// Option index for the currently displayed question.
    pub option: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum NavigateRequest {
    Next,
    Previous,
    Jump { index: usize },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub assignment_id: String,
    pub status: AssignmentStatus,
    pub score: u32,
    pub passed: bool,
    pub correct_answers: u32,
    pub total_questions: u32,
}
