use crate::models::assignment::{Assignment, UNANSWERED};
use crate::models::question::Question;
use serde::Serialize;

/// Aggregate result of grading one answer vector against the question key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamOutcome {
    pub correct_answers: u32,
    pub total_questions: u32,
    /// `round(100 * correct / total)`, 0..=100.
    pub score: u32,
    pub passed: bool,
}

/// Grade an answer vector. Unanswered slots (`-1`) simply count as not
/// correct. Missing trailing answers are treated the same way.
pub fn grade(questions: &[Question], answers: &[i32], passing_score: u32) -> ExamOutcome {
    let total = questions.len() as u32;
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| answers.get(*i).copied().unwrap_or(UNANSWERED) == q.correct_answer)
        .count() as u32;

    let score = if total == 0 {
        0
    } else {
        ((100.0 * correct as f64) / total as f64).round() as u32
    };

    ExamOutcome {
        correct_answers: correct,
        total_questions: total,
        score,
        passed: score >= passing_score,
    }
}

/// One row of the per-question comparison view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionReview {
    pub index: usize,
    pub question: String,
    pub options: Vec<String>,
    /// Selected option index, `-1` if unanswered.
    pub selected: i32,
    pub correct: i32,
    pub is_correct: bool,
    pub answered: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsView {
    pub assignment_id: String,
    pub job_title: String,
    pub candidate_name: String,
    pub duration: u32,
    pub passing_score: u32,
    pub score: u32,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub passed: bool,
    pub questions: Vec<QuestionReview>,
}

/// Pure view of a completed assignment: every question is rendered even when
/// its answer slot is `-1`.
pub fn results_view(assignment: &Assignment) -> ResultsView {
    let answers = assignment.answers.clone().unwrap_or_default();
    let questions = assignment
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let selected = answers.get(i).copied().unwrap_or(UNANSWERED);
            QuestionReview {
                index: i,
                question: q.question.clone(),
                options: q.options.clone(),
                selected,
                correct: q.correct_answer,
                is_correct: selected == q.correct_answer,
                answered: selected != UNANSWERED,
                explanation: q.explanation.clone(),
            }
        })
        .collect();

    let total = assignment.questions.len() as u32;
    ResultsView {
        assignment_id: assignment.id.clone(),
        job_title: assignment.job_title.clone(),
        candidate_name: assignment.candidate_name.clone(),
        duration: assignment.duration,
        passing_score: assignment.passing_score,
        score: assignment.score.unwrap_or(0),
        correct_answers: assignment.correct_answers.unwrap_or(0),
        total_questions: assignment.total_questions.unwrap_or(total),
        passed: assignment.passed.unwrap_or(false),
        questions,
    }
}
