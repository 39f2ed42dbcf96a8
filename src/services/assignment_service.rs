use crate::error::{Error, Result};
use crate::exam::scoring::{self, ExamOutcome, ResultsView};
use crate::exam::session::{ExamSession, SessionState, Tick};
use crate::models::assignment::{validate_exam_params, Assignment, AssignmentStatus};
use crate::models::job::Job;
use crate::models::question::{Question, QUESTIONS_PER_ASSIGNMENT};
use crate::store::client::StoreClient;
use crate::store::collections;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Snapshot of a live exam session handed to the exam view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub assignment_id: String,
    pub status: AssignmentStatus,
    pub remaining_seconds: u32,
    pub current_question: usize,
    pub answers: Vec<i32>,
    pub answered: usize,
    pub total_questions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateAction {
    Next,
    Previous,
    Jump(usize),
}

/// Owns the assignment lifecycle: pending records created from generated
/// questions, the in-process registry of running exam sessions, and the
/// compare-and-swap transitions in and out of `InProgress`. The one-second
/// tick and the deadline are driven here, server-side, so an abandoned
/// browser cannot leave an assignment in progress past its deadline.
struct SessionEntry {
    candidate_id: String,
    session: ExamSession,
}

#[derive(Clone)]
pub struct AssignmentService {
    store: StoreClient,
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
}

impl AssignmentService {
    pub fn new(store: StoreClient) -> Self {
        Self {
            store,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Persist a new pending assignment for a job/candidate pairing. The
    /// questions are expected to have passed Question Source validation;
    /// nothing here patches partial sets.
    pub async fn create(
        &self,
        job: &Job,
        candidate_id: &str,
        candidate_name: &str,
        candidate_email: &str,
        questions: Vec<Question>,
        duration: u32,
        passing_score: u32,
    ) -> Result<Assignment> {
        validate_exam_params(duration, passing_score).map_err(Error::BadRequest)?;
        if questions.len() != QUESTIONS_PER_ASSIGNMENT {
            return Err(Error::BadRequest(format!(
                "expected exactly {} questions, got {}",
                QUESTIONS_PER_ASSIGNMENT,
                questions.len()
            )));
        }

        let assignment = Assignment {
            id: StoreClient::push_id(),
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            job_description: job.description.clone(),
            candidate_id: candidate_id.to_string(),
            candidate_name: candidate_name.to_string(),
            candidate_email: candidate_email.to_string(),
            questions,
            duration,
            passing_score,
            status: AssignmentStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            answers: None,
            score: None,
            passed: None,
            correct_answers: None,
            total_questions: None,
        };

        self.store
            .put_record(collections::ASSIGNMENTS, &assignment.id, &assignment)
            .await?;
        Ok(assignment)
    }

    pub async fn get(&self, id: &str) -> Result<Assignment> {
        self.store
            .get_record(collections::ASSIGNMENTS, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("assignment {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<Assignment>> {
        self.store.list(collections::ASSIGNMENTS).await
    }

    pub async fn list_for_candidate(&self, candidate_id: &str) -> Result<Vec<Assignment>> {
        let mut assignments: Vec<Assignment> = self.list().await?;
        assignments.retain(|a| a.candidate_id == candidate_id);
        Ok(assignments)
    }

    /// `Pending -> InProgress`: records the start timestamp with a guarded
    /// write and registers the live session. Exactly one caller wins a race
    /// here; the loser gets `Conflict`.
    pub async fn start(&self, id: &str, candidate_id: &str) -> Result<SessionView> {
        let (mut assignment, etag) = self
            .store
            .get_versioned_record::<Assignment>(collections::ASSIGNMENTS, id)
            .await?;

        if assignment.candidate_id != candidate_id {
            return Err(Error::Forbidden(
                "assignment belongs to another candidate".to_string(),
            ));
        }
        if assignment.status != AssignmentStatus::Pending {
            return Err(Error::Conflict(format!(
                "assignment is {}, not pending",
                assignment.status
            )));
        }
        // A record another writer stored with a short question set must not
        // reach a live session.
        if assignment.questions.len() != QUESTIONS_PER_ASSIGNMENT {
            return Err(Error::Persistence(format!(
                "assignment {} carries {} questions, expected {}",
                id,
                assignment.questions.len(),
                QUESTIONS_PER_ASSIGNMENT
            )));
        }

        assignment.status = AssignmentStatus::InProgress;
        assignment.started_at = Some(Utc::now());

        let written = self
            .store
            .put_record_if_match(collections::ASSIGNMENTS, id, &etag, &assignment)
            .await?;
        if !written {
            return Err(Error::Conflict(
                "assignment was updated concurrently".to_string(),
            ));
        }

        let mut session = ExamSession::new(
            assignment.id.clone(),
            assignment.questions.len(),
            assignment.duration,
        );
        session.start();
        let view = Self::view_of(&session);
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .insert(
                assignment.id.clone(),
                SessionEntry {
                    candidate_id: candidate_id.to_string(),
                    session,
                },
            );

        tracing::info!(assignment_id = %id, duration = assignment.duration, "exam started");
        Ok(view)
    }

    /// Record the selected option for the currently displayed question.
    pub fn select_answer(&self, id: &str, candidate_id: &str, option: i32) -> Result<SessionView> {
        self.with_session(id, candidate_id, |session| {
            if !session.select_answer(option) {
                return Err(Error::BadRequest(format!(
                    "option {} cannot be selected now",
                    option
                )));
            }
            Ok(Self::view_of(session))
        })
    }

    /// Change which question is displayed. Never touches the timer or the
    /// answer vector; out-of-range moves are no-ops.
    pub fn navigate(
        &self,
        id: &str,
        candidate_id: &str,
        action: NavigateAction,
    ) -> Result<SessionView> {
        self.with_session(id, candidate_id, |session| {
            match action {
                NavigateAction::Next => session.next_question(),
                NavigateAction::Previous => session.previous_question(),
                NavigateAction::Jump(index) => session.jump_to(index),
            };
            Ok(Self::view_of(session))
        })
    }

    /// Explicit submission by the candidate.
    pub async fn submit(&self, id: &str, candidate_id: &str) -> Result<(Assignment, ExamOutcome)> {
        let assignment = self.get(id).await?;
        if assignment.candidate_id != candidate_id {
            return Err(Error::Forbidden(
                "assignment belongs to another candidate".to_string(),
            ));
        }
        self.finish(id).await
    }

    /// Status for either role: live session numbers while running, stored
    /// outcome afterwards.
    pub async fn status(&self, id: &str) -> Result<SessionView> {
        {
            let sessions = self.sessions.lock().expect("session registry lock poisoned");
            if let Some(entry) = sessions.get(id) {
                if entry.session.state() != SessionState::Completed {
                    return Ok(Self::view_of(&entry.session));
                }
            }
        }
        let assignment = self.get(id).await?;
        Ok(SessionView {
            assignment_id: assignment.id.clone(),
            status: assignment.status,
            remaining_seconds: 0,
            current_question: 0,
            answered: assignment
                .answers
                .as_ref()
                .map(|a| a.iter().filter(|x| **x != -1).count())
                .unwrap_or(0),
            total_questions: assignment.questions.len(),
            answers: assignment.answers.unwrap_or_default(),
        })
    }

    /// Per-question comparison of a completed assignment. Pure read.
    pub async fn results(&self, id: &str) -> Result<ResultsView> {
        let assignment = self.get(id).await?;
        if !assignment.is_completed() {
            return Err(Error::Conflict(format!(
                "assignment is {}, results exist only once completed",
                assignment.status
            )));
        }
        Ok(scoring::results_view(&assignment))
    }

    /// One wall-clock second for every registered session. Sessions whose
    /// time hit zero are force-submitted with whatever answers exist.
    pub async fn tick_sessions(&self) {
        let expired: Vec<String> = {
            let mut sessions = self.sessions.lock().expect("session registry lock poisoned");
            sessions
                .iter_mut()
                .filter_map(|(id, entry)| match entry.session.tick() {
                    Tick::Expired => Some(id.clone()),
                    _ => None,
                })
                .collect()
        };

        for id in expired {
            tracing::info!(assignment_id = %id, "exam time expired, forcing submission");
            if let Err(e) = self.finish(&id).await {
                tracing::error!(assignment_id = %id, error = %e, "forced submission failed");
            }
        }
    }

    /// Shared `InProgress -> Submitting -> Completed` path for explicit and
    /// timeout-forced submission. Idempotent: once completed, repeat calls
    /// return the stored outcome unchanged. On a failed store write the
    /// session returns to `InProgress` with its answers intact.
    async fn finish(&self, id: &str) -> Result<(Assignment, ExamOutcome)> {
        let answers = {
            let mut sessions = self.sessions.lock().expect("session registry lock poisoned");
            match sessions.get_mut(id) {
                // begin_submit is the idempotence guard: a session already
                // submitting or completed falls through to the stored record.
                Some(entry) => {
                    if entry.session.begin_submit() {
                        Some(entry.session.answers().to_vec())
                    } else {
                        None
                    }
                }
                None => None,
            }
        };

        let Some(answers) = answers else {
            let assignment = self.get(id).await?;
            return match assignment.status {
                AssignmentStatus::Completed => {
                    let outcome = ExamOutcome {
                        correct_answers: assignment.correct_answers.unwrap_or(0),
                        total_questions: assignment.total_questions.unwrap_or(0),
                        score: assignment.score.unwrap_or(0),
                        passed: assignment.passed.unwrap_or(false),
                    };
                    Ok((assignment, outcome))
                }
                _ => Err(Error::Conflict(
                    "no running session for this assignment".to_string(),
                )),
            };
        };

        let result = self.persist_outcome(id, &answers).await;
        let mut sessions = self.sessions.lock().expect("session registry lock poisoned");
        match result {
            Ok(outcome) => {
                if let Some(entry) = sessions.get_mut(id) {
                    entry.session.complete();
                }
                sessions.remove(id);
                Ok(outcome)
            }
            Err(e @ Error::Conflict(_)) => {
                // The record already left InProgress through another writer;
                // this session is stale and must not come back to life.
                sessions.remove(id);
                Err(e)
            }
            Err(e) => {
                // Keep the answers; the candidate may retry.
                if let Some(entry) = sessions.get_mut(id) {
                    entry.session.abort_submit();
                }
                Err(e)
            }
        }
    }

    /// One atomic, CAS-guarded update carrying the whole outcome. At most
    /// one writer ever moves a record out of `InProgress`.
    async fn persist_outcome(
        &self,
        id: &str,
        answers: &[i32],
    ) -> Result<(Assignment, ExamOutcome)> {
        let (mut assignment, etag) = self
            .store
            .get_versioned_record::<Assignment>(collections::ASSIGNMENTS, id)
            .await?;

        if assignment.status != AssignmentStatus::InProgress {
            return Err(Error::Conflict(format!(
                "assignment is {}, not in-progress",
                assignment.status
            )));
        }

        let outcome = scoring::grade(&assignment.questions, answers, assignment.passing_score);

        assignment.status = AssignmentStatus::Completed;
        assignment.completed_at = Some(Utc::now());
        assignment.answers = Some(answers.to_vec());
        assignment.score = Some(outcome.score);
        assignment.passed = Some(outcome.passed);
        assignment.correct_answers = Some(outcome.correct_answers);
        assignment.total_questions = Some(outcome.total_questions);

        let written = self
            .store
            .put_record_if_match(collections::ASSIGNMENTS, id, &etag, &assignment)
            .await?;
        if !written {
            return Err(Error::Conflict(
                "assignment was completed by another session".to_string(),
            ));
        }

        tracing::info!(
            assignment_id = %id,
            score = outcome.score,
            passed = outcome.passed,
            "exam completed"
        );
        Ok((assignment, outcome))
    }

    fn with_session<T>(
        &self,
        id: &str,
        candidate_id: &str,
        f: impl FnOnce(&mut ExamSession) -> Result<T>,
    ) -> Result<T> {
        let mut sessions = self.sessions.lock().expect("session registry lock poisoned");
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("no running session for assignment {}", id)))?;
        if entry.candidate_id != candidate_id {
            return Err(Error::Forbidden(
                "assignment belongs to another candidate".to_string(),
            ));
        }
        f(&mut entry.session)
    }

    fn view_of(session: &ExamSession) -> SessionView {
        let status = match session.state() {
            SessionState::NotStarted => AssignmentStatus::Pending,
            SessionState::InProgress | SessionState::Submitting => AssignmentStatus::InProgress,
            SessionState::Completed => AssignmentStatus::Completed,
        };
        SessionView {
            assignment_id: session.assignment_id().to_string(),
            status,
            remaining_seconds: session.remaining_seconds(),
            current_question: session.current_question(),
            answers: session.answers().to_vec(),
            answered: session.answered_count(),
            total_questions: session.answers().len(),
        }
    }
}
