use crate::models::assignment::UNANSWERED;
use crate::models::question::OPTIONS_PER_QUESTION;

/// Lifecycle of one candidate's timed exam.
///
/// `Completed` is terminal; no transition leaves it. `Submitting` exists so
/// that a failed persistence write can hand the session back to the candidate
/// without losing answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Submitting,
    Completed,
}

/// Outcome of one clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Session is not running; the tick was inert.
    Idle,
    Running {
        remaining_seconds: u32,
    },
    /// Remaining time hit zero. The caller must force submission with
    /// whatever answers exist.
    Expired,
}

/// The exam state machine, kept pure: every side effect (start
/// timestamp, submission write) belongs to the caller. One instance per
/// active assignment, driven by a single one-second tick.
#[derive(Debug, Clone)]
pub struct ExamSession {
    assignment_id: String,
    total_questions: usize,
    duration_minutes: u32,
    state: SessionState,
    remaining_seconds: u32,
    current_question: usize,
    answers: Vec<i32>,
}

impl ExamSession {
    pub fn new(assignment_id: String, total_questions: usize, duration_minutes: u32) -> Self {
        Self {
            assignment_id,
            total_questions,
            duration_minutes,
            state: SessionState::NotStarted,
            remaining_seconds: 0,
            current_question: 0,
            answers: Vec::new(),
        }
    }

    pub fn assignment_id(&self) -> &str {
        &self.assignment_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn current_question(&self) -> usize {
        self.current_question
    }

    pub fn answers(&self) -> &[i32] {
        &self.answers
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| **a != UNANSWERED).count()
    }

    /// `NotStarted -> InProgress`: arm the timer and reset the answer vector
    /// to all-unanswered. Returns false if the session already left
    /// `NotStarted`.
    pub fn start(&mut self) -> bool {
        if self.state != SessionState::NotStarted {
            return false;
        }
        self.state = SessionState::InProgress;
        self.remaining_seconds = self.duration_minutes * 60;
        self.answers = vec![UNANSWERED; self.total_questions];
        self.current_question = 0;
        true
    }

    /// One second elapsed. Inert unless `InProgress`.
    pub fn tick(&mut self) -> Tick {
        if self.state != SessionState::InProgress {
            return Tick::Idle;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            Tick::Expired
        } else {
            Tick::Running {
                remaining_seconds: self.remaining_seconds,
            }
        }
    }

    /// Overwrite the answer slot of the currently displayed question. Does
    /// not advance the question pointer. Inert outside `InProgress` or for an
    /// out-of-range option index.
    pub fn select_answer(&mut self, option: i32) -> bool {
        if self.state != SessionState::InProgress {
            return false;
        }
        if option < 0 || option as usize >= OPTIONS_PER_QUESTION {
            return false;
        }
        match self.answers.get_mut(self.current_question) {
            Some(slot) => {
                *slot = option;
                true
            }
            None => false,
        }
    }

    /// Forward navigation, a no-op on the last question.
    pub fn next_question(&mut self) -> usize {
        if self.state == SessionState::InProgress
            && self.current_question + 1 < self.total_questions
        {
            self.current_question += 1;
        }
        self.current_question
    }

    /// Backward navigation, a no-op on the first question.
    pub fn previous_question(&mut self) -> usize {
        if self.state == SessionState::InProgress && self.current_question > 0 {
            self.current_question -= 1;
        }
        self.current_question
    }

    /// Jump straight to a question index; out-of-range jumps are ignored.
    pub fn jump_to(&mut self, index: usize) -> usize {
        if self.state == SessionState::InProgress && index < self.total_questions {
            self.current_question = index;
        }
        self.current_question
    }

    /// `InProgress -> Submitting`. The idempotence guard: returns false once
    /// the session already left `InProgress`, so a duplicate submit (second
    /// click, racing timeout) is inert.
    pub fn begin_submit(&mut self) -> bool {
        if self.state != SessionState::InProgress {
            return false;
        }
        self.state = SessionState::Submitting;
        true
    }

    /// The persistence write failed; hand the session back so the candidate
    /// can retry without losing answers.
    pub fn abort_submit(&mut self) {
        if self.state == SessionState::Submitting {
            self.state = SessionState::InProgress;
        }
    }

    /// `Submitting -> Completed`. Terminal.
    pub fn complete(&mut self) {
        if self.state == SessionState::Submitting {
            self.state = SessionState::Completed;
        }
    }
}
