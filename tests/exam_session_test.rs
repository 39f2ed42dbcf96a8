use hiregenius_backend::exam::session::{ExamSession, SessionState, Tick};

fn running_session() -> ExamSession {
    let mut session = ExamSession::new("a1".to_string(), 10, 15);
    assert!(session.start());
    session
}

#[test]
fn start_arms_timer_and_clears_answers() {
    let mut session = ExamSession::new("a1".to_string(), 10, 15);
    assert_eq!(session.state(), SessionState::NotStarted);
    assert!(session.start());
    assert_eq!(session.state(), SessionState::InProgress);
    assert_eq!(session.remaining_seconds(), 15 * 60);
    assert_eq!(session.current_question(), 0);
    assert_eq!(session.answers(), vec![-1; 10]);
    assert_eq!(session.answered_count(), 0);

    // A second start is inert.
    assert!(!session.start());
    assert_eq!(session.remaining_seconds(), 15 * 60);
}

#[test]
fn tick_counts_down_to_expiry() {
    let mut session = running_session();
    for expected in (1..15 * 60).rev() {
        assert_eq!(
            session.tick(),
            Tick::Running {
                remaining_seconds: expected
            }
        );
    }
    assert_eq!(session.tick(), Tick::Expired);
    // Still in progress until the caller forces submission; repeated ticks
    // keep reporting expiry without underflowing.
    assert_eq!(session.state(), SessionState::InProgress);
    assert_eq!(session.tick(), Tick::Expired);
    assert_eq!(session.remaining_seconds(), 0);
}

#[test]
fn tick_is_inert_outside_in_progress() {
    let mut session = ExamSession::new("a1".to_string(), 10, 15);
    assert_eq!(session.tick(), Tick::Idle);

    let mut session = running_session();
    assert!(session.begin_submit());
    assert_eq!(session.tick(), Tick::Idle);
}

#[test]
fn select_answer_targets_current_question_only() {
    let mut session = running_session();
    assert!(session.select_answer(2));
    assert_eq!(session.answers()[0], 2);
    assert_eq!(session.answered_count(), 1);

    // Overwriting the same slot does not advance anything.
    assert!(session.select_answer(3));
    assert_eq!(session.answers()[0], 3);
    assert_eq!(session.current_question(), 0);
    assert_eq!(session.answered_count(), 1);
}

#[test]
fn select_answer_rejects_out_of_range_options() {
    let mut session = running_session();
    assert!(!session.select_answer(4));
    assert!(!session.select_answer(-1));
    assert_eq!(session.answers()[0], -1);
}

#[test]
fn navigation_clamps_at_both_ends() {
    let mut session = running_session();
    assert_eq!(session.previous_question(), 0);

    for expected in 1..10 {
        assert_eq!(session.next_question(), expected);
    }
    // Already on the last question.
    assert_eq!(session.next_question(), 9);

    assert_eq!(session.jump_to(4), 4);
    // Out-of-range jump is a no-op.
    assert_eq!(session.jump_to(10), 4);
}

#[test]
fn jump_preserves_stored_answers() {
    let mut session = running_session();
    assert!(session.select_answer(1));
    session.jump_to(7);
    assert!(session.select_answer(2));
    session.jump_to(0);

    assert_eq!(session.answers()[0], 1);
    assert_eq!(session.answers()[7], 2);
    assert_eq!(session.answered_count(), 2);
}

#[test]
fn begin_submit_is_the_idempotence_guard() {
    let mut session = running_session();
    assert!(session.begin_submit());
    assert_eq!(session.state(), SessionState::Submitting);
    // A racing duplicate submit loses the guard.
    assert!(!session.begin_submit());

    session.complete();
    assert_eq!(session.state(), SessionState::Completed);
    assert!(!session.begin_submit());
}

#[test]
fn abort_submit_returns_the_session_with_answers_intact() {
    let mut session = running_session();
    assert!(session.select_answer(0));
    assert!(session.begin_submit());

    session.abort_submit();
    assert_eq!(session.state(), SessionState::InProgress);
    assert_eq!(session.answers()[0], 0);
    // The candidate can retry.
    assert!(session.begin_submit());
}

#[test]
fn completed_is_terminal() {
    let mut session = running_session();
    assert!(session.begin_submit());
    session.complete();

    session.abort_submit();
    assert_eq!(session.state(), SessionState::Completed);
    assert!(!session.select_answer(1));
    assert_eq!(session.next_question(), 0);
    assert_eq!(session.tick(), Tick::Idle);
}

#[test]
fn select_answer_is_inert_without_question_slots() {
    // A session armed from a record with no questions must refuse the
    // selection instead of indexing an empty answer vector.
    let mut session = ExamSession::new("a1".to_string(), 0, 15);
    assert!(session.start());
    assert!(!session.select_answer(0));
    assert_eq!(session.answered_count(), 0);
    assert_eq!(session.next_question(), 0);
}

#[test]
fn interaction_is_inert_while_submitting() {
    let mut session = running_session();
    assert!(session.begin_submit());
    assert!(!session.select_answer(1));
    assert_eq!(session.next_question(), 0);
    assert_eq!(session.jump_to(5), 0);
}
