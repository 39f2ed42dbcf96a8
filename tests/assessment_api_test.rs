use std::env;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{get, patch, post},
    Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use hiregenius_backend::error::Error;
use hiregenius_backend::models::assignment::{Assignment, AssignmentStatus};
use hiregenius_backend::models::job::Job;
use hiregenius_backend::models::question::Question;
use hiregenius_backend::services::auth_service::Claims;
use hiregenius_backend::store::collections;
use hiregenius_backend::store::memory::MemoryBackend;
use hiregenius_backend::{middleware, routes, AppState};

const JWT_SECRET: &str = "test_secret_key";

fn init_test_config() {
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("IDENTITY_API_KEY", "test-identity-key");
    env::set_var("GENERATION_API_KEY", "test-generation-key");
    env::set_var("JWT_SECRET", JWT_SECRET);
    env::set_var("API_RPS", "1000");
    env::set_var("PUBLIC_RPS", "1000");
    // Several tests share the process; only the first init wins.
    let _ = hiregenius_backend::config::init_config();
}

fn mint_token(uid: &str, role: &str, name: &str, email: &str) -> String {
    let claims = Claims {
        sub: uid.to_string(),
        exp: Utc::now().timestamp() as usize + 3600,
        role: role.to_string(),
        name: name.to_string(),
        email: email.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("token")
}

fn app(state: AppState) -> Router {
    let candidate_api = Router::new()
        .route(
            "/api/assignments/:id/start",
            post(routes::assignments::start_assignment),
        )
        .route(
            "/api/assignments/:id/answer",
            patch(routes::assignments::answer),
        )
        .route(
            "/api/assignments/:id/navigate",
            post(routes::assignments::navigate),
        )
        .route(
            "/api/assignments/:id/submit",
            post(routes::assignments::submit_assignment),
        )
        .layer(axum::middleware::from_fn(middleware::auth::require_candidate));

    let shared_api = Router::new()
        .route("/api/assignments", get(routes::assignments::list_assignments))
        .route("/api/assignments/:id", get(routes::assignments::get_assignment))
        .route(
            "/api/assignments/:id/status",
            get(routes::assignments::assignment_status),
        )
        .route(
            "/api/assignments/:id/results",
            get(routes::assignments::assignment_results),
        )
        .route(
            "/api/events/:collection",
            get(routes::events::subscribe_collection),
        )
        .layer(axum::middleware::from_fn(middleware::auth::require_auth));

    candidate_api.merge(shared_api).with_state(state)
}

fn question(index: usize, correct: i32) -> Question {
    Question {
        question: format!("Question {}?", index),
        options: vec![
            "Option A".to_string(),
            "Option B".to_string(),
            "Option C".to_string(),
            "Option D".to_string(),
        ],
        correct_answer: correct,
        explanation: "Because it is.".to_string(),
    }
}

fn ten_questions() -> Vec<Question> {
    (0..10).map(|i| question(i, (i % 4) as i32)).collect()
}

async fn seed_job(state: &AppState) -> Job {
    state
        .job_service
        .create(
            "recruiter-1",
            "Rita Recruiter",
            "Acme",
            "Backend Engineer".to_string(),
            "Own the API layer".to_string(),
            vec!["Rust".to_string(), "SQL".to_string()],
        )
        .await
        .expect("job")
}

async fn seed_assignment(state: &AppState, candidate_id: &str) -> String {
    let job = seed_job(state).await;
    state
        .assignment_service
        .create(
            &job,
            candidate_id,
            "Alice Candidate",
            "alice@example.com",
            ten_questions(),
            15,
            70,
        )
        .await
        .expect("assignment")
        .id
}

fn authed(method: &str, uri: &str, token: &str, body: Option<JsonValue>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token));
    match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn assessment_flow_end_to_end() {
    init_test_config();
    let state = AppState::new(Arc::new(MemoryBackend::new()));
    let id = seed_assignment(&state, "candidate-1").await;
    let app = app(state.clone());

    let candidate = mint_token("candidate-1", "candidate", "Alice", "alice@example.com");
    let recruiter = mint_token("recruiter-1", "recruiter", "Rita", "rita@example.com");

    // Unauthenticated and wrong-role callers are turned away before the
    // handler runs.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/assignments/{}/start", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/assignments/{}/start", id),
            &recruiter,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Start: pending -> in-progress, timer armed.
    let resp = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/assignments/{}/start", id),
            &candidate,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let view = json_body(resp).await;
    assert_eq!(view["status"], "in-progress");
    assert_eq!(view["remainingSeconds"], 15 * 60);
    assert_eq!(view["totalQuestions"], 10);
    assert_eq!(view["answered"], 0);

    // A second start loses against the stored status.
    let resp = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/assignments/{}/start", id),
            &candidate,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Answer question 0 correctly (key is index % 4 = 0).
    let resp = app
        .clone()
        .oneshot(authed(
            "PATCH",
            &format!("/api/assignments/{}/answer", id),
            &candidate,
            Some(json!({ "option": 0 })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let view = json_body(resp).await;
    assert_eq!(view["answers"][0], 0);
    assert_eq!(view["answered"], 1);

    // Out-of-range option is rejected.
    let resp = app
        .clone()
        .oneshot(authed(
            "PATCH",
            &format!("/api/assignments/{}/answer", id),
            &candidate,
            Some(json!({ "option": 4 })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Navigate forward and answer question 1 correctly.
    let resp = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/assignments/{}/navigate", id),
            &candidate,
            Some(json!({ "action": "next" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["currentQuestion"], 1);
    let resp = app
        .clone()
        .oneshot(authed(
            "PATCH",
            &format!("/api/assignments/{}/answer", id),
            &candidate,
            Some(json!({ "option": 1 })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Jump to the last question; earlier answers survive.
    let resp = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/assignments/{}/navigate", id),
            &candidate,
            Some(json!({ "action": "jump", "index": 9 })),
        ))
        .await
        .unwrap();
    let view = json_body(resp).await;
    assert_eq!(view["currentQuestion"], 9);
    assert_eq!(view["answers"][0], 0);
    assert_eq!(view["answers"][1], 1);

    // Live status while in progress.
    let resp = app
        .clone()
        .oneshot(authed(
            "GET",
            &format!("/api/assignments/{}/status", id),
            &recruiter,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "in-progress");

    // Submit with 2/10 correct: score 20, failed.
    let resp = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/assignments/{}/submit", id),
            &candidate,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let outcome = json_body(resp).await;
    assert_eq!(outcome["status"], "completed");
    assert_eq!(outcome["score"], 20);
    assert_eq!(outcome["correctAnswers"], 2);
    assert_eq!(outcome["totalQuestions"], 10);
    assert_eq!(outcome["passed"], false);

    // A duplicate submit is idempotent: same outcome, no second grading.
    let resp = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/assignments/{}/submit", id),
            &candidate,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let repeat = json_body(resp).await;
    assert_eq!(repeat["score"], 20);
    assert_eq!(repeat["status"], "completed");

    // Stored status after completion.
    let resp = app
        .clone()
        .oneshot(authed(
            "GET",
            &format!("/api/assignments/{}/status", id),
            &candidate,
            None,
        ))
        .await
        .unwrap();
    let view = json_body(resp).await;
    assert_eq!(view["status"], "completed");
    assert_eq!(view["answered"], 2);

    // Results render all ten questions for both roles.
    for token in [&candidate, &recruiter] {
        let resp = app
            .clone()
            .oneshot(authed(
                "GET",
                &format!("/api/assignments/{}/results", id),
                token,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let results = json_body(resp).await;
        assert_eq!(results["questions"].as_array().unwrap().len(), 10);
        assert_eq!(results["questions"][0]["isCorrect"], true);
        assert_eq!(results["questions"][9]["answered"], false);
        assert_eq!(results["score"], 20);
    }
}

#[tokio::test]
async fn results_are_unavailable_before_completion() {
    init_test_config();
    let state = AppState::new(Arc::new(MemoryBackend::new()));
    let id = seed_assignment(&state, "candidate-2").await;
    let app = app(state);
    let candidate = mint_token("candidate-2", "candidate", "Bob", "bob@example.com");

    let resp = app
        .clone()
        .oneshot(authed(
            "GET",
            &format!("/api/assignments/{}/results", id),
            &candidate,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Submitting without a running session is a conflict, not a crash.
    let resp = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/assignments/{}/submit", id),
            &candidate,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn sessions_are_scoped_to_their_candidate() {
    init_test_config();
    let state = AppState::new(Arc::new(MemoryBackend::new()));
    let id = seed_assignment(&state, "candidate-3").await;
    let app = app(state);
    let owner = mint_token("candidate-3", "candidate", "Cara", "cara@example.com");
    let intruder = mint_token("candidate-9", "candidate", "Ivan", "ivan@example.com");

    let resp = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/assignments/{}/start", id),
            &intruder,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/assignments/{}/start", id),
            &owner,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Another candidate cannot touch the running session either.
    let resp = app
        .clone()
        .oneshot(authed(
            "PATCH",
            &format!("/api/assignments/{}/answer", id),
            &intruder,
            Some(json!({ "option": 0 })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .clone()
        .oneshot(authed(
            "GET",
            &format!("/api/assignments/{}", id),
            &intruder,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn expired_sessions_are_force_submitted_by_the_clock() {
    init_test_config();
    let state = AppState::new(Arc::new(MemoryBackend::new()));
    let id = seed_assignment(&state, "candidate-4").await;

    state
        .assignment_service
        .start(&id, "candidate-4")
        .await
        .expect("start");
    state
        .assignment_service
        .select_answer(&id, "candidate-4", 0)
        .expect("answer");

    // 15 minutes of server ticks drain the clock and force submission with
    // the answers recorded so far.
    for _ in 0..15 * 60 {
        state.assignment_service.tick_sessions().await;
    }

    let assignment = state.assignment_service.get(&id).await.expect("get");
    assert!(assignment.is_completed());
    assert_eq!(assignment.score, Some(10));
    assert_eq!(assignment.correct_answers, Some(1));
    assert_eq!(assignment.passed, Some(false));
    assert_eq!(assignment.answers.as_deref(), Some(&[0, -1, -1, -1, -1, -1, -1, -1, -1, -1][..]));
}

#[tokio::test]
async fn stale_sessions_are_discarded_after_external_completion() {
    init_test_config();
    let state = AppState::new(Arc::new(MemoryBackend::new()));
    let id = seed_assignment(&state, "candidate-8").await;
    state
        .assignment_service
        .start(&id, "candidate-8")
        .await
        .expect("start");
    state
        .assignment_service
        .select_answer(&id, "candidate-8", 1)
        .expect("answer");

    // Another writer (a second instance, or the legacy web client) completes
    // the record out of band.
    let mut assignment: Assignment = state.assignment_service.get(&id).await.expect("get");
    assignment.status = AssignmentStatus::Completed;
    assignment.completed_at = Some(Utc::now());
    assignment.answers = Some(vec![-1; 10]);
    assignment.score = Some(0);
    assignment.passed = Some(false);
    assignment.correct_answers = Some(0);
    assignment.total_questions = Some(10);
    state
        .store
        .put_record(collections::ASSIGNMENTS, &id, &assignment)
        .await
        .expect("external write");

    // Drain the clock and then some: the forced submission loses the race
    // exactly once and the session is dropped rather than revived.
    for _ in 0..15 * 60 + 5 {
        state.assignment_service.tick_sessions().await;
    }

    // No registry entry remains, so the candidate cannot keep mutating
    // answers on a completed assignment.
    let err = state.assignment_service.select_answer(&id, "candidate-8", 2);
    assert!(matches!(err, Err(Error::NotFound(_))));

    // The externally written outcome is untouched.
    let stored = state.assignment_service.get(&id).await.expect("get");
    assert_eq!(stored.score, Some(0));
    assert_eq!(stored.answers, Some(vec![-1; 10]));
}

#[tokio::test]
async fn assignments_require_a_full_question_set() {
    init_test_config();
    let state = AppState::new(Arc::new(MemoryBackend::new()));
    let job = seed_job(&state).await;

    let short: Vec<Question> = (0..9).map(|i| question(i, 0)).collect();
    let err = state
        .assignment_service
        .create(&job, "candidate-7", "Dan", "dan@example.com", short, 15, 70)
        .await;
    assert!(matches!(err, Err(Error::BadRequest(_))));

    let long: Vec<Question> = (0..11).map(|i| question(i, 0)).collect();
    let err = state
        .assignment_service
        .create(&job, "candidate-7", "Dan", "dan@example.com", long, 15, 70)
        .await;
    assert!(matches!(err, Err(Error::BadRequest(_))));
}

#[tokio::test]
async fn short_question_records_cannot_be_started() {
    init_test_config();
    let state = AppState::new(Arc::new(MemoryBackend::new()));
    let job = seed_job(&state).await;

    // A record some other client stored without its question set.
    let assignment = Assignment {
        id: "broken-1".to_string(),
        job_id: job.id.clone(),
        job_title: job.title.clone(),
        job_description: job.description.clone(),
        candidate_id: "candidate-7".to_string(),
        candidate_name: "Dan".to_string(),
        candidate_email: "dan@example.com".to_string(),
        questions: Vec::new(),
        duration: 15,
        passing_score: 70,
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
    state
        .store
        .put_record(collections::ASSIGNMENTS, &assignment.id, &assignment)
        .await
        .expect("external write");

    let err = state.assignment_service.start("broken-1", "candidate-7").await;
    assert!(matches!(err, Err(Error::Persistence(_))));
    // The record never left pending.
    let stored = state.assignment_service.get("broken-1").await.expect("get");
    assert_eq!(stored.status, AssignmentStatus::Pending);
}

#[tokio::test]
async fn events_feed_serves_known_collections_only() {
    init_test_config();
    let state = AppState::new(Arc::new(MemoryBackend::new()));
    let app = app(state);
    let token = mint_token("candidate-5", "candidate", "Eve", "eve@example.com");

    let resp = app
        .clone()
        .oneshot(authed("GET", "/api/events/assignments", &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/event-stream"));

    let resp = app
        .clone()
        .oneshot(authed("GET", "/api/events/nonsense", &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Profile snapshots carry contact details and stay recruiter-only.
    let resp = app
        .clone()
        .oneshot(authed("GET", "/api/events/users", &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let recruiter = mint_token("recruiter-1", "recruiter", "Rita", "rita@example.com");
    let resp = app
        .clone()
        .oneshot(authed("GET", "/api/events/users", &recruiter, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
