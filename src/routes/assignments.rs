use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use validator::Validate;

use crate::dto::assignment_dto::{
    AnswerRequest, CreateAssignmentRequest, NavigateRequest, SubmitResponse,
};
use crate::error::Error;
use crate::exam::scoring::ResultsView;
use crate::models::assignment::Assignment;
use crate::services::assignment_service::{NavigateAction, SessionView};
use crate::services::auth_service::Claims;
use crate::AppState;

/// Recruiter action: generate a validated question set for the applicant's
/// job and persist the pending assignment. A generation failure creates
/// nothing; the recruiter retries the whole request.
pub async fn create_assignment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateAssignmentRequest>,
) -> crate::error::Result<Json<Assignment>> {
    req.validate()?;
    let application = state.application_service.get(&req.application_id).await?;
    let job = state.job_service.get(&application.job_id).await?;
    if job.recruiter_id != claims.sub {
        return Err(Error::Forbidden(
            "application belongs to another recruiter's job".to_string(),
        ));
    }

    let questions = state
        .question_source
        .generate(&job.title, &job.description, &job.requirements)
        .await?;

    let assignment = state
        .assignment_service
        .create(
            &job,
            &application.candidate_id,
            &application.name,
            &application.email,
            questions,
            req.duration,
            req.passing_score,
        )
        .await?;
    tracing::info!(
        assignment_id = %assignment.id,
        candidate = %assignment.candidate_name,
        "assessment sent"
    );
    Ok(Json(assignment))
}

pub async fn list_assignments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Json<Vec<Assignment>>> {
    let assignments = if claims.role == "recruiter" {
        let job_ids: Vec<String> = state
            .job_service
            .list_for_recruiter(&claims.sub)
            .await?
            .into_iter()
            .map(|j| j.id)
            .collect();
        let mut all = state.assignment_service.list().await?;
        all.retain(|a| job_ids.contains(&a.job_id));
        all
    } else {
        state
            .assignment_service
            .list_for_candidate(&claims.sub)
            .await?
    };
    Ok(Json(assignments))
}

async fn authorize_read(
    state: &AppState,
    claims: &Claims,
    assignment: &Assignment,
) -> crate::error::Result<()> {
    if claims.role == "recruiter" {
        let job = state.job_service.get(&assignment.job_id).await?;
        if job.recruiter_id != claims.sub {
            return Err(Error::Forbidden(
                "assignment belongs to another recruiter's job".to_string(),
            ));
        }
    } else if assignment.candidate_id != claims.sub {
        return Err(Error::Forbidden(
            "assignment belongs to another candidate".to_string(),
        ));
    }
    Ok(())
}

pub async fn get_assignment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> crate::error::Result<Json<Assignment>> {
    let assignment = state.assignment_service.get(&id).await?;
    authorize_read(&state, &claims, &assignment).await?;
    Ok(Json(assignment))
}

pub async fn start_assignment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> crate::error::Result<Json<SessionView>> {
    let view = state.assignment_service.start(&id, &claims.sub).await?;
    Ok(Json(view))
}

pub async fn answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<AnswerRequest>,
) -> crate::error::Result<Json<SessionView>> {
    let view = state
        .assignment_service
        .select_answer(&id, &claims.sub, req.option)?;
    Ok(Json(view))
}

pub async fn navigate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<NavigateRequest>,
) -> crate::error::Result<Json<SessionView>> {
    let action = match req {
        NavigateRequest::Next => NavigateAction::Next,
        NavigateRequest::Previous => NavigateAction::Previous,
        NavigateRequest::Jump { index } => NavigateAction::Jump(index),
    };
    let view = state.assignment_service.navigate(&id, &claims.sub, action)?;
    Ok(Json(view))
}

pub async fn submit_assignment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> crate::error::Result<Json<SubmitResponse>> {
    let (assignment, outcome) = state.assignment_service.submit(&id, &claims.sub).await?;
    Ok(Json(SubmitResponse {
        assignment_id: assignment.id,
        status: assignment.status,
        score: outcome.score,
        passed: outcome.passed,
        correct_answers: outcome.correct_answers,
        total_questions: outcome.total_questions,
    }))
}

pub async fn assignment_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> crate::error::Result<Json<SessionView>> {
    let assignment = state.assignment_service.get(&id).await?;
    authorize_read(&state, &claims, &assignment).await?;
    Ok(Json(state.assignment_service.status(&id).await?))
}

/// Per-question comparison view of a completed assessment, readable by both
/// the candidate and the recruiter.
pub async fn assignment_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> crate::error::Result<Json<ResultsView>> {
    let assignment = state.assignment_service.get(&id).await?;
    authorize_read(&state, &claims, &assignment).await?;
    Ok(Json(state.assignment_service.results(&id).await?))
}
