use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use validator::Validate;

use crate::dto::application_dto::{ApplyRequest, UpdateApplicationStatusRequest};
use crate::error::Error;
use crate::models::application::Application;
use crate::models::job::JobStatus;
use crate::services::auth_service::Claims;
use crate::AppState;

pub async fn apply(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ApplyRequest>,
) -> crate::error::Result<Json<Application>> {
    req.validate()?;
    let job = state.job_service.get(&req.job_id).await?;
    if job.status != JobStatus::Active {
        return Err(Error::BadRequest("job is no longer active".to_string()));
    }

    let application = state
        .application_service
        .apply(
            &job,
            &claims.sub,
            &claims.name,
            &claims.email,
            req.phone,
            req.skills,
            req.experience,
            req.location,
            req.resume_url,
        )
        .await?;
    tracing::info!(application_id = %application.id, job_id = %job.id, "application received");
    Ok(Json(application))
}

/// Recruiters see applicants to their jobs; candidates see their own
/// applications.
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Json<Vec<Application>>> {
    let applications = if claims.role == "recruiter" {
        let job_ids: Vec<String> = state
            .job_service
            .list_for_recruiter(&claims.sub)
            .await?
            .into_iter()
            .map(|j| j.id)
            .collect();
        state.application_service.list_for_jobs(&job_ids).await?
    } else {
        state
            .application_service
            .list_for_candidate(&claims.sub)
            .await?
    };
    Ok(Json(applications))
}

pub async fn update_application_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateApplicationStatusRequest>,
) -> crate::error::Result<Json<Application>> {
    let application = state.application_service.get(&id).await?;
    let job = state.job_service.get(&application.job_id).await?;
    if job.recruiter_id != claims.sub {
        return Err(Error::Forbidden(
            "application belongs to another recruiter's job".to_string(),
        ));
    }

    let updated = state
        .application_service
        .update_status(&id, &job, req.status, &state.interview_service)
        .await?;
    Ok(Json(updated))
}
