use axum::{
    extract::{Multipart, Path, State},
    response::Json,
    Extension,
};
use validator::Validate;

use crate::dto::job_dto::{CreateJobRequest, UpdateJobStatusRequest};
use crate::error::Error;
use crate::models::job::Job;
use crate::services::auth_service::Claims;
use crate::AppState;

pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateJobRequest>,
) -> crate::error::Result<Json<Job>> {
    req.validate()?;
    let profile = state
        .store
        .get_record::<crate::models::user::UserProfile>(crate::store::collections::USERS, &claims.sub)
        .await?;
    let company = profile
        .and_then(|p| p.company)
        .unwrap_or_else(|| "HireGenius".to_string());

    let job = state
        .job_service
        .create(
            &claims.sub,
            &claims.name,
            &company,
            req.title,
            req.description,
            req.requirements,
        )
        .await?;
    Ok(Json(job))
}

/// Recruiters see their own postings; candidates see every active job.
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Json<Vec<Job>>> {
    let jobs = if claims.role == "recruiter" {
        state.job_service.list_for_recruiter(&claims.sub).await?
    } else {
        state.job_service.list_active().await?
    };
    Ok(Json(jobs))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> crate::error::Result<Json<Job>> {
    Ok(Json(state.job_service.get(&id).await?))
}

pub async fn update_job_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateJobStatusRequest>,
) -> crate::error::Result<Json<Job>> {
    let job = state
        .job_service
        .set_status(&id, &claims.sub, req.status)
        .await?;
    Ok(Json(job))
}

/// Pass-through byte store for the job-description document; only the
/// resulting URL is kept on the job record.
pub async fn upload_job_document(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> crate::error::Result<Json<Job>> {
    let allowed_extensions = ["pdf", "doc", "docx", "txt"];
    let mut stored_url: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("document").to_string();
        let data = field.bytes().await?;
        if data.is_empty() {
            continue;
        }

        let extension = std::path::Path::new(&filename)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        if !allowed_extensions.contains(&extension.as_str()) {
            return Err(Error::BadRequest(format!(
                "file type not allowed, allowed: {}",
                allowed_extensions.join(", ")
            )));
        }

        let uploads_dir = format!("{}/jobs", crate::config::get_config().uploads_dir);
        tokio::fs::create_dir_all(&uploads_dir).await?;
        let saved_name = format!("{}.{}", uuid::Uuid::new_v4(), extension);
        tokio::fs::write(format!("{}/{}", uploads_dir, saved_name), data).await?;
        stored_url = Some(format!("/uploads/jobs/{}", saved_name));
    }

    let url =
        stored_url.ok_or_else(|| Error::BadRequest("no document uploaded".to_string()))?;
    let job = state
        .job_service
        .attach_document(&id, &claims.sub, url)
        .await?;
    Ok(Json(job))
}
