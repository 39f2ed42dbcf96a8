use axum::{extract::State, response::Json, Extension};

use crate::models::interview::Interview;
use crate::services::auth_service::Claims;
use crate::AppState;

pub async fn list_interviews(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> crate::error::Result<Json<Vec<Interview>>> {
    let interviews = if claims.role == "recruiter" {
        state
            .interview_service
            .list_for_recruiter(&claims.sub)
            .await?
    } else {
        state
            .interview_service
            .list_for_candidate(&claims.sub)
            .await?
    };
    Ok(Json(interviews))
}
