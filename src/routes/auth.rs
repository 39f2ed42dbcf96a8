use axum::{extract::State, response::Json};
use validator::Validate;

use crate::dto::auth_dto::{AuthResponse, LoginRequest, SignupRequest};
use crate::AppState;

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> crate::error::Result<Json<AuthResponse>> {
    req.validate()?;
    let session = state
        .auth_service
        .sign_up(
            &req.email,
            &req.password,
            &req.name,
            req.user_type,
            req.company,
            req.phone,
        )
        .await?;
    tracing::info!(uid = %session.profile.uid, role = ?session.profile.user_type, "account created");
    Ok(Json(AuthResponse {
        token: session.token,
        uid: session.profile.uid,
        name: session.profile.name,
        email: session.profile.email,
        user_type: session.profile.user_type,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> crate::error::Result<Json<AuthResponse>> {
    req.validate()?;
    let session = state.auth_service.sign_in(&req.email, &req.password).await?;
    Ok(Json(AuthResponse {
        token: session.token,
        uid: session.profile.uid,
        name: session.profile.name,
        email: session.profile.email,
        user_type: session.profile.user_type,
    }))
}
