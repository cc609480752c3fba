//! Recruiter profile routes (public view and the student's own view).

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::Role;
use crate::services::RecruiterProfile;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/public/students/{student_id}/profile", get(public_profile))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/profile", get(own_profile))
}

async fn public_profile(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<Json<RecruiterProfile>> {
    Ok(Json(state.profiles.recruiter_profile(&student_id).await?))
}

async fn own_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RecruiterProfile>> {
    user.require(&[Role::Student])?;
    Ok(Json(state.profiles.recruiter_profile(&user.user_id).await?))
}
