/// Project endpoints
///
/// All routes require authentication. Reads and updates are limited to
/// members; a non-member sees the project as missing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::models::membership::MemberView;
use taskboard_shared::models::project::ProjectSummary;
use taskboard_shared::services::projects::{MemberAssignment, ProjectDetail, ProjectPatch};
use taskboard_shared::validation::not_blank;
use validator::Validate;

use super::CreatedResponse;
use crate::{
    app::AppState,
    error::ApiResult,
    middleware::auth::AuthContext,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(
        length(min = 1, max = 100, message = "Title must be 1 to 100 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: String,
}

/// Complete desired member list
#[derive(Debug, Deserialize)]
pub struct UpdateMembersRequest {
    pub members: Vec<MemberAssignment>,
}

/// Create a project; the caller becomes its SuperAdmin
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    req.validate()?;

    let project = state
        .projects
        .create(&req.title, &req.description, auth.user_id())
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: project.id })))
}

/// Projects the caller belongs to
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectSummary>>> {
    Ok(Json(state.projects.list_for_user(auth.user_id()).await?))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ProjectDetail>> {
    Ok(Json(state.projects.get_for_user(id, auth.user_id()).await?))
}

/// Update a project; `lists` and `tags`, when present, are the complete sets
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(patch): Json<ProjectPatch>,
) -> ApiResult<Json<ProjectDetail>> {
    patch.validate()?;

    let detail = state.projects.update(id, auth.user_id(), patch).await?;

    Ok(Json(detail))
}

/// Only the creator may delete a project
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.projects.delete(id, auth.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the member list; Admins and SuperAdmins only
pub async fn update_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMembersRequest>,
) -> ApiResult<Json<Vec<MemberView>>> {
    let members = state
        .projects
        .update_members(id, req.members, auth.user_id())
        .await?;

    Ok(Json(members))
}
