/// Comment endpoints
///
/// Anyone authenticated may comment on a card; only the author may edit or
/// delete a comment.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::models::comment::Comment;
use taskboard_shared::validation::not_blank;
use validator::Validate;

use crate::{app::AppState, error::ApiResult, middleware::auth::AuthContext};

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(
        length(min = 1, max = 1000, message = "Comment must be 1 to 1000 characters"),
        custom(function = "not_blank")
    )]
    pub description: String,
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(card_id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    req.validate()?;

    let comment = state
        .comments
        .add(card_id, &req.description, auth.user_id())
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<Json<Comment>> {
    req.validate()?;

    let comment = state
        .comments
        .update(id, &req.description, auth.user_id())
        .await?;

    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.comments.delete(id, auth.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
