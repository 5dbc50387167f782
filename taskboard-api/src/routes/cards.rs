/// Card endpoints
///
/// Any authenticated caller may work with cards. `PUT /cards/:id` takes the
/// scalar fields to change plus, optionally, the complete sets of tag
/// assignments (`tag_cards`), approvers and sub-tasks (`tasks_card`).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use taskboard_shared::services::cards::{CardDetail, CardPatch};
use taskboard_shared::validation::not_blank;
use validator::Validate;

use super::CreatedResponse;
use crate::{app::AppState, error::ApiResult};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCardRequest {
    #[validate(
        length(min = 1, max = 255, message = "Title must be 1 to 255 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,
}

/// Create a card at the end of a list; returns the new card id
pub async fn create_card(
    State(state): State<AppState>,
    Path(list_id): Path<i64>,
    Json(req): Json<CreateCardRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    req.validate()?;

    let card = state.cards.create(list_id, &req.title).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: card.id })))
}

pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CardDetail>> {
    Ok(Json(state.cards.get(id).await?))
}

pub async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<CardPatch>,
) -> ApiResult<Json<CardDetail>> {
    patch.fields.validate()?;
    patch.validate()?;

    Ok(Json(state.cards.update(id, patch).await?))
}

pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.cards.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
