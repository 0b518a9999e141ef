use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use sqlx::sqlite::SqlitePool;

use super::write_error;
use crate::db;
use crate::error::ApiError;
use crate::models::{MessageResponse, NewPlayerCard, PlayerCard, PlayerCardPatch};

fn card_not_found() -> ApiError {
    ApiError::NotFound("Player card not found".to_string())
}

async fn ensure_player_exists(pool: &SqlitePool, player_id: i64) -> Result<(), ApiError> {
    match db::get_player_by_id(pool, player_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("Player not found".to_string())),
    }
}

// GET /api/players/{id}/cards - Scouting cards for a player
pub async fn get_player_cards(
    State(pool): State<SqlitePool>,
    Path(player_id): Path<i64>,
) -> Result<Json<Vec<PlayerCard>>, ApiError> {
    ensure_player_exists(&pool, player_id).await?;

    let cards = db::get_cards_for_player(&pool, player_id).await?;

    Ok(Json(cards))
}

// POST /api/players/{id}/cards - Attach a scouting card to a player
pub async fn create_player_card(
    State(pool): State<SqlitePool>,
    Path(player_id): Path<i64>,
    payload: Result<Json<NewPlayerCard>, JsonRejection>,
) -> Result<Json<PlayerCard>, ApiError> {
    let Json(new_card) = payload?;
    new_card.validate().map_err(ApiError::BadRequest)?;
    ensure_player_exists(&pool, player_id).await?;

    let card = db::insert_card(&pool, player_id, &new_card)
        .await
        .map_err(write_error("Failed to create player card"))?;

    tracing::info!("Created card {} for player {}", card.id, player_id);
    Ok(Json(card))
}

// GET /api/cards/{id}
pub async fn get_card(
    State(pool): State<SqlitePool>,
    Path(card_id): Path<i64>,
) -> Result<Json<PlayerCard>, ApiError> {
    let card = db::get_card_by_id(&pool, card_id)
        .await?
        .ok_or_else(card_not_found)?;

    Ok(Json(card))
}

// PUT /api/cards/{id}
pub async fn update_card(
    State(pool): State<SqlitePool>,
    Path(card_id): Path<i64>,
    payload: Result<Json<PlayerCardPatch>, JsonRejection>,
) -> Result<Json<PlayerCard>, ApiError> {
    let Json(patch) = payload?;
    patch.validate().map_err(ApiError::BadRequest)?;

    let card = db::update_card(&pool, card_id, &patch)
        .await
        .map_err(write_error("Failed to update player card"))?
        .ok_or_else(card_not_found)?;

    tracing::info!("Updated card {}", card.id);
    Ok(Json(card))
}

// DELETE /api/cards/{id}
pub async fn delete_card(
    State(pool): State<SqlitePool>,
    Path(card_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !db::delete_card(&pool, card_id).await? {
        return Err(card_not_found());
    }

    tracing::info!("Deleted card ID: {}", card_id);
    Ok(Json(MessageResponse {
        message: "Player card deleted successfully".to_string(),
    }))
}
