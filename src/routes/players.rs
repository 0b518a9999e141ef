use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::Json,
};
use sqlx::sqlite::SqlitePool;

use super::{check_min, check_range, write_error};
use crate::db;
use crate::error::ApiError;
use crate::models::{
    LeaderStat, LeadersQuery, ListPlayersQuery, MessageResponse, NewPlayer, Player, PlayerPatch,
};

const MAX_PAGE_SIZE: i64 = 1000;
const MAX_LEADERS: i64 = 50;

fn player_not_found() -> ApiError {
    ApiError::NotFound("Player not found".to_string())
}

// GET /api/players - List players with optional filters
pub async fn get_players(
    State(pool): State<SqlitePool>,
    params: Result<Query<ListPlayersQuery>, QueryRejection>,
) -> Result<Json<Vec<Player>>, ApiError> {
    let Query(params) = params?;
    check_min("skip", params.skip, 0)?;
    check_range("limit", params.limit, 1, MAX_PAGE_SIZE)?;

    let players = db::list_players(&pool, &params).await?;

    Ok(Json(players))
}

// GET /api/players/{id} - Get player by primary key
pub async fn get_player_by_id(
    State(pool): State<SqlitePool>,
    Path(player_id): Path<i64>,
) -> Result<Json<Player>, ApiError> {
    let player = db::get_player_by_id(&pool, player_id)
        .await?
        .ok_or_else(player_not_found)?;

    Ok(Json(player))
}

// GET /api/players/espn/{espn_id} - Get player by ESPN id
pub async fn get_player_by_espn_id(
    State(pool): State<SqlitePool>,
    Path(espn_id): Path<i64>,
) -> Result<Json<Player>, ApiError> {
    let player = db::get_player_by_espn_id(&pool, espn_id)
        .await?
        .ok_or_else(player_not_found)?;

    Ok(Json(player))
}

// POST /api/players - Create a player
pub async fn create_player(
    State(pool): State<SqlitePool>,
    payload: Result<Json<NewPlayer>, JsonRejection>,
) -> Result<Json<Player>, ApiError> {
    let Json(new_player) = payload.map_err(|rejection| {
        tracing::error!("Failed to create player: {}", rejection.body_text());
        ApiError::BadRequest("Failed to create player".to_string())
    })?;

    let player = db::insert_player(&pool, &new_player)
        .await
        .map_err(write_error("Failed to create player"))?;

    tracing::info!("Created player: {}", player.name);
    Ok(Json(player))
}

// PUT /api/players/{id} - Apply a partial update
pub async fn update_player(
    State(pool): State<SqlitePool>,
    Path(player_id): Path<i64>,
    payload: Result<Json<PlayerPatch>, JsonRejection>,
) -> Result<Json<Player>, ApiError> {
    let Json(patch) = payload?;

    let player = db::update_player(&pool, player_id, &patch)
        .await
        .map_err(write_error("Failed to update player"))?
        .ok_or_else(player_not_found)?;

    tracing::info!("Updated player: {}", player.name);
    Ok(Json(player))
}

// DELETE /api/players/{id} - Delete a player and its scouting cards
pub async fn delete_player(
    State(pool): State<SqlitePool>,
    Path(player_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !db::delete_player(&pool, player_id).await? {
        return Err(player_not_found());
    }

    tracing::info!("Deleted player ID: {}", player_id);
    Ok(Json(MessageResponse {
        message: "Player deleted successfully".to_string(),
    }))
}

// GET /api/players/stats/leaders?stat=hr&limit=10 - Stored players ranked by a stat
pub async fn get_leaders(
    State(pool): State<SqlitePool>,
    params: Result<Query<LeadersQuery>, QueryRejection>,
) -> Result<Json<Vec<Player>>, ApiError> {
    let Query(params) = params?;
    let stat: LeaderStat = params.stat.parse().map_err(ApiError::BadRequest)?;
    check_range("limit", params.limit, 1, MAX_LEADERS)?;

    let players = db::get_leaders(&pool, stat, params.limit).await?;

    Ok(Json(players))
}
