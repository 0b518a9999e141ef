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
use crate::models::{ListTeamsQuery, MessageResponse, NewTeam, Team, TeamPatch};

const MAX_PAGE_SIZE: i64 = 500;

fn team_not_found() -> ApiError {
    ApiError::NotFound("Team not found".to_string())
}

// GET /api/teams - List fantasy teams
pub async fn get_teams(
    State(pool): State<SqlitePool>,
    params: Result<Query<ListTeamsQuery>, QueryRejection>,
) -> Result<Json<Vec<Team>>, ApiError> {
    let Query(params) = params?;
    check_min("skip", params.skip, 0)?;
    check_range("limit", params.limit, 1, MAX_PAGE_SIZE)?;

    let teams = db::list_teams(&pool, &params).await?;

    Ok(Json(teams))
}

// GET /api/teams/{id} - Get team by ID
pub async fn get_team_by_id(
    State(pool): State<SqlitePool>,
    Path(team_id): Path<i64>,
) -> Result<Json<Team>, ApiError> {
    let team = db::get_team_by_id(&pool, team_id)
        .await?
        .ok_or_else(team_not_found)?;

    Ok(Json(team))
}

// POST /api/teams
pub async fn create_team(
    State(pool): State<SqlitePool>,
    payload: Result<Json<NewTeam>, JsonRejection>,
) -> Result<Json<Team>, ApiError> {
    let Json(new_team) = payload.map_err(|rejection| {
        tracing::error!("Failed to create team: {}", rejection.body_text());
        ApiError::BadRequest("Failed to create team".to_string())
    })?;

    let team = db::insert_team(&pool, &new_team)
        .await
        .map_err(write_error("Failed to create team"))?;

    tracing::info!("Created team: {}", team.name);
    Ok(Json(team))
}

// PUT /api/teams/{id}
pub async fn update_team(
    State(pool): State<SqlitePool>,
    Path(team_id): Path<i64>,
    payload: Result<Json<TeamPatch>, JsonRejection>,
) -> Result<Json<Team>, ApiError> {
    let Json(patch) = payload?;

    let team = db::update_team(&pool, team_id, &patch)
        .await
        .map_err(write_error("Failed to update team"))?
        .ok_or_else(team_not_found)?;

    tracing::info!("Updated team: {}", team.name);
    Ok(Json(team))
}

// DELETE /api/teams/{id}
pub async fn delete_team(
    State(pool): State<SqlitePool>,
    Path(team_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !db::delete_team(&pool, team_id).await? {
        return Err(team_not_found());
    }

    tracing::info!("Deleted team ID: {}", team_id);
    Ok(Json(MessageResponse {
        message: "Team deleted successfully".to_string(),
    }))
}
