use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::Json,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::upstream;
use crate::db;
use crate::error::ApiError;
use crate::services::espn::{
    FreeAgent, LeagueClient, LeagueSettingsSummary, LeagueTeam, PlayerStatsLookup, RosterPlayer,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SeasonParam {
    pub year: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
}

async fn connect(
    state: &AppState,
    league_id: i64,
    params: Result<Query<SeasonParam>, QueryRejection>,
) -> Result<LeagueClient, ApiError> {
    let Query(params) = params?;
    let year = params.year.unwrap_or_else(|| Utc::now().year());

    LeagueClient::connect(
        state.http.clone(),
        &state.config.espn_base_url,
        state.league_config(league_id, year),
    )
    .await
    .map_err(upstream("Failed to connect to ESPN league"))
}

// GET /api/espn/leagues/{league_id}/teams
pub async fn get_league_teams(
    State(state): State<AppState>,
    Path(league_id): Path<i64>,
    params: Result<Query<SeasonParam>, QueryRejection>,
) -> Result<Json<Vec<LeagueTeam>>, ApiError> {
    let league = connect(&state, league_id, params).await?;
    let teams = league.teams();
    league.close();

    Ok(Json(teams))
}

// GET /api/espn/leagues/{league_id}/players
pub async fn get_league_players(
    State(state): State<AppState>,
    Path(league_id): Path<i64>,
    params: Result<Query<SeasonParam>, QueryRejection>,
) -> Result<Json<Vec<RosterPlayer>>, ApiError> {
    let league = connect(&state, league_id, params).await?;
    let players = league.players();
    league.close();

    Ok(Json(players))
}

// GET /api/espn/leagues/{league_id}/free-agents
pub async fn get_free_agents(
    State(state): State<AppState>,
    Path(league_id): Path<i64>,
    params: Result<Query<SeasonParam>, QueryRejection>,
) -> Result<Json<Vec<FreeAgent>>, ApiError> {
    let league = connect(&state, league_id, params).await?;
    let free_agents = league.free_agents().await;
    league.close();

    let free_agents = free_agents.map_err(upstream("Failed to retrieve free agents"))?;
    Ok(Json(free_agents))
}

// GET /api/espn/leagues/{league_id}/players/{espn_id}
pub async fn get_league_player_stats(
    State(state): State<AppState>,
    Path((league_id, espn_id)): Path<(i64, i64)>,
    params: Result<Query<SeasonParam>, QueryRejection>,
) -> Result<Json<PlayerStatsLookup>, ApiError> {
    let league = connect(&state, league_id, params).await?;
    let lookup = league.player_stats(espn_id).await;
    league.close();

    let stats = lookup
        .map_err(upstream("Failed to retrieve player stats"))?
        .ok_or_else(|| ApiError::NotFound(format!("Player {} not found in league", espn_id)))?;

    Ok(Json(stats))
}

// GET /api/espn/leagues/{league_id}/settings
pub async fn get_league_settings(
    State(state): State<AppState>,
    Path(league_id): Path<i64>,
    params: Result<Query<SeasonParam>, QueryRejection>,
) -> Result<Json<LeagueSettingsSummary>, ApiError> {
    let league = connect(&state, league_id, params).await?;
    let settings = league.settings();
    league.close();

    Ok(Json(settings))
}

// POST /api/espn/leagues/{league_id}/import - Sync rostered players into the store
pub async fn import_league_players(
    State(state): State<AppState>,
    Path(league_id): Path<i64>,
    params: Result<Query<SeasonParam>, QueryRejection>,
) -> Result<Json<ImportSummary>, ApiError> {
    let league = connect(&state, league_id, params).await?;
    let players = league.players();
    league.close();

    let (created, updated) = db::upsert_roster_players(&state.pool, &players).await?;

    tracing::info!(
        "Imported league {}: {} created, {} updated",
        league_id,
        created,
        updated
    );
    Ok(Json(ImportSummary { created, updated }))
}
