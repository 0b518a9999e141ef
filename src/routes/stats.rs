use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{check_range, upstream};
use crate::error::ApiError;
use crate::services::stats::{LeaderEntry, SeasonBattingLine, StatcastSummary};
use crate::state::AppState;

const MAX_LEADERS: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct SeasonQuery {
    pub player_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsLeadersQuery {
    #[serde(default = "default_stat")]
    pub stat: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_stat() -> String {
    "HR".to_string()
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct StatcastQuery {
    pub start_dt: Option<String>,
    pub end_dt: Option<String>,
}

fn parse_date(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    value
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                ApiError::BadRequest(format!("{} must be a date in YYYY-MM-DD format", name))
            })
        })
        .transpose()
}

// GET /api/stats/players/season/{year}?player_name=judge
pub async fn get_season_stats(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    params: Result<Query<SeasonQuery>, QueryRejection>,
) -> Result<Json<Vec<SeasonBattingLine>>, ApiError> {
    let Query(params) = params?;

    let players = state
        .stats_client()
        .season_batting(year, params.player_name.as_deref())
        .await
        .map_err(upstream("Failed to retrieve season stats"))?;

    if players.is_empty() {
        return Err(ApiError::NotFound(format!("No players found for {}", year)));
    }

    Ok(Json(players))
}

// GET /api/stats/leaders/{year}?stat=HR&limit=10
pub async fn get_stat_leaders(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    params: Result<Query<StatsLeadersQuery>, QueryRejection>,
) -> Result<Json<Vec<LeaderEntry>>, ApiError> {
    let Query(params) = params?;
    check_range("limit", params.limit, 1, MAX_LEADERS)?;

    let leaders = state
        .stats_client()
        .leaders(year, &params.stat, params.limit as usize)
        .await
        .map_err(upstream("Failed to retrieve leaders"))?;

    if leaders.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No {} leaders found for {}",
            params.stat, year
        )));
    }

    Ok(Json(leaders))
}

// GET /api/stats/statcast/{player_id}?start_dt=2024-06-01&end_dt=2024-06-02
pub async fn get_statcast(
    State(state): State<AppState>,
    Path(player_id): Path<i64>,
    params: Result<Query<StatcastQuery>, QueryRejection>,
) -> Result<Json<StatcastSummary>, ApiError> {
    let Query(params) = params?;
    let start = parse_date("start_dt", params.start_dt.as_deref())?;
    let end = parse_date("end_dt", params.end_dt.as_deref())?;

    let summary = state
        .stats_client()
        .statcast(player_id, start, end)
        .await
        .map_err(upstream("Failed to retrieve statcast data"))?
        .ok_or_else(|| {
            ApiError::NotFound(format!("No statcast data found for player {}", player_id))
        })?;

    Ok(Json(summary))
}
