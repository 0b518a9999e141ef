//! Public baseball statistics connector.
//!
//! Season batting lines and leaderboards come from the FanGraphs leaders API;
//! pitch-level data comes from the Baseball Savant search CSV. The client holds
//! no per-call state. Failures come back as [`StatsError`] so callers can tell
//! an empty result apart from a failed query.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::America::New_York;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const FANGRAPHS_BASE_URL: &str = "https://www.fangraphs.com";
pub const SAVANT_BASE_URL: &str = "https://baseballsavant.mlb.com";

/// Season stats are cut off after this many rows.
pub const MAX_SEASON_ROWS: usize = 1000;

/// Placeholder FanGraphs uses for "no value".
const PLACEHOLDER: &str = "--";

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex is valid"));

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed CSV response: {0}")]
    Csv(String),
}

/// One batter's season line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonBattingLine {
    pub name: Option<String>,
    pub team: Option<String>,
    pub age: Option<i64>,
    pub avg: Option<f64>,
    pub hr: Option<i64>,
    pub rbi: Option<i64>,
    pub sb: Option<i64>,
    pub ops: Option<f64>,
    pub war: Option<f64>,
    pub wrc_plus: Option<f64>,
}

/// First pitch-tracking row for a player in a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatcastSummary {
    pub player_id: i64,
    pub player_name: Option<String>,
    pub pitch_type: Option<String>,
    pub release_speed: Option<f64>,
    pub spin_rate: Option<f64>,
    pub pfx_x: Option<f64>,
    pub pfx_z: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeaderValue {
    Count(i64),
    Rate(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderEntry {
    pub name: Option<String>,
    pub team: Option<String>,
    pub stat: String,
    pub value: LeaderValue,
}

/// Leaderboard stats accepted by [`StatsClient::leaders`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardStat {
    HomeRuns,
    RunsBattedIn,
    StolenBases,
    War,
    WrcPlus,
    Ops,
    BattingAverage,
    OnBase,
    Slugging,
}

impl LeaderboardStat {
    /// Resolve a requested stat name; anything unrecognized ranks by home runs.
    pub fn from_name(name: &str) -> Self {
        match name {
            "RBI" => Self::RunsBattedIn,
            "SB" => Self::StolenBases,
            "WAR" => Self::War,
            "wRC+" => Self::WrcPlus,
            "OPS" => Self::Ops,
            "BA" => Self::BattingAverage,
            "OBP" => Self::OnBase,
            "SLG" => Self::Slugging,
            _ => Self::HomeRuns,
        }
    }

    /// FanGraphs column holding this stat.
    pub fn column(self) -> &'static str {
        match self {
            Self::HomeRuns => "HR",
            Self::RunsBattedIn => "RBI",
            Self::StolenBases => "SB",
            Self::War => "WAR",
            Self::WrcPlus => "wRC+",
            Self::Ops => "OPS",
            Self::BattingAverage => "AVG",
            Self::OnBase => "OBP",
            Self::Slugging => "SLG",
        }
    }

    pub fn is_rate(self) -> bool {
        !matches!(self, Self::HomeRuns | Self::RunsBattedIn | Self::StolenBases)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerRole {
    Pitcher,
    Batter,
}

impl PlayerRole {
    fn as_str(self) -> &'static str {
        match self {
            PlayerRole::Pitcher => "pitcher",
            PlayerRole::Batter => "batter",
        }
    }

    fn lookup_param(self) -> &'static str {
        match self {
            PlayerRole::Pitcher => "pitchers_lookup[]",
            PlayerRole::Batter => "batters_lookup[]",
        }
    }
}

#[derive(Debug, Deserialize)]
struct LeaderboardResponse {
    #[serde(default)]
    data: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone)]
pub struct StatsClient {
    http: Client,
    fangraphs_base_url: String,
    savant_base_url: String,
}

impl StatsClient {
    pub fn new(http: Client, fangraphs_base_url: &str, savant_base_url: &str) -> Self {
        Self {
            http,
            fangraphs_base_url: fangraphs_base_url.trim_end_matches('/').to_string(),
            savant_base_url: savant_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Season batting lines, optionally filtered by a case-insensitive name substring.
    pub async fn season_batting(
        &self,
        year: i32,
        player_name: Option<&str>,
    ) -> Result<Vec<SeasonBattingLine>, StatsError> {
        tracing::info!("Pulling batting stats for {}...", year);
        let rows = self.batting_rows(year).await?;
        let players = season_lines_from(&rows, player_name);
        tracing::info!("Retrieved {} players with batting stats", players.len());
        Ok(players)
    }

    /// Pitch-tracking summary for a player. Dates default to yesterday through today.
    pub async fn statcast(
        &self,
        player_id: i64,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Option<StatcastSummary>, StatsError> {
        tracing::info!("Pulling statcast data for player ID {}", player_id);
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            _ => default_statcast_range(),
        };

        let mut row = self
            .statcast_first_row(PlayerRole::Pitcher, player_id, start, end)
            .await?;
        if row.is_none() {
            row = self
                .statcast_first_row(PlayerRole::Batter, player_id, start, end)
                .await?;
        }

        match row {
            Some(row) => Ok(Some(statcast_summary_from(player_id, &row))),
            None => {
                tracing::warn!("No statcast data found for player ID {}", player_id);
                Ok(None)
            }
        }
    }

    /// Top `limit` batters by `stat`, which echoes back as requested.
    pub async fn leaders(&self, year: i32, stat: &str, limit: usize) -> Result<Vec<LeaderEntry>, StatsError> {
        tracing::info!("Getting {} leaders for {}...", stat, year);
        let rows = self.batting_rows(year).await?;
        let leaders = leaders_from(&rows, stat, limit);
        tracing::info!("Retrieved {} {} leaders", leaders.len(), stat);
        Ok(leaders)
    }

    async fn batting_rows(&self, year: i32) -> Result<Vec<Map<String, Value>>, StatsError> {
        let url = format!("{}/api/leaders/major-league/data", self.fangraphs_base_url);
        let season = year.to_string();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("pos", "all"),
                ("stats", "bat"),
                ("lg", "all"),
                ("qual", "y"),
                ("type", "8"),
                ("season", season.as_str()),
                ("season1", season.as_str()),
                ("ind", "0"),
                ("pageitems", "2000000000"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<LeaderboardResponse>()
            .await?;

        Ok(response.data)
    }

    async fn statcast_first_row(
        &self,
        role: PlayerRole,
        player_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Vec<(String, String)>>, StatsError> {
        let url = format!("{}/statcast_search/csv", self.savant_base_url);
        let player = player_id.to_string();
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();

        let body = self
            .http
            .get(&url)
            .query(&[
                ("all", "true"),
                ("type", "details"),
                ("player_type", role.as_str()),
                (role.lookup_param(), player.as_str()),
                ("game_date_gt", start.as_str()),
                ("game_date_lt", end.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        first_csv_row(&body)
    }
}

/// Yesterday and today on the US Eastern calendar, which Savant game dates use.
pub fn default_statcast_range() -> (NaiveDate, NaiveDate) {
    let today = Utc::now().with_timezone(&New_York).date_naive();
    (today - Duration::days(1), today)
}

/// Best-effort numeric coercion. Placeholders, nulls, missing keys and
/// unparsable strings all become `None`.
pub fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw == PLACEHOLDER {
        return None;
    }
    raw.trim_end_matches('%')
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

fn text_field(row: &Map<String, Value>, plain: &str, html: &str) -> Option<String> {
    if let Some(Value::String(s)) = row.get(plain) {
        return Some(s.clone());
    }
    match row.get(html) {
        Some(Value::String(s)) => Some(HTML_TAG.replace_all(s, "").trim().to_string()),
        _ => None,
    }
}

fn row_name(row: &Map<String, Value>) -> Option<String> {
    text_field(row, "PlayerName", "Name")
}

fn row_team(row: &Map<String, Value>) -> Option<String> {
    text_field(row, "TeamName", "Team")
}

fn season_lines_from(rows: &[Map<String, Value>], player_name: Option<&str>) -> Vec<SeasonBattingLine> {
    let needle = player_name.map(str::to_lowercase);
    let int = |row: &Map<String, Value>, key: &str| coerce_number(row.get(key)).map(|v| v as i64);
    let float = |row: &Map<String, Value>, key: &str| coerce_number(row.get(key));

    rows.iter()
        .filter(|row| match &needle {
            Some(needle) => row_name(row).is_some_and(|name| name.to_lowercase().contains(needle)),
            None => true,
        })
        .take(MAX_SEASON_ROWS)
        .map(|row| SeasonBattingLine {
            name: row_name(row),
            team: row_team(row),
            age: int(row, "Age"),
            avg: float(row, "AVG"),
            hr: int(row, "HR"),
            rbi: int(row, "RBI"),
            sb: int(row, "SB"),
            ops: float(row, "OPS"),
            war: float(row, "WAR"),
            wrc_plus: float(row, "wRC+"),
        })
        .collect()
}

fn leaders_from(rows: &[Map<String, Value>], stat: &str, limit: usize) -> Vec<LeaderEntry> {
    let resolved = LeaderboardStat::from_name(stat);
    let column = resolved.column();

    let mut ranked: Vec<(f64, &Map<String, Value>)> = rows
        .iter()
        .filter_map(|row| coerce_number(row.get(column)).map(|value| (value, row)))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    ranked
        .into_iter()
        .take(limit)
        .map(|(value, row)| LeaderEntry {
            name: row_name(row),
            team: row_team(row),
            stat: stat.to_string(),
            value: if resolved.is_rate() {
                LeaderValue::Rate(value)
            } else {
                LeaderValue::Count(value as i64)
            },
        })
        .collect()
}

fn statcast_summary_from(player_id: i64, row: &[(String, String)]) -> StatcastSummary {
    StatcastSummary {
        player_id,
        player_name: csv_field(row, "player_name").map(str::to_string),
        pitch_type: csv_field(row, "pitch_type").map(str::to_string),
        release_speed: csv_field(row, "release_speed").and_then(parse_number),
        spin_rate: csv_field(row, "release_spin_rate").and_then(parse_number),
        pfx_x: csv_field(row, "pfx_x").and_then(parse_number),
        pfx_z: csv_field(row, "pfx_z").and_then(parse_number),
    }
}

fn csv_field<'a>(row: &'a [(String, String)], name: &str) -> Option<&'a str> {
    row.iter()
        .find(|(column, _)| column == name)
        .map(|(_, value)| value.as_str())
        .filter(|value| !value.is_empty())
}

/// Pair the header with the first data record of a CSV body.
///
/// Returns `Ok(None)` when the body has no data rows.
fn first_csv_row(body: &str) -> Result<Option<Vec<(String, String)>>, StatsError> {
    let body = body.trim_start_matches('\u{feff}');
    let mut records = CsvRecords::new(body);

    let header = match records.next().transpose()? {
        Some(header) => header,
        None => return Ok(None),
    };
    let row = loop {
        match records.next().transpose()? {
            Some(record) if record.iter().all(|field| field.is_empty()) => continue,
            Some(record) => break record,
            None => return Ok(None),
        }
    };

    Ok(Some(header.into_iter().zip(row).collect()))
}

/// Minimal RFC 4180 record reader: quoted fields, doubled quotes, CRLF or LF.
struct CsvRecords<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> CsvRecords<'a> {
    fn new(body: &'a str) -> Self {
        Self {
            chars: body.chars().peekable(),
        }
    }
}

impl Iterator for CsvRecords<'_> {
    type Item = Result<Vec<String>, StatsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.chars.peek()?;

        let mut record = Vec::new();
        let mut field = String::new();
        let mut quoted = false;

        while let Some(c) = self.chars.next() {
            match (c, quoted) {
                ('"', true) if self.chars.peek() == Some(&'"') => {
                    self.chars.next();
                    field.push('"');
                }
                ('"', true) => quoted = false,
                ('"', false) if field.is_empty() => quoted = true,
                (',', false) => record.push(std::mem::take(&mut field)),
                ('\r', false) if self.chars.peek() == Some(&'\n') => {}
                ('\n', false) => {
                    record.push(field);
                    return Some(Ok(record));
                }
                (c, _) => field.push(c),
            }
        }

        if quoted {
            return Some(Err(StatsError::Csv("unterminated quoted field".to_string())));
        }
        record.push(field);
        Some(Ok(record))
    }
}
