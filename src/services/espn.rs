//! ESPN fantasy-baseball league connector.
//!
//! A [`LeagueClient`] is built with [`LeagueClient::connect`], which pulls the
//! league snapshot (teams, rosters, settings) once. Every later call on the same
//! handle reads that snapshot, except free-agent lookups which hit the API again.
//! Failures are returned to the caller as [`EspnError`]; nothing is retried.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, COOKIE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base path for the ESPN Fantasy Baseball v3 API.
pub const ESPN_BASE_URL: &str = "https://lm-api-reads.fantasy.espn.com/apis/v3/games/flb";

/// Page size used when listing free agents.
pub const FREE_AGENT_PAGE_SIZE: usize = 1000;

const FANTASY_FILTER: HeaderName = HeaderName::from_static("x-fantasy-filter");

#[derive(Debug, Error)]
pub enum EspnError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// Private-league cookies.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub espn_s2: String,
    pub swid: String,
}

#[derive(Debug, Clone)]
pub struct LeagueConfig {
    pub league_id: i64,
    pub year: i32,
    pub credentials: Option<Credentials>,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct LeagueResponse {
    #[serde(default)]
    teams: Vec<ApiTeam>,
    #[serde(default)]
    members: Vec<ApiMember>,
    #[serde(default)]
    settings: ApiSettings,
}

#[derive(Debug, Deserialize)]
struct ApiTeam {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    owners: Vec<String>,
    #[serde(default)]
    record: ApiRecord,
    #[serde(rename = "playoffSeed", default)]
    playoff_seed: Option<i64>,
    #[serde(default)]
    roster: ApiRoster,
}

#[derive(Debug, Default, Deserialize)]
struct ApiRecord {
    #[serde(default)]
    overall: ApiRecordLine,
}

#[derive(Debug, Default, Deserialize)]
struct ApiRecordLine {
    #[serde(default)]
    wins: i64,
    #[serde(default)]
    losses: i64,
    #[serde(default)]
    ties: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ApiRoster {
    #[serde(default)]
    entries: Vec<ApiRosterEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiRosterEntry {
    #[serde(rename = "playerPoolEntry")]
    player_pool_entry: ApiPlayerPoolEntry,
}

#[derive(Debug, Deserialize)]
struct ApiPlayerPoolEntry {
    player: ApiPlayer,
}

#[derive(Debug, Deserialize)]
struct ApiPlayer {
    id: i64,
    #[serde(rename = "fullName", default)]
    full_name: String,
    #[serde(rename = "defaultPositionId", default)]
    default_position_id: i64,
    #[serde(rename = "proTeamId", default)]
    pro_team_id: i64,
    #[serde(default)]
    age: Option<i64>,
    #[serde(default)]
    ownership: Option<ApiOwnership>,
    #[serde(default)]
    stats: Vec<ApiStatLine>,
}

#[derive(Debug, Deserialize)]
struct ApiOwnership {
    #[serde(rename = "percentOwned", default)]
    percent_owned: f64,
    #[serde(rename = "averageDraftPosition", default)]
    average_draft_position: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiStatLine {
    #[serde(rename = "seasonId", default)]
    season_id: i32,
    #[serde(rename = "statSourceId", default)]
    stat_source_id: u8,
    #[serde(rename = "statSplitTypeId", default)]
    stat_split_type_id: u8,
    #[serde(default)]
    stats: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct ApiMember {
    id: String,
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(rename = "firstName", default)]
    first_name: Option<String>,
    #[serde(rename = "lastName", default)]
    last_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiSettings {
    #[serde(default)]
    name: String,
    #[serde(rename = "scoringSettings", default)]
    scoring_settings: ApiScoringSettings,
    #[serde(rename = "rosterSettings", default)]
    roster_settings: ApiRosterSettings,
    #[serde(rename = "scheduleSettings", default)]
    schedule_settings: ApiScheduleSettings,
    #[serde(rename = "tradeSettings", default)]
    trade_settings: ApiTradeSettings,
}

#[derive(Debug, Default, Deserialize)]
struct ApiScoringSettings {
    #[serde(rename = "scoringType", default)]
    scoring_type: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiRosterSettings {
    #[serde(rename = "lineupSlotCounts", default)]
    lineup_slot_counts: BTreeMap<String, i64>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiScheduleSettings {
    #[serde(rename = "playoffTeamCount", default)]
    playoff_team_count: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ApiTradeSettings {
    /// Epoch milliseconds; 0 when the league has no deadline.
    #[serde(rename = "deadlineDate", default)]
    deadline_date: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct FreeAgentResponse {
    #[serde(default)]
    players: Vec<ApiPlayerPoolEntry>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueTeam {
    pub espn_team_id: i64,
    pub name: String,
    pub owner: Option<String>,
    pub wins: i64,
    pub losses: i64,
    pub ties: i64,
    pub standing: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterPlayer {
    pub espn_id: i64,
    pub name: String,
    pub position: Option<String>,
    pub team: Option<String>,
    pub age: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeAgent {
    pub espn_id: i64,
    pub name: String,
    pub position: Option<String>,
    pub team: Option<String>,
    pub ownership: f64,
    pub adp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatsLookup {
    pub espn_id: i64,
    pub name: String,
    pub stats: BTreeMap<String, f64>,
    pub projected_stats: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSettingsSummary {
    pub league_id: i64,
    pub year: i32,
    pub name: String,
    pub num_teams: usize,
    pub playoff_teams: i64,
    pub scoring_type: String,
    pub roster_size: i64,
    pub trade_deadline: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Connected handle to a single ESPN league season.
#[derive(Debug)]
pub struct LeagueClient {
    http: Client,
    base_url: String,
    config: LeagueConfig,
    headers: HeaderMap,
    league: LeagueResponse,
}

impl LeagueClient {
    pub async fn connect(http: Client, base_url: &str, config: LeagueConfig) -> Result<Self, EspnError> {
        let headers = cookie_header_map(config.credentials.as_ref())?;
        let url = league_url(base_url, &config);

        let league = http
            .get(&url)
            .headers(headers.clone())
            .query(&[("view", "mTeam"), ("view", "mRoster"), ("view", "mSettings")])
            .send()
            .await?
            .error_for_status()?
            .json::<LeagueResponse>()
            .await?;

        if config.credentials.is_some() {
            tracing::info!("Connected to private ESPN league {}", config.league_id);
        } else {
            tracing::info!("Connected to public ESPN league {}", config.league_id);
        }

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            config,
            headers,
            league,
        })
    }

    pub fn teams(&self) -> Vec<LeagueTeam> {
        let teams = teams_from(&self.league);
        tracing::info!("Retrieved {} teams from ESPN", teams.len());
        teams
    }

    /// Rostered players across every team, first occurrence wins.
    pub fn players(&self) -> Vec<RosterPlayer> {
        let players = roster_players_from(&self.league);
        tracing::info!("Retrieved {} unique players from ESPN", players.len());
        players
    }

    pub async fn free_agents(&self) -> Result<Vec<FreeAgent>, EspnError> {
        let free_agents: Vec<FreeAgent> = self
            .fetch_free_agents()
            .await?
            .iter()
            .map(|entry| free_agent_from(&entry.player))
            .collect();

        tracing::info!("Retrieved {} free agents from ESPN", free_agents.len());
        Ok(free_agents)
    }

    /// Look the player up on the rosters first, then among free agents.
    pub async fn player_stats(&self, espn_id: i64) -> Result<Option<PlayerStatsLookup>, EspnError> {
        let rostered = self
            .league
            .teams
            .iter()
            .flat_map(|team| team.roster.entries.iter())
            .map(|entry| &entry.player_pool_entry.player)
            .find(|player| player.id == espn_id);

        if let Some(player) = rostered {
            return Ok(Some(stats_lookup_from(player, self.config.year)));
        }

        let free_agents = self.fetch_free_agents().await?;
        if let Some(entry) = free_agents.iter().find(|entry| entry.player.id == espn_id) {
            return Ok(Some(stats_lookup_from(&entry.player, self.config.year)));
        }

        tracing::warn!("Player {} not found in ESPN league", espn_id);
        Ok(None)
    }

    pub fn settings(&self) -> LeagueSettingsSummary {
        let settings = settings_from(&self.league, &self.config);
        tracing::info!("Retrieved league settings for {}", settings.name);
        settings
    }

    pub fn close(self) {
        tracing::debug!("Closed ESPN league {}", self.config.league_id);
    }

    async fn fetch_free_agents(&self) -> Result<Vec<ApiPlayerPoolEntry>, EspnError> {
        let filter = serde_json::json!({
            "players": {
                "filterStatus": { "value": ["FREEAGENT", "WAIVERS"] },
                "limit": FREE_AGENT_PAGE_SIZE,
                "sortPercOwned": { "sortPriority": 1, "sortAsc": false }
            }
        });

        let mut headers = self.headers.clone();
        headers.insert(FANTASY_FILTER, HeaderValue::from_str(&filter.to_string())?);

        let response = self
            .http
            .get(league_url(&self.base_url, &self.config))
            .headers(headers)
            .query(&[("view", "kona_player_info")])
            .send()
            .await?
            .error_for_status()?
            .json::<FreeAgentResponse>()
            .await?;

        Ok(response.players)
    }
}

fn league_url(base_url: &str, config: &LeagueConfig) -> String {
    format!(
        "{}/seasons/{}/segments/0/leagues/{}",
        base_url.trim_end_matches('/'),
        config.year,
        config.league_id
    )
}

/// Accept header always; cookie header only for private leagues.
fn cookie_header_map(credentials: Option<&Credentials>) -> Result<HeaderMap, EspnError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(credentials) = credentials {
        let cookie = format!("SWID={}; espn_s2={}", credentials.swid, credentials.espn_s2);
        headers.insert(COOKIE, HeaderValue::from_str(&cookie)?);
    }
    Ok(headers)
}

fn teams_from(league: &LeagueResponse) -> Vec<LeagueTeam> {
    league
        .teams
        .iter()
        .map(|team| LeagueTeam {
            espn_team_id: team.id,
            name: team_name(team),
            owner: team
                .owners
                .first()
                .and_then(|owner_id| league.members.iter().find(|m| &m.id == owner_id))
                .and_then(member_name),
            wins: team.record.overall.wins,
            losses: team.record.overall.losses,
            ties: team.record.overall.ties,
            standing: team.playoff_seed,
        })
        .collect()
}

fn roster_players_from(league: &LeagueResponse) -> Vec<RosterPlayer> {
    let mut seen = HashSet::new();
    league
        .teams
        .iter()
        .flat_map(|team| team.roster.entries.iter())
        .map(|entry| &entry.player_pool_entry.player)
        .filter(|player| seen.insert(player.id))
        .map(|player| RosterPlayer {
            espn_id: player.id,
            name: player.full_name.clone(),
            position: position_name(player.default_position_id).map(str::to_string),
            team: pro_team_abbreviation(player.pro_team_id).map(str::to_string),
            age: player.age,
        })
        .collect()
}

fn free_agent_from(player: &ApiPlayer) -> FreeAgent {
    FreeAgent {
        espn_id: player.id,
        name: player.full_name.clone(),
        position: position_name(player.default_position_id).map(str::to_string),
        team: pro_team_abbreviation(player.pro_team_id).map(str::to_string),
        ownership: player.ownership.as_ref().map_or(0.0, |o| o.percent_owned),
        adp: player
            .ownership
            .as_ref()
            .and_then(|o| o.average_draft_position),
    }
}

fn stats_lookup_from(player: &ApiPlayer, year: i32) -> PlayerStatsLookup {
    PlayerStatsLookup {
        espn_id: player.id,
        name: player.full_name.clone(),
        stats: season_stats(player, year, 0),
        projected_stats: season_stats(player, year, 1),
    }
}

/// Season-total line for the given source (0 = actual, 1 = projected), keyed by stat name.
fn season_stats(player: &ApiPlayer, year: i32, source: u8) -> BTreeMap<String, f64> {
    player
        .stats
        .iter()
        .find(|line| {
            line.season_id == year && line.stat_source_id == source && line.stat_split_type_id == 0
        })
        .map(|line| {
            line.stats
                .iter()
                .map(|(id, value)| {
                    let key = id
                        .parse::<u16>()
                        .ok()
                        .and_then(stat_name)
                        .map_or_else(|| id.clone(), str::to_string);
                    (key, *value)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn settings_from(league: &LeagueResponse, config: &LeagueConfig) -> LeagueSettingsSummary {
    let settings = &league.settings;
    LeagueSettingsSummary {
        league_id: config.league_id,
        year: config.year,
        name: settings.name.clone(),
        num_teams: league.teams.len(),
        playoff_teams: settings.schedule_settings.playoff_team_count,
        scoring_type: settings.scoring_settings.scoring_type.clone(),
        roster_size: settings.roster_settings.lineup_slot_counts.values().sum(),
        trade_deadline: settings
            .trade_settings
            .deadline_date
            .filter(|ms| *ms > 0)
            .and_then(DateTime::<Utc>::from_timestamp_millis),
    }
}

fn team_name(team: &ApiTeam) -> String {
    match &team.name {
        Some(name) if !name.is_empty() => name.clone(),
        _ => [team.location.as_deref(), team.nickname.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn member_name(member: &ApiMember) -> Option<String> {
    match (&member.first_name, &member.last_name) {
        (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
        _ => member.display_name.clone(),
    }
}

fn position_name(default_position_id: i64) -> Option<&'static str> {
    let name = match default_position_id {
        1 => "SP",
        2 => "C",
        3 => "1B",
        4 => "2B",
        5 => "3B",
        6 => "SS",
        7 => "LF",
        8 => "CF",
        9 => "RF",
        10 => "DH",
        11 => "RP",
        _ => return None,
    };
    Some(name)
}

fn pro_team_abbreviation(pro_team_id: i64) -> Option<&'static str> {
    let abbreviation = match pro_team_id {
        0 => "FA",
        1 => "BAL",
        2 => "BOS",
        3 => "LAA",
        4 => "CHW",
        5 => "CLE",
        6 => "DET",
        7 => "KC",
        8 => "MIL",
        9 => "MIN",
        10 => "NYY",
        11 => "OAK",
        12 => "SEA",
        13 => "TEX",
        14 => "TOR",
        15 => "ATL",
        16 => "CHC",
        17 => "CIN",
        18 => "HOU",
        19 => "LAD",
        20 => "WSH",
        21 => "NYM",
        22 => "PHI",
        23 => "PIT",
        24 => "STL",
        25 => "SD",
        26 => "SF",
        27 => "COL",
        28 => "MIA",
        29 => "ARI",
        30 => "TB",
        _ => return None,
    };
    Some(abbreviation)
}

fn stat_name(stat_id: u16) -> Option<&'static str> {
    let name = match stat_id {
        0 => "AB",
        1 => "H",
        2 => "AVG",
        3 => "2B",
        4 => "3B",
        5 => "HR",
        6 => "XBH",
        7 => "1B",
        8 => "TB",
        9 => "SLG",
        10 => "B_BB",
        11 => "B_IBB",
        12 => "HBP",
        13 => "SF",
        14 => "SH",
        15 => "SAC",
        16 => "PA",
        17 => "OBP",
        18 => "OPS",
        19 => "RC",
        20 => "R",
        21 => "RBI",
        23 => "SB",
        24 => "CS",
        25 => "SB-CS",
        26 => "GDP",
        27 => "B_SO",
        28 => "PS",
        29 => "PPA",
        31 => "CYC",
        32 => "GP",
        33 => "GS",
        34 => "OUTS",
        35 => "TBF",
        36 => "P",
        37 => "P_H",
        38 => "OBA",
        39 => "P_BB",
        40 => "P_IBB",
        41 => "WHIP",
        42 => "P_HBP",
        43 => "OOBP",
        44 => "P_R",
        45 => "ER",
        46 => "P_HR",
        47 => "ERA",
        48 => "K",
        49 => "K/9",
        50 => "WP",
        51 => "BLK",
        52 => "PK",
        53 => "W",
        54 => "L",
        55 => "WPCT",
        56 => "SVO",
        57 => "SV",
        58 => "BLSV",
        59 => "SV%",
        60 => "HLD",
        62 => "CG",
        63 => "QS",
        _ => return None,
    };
    Some(name)
}
