use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use std::str::FromStr;

/// Marks a key as present. With `T = Option<_>` an explicit `null` becomes
/// `Some(None)`; with a non-optional `T` an explicit `null` is an error.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Direction of a player's average draft position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AdpTrend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LeagueType {
    Dynasty,
    Redraft,
    BestBall,
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Player {
    pub id: i64,
    pub espn_id: i64,
    pub name: String,
    pub position: Option<String>,
    pub team: Option<String>,
    pub age: Option<i64>,

    pub avg: Option<f64>,
    pub hr: Option<i64>,
    pub rbi: Option<i64>,
    pub sb: Option<i64>,
    pub ops: Option<f64>,

    pub projected_avg: Option<f64>,
    pub projected_hr: Option<i64>,
    pub projected_rbi: Option<i64>,
    pub projected_sb: Option<i64>,
    pub projected_ops: Option<f64>,

    pub adp: Option<f64>,
    pub adp_trend: Option<AdpTrend>,
    pub ownership: Option<f64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /players`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPlayer {
    pub espn_id: i64,
    pub name: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default)]
    pub hr: Option<i64>,
    #[serde(default)]
    pub rbi: Option<i64>,
    #[serde(default)]
    pub sb: Option<i64>,
    #[serde(default)]
    pub ops: Option<f64>,
    #[serde(default)]
    pub projected_avg: Option<f64>,
    #[serde(default)]
    pub projected_hr: Option<i64>,
    #[serde(default)]
    pub projected_rbi: Option<i64>,
    #[serde(default)]
    pub projected_sb: Option<i64>,
    #[serde(default)]
    pub projected_ops: Option<f64>,
    #[serde(default)]
    pub adp: Option<f64>,
    #[serde(default)]
    pub adp_trend: Option<AdpTrend>,
    #[serde(default)]
    pub ownership: Option<f64>,
}

/// Body of `PUT /players/{id}`.
///
/// An absent key leaves the column alone, `null` clears a nullable column and
/// is rejected for `espn_id` and `name`. `id` is accepted and discarded so
/// clients can send back a full document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerPatch {
    #[serde(default, rename = "id")]
    _id: Option<IgnoredAny>,
    #[serde(default, deserialize_with = "present")]
    pub espn_id: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub position: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub team: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub age: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub avg: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub hr: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub rbi: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub sb: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub ops: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub projected_avg: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub projected_hr: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub projected_rbi: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub projected_sb: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub projected_ops: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub adp: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub adp_trend: Option<Option<AdpTrend>>,
    #[serde(default, deserialize_with = "present")]
    pub ownership: Option<Option<f64>>,
}

/// Query parameters for `GET /players`.
#[derive(Debug, Deserialize)]
pub struct ListPlayersQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_player_limit")]
    pub limit: i64,
    pub position: Option<String>,
    pub team: Option<String>,
    pub search: Option<String>,
}

fn default_player_limit() -> i64 {
    100
}

/// Stats the stored-player leaderboard may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderStat {
    Hr,
    Rbi,
    Sb,
    Avg,
    Ops,
}

impl LeaderStat {
    pub const ALL: [LeaderStat; 5] = [
        LeaderStat::Hr,
        LeaderStat::Rbi,
        LeaderStat::Sb,
        LeaderStat::Avg,
        LeaderStat::Ops,
    ];

    pub fn column(self) -> &'static str {
        match self {
            LeaderStat::Hr => "hr",
            LeaderStat::Rbi => "rbi",
            LeaderStat::Sb => "sb",
            LeaderStat::Avg => "avg",
            LeaderStat::Ops => "ops",
        }
    }
}

impl FromStr for LeaderStat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeaderStat::ALL
            .into_iter()
            .find(|stat| stat.column() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = LeaderStat::ALL.iter().map(|s| s.column()).collect();
                format!("Invalid stat. Must be one of: {}", valid.join(", "))
            })
    }
}

/// Query parameters for `GET /players/stats/leaders`.
#[derive(Debug, Deserialize)]
pub struct LeadersQuery {
    pub stat: String,
    #[serde(default = "default_leaders_limit")]
    pub limit: i64,
}

fn default_leaders_limit() -> i64 {
    10
}

// ---------------------------------------------------------------------------
// Player cards
// ---------------------------------------------------------------------------

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 10;

/// Scouting note attached to a single player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlayerCard {
    pub id: i64,
    pub player_id: i64,
    pub notes: Option<String>,
    pub tags: Json<Vec<String>>,
    pub rating: Option<i64>,
    pub scout_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPlayerCard {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub scout_name: Option<String>,
}

impl NewPlayerCard {
    pub fn validate(&self) -> Result<(), String> {
        check_rating(self.rating)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerCardPatch {
    #[serde(default, rename = "id")]
    _id: Option<IgnoredAny>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub scout_name: Option<Option<String>>,
}

impl PlayerCardPatch {
    pub fn validate(&self) -> Result<(), String> {
        check_rating(self.rating.flatten())
    }
}

fn check_rating(rating: Option<i64>) -> Result<(), String> {
    match rating {
        Some(r) if !(MIN_RATING..=MAX_RATING).contains(&r) => Err(format!(
            "rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// Fantasy team tracked by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: i64,
    pub espn_league_id: i64,
    pub espn_team_id: i64,
    pub name: String,
    pub owner: Option<String>,
    pub league_name: Option<String>,
    pub league_type: Option<LeagueType>,
    pub num_teams: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewTeam {
    pub espn_league_id: i64,
    pub espn_team_id: i64,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub league_name: Option<String>,
    #[serde(default)]
    pub league_type: Option<LeagueType>,
    #[serde(default)]
    pub num_teams: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamPatch {
    #[serde(default, rename = "id")]
    _id: Option<IgnoredAny>,
    #[serde(default, deserialize_with = "present")]
    pub espn_league_id: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub espn_team_id: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub owner: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub league_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub league_type: Option<Option<LeagueType>>,
    #[serde(default, deserialize_with = "present")]
    pub num_teams: Option<Option<i64>>,
}

/// Query parameters for `GET /teams`.
#[derive(Debug, Deserialize)]
pub struct ListTeamsQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_team_limit")]
    pub limit: i64,
    pub league_type: Option<LeagueType>,
}

fn default_team_limit() -> i64 {
    50
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_carries_no_fields() {
        let patch: PlayerPatch = serde_json::from_str("{}").unwrap();

        assert_eq!(patch.name, None);
        assert_eq!(patch.team, None);
        assert_eq!(patch.hr, None);
    }

    #[test]
    fn id_key_is_accepted_but_ignored() {
        let patch: PlayerPatch = serde_json::from_str(r#"{"id": 999, "hr": 40}"#).unwrap();

        assert_eq!(patch.hr, Some(Some(40)));
        assert_eq!(patch.espn_id, None);
    }

    #[test]
    fn explicit_null_clears_nullable_field() {
        let patch: PlayerPatch = serde_json::from_str(r#"{"team": null}"#).unwrap();

        assert_eq!(patch.team, Some(None));
        assert_eq!(patch.position, None);
    }

    #[test]
    fn null_on_required_field_is_rejected() {
        assert!(serde_json::from_str::<PlayerPatch>(r#"{"name": null}"#).is_err());
        assert!(serde_json::from_str::<PlayerPatch>(r#"{"espn_id": null}"#).is_err());
        assert!(serde_json::from_str::<TeamPatch>(r#"{"name": null}"#).is_err());
        assert!(serde_json::from_str::<TeamPatch>(r#"{"espn_league_id": null}"#).is_err());
        assert!(serde_json::from_str::<TeamPatch>(r#"{"espn_team_id": null}"#).is_err());
        assert!(serde_json::from_str::<PlayerCardPatch>(r#"{"tags": null}"#).is_err());

        let patch: PlayerPatch = serde_json::from_str(r#"{"name": "Bobby Witt Jr."}"#).unwrap();
        assert_eq!(patch.name.as_deref(), Some("Bobby Witt Jr."));
    }

    #[test]
    fn unknown_patch_key_is_rejected() {
        let result = serde_json::from_str::<PlayerPatch>(r#"{"batting_stance": "open"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn timestamps_are_not_patchable() {
        let result = serde_json::from_str::<PlayerPatch>(r#"{"created_at": "2020-01-01"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn new_player_requires_espn_id_and_name() {
        assert!(serde_json::from_str::<NewPlayer>(r#"{"name": "Juan Soto"}"#).is_err());
        assert!(serde_json::from_str::<NewPlayer>(r#"{"espn_id": 36969}"#).is_err());
        let player: NewPlayer =
            serde_json::from_str(r#"{"espn_id": 36969, "name": "Juan Soto", "adp_trend": "up"}"#)
                .unwrap();
        assert_eq!(player.adp_trend, Some(AdpTrend::Up));
    }

    #[test]
    fn leader_stat_parses_allow_list_only() {
        assert_eq!("hr".parse::<LeaderStat>(), Ok(LeaderStat::Hr));
        assert_eq!("ops".parse::<LeaderStat>(), Ok(LeaderStat::Ops));
        assert!("HR".parse::<LeaderStat>().is_err());
        assert!("xyz".parse::<LeaderStat>().is_err());
    }

    #[test]
    fn card_rating_bounds() {
        let ok = NewPlayerCard {
            rating: Some(10),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let too_high = NewPlayerCard {
            rating: Some(11),
            ..Default::default()
        };
        assert!(too_high.validate().is_err());

        let patch: PlayerCardPatch = serde_json::from_str(r#"{"rating": 0}"#).unwrap();
        assert!(patch.validate().is_err());

        let cleared: PlayerCardPatch = serde_json::from_str(r#"{"rating": null}"#).unwrap();
        assert!(cleared.validate().is_ok());
    }

    #[test]
    fn league_type_uses_snake_case() {
        let team: NewTeam = serde_json::from_str(
            r#"{"espn_league_id": 1, "espn_team_id": 2, "name": "Dingers", "league_type": "best_ball"}"#,
        )
        .unwrap();
        assert_eq!(team.league_type, Some(LeagueType::BestBall));
    }
}
