//! Canned ESPN, FanGraphs and Savant responses served from a local listener.

use std::collections::HashMap;

use axum::{
    extract::Query,
    http::HeaderMap,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};

pub const LEAGUE_YEAR: i32 = 2025;
pub const STATS_SEASON: i32 = 2024;

/// Savant id that only has pitch data as a pitcher.
pub const PITCHER_ID: i64 = 543037;
/// Savant id that only has pitch data as a batter.
pub const BATTER_ID: i64 = 592450;

const SAVANT_HEADER: &str =
    "pitch_type,game_date,release_speed,player_name,pfx_x,pfx_z,release_spin_rate\n";

/// Start the fake upstream and return its base URL.
pub async fn spawn() -> String {
    let router = Router::new()
        .route(
            "/flb/seasons/{year}/segments/0/leagues/{league_id}",
            get(espn_league),
        )
        .route("/api/leaders/major-league/data", get(fangraphs_leaders))
        .route("/statcast_search/csv", get(savant_csv));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

fn roster_entry(id: i64, name: &str, position: i64, pro_team: i64, age: i64) -> Value {
    json!({
        "playerPoolEntry": {
            "player": {
                "id": id,
                "fullName": name,
                "defaultPositionId": position,
                "proTeamId": pro_team,
                "age": age,
                "stats": [
                    { "seasonId": LEAGUE_YEAR, "statSourceId": 0, "statSplitTypeId": 0,
                      "stats": { "5": 30.0 } }
                ]
            }
        }
    })
}

// Free-agent requests carry the filter header, snapshot requests do not.
async fn espn_league(headers: HeaderMap) -> Json<Value> {
    if headers.contains_key("x-fantasy-filter") {
        return Json(json!({
            "players": [{
                "player": {
                    "id": 500,
                    "fullName": "Luis Arraez",
                    "defaultPositionId": 4,
                    "proTeamId": 25,
                    "ownership": { "percentOwned": 41.5, "averageDraftPosition": 180.2 },
                    "stats": [
                        { "seasonId": LEAGUE_YEAR, "statSourceId": 0, "statSplitTypeId": 0,
                          "stats": { "2": 0.314 } }
                    ]
                }
            }]
        }));
    }

    Json(json!({
        "members": [{ "id": "{OWNER}", "displayName": "dingers" }],
        "teams": [
            {
                "id": 1,
                "name": "Moonshots",
                "owners": ["{OWNER}"],
                "record": { "overall": { "wins": 9, "losses": 5, "ties": 0 } },
                "roster": { "entries": [
                    roster_entry(100, "Aaron Judge", 9, 10, 33),
                    roster_entry(200, "Bobby Witt Jr.", 6, 7, 25)
                ] }
            },
            {
                "id": 2,
                "name": "Bullpen Carts",
                "roster": { "entries": [roster_entry(100, "Aaron Judge", 9, 10, 33)] }
            }
        ],
        "settings": {
            "name": "Sunday Swingers",
            "scoringSettings": { "scoringType": "H2H_CATEGORY" },
            "scheduleSettings": { "playoffTeamCount": 4 }
        }
    }))
}

// Only `STATS_SEASON` has rows; any other season is empty.
async fn fangraphs_leaders(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let season = STATS_SEASON.to_string();
    if params.get("season") != Some(&season) {
        return Json(json!({ "data": [] }));
    }

    Json(json!({
        "data": [
            { "PlayerName": "Aaron Judge", "TeamName": "NYY", "Age": 32, "HR": 58, "OPS": "1.159", "AVG": 0.322 },
            { "PlayerName": "Juan Soto", "TeamName": "NYY", "Age": 25, "HR": 41, "OPS": 0.989, "AVG": 0.288 },
            { "PlayerName": "Luis Arraez", "TeamName": "SD", "Age": 27, "HR": 4, "OPS": "--", "AVG": 0.314 }
        ]
    }))
}

async fn savant_csv(Query(params): Query<HashMap<String, String>>) -> String {
    let role = params.get("player_type").map(String::as_str);
    let pitcher = params.get("pitchers_lookup[]").and_then(|id| id.parse::<i64>().ok());
    let batter = params.get("batters_lookup[]").and_then(|id| id.parse::<i64>().ok());

    match (role, pitcher, batter) {
        (Some("pitcher"), Some(PITCHER_ID), _) => format!(
            "{}FF,2024-06-01,97.1,\"Cole, Gerrit\",-0.62,1.41,2450\n",
            SAVANT_HEADER
        ),
        (Some("batter"), _, Some(BATTER_ID)) => format!(
            "{}SL,2024-06-01,86.4,\"Arraez, Luis\",0.35,0.12,2310\n",
            SAVANT_HEADER
        ),
        _ => SAVANT_HEADER.to_string(),
    }
}
