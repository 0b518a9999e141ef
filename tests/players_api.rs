mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{get, response_body, send, test_app, test_pool};
use fantasy_baseball_api::db;
use fantasy_baseball_api::models::{MessageResponse, NewPlayer, Player, PlayerPatch};

async fn create(app: &axum::Router, body: Value) -> Player {
    let response = send(app, Method::POST, "/api/players", Some(body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    response_body(response).await
}

#[tokio::test]
async fn create_then_get_returns_same_player() {
    let (app, _pool) = test_app().await;

    let created = create(
        &app,
        json!({"espn_id": 33192, "name": "Aaron Judge", "position": "OF", "team": "NYY", "hr": 58}),
    )
    .await;
    assert_eq!(created.name, "Aaron Judge");
    assert!(created.updated_at.is_none());

    let response = get(&app, &format!("/api/players/{}", created.id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: Player = response_body(response).await;
    assert_eq!(fetched, created);

    let response = get(&app, "/api/players/espn/33192").await;
    assert_eq!(response.status(), StatusCode::OK);
    let by_espn: Player = response_body(response).await;
    assert_eq!(by_espn.id, created.id);
}

#[tokio::test]
async fn duplicate_espn_id_is_rejected() {
    let (app, _pool) = test_app().await;
    create(&app, json!({"espn_id": 1, "name": "First"})).await;

    let response = send(
        &app,
        Method::POST,
        "/api/players",
        Some(json!({"espn_id": 1, "name": "Second"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response_body(response).await;
    assert_eq!(body["message"], "Failed to create player");
}

#[tokio::test]
async fn create_without_required_fields_is_rejected() {
    let (app, _pool) = test_app().await;

    let response = send(&app, Method::POST, "/api/players", Some(json!({"name": "No Id"}))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_update_leaves_player_unchanged() {
    let (app, _pool) = test_app().await;
    let created = create(&app, json!({"espn_id": 7, "name": "Mookie Betts", "team": "LAD"})).await;

    let response = send(
        &app,
        Method::PUT,
        &format!("/api/players/{}", created.id),
        Some(json!({})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let updated: Player = response_body(response).await;
    assert_eq!(updated, created);
}

#[tokio::test]
async fn update_ignores_id_and_applies_fields() {
    let (app, _pool) = test_app().await;
    let created = create(&app, json!({"espn_id": 8, "name": "Trea Turner", "team": "WSH"})).await;

    let response = send(
        &app,
        Method::PUT,
        &format!("/api/players/{}", created.id),
        Some(json!({"id": 999, "team": "PHI", "position": null})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let updated: Player = response_body(response).await;
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.team.as_deref(), Some("PHI"));
    assert!(updated.position.is_none());
    assert!(updated.updated_at.is_some());

    assert_eq!(get(&app, "/api/players/999").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patches_to_different_fields_do_not_overwrite_each_other() {
    let pool = test_pool().await;
    let new_player: NewPlayer =
        serde_json::from_value(json!({"espn_id": 5, "name": "Keep", "team": "KC"})).unwrap();
    let player = db::insert_player(&pool, &new_player).await.unwrap();

    let hr: PlayerPatch = serde_json::from_value(json!({"hr": 40})).unwrap();
    let team: PlayerPatch = serde_json::from_value(json!({"team": "NYY"})).unwrap();
    let (first, second) = tokio::join!(
        db::update_player(&pool, player.id, &hr),
        db::update_player(&pool, player.id, &team),
    );
    assert!(first.unwrap().is_some());
    assert!(second.unwrap().is_some());

    let stored = db::get_player_by_id(&pool, player.id).await.unwrap().unwrap();
    assert_eq!(stored.hr, Some(40));
    assert_eq!(stored.team.as_deref(), Some("NYY"));
    assert_eq!(stored.name, "Keep");
}

#[tokio::test]
async fn update_of_vanished_player_is_none() {
    let pool = test_pool().await;
    let patch: PlayerPatch = serde_json::from_value(json!({"name": "Ghost"})).unwrap();

    assert!(db::update_player(&pool, 404, &patch).await.unwrap().is_none());
}

#[tokio::test]
async fn null_on_required_field_is_rejected() {
    let (app, _pool) = test_app().await;
    let created = create(&app, json!({"espn_id": 5, "name": "Keep"})).await;
    let uri = format!("/api/players/{}", created.id);

    let response = send(&app, Method::PUT, &uri, Some(json!({"name": null, "espn_id": null}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let stored: Player = response_body(get(&app, &uri).await).await;
    assert_eq!(stored, created);
}

#[tokio::test]
async fn update_missing_player_is_not_found() {
    let (app, _pool) = test_app().await;

    let response = send(&app, Method::PUT, "/api/players/42", Some(json!({"name": "x"}))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_player() {
    let (app, _pool) = test_app().await;
    let created = create(&app, json!({"espn_id": 9, "name": "Gone Soon"})).await;
    let uri = format!("/api/players/{}", created.id);

    let response = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: MessageResponse = response_body(response).await;
    assert_eq!(body.message, "Player deleted successfully");

    assert_eq!(get(&app, &uri).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        send(&app, Method::DELETE, &uri, None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn list_filters_by_exact_position_and_searches_case_insensitively() {
    let (app, _pool) = test_app().await;
    create(&app, json!({"espn_id": 1, "name": "Bobby Witt Jr.", "position": "SS", "team": "KC"})).await;
    create(&app, json!({"espn_id": 2, "name": "Corey Seager", "position": "SS", "team": "TEX"})).await;
    create(&app, json!({"espn_id": 3, "name": "Jose Ramirez", "position": "3B", "team": "CLE"})).await;

    let shortstops: Vec<Player> = response_body(get(&app, "/api/players?position=SS").await).await;
    assert_eq!(shortstops.len(), 2);
    assert!(shortstops.iter().all(|p| p.position.as_deref() == Some("SS")));

    let found: Vec<Player> = response_body(get(&app, "/api/players?search=seager").await).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Corey Seager");

    let by_team: Vec<Player> = response_body(get(&app, "/api/players?search=cle").await).await;
    assert_eq!(by_team.len(), 1);
    assert_eq!(by_team[0].espn_id, 3);
}

#[tokio::test]
async fn list_paginates_and_validates_bounds() {
    let (app, _pool) = test_app().await;
    for espn_id in 1..=3 {
        create(&app, json!({"espn_id": espn_id, "name": format!("Player {}", espn_id)})).await;
    }

    let page: Vec<Player> = response_body(get(&app, "/api/players?skip=1&limit=1").await).await;
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].espn_id, 2);

    assert_eq!(get(&app, "/api/players?limit=0").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(get(&app, "/api/players?limit=1001").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(get(&app, "/api/players?skip=-1").await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn leaders_rank_by_stat_with_missing_values_last() {
    let (app, _pool) = test_app().await;
    create(&app, json!({"espn_id": 1, "name": "Low", "hr": 10})).await;
    create(&app, json!({"espn_id": 2, "name": "None"})).await;
    create(&app, json!({"espn_id": 3, "name": "High", "hr": 40})).await;

    let response = get(&app, "/api/players/stats/leaders?stat=hr&limit=3").await;
    assert_eq!(response.status(), StatusCode::OK);
    let leaders: Vec<Player> = response_body(response).await;
    let names: Vec<&str> = leaders.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["High", "Low", "None"]);
}

#[tokio::test]
async fn leaders_reject_unknown_stat_and_bad_limit() {
    let (app, _pool) = test_app().await;

    let response = get(&app, "/api/players/stats/leaders?stat=xyz").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response_body(response).await;
    assert_eq!(body["message"], "Invalid stat. Must be one of: hr, rbi, sb, avg, ops");

    assert_eq!(
        get(&app, "/api/players/stats/leaders?stat=ops&limit=51").await.status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        get(&app, "/api/players/stats/leaders").await.status(),
        StatusCode::BAD_REQUEST
    );
}
