use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use state::AppState;

fn api_routes() -> Router<AppState> {
    Router::new()
        // Player endpoints
        .route(
            "/players",
            get(routes::players::get_players).post(routes::players::create_player),
        )
        .route(
            "/players/{id}",
            get(routes::players::get_player_by_id)
                .put(routes::players::update_player)
                .delete(routes::players::delete_player),
        )
        .route("/players/espn/{espn_id}", get(routes::players::get_player_by_espn_id))
        .route("/players/stats/leaders", get(routes::players::get_leaders))

        // Scouting card endpoints
        .route(
            "/players/{id}/cards",
            get(routes::cards::get_player_cards).post(routes::cards::create_player_card),
        )
        .route(
            "/cards/{id}",
            get(routes::cards::get_card)
                .put(routes::cards::update_card)
                .delete(routes::cards::delete_card),
        )

        // Team endpoints
        .route(
            "/teams",
            get(routes::teams::get_teams).post(routes::teams::create_team),
        )
        .route(
            "/teams/{id}",
            get(routes::teams::get_team_by_id)
                .put(routes::teams::update_team)
                .delete(routes::teams::delete_team),
        )

        // ESPN league endpoints
        .route("/espn/leagues/{league_id}/teams", get(routes::league::get_league_teams))
        .route("/espn/leagues/{league_id}/players", get(routes::league::get_league_players))
        .route(
            "/espn/leagues/{league_id}/players/{espn_id}",
            get(routes::league::get_league_player_stats),
        )
        .route("/espn/leagues/{league_id}/free-agents", get(routes::league::get_free_agents))
        .route("/espn/leagues/{league_id}/settings", get(routes::league::get_league_settings))
        .route("/espn/leagues/{league_id}/import", post(routes::league::import_league_players))

        // Stats endpoints
        .route("/stats/players/season/{year}", get(routes::stats::get_season_stats))
        .route("/stats/leaders/{year}", get(routes::stats::get_stat_leaders))
        .route("/stats/statcast/{player_id}", get(routes::stats::get_statcast))

        .route("/health", get(routes::health::health_check))
}

/// Build the full application router around `state`.
pub fn app(state: AppState) -> Router {
    // CORS configuration for browser frontends
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
