use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::sqlite::SqlitePool;

use crate::config::Config;
use crate::services::espn::LeagueConfig;
use crate::services::stats::StatsClient;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub http: reqwest::Client,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool,
            http: reqwest::Client::new(),
            config: Arc::new(config),
        }
    }

    pub fn stats_client(&self) -> StatsClient {
        StatsClient::new(
            self.http.clone(),
            &self.config.fangraphs_base_url,
            &self.config.savant_base_url,
        )
    }

    pub fn league_config(&self, league_id: i64, year: i32) -> LeagueConfig {
        LeagueConfig {
            league_id,
            year,
            credentials: self.config.espn_credentials.clone(),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
