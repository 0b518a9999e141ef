use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fantasy_baseball_api::{app, config::Config, db, AppState};

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Fantasy Baseball API...");

    dotenvy::dotenv().ok();

    let config = Config::from_env().expect("Invalid configuration");

    let pool = db::connect(&config.database_url, config.max_connections)
        .await
        .expect("Failed to connect to database");

    db::init_schema(&pool)
        .await
        .expect("Failed to initialize database schema");

    tracing::info!("Database connection established.");

    let addr = config.addr();
    let state = AppState::new(pool.clone(), config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server.");

    db::close(&pool).await;
    tracing::info!("Shutting down Fantasy Baseball API...");
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
