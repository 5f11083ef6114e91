mod api;
mod config;
mod db;
mod error;
mod scorer;
mod signal;
mod state;
mod types;

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, SNAPSHOT_WINDOW};
use crate::db::SignalStore;
use crate::error::Result;
use crate::scorer::SignalRefresher;
use crate::state::SnapshotStore;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", cfg.db_path)).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);
    let db = SignalStore::new(pool);

    // --- Hydrate in-memory state from persisted markets/snapshots ---
    let store = SnapshotStore::new();
    let markets = db.load_markets().await?;
    let mut snapshot_total = 0usize;
    for meta in markets {
        let market_id = meta.market_id.clone();
        store.upsert_market(meta);
        // Stored newest-first; replay oldest-first so the ring ends up
        // newest-at-front.
        let snapshots = db.load_snapshots(&market_id, SNAPSHOT_WINDOW as i64).await?;
        snapshot_total += snapshots.len();
        for snapshot in snapshots.into_iter().rev() {
            store.push_snapshot(snapshot);
        }
    }
    info!(
        "Hydrated {} markets with {snapshot_total} snapshots",
        store.market_count(),
    );

    let health = Arc::new(HealthState::new(Utc::now().timestamp() as u64));

    // --- Background signal refresher ---
    let refresher = SignalRefresher::new(
        cfg.clone(),
        Arc::clone(&store),
        db.clone(),
        Arc::clone(&health),
    );
    tokio::spawn(async move { refresher.run().await });

    // --- HTTP API server ---
    let api_state = ApiState { store, db, health };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
