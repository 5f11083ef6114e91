use crate::error::{AppError, Result};

/// Max snapshots retained per market in the in-memory store (newest-first).
/// Behavior features read the full window.
pub const SNAPSHOT_WINDOW: usize = 100;

/// Flow features read at most this many of the newest snapshots.
pub const FLOW_WINDOW: usize = 50;

/// Participation scoring reads at most this many historical snapshots.
pub const PARTICIPATION_WINDOW: usize = 20;

/// Minimum snapshots before the coefficient-of-variation formulas engage.
/// Below this, stability/concentration scores fall back to 50.
pub const MIN_STABILITY_SNAPSHOTS: usize = 5;

/// Minimum positive samples within the window for a CoV score.
pub const MIN_POSITIVE_SAMPLES: usize = 3;

/// Exposure batch scans at most this many other markets per run.
pub const EXPOSURE_SCAN_LIMIT: usize = 200;

/// Flow signals older than this are ignored by structure alerts.
pub const SIGNAL_FRESHNESS_SECS: i64 = 4 * 3600;

/// Signal refresher interval (seconds).
pub const REFRESH_INTERVAL_SECS: u64 = 60;

/// Assumed 24h volume baseline for volume_spike alerts when no history exists.
pub const VOLUME_BASELINE_DEFAULT: f64 = 10_000.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Markets with fewer snapshots than this are skipped by the refresher.
    pub refresh_min_snapshots: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "signals.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            refresh_min_snapshots: std::env::var("REFRESH_MIN_SNAPSHOTS")
                .unwrap_or_else(|_| "1".to_string())
                .parse::<usize>()
                .unwrap_or(1),
        })
    }
}
