//! Shared health state for the /health endpoint.
//! Updated by the SignalRefresher, read by the API.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct HealthState {
    /// Unix-seconds timestamp of service start.
    pub started_at: AtomicU64,
    /// Unix-seconds timestamp of the last completed refresh (0 = none yet).
    pub last_refresh_at: AtomicU64,
    /// Total alerts triggered since start.
    pub alerts_triggered: AtomicU64,
}

impl HealthState {
    pub fn new(started_at: u64) -> Self {
        let state = Self::default();
        state.started_at.store(started_at, Ordering::Relaxed);
        state
    }

    pub fn set_last_refresh_at(&self, secs: u64) {
        self.last_refresh_at.store(secs, Ordering::Relaxed);
    }

    pub fn add_alerts_triggered(&self, n: u64) {
        self.alerts_triggered.fetch_add(n, Ordering::Relaxed);
    }

    pub fn started_at(&self) -> u64 {
        self.started_at.load(Ordering::Relaxed)
    }

    pub fn last_refresh_at(&self) -> u64 {
        self.last_refresh_at.load(Ordering::Relaxed)
    }

    pub fn alerts_triggered(&self) -> u64 {
        self.alerts_triggered.load(Ordering::Relaxed)
    }
}
