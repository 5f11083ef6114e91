use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;

use crate::config::SNAPSHOT_WINDOW;
use crate::types::{MarketMeta, MarketSnapshot};

// ---------------------------------------------------------------------------
// SnapshotStore
// ---------------------------------------------------------------------------

/// In-memory hot state shared by the API handlers and the signal refresher.
///
/// Snapshots are kept newest-first, capped at `SNAPSHOT_WINDOW` per market —
/// every classifier reads at most that many. Hydrated from SQLite at boot,
/// appended on ingest.
pub struct SnapshotStore {
    /// market_id → metadata
    markets: DashMap<String, MarketMeta>,
    /// market_id → snapshots, index 0 = most recent
    snapshots: DashMap<String, VecDeque<MarketSnapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            markets: DashMap::new(),
            snapshots: DashMap::new(),
        })
    }

    /// Register or refresh market metadata.
    pub fn upsert_market(&self, meta: MarketMeta) {
        self.snapshots.entry(meta.market_id.clone()).or_default();
        self.markets.insert(meta.market_id.clone(), meta);
    }

    pub fn get_market(&self, market_id: &str) -> Option<MarketMeta> {
        self.markets.get(market_id).map(|m| m.clone())
    }

    /// Append a snapshot as the new most-recent entry, evicting the oldest
    /// once the window is full.
    pub fn push_snapshot(&self, snapshot: MarketSnapshot) {
        let mut ring = self.snapshots.entry(snapshot.market_id.clone()).or_default();
        ring.push_front(snapshot);
        if ring.len() > SNAPSHOT_WINDOW {
            ring.pop_back();
        }
    }

    /// Up to `limit` snapshots, newest-first.
    pub fn recent_snapshots(&self, market_id: &str, limit: usize) -> Vec<MarketSnapshot> {
        self.snapshots
            .get(market_id)
            .map(|ring| ring.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn latest_snapshot(&self, market_id: &str) -> Option<MarketSnapshot> {
        self.snapshots
            .get(market_id)
            .and_then(|ring| ring.front().cloned())
    }

    pub fn snapshot_count(&self, market_id: &str) -> usize {
        self.snapshots.get(market_id).map(|r| r.len()).unwrap_or(0)
    }

    pub fn market_count(&self) -> usize {
        self.markets.len()
    }

    pub fn all_market_ids(&self) -> Vec<String> {
        self.markets.iter().map(|e| e.key().clone()).collect()
    }

    /// Markets other than `market_id` whose end date is absent or in the
    /// future, capped at `limit`. Exposure scan candidates.
    pub fn unresolved_market_ids(
        &self,
        market_id: &str,
        now: chrono::DateTime<chrono::Utc>,
        limit: usize,
    ) -> Vec<String> {
        self.markets
            .iter()
            .filter(|e| e.key() != market_id)
            .filter(|e| e.value().end_date.map_or(true, |end| end > now))
            .map(|e| e.key().clone())
            .take(limit)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn meta(id: &str) -> MarketMeta {
        MarketMeta {
            market_id: id.to_string(),
            question: "Test?".to_string(),
            category: None,
            end_date: None,
        }
    }

    fn snap(id: &str, price: f64) -> MarketSnapshot {
        MarketSnapshot {
            market_id: id.to_string(),
            price,
            volume_24h: 1000.0,
            liquidity: 5000.0,
            spread: 0.02,
            depth: 2000.0,
            taken_at: Utc::now(),
        }
    }

    #[test]
    fn snapshots_are_newest_first() {
        let store = SnapshotStore::new();
        store.upsert_market(meta("m1"));
        store.push_snapshot(snap("m1", 0.40));
        store.push_snapshot(snap("m1", 0.50));
        store.push_snapshot(snap("m1", 0.60));

        let recent = store.recent_snapshots("m1", 10);
        assert_eq!(recent.len(), 3);
        assert!((recent[0].price - 0.60).abs() < 1e-9);
        assert!((recent[2].price - 0.40).abs() < 1e-9);
        assert!((store.latest_snapshot("m1").unwrap().price - 0.60).abs() < 1e-9);
    }

    #[test]
    fn window_evicts_oldest() {
        let store = SnapshotStore::new();
        store.upsert_market(meta("m1"));
        for i in 0..(SNAPSHOT_WINDOW + 10) {
            store.push_snapshot(snap("m1", i as f64 / 1000.0));
        }
        assert_eq!(store.snapshot_count("m1"), SNAPSHOT_WINDOW);

        // Oldest remaining entry is the 10th pushed, not the 0th.
        let recent = store.recent_snapshots("m1", SNAPSHOT_WINDOW);
        assert!((recent.last().unwrap().price - 0.010).abs() < 1e-9);
    }

    #[test]
    fn unknown_market_reads_empty() {
        let store = SnapshotStore::new();
        assert!(store.recent_snapshots("nope", 10).is_empty());
        assert!(store.latest_snapshot("nope").is_none());
        assert_eq!(store.snapshot_count("nope"), 0);
    }

    #[test]
    fn unresolved_excludes_self_and_ended() {
        let store = SnapshotStore::new();
        let now = Utc::now();
        store.upsert_market(meta("target"));
        store.upsert_market(meta("open"));
        let mut ended = meta("ended");
        ended.end_date = Some(now - Duration::hours(1));
        store.upsert_market(ended);

        let ids = store.unresolved_market_ids("target", now, 200);
        assert_eq!(ids, vec!["open".to_string()]);
    }
}
