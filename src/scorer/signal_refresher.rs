//! Background task that recomputes every market's derived profiles and
//! sweeps active alerts on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::api::health::HealthState;
use crate::config::{
    Config, FLOW_WINDOW, PARTICIPATION_WINDOW, REFRESH_INTERVAL_SECS, SNAPSHOT_WINDOW,
    VOLUME_BASELINE_DEFAULT,
};
use crate::db::SignalStore;
use crate::error::Result;
use crate::signal::alert::evaluate_alert;
use crate::signal::behavior::classify_behavior;
use crate::signal::drivers::extract_drivers;
use crate::signal::features::{extract_behavior_features, extract_flow_features};
use crate::signal::flow::classify_flow;
use crate::signal::participation::score_participation;
use crate::state::SnapshotStore;
use crate::types::{Alert, MarketState};

pub struct SignalRefresher {
    cfg: Config,
    store: Arc<SnapshotStore>,
    db: SignalStore,
    health: Arc<HealthState>,
}

impl SignalRefresher {
    pub fn new(
        cfg: Config,
        store: Arc<SnapshotStore>,
        db: SignalStore,
        health: Arc<HealthState>,
    ) -> Self {
        Self { cfg, store, db, health }
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(Duration::from_secs(REFRESH_INTERVAL_SECS));
        ticker.tick().await; // consume immediate first tick

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh_all().await {
                error!("Signal refresh failed: {e}");
            }
        }
    }

    async fn refresh_all(&self) -> Result<()> {
        let now = Utc::now();
        let mut scored = 0usize;
        let mut skipped = 0usize;

        for market_id in self.store.all_market_ids() {
            let snapshots = self.store.recent_snapshots(&market_id, SNAPSHOT_WINDOW);
            if snapshots.len() < self.cfg.refresh_min_snapshots {
                skipped += 1;
                continue;
            }
            let Some(meta) = self.store.get_market(&market_id) else {
                skipped += 1;
                continue;
            };

            let features = extract_behavior_features(&snapshots, &meta, now);
            let behavior = classify_behavior(&market_id, features, meta.category.as_deref());
            self.db.upsert_behavior(&behavior, now).await?;

            let flow_window = &snapshots[..snapshots.len().min(FLOW_WINDOW)];
            let flow = classify_flow(
                &market_id,
                extract_flow_features(flow_window),
                flow_window.len(),
            );
            self.db.upsert_flow(&flow, now).await?;

            self.db.upsert_drivers(&extract_drivers(&meta), now).await?;

            if let Some(latest) = snapshots.first() {
                let history = &snapshots[..snapshots.len().min(PARTICIPATION_WINDOW)];
                let (yes, no) =
                    score_participation(&market_id, latest, history, &mut rand::thread_rng());
                self.db.replace_participation(&yes, &no, now).await?;
            }

            scored += 1;
        }

        let triggered = self.sweep_alerts().await?;

        self.health.set_last_refresh_at(now.timestamp() as u64);
        self.health.add_alerts_triggered(triggered as u64);
        info!(
            scored,
            skipped,
            alerts_triggered = triggered,
            "Signal refresh complete: {scored} markets scored, {triggered} alerts triggered",
        );
        Ok(())
    }

    /// Evaluate every active alert against current market state. Triggered
    /// alerts flip to terminal status and emit a notification row.
    async fn sweep_alerts(&self) -> Result<usize> {
        let now = Utc::now();
        let mut triggered = 0usize;

        for alert in self.db.active_alerts().await? {
            let Some(state) = self.market_state(&alert).await? else {
                continue;
            };
            let decision = evaluate_alert(&alert.condition, &state);
            if !decision.should_trigger {
                continue;
            }

            self.db.mark_triggered(&alert.id, now).await?;
            let kind = alert.condition.kind();
            let metadata = serde_json::json!({
                "market_id": alert.market_id,
                "condition": alert.condition,
            });
            if let Err(e) = self
                .db
                .insert_notification(
                    &alert.user_id,
                    &alert.id,
                    &alert.market_id,
                    kind,
                    &format!("Alert triggered: {kind}"),
                    &decision.message,
                    &metadata,
                    now,
                )
                .await
            {
                warn!("Notification write failed for alert {}: {e}", alert.id);
            }
            info!(
                alert_id = %alert.id,
                market_id = %alert.market_id,
                kind,
                "ALERT TRIGGERED | {}",
                decision.message,
            );
            triggered += 1;
        }
        Ok(triggered)
    }

    async fn market_state(&self, alert: &Alert) -> Result<Option<MarketState>> {
        let Some(latest) = self.store.latest_snapshot(&alert.market_id) else {
            return Ok(None);
        };
        let now = Utc::now();
        let hours_until_end = self
            .store
            .get_market(&alert.market_id)
            .and_then(|m| m.end_date)
            .map(|end| (end - now).num_seconds() as f64 / 3600.0);
        let flow_signal = self.db.flow_signal_state(&alert.market_id).await?;

        Ok(Some(MarketState {
            price: latest.price,
            volume_24h: latest.volume_24h,
            liquidity: latest.liquidity,
            hours_until_end,
            avg_volume_baseline: VOLUME_BASELINE_DEFAULT,
            flow_signal,
            now,
        }))
    }
}
