//! SQLite persistence for markets, snapshots, and every derived profile.
//!
//! One row (or row pair) per profile: behavior/flow/drivers upsert in place,
//! participation replaces both sides, exposure links insert-if-missing.
//! Queries are runtime-checked; column strings mirror `migrations/`.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::db::models::{
    AlertRow, BehaviorProfileRow, ExposureLinkRow, FlowProfileRow, MarketRow,
    ParticipationProfileRow, ResolutionDriversRow, SnapshotRow,
};
use crate::error::Result;
use crate::types::{
    Alert, AlertStatus, BehaviorProfile, ExposureClassification, FlowLabel, FlowProfile,
    FlowSignalState, MarketMeta, MarketSnapshot, ParticipationProfile, ResolutionDrivers,
    SignalConfidence,
};

#[derive(Clone)]
pub struct SignalStore {
    pool: sqlx::SqlitePool,
}

impl SignalStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    // -----------------------------------------------------------------------
    // Markets & snapshots
    // -----------------------------------------------------------------------

    pub async fn upsert_market(&self, meta: &MarketMeta, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO markets (id, question, category, end_date, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                question = excluded.question,
                category = excluded.category,
                end_date = excluded.end_date
            "#,
        )
        .bind(&meta.market_id)
        .bind(&meta.question)
        .bind(&meta.category)
        .bind(meta.end_date.map(|d| d.to_rfc3339()))
        .bind(now.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn load_markets(&self) -> Result<Vec<MarketMeta>> {
        let rows = sqlx::query_as::<_, MarketRow>(
            "SELECT id, question, category, end_date FROM markets",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(market_from_row).collect())
    }

    pub async fn insert_snapshot(&self, snapshot: &MarketSnapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO snapshots (market_id, price, volume_24h, liquidity, spread, depth, taken_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snapshot.market_id)
        .bind(snapshot.price)
        .bind(snapshot.volume_24h)
        .bind(snapshot.liquidity)
        .bind(snapshot.spread)
        .bind(snapshot.depth)
        .bind(snapshot.taken_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent snapshots for one market, newest-first.
    pub async fn load_snapshots(&self, market_id: &str, limit: i64) -> Result<Vec<MarketSnapshot>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT market_id, price, volume_24h, liquidity, spread, depth, taken_at
            FROM snapshots
            WHERE market_id = ?
            ORDER BY taken_at DESC
            LIMIT ?
            "#,
        )
        .bind(market_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(snapshot_from_row).collect())
    }

    // -----------------------------------------------------------------------
    // Behavior profiles
    // -----------------------------------------------------------------------

    pub async fn upsert_behavior(&self, p: &BehaviorProfile, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO behavior_profiles (
                market_id, info_cadence, info_structure, liquidity_stability,
                time_to_resolution, participant_concentration,
                cluster, confidence, explanation,
                retail_friendliness, what_it_means, what_to_watch, typical_mistake,
                updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(market_id) DO UPDATE SET
                info_cadence = excluded.info_cadence,
                info_structure = excluded.info_structure,
                liquidity_stability = excluded.liquidity_stability,
                time_to_resolution = excluded.time_to_resolution,
                participant_concentration = excluded.participant_concentration,
                cluster = excluded.cluster,
                confidence = excluded.confidence,
                explanation = excluded.explanation,
                retail_friendliness = excluded.retail_friendliness,
                what_it_means = excluded.what_it_means,
                what_to_watch = excluded.what_to_watch,
                typical_mistake = excluded.typical_mistake,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&p.market_id)
        .bind(p.features.info_cadence as i64)
        .bind(p.features.info_structure as i64)
        .bind(p.features.liquidity_stability as i64)
        .bind(p.features.time_to_resolution as i64)
        .bind(p.features.participant_concentration as i64)
        .bind(p.cluster.to_string())
        .bind(p.confidence as i64)
        .bind(&p.explanation)
        .bind(p.retail_friendliness.to_string())
        .bind(&p.what_it_means)
        .bind(&p.what_to_watch)
        .bind(&p.typical_mistake)
        .bind(now.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn behavior_profile(&self, market_id: &str) -> Result<Option<BehaviorProfileRow>> {
        let row = sqlx::query_as::<_, BehaviorProfileRow>(
            "SELECT * FROM behavior_profiles WHERE market_id = ?",
        )
        .bind(market_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // -----------------------------------------------------------------------
    // Flow profiles
    // -----------------------------------------------------------------------

    pub async fn upsert_flow(&self, p: &FlowProfile, now: DateTime<Utc>) -> Result<()> {
        let why_bullets = serde_json::to_string(&p.why_bullets)?;
        sqlx::query(
            r#"
            INSERT INTO flow_profiles (
                market_id, label, confidence, why_bullets,
                large_early_trades_pct, order_book_concentration,
                depth_shift_speed, repricing_speed, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(market_id) DO UPDATE SET
                label = excluded.label,
                confidence = excluded.confidence,
                why_bullets = excluded.why_bullets,
                large_early_trades_pct = excluded.large_early_trades_pct,
                order_book_concentration = excluded.order_book_concentration,
                depth_shift_speed = excluded.depth_shift_speed,
                repricing_speed = excluded.repricing_speed,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&p.market_id)
        .bind(p.label.to_string())
        .bind(p.confidence.to_string())
        .bind(why_bullets)
        .bind(p.metrics.map(|m| m.large_early_trades_pct))
        .bind(p.metrics.map(|m| m.order_book_concentration))
        .bind(p.metrics.map(|m| m.depth_shift_speed))
        .bind(p.metrics.map(|m| m.repricing_speed))
        .bind(now.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn flow_profile(&self, market_id: &str) -> Result<Option<FlowProfileRow>> {
        let row = sqlx::query_as::<_, FlowProfileRow>(
            "SELECT * FROM flow_profiles WHERE market_id = ?",
        )
        .bind(market_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Freshest stored flow signal for the alert evaluator.
    /// `is_favorable` means flow reads retail-actionable.
    pub async fn flow_signal_state(&self, market_id: &str) -> Result<Option<FlowSignalState>> {
        let Some(row) = self.flow_profile(market_id).await? else {
            return Ok(None);
        };
        let Some(confidence) = SignalConfidence::parse(&row.confidence) else {
            warn!("Unparseable flow confidence '{}' for {market_id}", row.confidence);
            return Ok(None);
        };
        let Some(computed_at) = DateTime::from_timestamp(row.updated_at, 0) else {
            return Ok(None);
        };
        Ok(Some(FlowSignalState {
            is_favorable: row.label == FlowLabel::RetailActionable.to_string(),
            confidence,
            computed_at,
        }))
    }

    // -----------------------------------------------------------------------
    // Resolution drivers
    // -----------------------------------------------------------------------

    pub async fn upsert_drivers(&self, d: &ResolutionDrivers, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO resolution_drivers (
                market_id, underlying_asset, asset_category, narrative_dependency,
                resolution_source, resolution_window_start, resolution_window_end, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(market_id) DO UPDATE SET
                underlying_asset = excluded.underlying_asset,
                asset_category = excluded.asset_category,
                narrative_dependency = excluded.narrative_dependency,
                resolution_source = excluded.resolution_source,
                resolution_window_start = excluded.resolution_window_start,
                resolution_window_end = excluded.resolution_window_end,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&d.market_id)
        .bind(&d.underlying_asset)
        .bind(d.asset_category.map(|c| c.to_string()))
        .bind(d.narrative_dependency.map(|n| n.to_string()))
        .bind(d.resolution_source.map(|s| s.to_string()))
        .bind(d.resolution_window_start.map(|t| t.to_rfc3339()))
        .bind(d.resolution_window_end.map(|t| t.to_rfc3339()))
        .bind(now.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn drivers(&self, market_id: &str) -> Result<Option<ResolutionDriversRow>> {
        let row = sqlx::query_as::<_, ResolutionDriversRow>(
            "SELECT * FROM resolution_drivers WHERE market_id = ?",
        )
        .bind(market_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // -----------------------------------------------------------------------
    // Exposure links
    // -----------------------------------------------------------------------

    /// True if a link exists for this unordered pair, in either direction.
    pub async fn link_exists(&self, market_a: &str, market_b: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM exposure_links
            WHERE (market_a_id = ? AND market_b_id = ?)
               OR (market_a_id = ? AND market_b_id = ?)
            "#,
        )
        .bind(market_a)
        .bind(market_b)
        .bind(market_b)
        .bind(market_a)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn insert_link(
        &self,
        market_a: &str,
        market_b: &str,
        c: &ExposureClassification,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO exposure_links (
                market_a_id, market_b_id, exposure_label, shared_driver_type,
                explanation, example_outcome, mistake_prevented, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(market_a)
        .bind(market_b)
        .bind(c.label.to_string())
        .bind(c.shared_driver_type.to_string())
        .bind(&c.explanation)
        .bind(&c.example_outcome)
        .bind(&c.mistake_prevented)
        .bind(now.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn links_for_market(&self, market_id: &str) -> Result<Vec<ExposureLinkRow>> {
        let rows = sqlx::query_as::<_, ExposureLinkRow>(
            r#"
            SELECT * FROM exposure_links
            WHERE market_a_id = ? OR market_b_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(market_id)
        .bind(market_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // -----------------------------------------------------------------------
    // Participation profiles
    // -----------------------------------------------------------------------

    /// Full replacement of both side rows for a market.
    pub async fn replace_participation(
        &self,
        yes: &ParticipationProfile,
        no: &ParticipationProfile,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("DELETE FROM participation_profiles WHERE market_id = ?")
            .bind(&yes.market_id)
            .execute(&self.pool)
            .await?;
        for profile in [yes, no] {
            sqlx::query(
                r#"
                INSERT INTO participation_profiles (
                    market_id, side, setup_quality_score, setup_quality_band,
                    participant_quality_score, participant_quality_band,
                    participation_summary, large_pct, mid_pct, small_pct,
                    behavior_insight, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&profile.market_id)
            .bind(profile.side.to_string())
            .bind(profile.setup_quality_score as i64)
            .bind(profile.setup_quality_band.to_string())
            .bind(profile.participant_quality_score as i64)
            .bind(profile.participant_quality_band.to_string())
            .bind(profile.participation_summary.to_string())
            .bind(profile.breakdown.large_pct as i64)
            .bind(profile.breakdown.mid_pct as i64)
            .bind(profile.breakdown.small_pct as i64)
            .bind(&profile.behavior_insight)
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn participation(&self, market_id: &str) -> Result<Vec<ParticipationProfileRow>> {
        let rows = sqlx::query_as::<_, ParticipationProfileRow>(
            "SELECT * FROM participation_profiles WHERE market_id = ? ORDER BY side DESC",
        )
        .bind(market_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // -----------------------------------------------------------------------
    // Alerts & notifications
    // -----------------------------------------------------------------------

    pub async fn insert_alert(&self, alert: &Alert) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO alerts (id, user_id, market_id, condition, status, created_at, triggered_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&alert.id)
        .bind(&alert.user_id)
        .bind(&alert.market_id)
        .bind(serde_json::to_string(&alert.condition)?)
        .bind(alert.status.to_string())
        .bind(alert.created_at.timestamp())
        .bind(alert.triggered_at.map(|t| t.timestamp()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_alerts(&self) -> Result<Vec<AlertRow>> {
        let rows = sqlx::query_as::<_, AlertRow>("SELECT * FROM alerts ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn alert(&self, alert_id: &str) -> Result<Option<AlertRow>> {
        let row = sqlx::query_as::<_, AlertRow>("SELECT * FROM alerts WHERE id = ?")
            .bind(alert_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Active alerts with parseable conditions. Rows whose stored condition
    /// no longer deserializes are skipped with a warning.
    pub async fn active_alerts(&self) -> Result<Vec<Alert>> {
        let rows = sqlx::query_as::<_, AlertRow>("SELECT * FROM alerts WHERE status = 'active'")
            .fetch_all(&self.pool)
            .await?;
        let mut alerts = Vec::with_capacity(rows.len());
        for row in rows {
            match alert_from_row(&row) {
                Some(alert) => alerts.push(alert),
                None => warn!("Skipping alert {} with unparseable condition", row.id),
            }
        }
        Ok(alerts)
    }

    pub async fn mark_triggered(&self, alert_id: &str, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE alerts SET status = 'triggered', triggered_at = ? WHERE id = ?")
            .bind(now.timestamp())
            .bind(alert_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Reset a triggered alert back to active.
    pub async fn dismiss_alert(&self, alert_id: &str) -> Result<()> {
        sqlx::query("UPDATE alerts SET status = 'active', triggered_at = NULL WHERE id = ?")
            .bind(alert_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_notification(
        &self,
        user_id: &str,
        alert_id: &str,
        market_id: &str,
        kind: &str,
        title: &str,
        message: &str,
        metadata: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, alert_id, market_id, kind, title, message, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(alert_id)
        .bind(market_id)
        .bind(kind)
        .bind(title)
        .bind(message)
        .bind(metadata.to_string())
        .bind(now.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row conversions
// ---------------------------------------------------------------------------

fn market_from_row(row: MarketRow) -> MarketMeta {
    MarketMeta {
        market_id: row.id,
        question: row.question,
        category: row.category,
        end_date: row.end_date.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|d| d.with_timezone(&Utc))
        }),
    }
}

fn snapshot_from_row(row: SnapshotRow) -> MarketSnapshot {
    MarketSnapshot {
        market_id: row.market_id,
        price: row.price,
        volume_24h: row.volume_24h,
        liquidity: row.liquidity,
        spread: row.spread,
        depth: row.depth,
        taken_at: DateTime::from_timestamp(row.taken_at, 0).unwrap_or_default(),
    }
}

fn alert_from_row(row: &AlertRow) -> Option<Alert> {
    Some(Alert {
        id: row.id.clone(),
        user_id: row.user_id.clone(),
        market_id: row.market_id.clone(),
        condition: serde_json::from_str(&row.condition).ok()?,
        status: AlertStatus::parse(&row.status)?,
        created_at: DateTime::from_timestamp(row.created_at, 0)?,
        triggered_at: row.triggered_at.and_then(|t| DateTime::from_timestamp(t, 0)),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
