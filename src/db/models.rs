//! Row structs for runtime-checked sqlx queries. Enum-valued columns come
//! back as their wire strings; API responses pass them through as-is.

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct MarketRow {
    pub id: String,
    pub question: String,
    pub category: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SnapshotRow {
    pub market_id: String,
    pub price: f64,
    pub volume_24h: f64,
    pub liquidity: f64,
    pub spread: f64,
    pub depth: f64,
    pub taken_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BehaviorProfileRow {
    pub market_id: String,
    pub info_cadence: i64,
    pub info_structure: i64,
    pub liquidity_stability: i64,
    pub time_to_resolution: i64,
    pub participant_concentration: i64,
    pub cluster: String,
    pub confidence: i64,
    pub explanation: String,
    pub retail_friendliness: String,
    pub what_it_means: String,
    pub what_to_watch: String,
    pub typical_mistake: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FlowProfileRow {
    pub market_id: String,
    pub label: String,
    pub confidence: String,
    /// JSON array of why-bullets.
    pub why_bullets: String,
    pub large_early_trades_pct: Option<f64>,
    pub order_book_concentration: Option<f64>,
    pub depth_shift_speed: Option<f64>,
    pub repricing_speed: Option<f64>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResolutionDriversRow {
    pub market_id: String,
    pub underlying_asset: Option<String>,
    pub asset_category: Option<String>,
    pub narrative_dependency: Option<String>,
    pub resolution_source: Option<String>,
    pub resolution_window_start: Option<String>,
    pub resolution_window_end: Option<String>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExposureLinkRow {
    pub id: i64,
    pub market_a_id: String,
    pub market_b_id: String,
    pub exposure_label: String,
    pub shared_driver_type: String,
    pub explanation: String,
    pub example_outcome: String,
    pub mistake_prevented: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParticipationProfileRow {
    pub market_id: String,
    pub side: String,
    pub setup_quality_score: i64,
    pub setup_quality_band: String,
    pub participant_quality_score: i64,
    pub participant_quality_band: String,
    pub participation_summary: String,
    pub large_pct: i64,
    pub mid_pct: i64,
    pub small_pct: i64,
    pub behavior_insight: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertRow {
    pub id: String,
    pub user_id: String,
    pub market_id: String,
    /// JSON-tagged `AlertCondition`.
    pub condition: String,
    pub status: String,
    pub created_at: i64,
    pub triggered_at: Option<i64>,
}
