use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::health::HealthState;
use crate::config::{
    EXPOSURE_SCAN_LIMIT, FLOW_WINDOW, PARTICIPATION_WINDOW, SNAPSHOT_WINDOW,
};
use crate::db::models::{
    AlertRow, BehaviorProfileRow, ExposureLinkRow, FlowProfileRow, ParticipationProfileRow,
    ResolutionDriversRow,
};
use crate::db::SignalStore;
use crate::error::AppError;
use crate::signal::alert::evaluate_alert;
use crate::signal::behavior::classify_behavior;
use crate::signal::drivers::extract_drivers;
use crate::signal::exposure::classify_exposure;
use crate::signal::features::{extract_behavior_features, extract_flow_features};
use crate::signal::flow::classify_flow;
use crate::signal::participation::score_participation;
use crate::state::SnapshotStore;
use crate::types::{
    Alert, AlertCondition, AlertDecision, AlertStatus, BehaviorProfile, ExposureLabel,
    FlowProfile, MarketMeta, MarketSnapshot, ParticipationProfile, ResolutionDrivers,
};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<SnapshotStore>,
    pub db: SignalStore,
    pub health: Arc<HealthState>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/markets", post(register_market).get(get_markets))
        .route("/markets/:id/snapshots", post(ingest_snapshot))
        .route("/markets/:id/signals", get(get_signals))
        .route("/markets/:id/signals/behavior", post(compute_behavior))
        .route("/markets/:id/signals/flow", post(compute_flow))
        .route("/markets/:id/signals/drivers", post(compute_drivers))
        .route("/markets/:id/signals/participation", post(compute_participation))
        .route("/markets/:id/exposure", get(get_exposure))
        .route("/markets/:id/exposure/scan", post(scan_exposure))
        .route("/alerts", post(create_alert).get(get_alerts))
        .route("/alerts/:id/evaluate", post(evaluate_alert_now))
        .route("/alerts/:id/dismiss", post(dismiss_alert))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterMarketRequest {
    pub market_id: String,
    pub question: String,
    pub category: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct SnapshotRequest {
    pub price: f64,
    pub volume_24h: f64,
    pub liquidity: f64,
    pub spread: f64,
    pub depth: f64,
    pub taken_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct MarketResponse {
    pub market_id: String,
    pub question: String,
    pub category: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
    pub snapshot_count: usize,
}

#[derive(Serialize)]
pub struct SignalsResponse {
    pub behavior: Option<BehaviorProfileRow>,
    pub flow: Option<FlowProfileRow>,
    pub drivers: Option<ResolutionDriversRow>,
    pub participation: Vec<ParticipationProfileRow>,
}

#[derive(Serialize)]
pub struct ParticipationResponse {
    pub yes: ParticipationProfile,
    pub no: ParticipationProfile,
}

#[derive(Serialize)]
pub struct ExposureScanResponse {
    pub scanned: usize,
    pub links_created: usize,
    pub highly_linked: usize,
    pub partially_linked: usize,
}

#[derive(Deserialize)]
pub struct CreateAlertRequest {
    pub user_id: String,
    pub market_id: String,
    pub condition: AlertCondition,
}

// ---------------------------------------------------------------------------
// Health & markets
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "started_at": state.health.started_at(),
        "last_refresh_at": state.health.last_refresh_at(),
        "alerts_triggered": state.health.alerts_triggered(),
        "markets": state.store.market_count(),
    }))
}

async fn register_market(
    State(state): State<ApiState>,
    Json(req): Json<RegisterMarketRequest>,
) -> Result<Json<MarketResponse>, AppError> {
    if req.market_id.trim().is_empty() {
        return Err(AppError::InvalidInput("market_id must not be empty".to_string()));
    }
    if req.question.trim().is_empty() {
        return Err(AppError::InvalidInput("question must not be empty".to_string()));
    }

    let meta = MarketMeta {
        market_id: req.market_id,
        question: req.question,
        category: req.category,
        end_date: req.end_date,
    };
    state.db.upsert_market(&meta, Utc::now()).await?;
    state.store.upsert_market(meta.clone());
    info!(market_id = %meta.market_id, "Market registered");

    Ok(Json(market_response(&state, meta)))
}

async fn get_markets(State(state): State<ApiState>) -> Json<Vec<MarketResponse>> {
    let mut markets: Vec<MarketResponse> = state
        .store
        .all_market_ids()
        .into_iter()
        .filter_map(|id| state.store.get_market(&id))
        .map(|meta| market_response(&state, meta))
        .collect();
    markets.sort_by(|a, b| a.market_id.cmp(&b.market_id));
    Json(markets)
}

fn market_response(state: &ApiState, meta: MarketMeta) -> MarketResponse {
    let snapshot_count = state.store.snapshot_count(&meta.market_id);
    MarketResponse {
        market_id: meta.market_id,
        question: meta.question,
        category: meta.category,
        end_date: meta.end_date,
        snapshot_count,
    }
}

async fn ingest_snapshot(
    State(state): State<ApiState>,
    Path(market_id): Path<String>,
    Json(req): Json<SnapshotRequest>,
) -> Result<Json<MarketSnapshot>, AppError> {
    require_market(&state, &market_id)?;
    if !req.price.is_finite() || !(0.0..=1.0).contains(&req.price) {
        return Err(AppError::InvalidInput("price must be within 0..1".to_string()));
    }
    for (name, value) in [
        ("volume_24h", req.volume_24h),
        ("liquidity", req.liquidity),
        ("spread", req.spread),
        ("depth", req.depth),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::InvalidInput(format!("{name} must be non-negative")));
        }
    }

    let snapshot = MarketSnapshot {
        market_id: market_id.clone(),
        price: req.price,
        volume_24h: req.volume_24h,
        liquidity: req.liquidity,
        spread: req.spread,
        depth: req.depth,
        taken_at: req.taken_at.unwrap_or_else(Utc::now),
    };
    state.db.insert_snapshot(&snapshot).await?;
    state.store.push_snapshot(snapshot.clone());
    Ok(Json(snapshot))
}

// ---------------------------------------------------------------------------
// Signal computation
// ---------------------------------------------------------------------------

async fn compute_behavior(
    State(state): State<ApiState>,
    Path(market_id): Path<String>,
) -> Result<Json<BehaviorProfile>, AppError> {
    let meta = require_market(&state, &market_id)?;
    let now = Utc::now();
    let snapshots = state.store.recent_snapshots(&market_id, SNAPSHOT_WINDOW);
    let features = extract_behavior_features(&snapshots, &meta, now);
    let profile = classify_behavior(&market_id, features, meta.category.as_deref());
    state.db.upsert_behavior(&profile, now).await?;
    Ok(Json(profile))
}

async fn compute_flow(
    State(state): State<ApiState>,
    Path(market_id): Path<String>,
) -> Result<Json<FlowProfile>, AppError> {
    require_market(&state, &market_id)?;
    let snapshots = state.store.recent_snapshots(&market_id, FLOW_WINDOW);
    let profile = classify_flow(&market_id, extract_flow_features(&snapshots), snapshots.len());
    state.db.upsert_flow(&profile, Utc::now()).await?;
    Ok(Json(profile))
}

async fn compute_drivers(
    State(state): State<ApiState>,
    Path(market_id): Path<String>,
) -> Result<Json<ResolutionDrivers>, AppError> {
    let meta = require_market(&state, &market_id)?;
    let drivers = extract_drivers(&meta);
    state.db.upsert_drivers(&drivers, Utc::now()).await?;
    Ok(Json(drivers))
}

async fn compute_participation(
    State(state): State<ApiState>,
    Path(market_id): Path<String>,
) -> Result<Json<ParticipationResponse>, AppError> {
    require_market(&state, &market_id)?;
    let snapshots = state.store.recent_snapshots(&market_id, PARTICIPATION_WINDOW);
    let Some(latest) = snapshots.first() else {
        return Err(AppError::InvalidInput(format!(
            "market {market_id} has no snapshots to score"
        )));
    };
    let (yes, no) = score_participation(&market_id, latest, &snapshots, &mut rand::thread_rng());
    state.db.replace_participation(&yes, &no, Utc::now()).await?;
    Ok(Json(ParticipationResponse { yes, no }))
}

async fn get_signals(
    State(state): State<ApiState>,
    Path(market_id): Path<String>,
) -> Result<Json<SignalsResponse>, AppError> {
    require_market(&state, &market_id)?;
    Ok(Json(SignalsResponse {
        behavior: state.db.behavior_profile(&market_id).await?,
        flow: state.db.flow_profile(&market_id).await?,
        drivers: state.db.drivers(&market_id).await?,
        participation: state.db.participation(&market_id).await?,
    }))
}

// ---------------------------------------------------------------------------
// Exposure
// ---------------------------------------------------------------------------

async fn get_exposure(
    State(state): State<ApiState>,
    Path(market_id): Path<String>,
) -> Result<Json<Vec<ExposureLinkRow>>, AppError> {
    require_market(&state, &market_id)?;
    Ok(Json(state.db.links_for_market(&market_id).await?))
}

/// Batch classify the target market against up to 200 other unresolved
/// markets. Existing pairs are skipped, not refreshed — re-running only
/// fills gaps. Independent pairs are never persisted.
async fn scan_exposure(
    State(state): State<ApiState>,
    Path(market_id): Path<String>,
) -> Result<Json<ExposureScanResponse>, AppError> {
    let meta = require_market(&state, &market_id)?;
    let now = Utc::now();

    let target_drivers = extract_drivers(&meta);
    state.db.upsert_drivers(&target_drivers, now).await?;

    let candidates = state.store.unresolved_market_ids(&market_id, now, EXPOSURE_SCAN_LIMIT);
    let mut response = ExposureScanResponse {
        scanned: 0,
        links_created: 0,
        highly_linked: 0,
        partially_linked: 0,
    };

    for other_id in candidates {
        response.scanned += 1;
        if state.db.link_exists(&market_id, &other_id).await? {
            continue;
        }
        let Some(other_meta) = state.store.get_market(&other_id) else {
            continue;
        };
        let classification = classify_exposure(&target_drivers, &extract_drivers(&other_meta));
        match classification.label {
            ExposureLabel::Independent => continue,
            ExposureLabel::HighlyLinked => response.highly_linked += 1,
            ExposureLabel::PartiallyLinked => response.partially_linked += 1,
        }
        state.db.insert_link(&market_id, &other_id, &classification, now).await?;
        response.links_created += 1;
    }

    info!(
        market_id = %market_id,
        scanned = response.scanned,
        created = response.links_created,
        "Exposure scan complete",
    );
    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

async fn create_alert(
    State(state): State<ApiState>,
    Json(req): Json<CreateAlertRequest>,
) -> Result<Json<Alert>, AppError> {
    if req.user_id.trim().is_empty() {
        return Err(AppError::InvalidInput("user_id must not be empty".to_string()));
    }
    require_market(&state, &req.market_id)?;

    let now = Utc::now();
    let alert = Alert {
        id: format!("al-{:x}", now.timestamp_nanos_opt().unwrap_or_default()),
        user_id: req.user_id,
        market_id: req.market_id,
        condition: req.condition,
        status: AlertStatus::Active,
        created_at: now,
        triggered_at: None,
    };
    state.db.insert_alert(&alert).await?;
    Ok(Json(alert))
}

async fn get_alerts(State(state): State<ApiState>) -> Result<Json<Vec<AlertRow>>, AppError> {
    Ok(Json(state.db.list_alerts().await?))
}

/// On-demand evaluation of a single alert, with the same side effects as the
/// background sweep: a trigger flips the alert and emits a notification.
async fn evaluate_alert_now(
    State(state): State<ApiState>,
    Path(alert_id): Path<String>,
) -> Result<Json<AlertDecision>, AppError> {
    let alerts = state.db.active_alerts().await?;
    let Some(alert) = alerts.into_iter().find(|a| a.id == alert_id) else {
        return Err(AppError::NotFound(format!("active alert {alert_id}")));
    };

    let Some(latest) = state.store.latest_snapshot(&alert.market_id) else {
        return Err(AppError::InvalidInput(format!(
            "market {} has no snapshots to evaluate against",
            alert.market_id
        )));
    };
    let now = Utc::now();
    let hours_until_end = state
        .store
        .get_market(&alert.market_id)
        .and_then(|m| m.end_date)
        .map(|end| (end - now).num_seconds() as f64 / 3600.0);

    let market_state = crate::types::MarketState {
        price: latest.price,
        volume_24h: latest.volume_24h,
        liquidity: latest.liquidity,
        hours_until_end,
        avg_volume_baseline: crate::config::VOLUME_BASELINE_DEFAULT,
        flow_signal: state.db.flow_signal_state(&alert.market_id).await?,
        now,
    };

    let decision = evaluate_alert(&alert.condition, &market_state);
    if decision.should_trigger {
        state.db.mark_triggered(&alert.id, now).await?;
        let kind = alert.condition.kind();
        let metadata = serde_json::json!({
            "market_id": alert.market_id,
            "condition": alert.condition,
        });
        state
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
            .await?;
        state.health.add_alerts_triggered(1);
    }
    Ok(Json(decision))
}

async fn dismiss_alert(
    State(state): State<ApiState>,
    Path(alert_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if state.db.alert(&alert_id).await?.is_none() {
        return Err(AppError::NotFound(format!("alert {alert_id}")));
    }
    state.db.dismiss_alert(&alert_id).await?;
    Ok(Json(serde_json::json!({ "status": "active" })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require_market(state: &ApiState, market_id: &str) -> Result<MarketMeta, AppError> {
    state
        .store
        .get_market(market_id)
        .ok_or_else(|| AppError::NotFound(format!("market {market_id}")))
}
