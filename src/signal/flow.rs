//! Flow guard: is professional money dominating this market, is it too
//! noisy to read, or is the flow something a retail participant can act on?

use crate::types::{FlowFeatures, FlowLabel, FlowProfile, SignalConfidence, WhyBullet};

/// Composite score weights.
const PRO_WEIGHTS: (f64, f64, f64) = (0.3, 0.3, 0.4);
const NOISY_WEIGHTS: (f64, f64) = (0.5, 0.5);

/// Minimum snapshots before a flow read is trusted at all.
const MIN_TRUSTED_SNAPSHOTS: usize = 10;

pub fn classify_flow(
    market_id: &str,
    features: FlowFeatures,
    snapshot_count: usize,
) -> FlowProfile {
    let pro_score = PRO_WEIGHTS.0 * features.large_early_trades_pct
        + PRO_WEIGHTS.1 * features.order_book_concentration
        + PRO_WEIGHTS.2 * features.repricing_speed;
    let noisy_score = NOISY_WEIGHTS.0 * features.depth_shift_speed
        + NOISY_WEIGHTS.1 * (50.0 - features.order_book_concentration).abs();

    let (label, confidence, why_bullets) = if pro_score > 60.0 {
        let confidence = if pro_score > 75.0 {
            SignalConfidence::High
        } else {
            SignalConfidence::Medium
        };
        (FlowLabel::ProDominant, confidence, pro_bullets(&features))
    } else if noisy_score > 50.0 || snapshot_count < MIN_TRUSTED_SNAPSHOTS {
        let confidence = if snapshot_count < MIN_TRUSTED_SNAPSHOTS {
            SignalConfidence::Low
        } else {
            SignalConfidence::Medium
        };
        (
            FlowLabel::HistoricallyNoisy,
            confidence,
            noisy_bullets(&features, snapshot_count),
        )
    } else {
        let confidence = if pro_score < 30.0 {
            SignalConfidence::High
        } else {
            SignalConfidence::Medium
        };
        (FlowLabel::RetailActionable, confidence, retail_bullets(&features))
    };

    // Metrics are unreadable below two snapshots — store nothing rather than
    // the zero-filled defaults.
    let metrics = (snapshot_count >= 2).then_some(features);

    FlowProfile {
        market_id: market_id.to_string(),
        label,
        confidence,
        why_bullets,
        metrics,
    }
}

fn bullet(text: &str, metric: &str, value: f64, unit: &str) -> WhyBullet {
    WhyBullet {
        text: text.to_string(),
        metric: metric.to_string(),
        value: (value * 10.0).round() / 10.0,
        unit: unit.to_string(),
    }
}

fn pro_bullets(f: &FlowFeatures) -> Vec<WhyBullet> {
    vec![
        bullet(
            "Large positions were built early in the window",
            "large_early_trades_pct",
            f.large_early_trades_pct,
            "%",
        ),
        bullet(
            "Order book liquidity is concentrated at few levels",
            "order_book_concentration",
            f.order_book_concentration,
            "%",
        ),
        bullet(
            "Price reprices quickly after new flow",
            "repricing_speed",
            f.repricing_speed,
            "%",
        ),
    ]
}

fn noisy_bullets(f: &FlowFeatures, snapshot_count: usize) -> Vec<WhyBullet> {
    vec![
        bullet(
            "Order book depth shifts erratically between observations",
            "depth_shift_speed",
            f.depth_shift_speed,
            "%",
        ),
        bullet(
            "Liquidity distribution gives no consistent read",
            "order_book_concentration",
            f.order_book_concentration,
            "%",
        ),
        bullet(
            "Observation history is thin for this market",
            "snapshot_count",
            snapshot_count as f64,
            "snapshots",
        ),
    ]
}

fn retail_bullets(f: &FlowFeatures) -> Vec<WhyBullet> {
    vec![
        bullet(
            "No sign of dominant early positioning",
            "large_early_trades_pct",
            f.large_early_trades_pct,
            "%",
        ),
        bullet(
            "Repricing is gradual, leaving time to act",
            "repricing_speed",
            f.repricing_speed,
            "%",
        ),
        bullet(
            "Order book depth is steady",
            "depth_shift_speed",
            f.depth_shift_speed,
            "%",
        ),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
