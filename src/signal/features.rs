//! Feature extraction from raw snapshot sequences.
//!
//! Every score is 0–100. Formulas that need more data than the market has
//! fall back to documented defaults instead of erroring — degraded
//! confidence is the signal, never an exception (and never NaN).

use chrono::{DateTime, Utc};

use crate::config::{MIN_POSITIVE_SAMPLES, MIN_STABILITY_SNAPSHOTS};
use crate::types::{BehaviorFeatures, FlowFeatures, MarketMeta, MarketSnapshot};

/// Neutral fallback when a formula lacks data.
const DEFAULT_SCORE: f64 = 50.0;

// ---------------------------------------------------------------------------
// Shared math
// ---------------------------------------------------------------------------

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Coefficient-of-variation stability: `100 - 100 * (stddev / mean)`,
/// clamped to [0, 100]. Requires a positive mean.
pub fn cv_stability(values: &[f64]) -> f64 {
    let m = mean(values);
    if m <= 0.0 {
        return DEFAULT_SCORE;
    }
    clamp_score(100.0 - 100.0 * (stddev(values) / m))
}

// ---------------------------------------------------------------------------
// Behavior features (classifier input A)
// ---------------------------------------------------------------------------

/// Extract the five behavior dimension scores from up to ~100 snapshots
/// (newest-first) plus static metadata.
pub fn extract_behavior_features(
    snapshots: &[MarketSnapshot],
    meta: &MarketMeta,
    now: DateTime<Utc>,
) -> BehaviorFeatures {
    let category = meta
        .category
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let hours_to_resolution = hours_until(meta.end_date, now);

    BehaviorFeatures {
        info_cadence: info_cadence(&category) as u8,
        info_structure: info_structure(&category, hours_to_resolution) as u8,
        liquidity_stability: windowed_cv_stability(snapshots, |s| s.liquidity) as u8,
        time_to_resolution: time_to_resolution(hours_to_resolution) as u8,
        participant_concentration: participant_concentration(snapshots) as u8,
    }
}

fn hours_until(end_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<f64> {
    end_date.map(|end| (end - now).num_seconds() as f64 / 3600.0)
}

/// How often resolution-relevant information arrives. First keyword wins.
fn info_cadence(category: &str) -> f64 {
    const CADENCE_BY_KEYWORD: &[(&str, f64)] = &[
        ("sports", 90.0),
        ("crypto", 80.0),
        ("politics", 40.0),
        ("election", 40.0),
    ];
    for (keyword, score) in CADENCE_BY_KEYWORD {
        if category.contains(keyword) {
            return *score;
        }
    }
    DEFAULT_SCORE
}

/// How discretely structured the information flow is. The imminent-resolution
/// check takes precedence over category rules.
fn info_structure(category: &str, hours_to_resolution: Option<f64>) -> f64 {
    if matches!(hours_to_resolution, Some(h) if h < 24.0) {
        90.0
    } else if category.contains("sports") {
        95.0
    } else if category.contains("will") && category.contains("2025") {
        70.0
    } else {
        DEFAULT_SCORE
    }
}

/// CoV stability over one snapshot field, with the minimum-data guards:
/// at least 5 snapshots and at least 3 positive values, else 50.
fn windowed_cv_stability(snapshots: &[MarketSnapshot], field: impl Fn(&MarketSnapshot) -> f64) -> f64 {
    if snapshots.len() < MIN_STABILITY_SNAPSHOTS {
        return DEFAULT_SCORE;
    }
    let values: Vec<f64> = snapshots.iter().map(&field).filter(|v| *v > 0.0).collect();
    if values.len() < MIN_POSITIVE_SAMPLES {
        return DEFAULT_SCORE;
    }
    cv_stability(&values)
}

/// Bucketed hours-to-resolution. Null end date reads as neutral.
fn time_to_resolution(hours: Option<f64>) -> f64 {
    match hours {
        None => DEFAULT_SCORE,
        Some(h) if h < 24.0 => 10.0,
        Some(h) if h < 168.0 => 30.0,
        Some(h) if h < 720.0 => 50.0,
        Some(h) if h < 2160.0 => 70.0,
        Some(_) => 90.0,
    }
}

/// Peak-to-mean volume ratio, scaled. High values mean a few heavy prints
/// dominate the tape.
fn participant_concentration(snapshots: &[MarketSnapshot]) -> f64 {
    if snapshots.len() < MIN_STABILITY_SNAPSHOTS {
        return DEFAULT_SCORE;
    }
    let volumes: Vec<f64> = snapshots
        .iter()
        .map(|s| s.volume_24h)
        .filter(|v| *v > 0.0)
        .collect();
    if volumes.len() < MIN_POSITIVE_SAMPLES {
        return DEFAULT_SCORE;
    }
    let m = mean(&volumes);
    if m <= 0.0 {
        return DEFAULT_SCORE;
    }
    let max = volumes.iter().cloned().fold(f64::MIN, f64::max);
    (max / m * 20.0).min(100.0)
}

// ---------------------------------------------------------------------------
// Stability scores shared with the participation scorer
// ---------------------------------------------------------------------------

/// CoV liquidity stability with the minimum-data guards. 50 when thin.
pub fn liquidity_stability_score(snapshots: &[MarketSnapshot]) -> f64 {
    windowed_cv_stability(snapshots, |s| s.liquidity)
}

/// Inverted repricing speed: 100 for a flat tape, 0 for constant 0.2 jumps.
/// 50 when fewer than two observations exist.
pub fn price_stability_score(snapshots: &[MarketSnapshot]) -> f64 {
    if snapshots.len() < 2 {
        return DEFAULT_SCORE;
    }
    clamp_score(100.0 - repricing_speed(snapshots))
}

// ---------------------------------------------------------------------------
// Flow features (classifier input B)
// ---------------------------------------------------------------------------

/// Extract the four flow metrics from up to ~50 snapshots, index 0 = most
/// recent.
pub fn extract_flow_features(snapshots: &[MarketSnapshot]) -> FlowFeatures {
    FlowFeatures {
        large_early_trades_pct: large_early_trades_pct(snapshots),
        order_book_concentration: order_book_concentration(snapshots),
        depth_shift_speed: depth_shift_speed(snapshots),
        repricing_speed: repricing_speed(snapshots),
    }
}

/// Share of volume that arrived in the oldest 5 observations relative to the
/// whole window. Oldest entries sit at the end of the slice.
fn large_early_trades_pct(snapshots: &[MarketSnapshot]) -> f64 {
    if snapshots.len() < 5 {
        return 0.0;
    }
    let volumes: Vec<f64> = snapshots.iter().map(|s| s.volume_24h).collect();
    let all_mean = mean(&volumes);
    if all_mean <= 0.0 {
        return 0.0;
    }
    let oldest_mean = mean(&volumes[volumes.len() - 5..]);
    (oldest_mean / all_mean * 100.0).min(100.0)
}

/// Liquidity range relative to its mean. Requires 3 positive values, else
/// neutral 50.
fn order_book_concentration(snapshots: &[MarketSnapshot]) -> f64 {
    let liquidity: Vec<f64> = snapshots
        .iter()
        .map(|s| s.liquidity)
        .filter(|v| *v > 0.0)
        .collect();
    if liquidity.len() < MIN_POSITIVE_SAMPLES {
        return DEFAULT_SCORE;
    }
    let m = mean(&liquidity);
    if m <= 0.0 {
        return DEFAULT_SCORE;
    }
    let max = liquidity.iter().cloned().fold(f64::MIN, f64::max);
    let min = liquidity.iter().cloned().fold(f64::MAX, f64::min);
    (((max - min) / m) * 50.0).min(100.0)
}

/// Mean absolute relative change between consecutive depth observations.
/// Pairs with a zero base are skipped rather than producing infinities.
fn depth_shift_speed(snapshots: &[MarketSnapshot]) -> f64 {
    if snapshots.len() < 2 {
        return 0.0;
    }
    let mut changes = Vec::with_capacity(snapshots.len() - 1);
    for pair in snapshots.windows(2) {
        let (newer, older) = (pair[0].depth, pair[1].depth);
        if older > 0.0 {
            changes.push((newer - older).abs() / older);
        }
    }
    if changes.is_empty() {
        return 0.0;
    }
    (mean(&changes) * 100.0).min(100.0)
}

/// Mean absolute consecutive price delta, scaled so a steady 0.2 move per
/// tick saturates the score.
fn repricing_speed(snapshots: &[MarketSnapshot]) -> f64 {
    if snapshots.len() < 2 {
        return 0.0;
    }
    let deltas: Vec<f64> = snapshots
        .windows(2)
        .map(|pair| (pair[0].price - pair[1].price).abs())
        .collect();
    (mean(&deltas) * 500.0).min(100.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn snap(price: f64, volume: f64, liquidity: f64, depth: f64) -> MarketSnapshot {
        MarketSnapshot {
            market_id: "m1".to_string(),
            price,
            volume_24h: volume,
            liquidity,
            spread: 0.02,
            depth,
            taken_at: Utc::now(),
        }
    }

    fn meta(category: Option<&str>, end_in_hours: Option<i64>) -> MarketMeta {
        MarketMeta {
            market_id: "m1".to_string(),
            question: "Test?".to_string(),
            category: category.map(str::to_string),
            end_date: end_in_hours.map(|h| Utc::now() + Duration::hours(h)),
        }
    }

    fn steady(n: usize) -> Vec<MarketSnapshot> {
        (0..n).map(|_| snap(0.5, 1000.0, 50_000.0, 2000.0)).collect()
    }

    #[test]
    fn under_five_snapshots_defaults_to_fifty() {
        let now = Utc::now();
        for n in 0..5 {
            let f = extract_behavior_features(&steady(n), &meta(None, None), now);
            assert_eq!(f.liquidity_stability, 50, "n={n}");
            assert_eq!(f.participant_concentration, 50, "n={n}");
        }
    }

    #[test]
    fn negative_liquidity_is_filtered_not_clamped() {
        // Three positive values among five snapshots — the negatives must not
        // poison the mean.
        let mut snaps = vec![
            snap(0.5, 100.0, -500.0, 100.0),
            snap(0.5, 100.0, -500.0, 100.0),
        ];
        snaps.extend((0..3).map(|_| snap(0.5, 100.0, 40_000.0, 100.0)));
        let f = extract_behavior_features(&snaps, &meta(None, None), Utc::now());
        assert_eq!(f.liquidity_stability, 100);
    }

    #[test]
    fn constant_liquidity_is_fully_stable() {
        let f = extract_behavior_features(&steady(20), &meta(None, None), Utc::now());
        assert_eq!(f.liquidity_stability, 100);
    }

    #[test]
    fn cadence_keyword_priority() {
        let now = Utc::now();
        let cases = [
            (Some("NBA Sports"), 90),
            (Some("crypto"), 80),
            (Some("politics"), 40),
            (Some("us-elections"), 40),
            (Some("weather"), 50),
            (None, 50),
        ];
        for (category, expected) in cases {
            let f = extract_behavior_features(&steady(10), &meta(category, None), now);
            assert_eq!(f.info_cadence, expected, "category={category:?}");
        }
    }

    #[test]
    fn imminent_resolution_beats_sports_structure() {
        let now = Utc::now();
        let f = extract_behavior_features(&steady(10), &meta(Some("sports"), Some(12)), now);
        assert_eq!(f.info_structure, 90);

        let f = extract_behavior_features(&steady(10), &meta(Some("sports"), Some(48)), now);
        assert_eq!(f.info_structure, 95);

        let f = extract_behavior_features(&steady(10), &meta(Some("will btc 2025"), Some(48)), now);
        assert_eq!(f.info_structure, 70);
    }

    #[test]
    fn time_to_resolution_buckets() {
        let now = Utc::now();
        let cases = [
            (Some(12), 10),
            (Some(100), 30),
            (Some(500), 50),
            (Some(2000), 70),
            (Some(3000), 90),
            (None, 50),
        ];
        for (hours, expected) in cases {
            let f = extract_behavior_features(&steady(10), &meta(None, hours), now);
            assert_eq!(f.time_to_resolution, expected, "hours={hours:?}");
        }
    }

    #[test]
    fn concentration_scales_with_volume_spike() {
        // One 4x print among steady volume: max/mean = 4000/1600 = 2.5 → 50.
        let snaps = vec![
            snap(0.5, 4000.0, 1000.0, 100.0),
            snap(0.5, 1000.0, 1000.0, 100.0),
            snap(0.5, 1000.0, 1000.0, 100.0),
            snap(0.5, 1000.0, 1000.0, 100.0),
            snap(0.5, 1000.0, 1000.0, 100.0),
        ];
        let f = extract_behavior_features(&snaps, &meta(None, None), Utc::now());
        assert_eq!(f.participant_concentration, 50);
    }

    #[test]
    fn behavior_scores_stay_in_range_on_extreme_inputs() {
        let mut snaps: Vec<MarketSnapshot> = (0..50)
            .map(|i| {
                snap(
                    if i % 2 == 0 { 0.01 } else { 0.99 },
                    if i % 3 == 0 { 1e9 } else { 0.001 },
                    if i % 5 == 0 { -1e9 } else { 1e-6 },
                    if i % 7 == 0 { 0.0 } else { 1e9 },
                )
            })
            .collect();
        snaps.push(snap(0.5, 0.0, 0.0, 0.0));
        let f = extract_behavior_features(&snaps, &meta(Some("crypto"), Some(1)), Utc::now());
        for score in [
            f.info_cadence,
            f.info_structure,
            f.liquidity_stability,
            f.time_to_resolution,
            f.participant_concentration,
        ] {
            assert!(score <= 100);
        }

        let flow = extract_flow_features(&snaps);
        for metric in [
            flow.large_early_trades_pct,
            flow.order_book_concentration,
            flow.depth_shift_speed,
            flow.repricing_speed,
        ] {
            assert!((0.0..=100.0).contains(&metric), "metric={metric}");
            assert!(metric.is_finite());
        }
    }

    #[test]
    fn flow_features_quiet_market() {
        // 20 entries, constant liquidity, price oscillating 0.49/0.51.
        let snaps: Vec<MarketSnapshot> = (0..20)
            .map(|i| snap(if i % 2 == 0 { 0.49 } else { 0.51 }, 1000.0, 50_000.0, 2000.0))
            .collect();
        let f = extract_flow_features(&snaps);
        assert!((f.order_book_concentration - 0.0).abs() < 1e-9);
        assert!((f.large_early_trades_pct - 100.0).abs() < 1e-9);
        assert!((f.depth_shift_speed - 0.0).abs() < 1e-9);
        // 0.02 per tick * 500 = 10.
        assert!((f.repricing_speed - 10.0).abs() < 1e-9);
    }

    #[test]
    fn flow_features_sparse_defaults() {
        let one = steady(1);
        let f = extract_flow_features(&one);
        assert_eq!(f.large_early_trades_pct, 0.0);
        assert_eq!(f.depth_shift_speed, 0.0);
        assert_eq!(f.repricing_speed, 0.0);
        // Fewer than 3 positive liquidity values → neutral.
        assert_eq!(f.order_book_concentration, 50.0);
    }

    #[test]
    fn early_trades_reads_oldest_entries() {
        // Newest-first: heavy early volume lives at the back of the slice.
        let mut snaps: Vec<MarketSnapshot> =
            (0..5).map(|_| snap(0.5, 100.0, 10_000.0, 100.0)).collect();
        snaps.extend((0..5).map(|_| snap(0.5, 900.0, 10_000.0, 100.0)));
        let f = extract_flow_features(&snaps);
        // oldest mean 900, all mean 500 → 180 capped at 100.
        assert!((f.large_early_trades_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_depth_pairs_are_skipped() {
        let snaps = vec![
            snap(0.5, 100.0, 1000.0, 1000.0),
            snap(0.5, 100.0, 1000.0, 0.0),
            snap(0.5, 100.0, 1000.0, 500.0),
        ];
        let f = extract_flow_features(&snaps);
        // Only the 0.0→500 base pair counts: |0-500|/500 = 1.0 → 100.
        assert!(f.depth_shift_speed.is_finite());
        assert!((f.depth_shift_speed - 100.0).abs() < 1e-9);
    }
}
