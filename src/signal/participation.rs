//! Participation-structure scoring.
//!
//! Two 0–100 scores per market side: setup quality (is this market's
//! structure historically workable) and participant quality (who is on the
//! other side of the trade), plus a heuristic ownership-breakdown estimate.
//! The NO side applies bounded jitter to the YES scores — the rng is
//! injected so tests stay deterministic.

use rand::Rng;

use crate::signal::features::{liquidity_stability_score, price_stability_score};
use crate::types::{
    MarketSide, MarketSnapshot, OwnershipBreakdown, ParticipantQualityBand, ParticipationProfile,
    ParticipationSummary, SetupQualityBand,
};

/// Score both market sides from the latest snapshot plus up to ~20 historical
/// snapshots (newest-first).
pub fn score_participation(
    market_id: &str,
    latest: &MarketSnapshot,
    history: &[MarketSnapshot],
    rng: &mut impl Rng,
) -> (ParticipationProfile, ParticipationProfile) {
    let liquidity_stability = liquidity_stability_score(history);
    let price_stability = price_stability_score(history);

    let setup = setup_quality_score(latest, liquidity_stability, price_stability);
    let participant = participant_quality_score(latest);

    let breakdown = ownership_breakdown(latest.volume_24h);
    let summary = participation_summary(breakdown);

    let yes = side_profile(market_id, MarketSide::Yes, setup, participant, breakdown, summary);

    // NO-side scores are an advisory estimate: jittered YES scores, re-clamped.
    let setup_no = clamp_u8(setup as i64 + ((rng.gen::<f64>() - 0.5) * 10.0).floor() as i64);
    let participant_no =
        clamp_u8(participant as i64 + ((rng.gen::<f64>() - 0.5) * 15.0).floor() as i64);
    let no = side_profile(market_id, MarketSide::No, setup_no, participant_no, breakdown, summary);

    (yes, no)
}

fn side_profile(
    market_id: &str,
    side: MarketSide,
    setup: u8,
    participant: u8,
    breakdown: OwnershipBreakdown,
    summary: ParticipationSummary,
) -> ParticipationProfile {
    let setup_band = setup_quality_band(setup);
    ParticipationProfile {
        market_id: market_id.to_string(),
        side,
        setup_quality_score: setup,
        setup_quality_band: setup_band,
        participant_quality_score: participant,
        participant_quality_band: participant_quality_band(participant),
        participation_summary: summary,
        breakdown,
        behavior_insight: behavior_insight(summary, setup_band).to_string(),
    }
}

// ---------------------------------------------------------------------------
// Score components
// ---------------------------------------------------------------------------

fn setup_quality_score(latest: &MarketSnapshot, liquidity_stability: f64, price_stability: f64) -> u8 {
    let mut score: i64 = 50;

    score += match latest.liquidity {
        l if l > 100_000.0 => 25,
        l if l > 50_000.0 => 20,
        l if l > 20_000.0 => 15,
        l if l > 5_000.0 => 10,
        _ => 5,
    };

    // Tight spreads rewarded, wide spreads penalized.
    score += match latest.spread {
        s if s < 0.01 => 15,
        s if s < 0.02 => 10,
        s if s < 0.05 => 0,
        s if s < 0.10 => -8,
        _ => -15,
    };

    score += match latest.volume_24h {
        v if v > 50_000.0 => 15,
        v if v > 10_000.0 => 10,
        v if v > 1_000.0 => 5,
        _ => 0,
    };

    score += (liquidity_stability * 0.15).floor() as i64;

    score += match latest.depth {
        d if d > 50_000.0 => 10,
        d if d > 20_000.0 => 7,
        d if d > 5_000.0 => 4,
        _ => 0,
    };

    score += ((price_stability - 50.0) * 0.2).floor() as i64;

    clamp_u8(score)
}

fn participant_quality_score(latest: &MarketSnapshot) -> u8 {
    let mut score: i64 = 50;

    score += match latest.volume_24h {
        v if v > 100_000.0 => 30,
        v if v > 25_000.0 => 20,
        v if v > 5_000.0 => 10,
        _ => 0,
    };

    score += match latest.liquidity {
        l if l > 100_000.0 => 20,
        l if l > 50_000.0 => 15,
        l if l > 20_000.0 => 10,
        _ => 0,
    };

    clamp_u8(score)
}

fn clamp_u8(score: i64) -> u8 {
    score.clamp(0, 100) as u8
}

fn setup_quality_band(score: u8) -> SetupQualityBand {
    match score {
        s if s >= 80 => SetupQualityBand::HistoricallyFavorable,
        s if s >= 60 => SetupQualityBand::MixedWorkable,
        s if s >= 40 => SetupQualityBand::Neutral,
        _ => SetupQualityBand::HistoricallyUnforgiving,
    }
}

fn participant_quality_band(score: u8) -> ParticipantQualityBand {
    match score {
        s if s >= 70 => ParticipantQualityBand::Strong,
        s if s >= 45 => ParticipantQualityBand::Moderate,
        _ => ParticipantQualityBand::Limited,
    }
}

// ---------------------------------------------------------------------------
// Ownership breakdown (heuristic, no real holder data)
// ---------------------------------------------------------------------------

fn ownership_breakdown(volume_24h: f64) -> OwnershipBreakdown {
    let (large_pct, mid_pct, small_pct) = if volume_24h > 100_000.0 {
        (45, 35, 20)
    } else if volume_24h > 25_000.0 {
        (35, 40, 25)
    } else if volume_24h < 1_000.0 {
        (15, 30, 55)
    } else {
        (30, 40, 30)
    };
    OwnershipBreakdown { large_pct, mid_pct, small_pct }
}

fn participation_summary(breakdown: OwnershipBreakdown) -> ParticipationSummary {
    if breakdown.large_pct >= 45 {
        ParticipationSummary::FewDominant
    } else if breakdown.small_pct >= 50 {
        ParticipationSummary::BroadRetail
    } else {
        ParticipationSummary::MixedParticipation
    }
}

// ---------------------------------------------------------------------------
// Behavior insight table
// ---------------------------------------------------------------------------

/// Fixed 3×4 lookup keyed by (participation summary, setup band).
fn behavior_insight(summary: ParticipationSummary, band: SetupQualityBand) -> &'static str {
    use ParticipationSummary::*;
    use SetupQualityBand::*;
    const TABLE: &[((ParticipationSummary, SetupQualityBand), &str)] = &[
        ((FewDominant, HistoricallyFavorable),
         "A few large holders dominate a well-structured market; they usually are the price."),
        ((FewDominant, MixedWorkable),
         "Concentrated ownership in a workable setup; expect sharp moves when whales reposition."),
        ((FewDominant, Neutral),
         "Large holders control a so-so market; thin exits when they leave."),
        ((FewDominant, HistoricallyUnforgiving),
         "Whale-dominated and structurally hostile; retail entries here rarely end well."),
        ((MixedParticipation, HistoricallyFavorable),
         "Balanced participation in a strong setup; prices tend to reflect genuine disagreement."),
        ((MixedParticipation, MixedWorkable),
         "A normal mix of sizes in an average market; standard caution applies."),
        ((MixedParticipation, Neutral),
         "Mixed crowd, middling structure; edge must come from information, not mechanics."),
        ((MixedParticipation, HistoricallyUnforgiving),
         "Even with balanced holders, this market's structure has punished entrants."),
        ((BroadRetail, HistoricallyFavorable),
         "Mostly small holders in a healthy market; crowd sentiment moves the price."),
        ((BroadRetail, MixedWorkable),
         "Retail-heavy with a workable setup; watch for herd entries at round numbers."),
        ((BroadRetail, Neutral),
         "A retail crowd in an indifferent market; momentum fades fast here."),
        ((BroadRetail, HistoricallyUnforgiving),
         "Crowded retail in a hostile structure; classic overtrading territory."),
    ];
    TABLE
        .iter()
        .find(|((s, b), _)| *s == summary && *b == band)
        .map(|(_, text)| *text)
        .unwrap_or("No specific insight available.")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn snap(volume: f64, liquidity: f64, spread: f64, depth: f64) -> MarketSnapshot {
        MarketSnapshot {
            market_id: "m1".to_string(),
            price: 0.5,
            volume_24h: volume,
            liquidity,
            spread,
            depth,
            taken_at: Utc::now(),
        }
    }

    #[test]
    fn deep_liquid_market_saturates_setup_score() {
        // 50 +25(liq) +15(spread) +15(vol) +floor(50*0.15)=7 +10(depth)
        // +floor(0*0.2)=0 → 122, clamped to 100. No history → both
        // stabilities default to 50.
        let latest = snap(60_000.0, 150_000.0, 0.005, 60_000.0);
        let mut rng = StdRng::seed_from_u64(7);
        let (yes, _) = score_participation("m1", &latest, &[], &mut rng);
        assert_eq!(yes.setup_quality_score, 100);
        assert_eq!(yes.setup_quality_band, SetupQualityBand::HistoricallyFavorable);
    }

    #[test]
    fn wide_spread_thin_market_scores_low() {
        // 50 +5(liq) -15(spread) +0(vol) +7(stability) +0(depth) +0 → 47.
        let latest = snap(500.0, 1_000.0, 0.25, 100.0);
        let mut rng = StdRng::seed_from_u64(7);
        let (yes, _) = score_participation("m1", &latest, &[], &mut rng);
        assert_eq!(yes.setup_quality_score, 47);
        assert_eq!(yes.setup_quality_band, SetupQualityBand::Neutral);
    }

    #[test]
    fn participant_score_tiers() {
        let mut rng = StdRng::seed_from_u64(7);
        // 50 + 30 + 20 = 100.
        let (yes, _) = score_participation("m1", &snap(150_000.0, 150_000.0, 0.02, 0.0), &[], &mut rng);
        assert_eq!(yes.participant_quality_score, 100);
        assert_eq!(yes.participant_quality_band, ParticipantQualityBand::Strong);

        // 50 + 0 + 0 = 50.
        let (yes, _) = score_participation("m1", &snap(1_000.0, 1_000.0, 0.02, 0.0), &[], &mut rng);
        assert_eq!(yes.participant_quality_score, 50);
        assert_eq!(yes.participant_quality_band, ParticipantQualityBand::Moderate);
    }

    #[test]
    fn ownership_breakdown_tiers_sum_to_100() {
        for volume in [500.0, 5_000.0, 50_000.0, 500_000.0] {
            let b = ownership_breakdown(volume);
            assert_eq!(b.large_pct as u32 + b.mid_pct as u32 + b.small_pct as u32, 100);
        }
        assert_eq!(participation_summary(ownership_breakdown(500_000.0)), ParticipationSummary::FewDominant);
        assert_eq!(participation_summary(ownership_breakdown(50_000.0)), ParticipationSummary::MixedParticipation);
        assert_eq!(participation_summary(ownership_breakdown(500.0)), ParticipationSummary::BroadRetail);
    }

    #[test]
    fn no_side_jitter_stays_bounded_and_clamped() {
        let latest = snap(60_000.0, 150_000.0, 0.005, 60_000.0);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (yes, no) = score_participation("m1", &latest, &[], &mut rng);
            let setup_delta = no.setup_quality_score as i64 - yes.setup_quality_score as i64;
            // YES saturated at 100, so the NO side can only sit at or below.
            assert!((-5..=0).contains(&setup_delta), "seed={seed}");
            assert!(no.participant_quality_score <= 100);
        }
    }

    #[test]
    fn same_seed_reproduces_no_side() {
        let latest = snap(30_000.0, 30_000.0, 0.03, 10_000.0);
        let history: Vec<MarketSnapshot> =
            (0..10).map(|_| snap(30_000.0, 30_000.0, 0.03, 10_000.0)).collect();
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let (_, no_a) = score_participation("m1", &latest, &history, &mut rng_a);
        let (_, no_b) = score_participation("m1", &latest, &history, &mut rng_b);
        assert_eq!(no_a.setup_quality_score, no_b.setup_quality_score);
        assert_eq!(no_a.participant_quality_score, no_b.participant_quality_score);
    }

    #[test]
    fn insight_table_covers_every_combination() {
        for summary in [
            ParticipationSummary::FewDominant,
            ParticipationSummary::MixedParticipation,
            ParticipationSummary::BroadRetail,
        ] {
            for band in [
                SetupQualityBand::HistoricallyFavorable,
                SetupQualityBand::MixedWorkable,
                SetupQualityBand::Neutral,
                SetupQualityBand::HistoricallyUnforgiving,
            ] {
                assert_ne!(behavior_insight(summary, band), "No specific insight available.");
            }
        }
    }

    #[test]
    fn stable_history_lifts_the_setup_score() {
        // Modest inputs so the clamp never engages:
        // base 50 +10(liq) +0(spread) +5(vol) +0(depth).
        let latest = snap(2_000.0, 8_000.0, 0.03, 1_000.0);
        let flat: Vec<MarketSnapshot> =
            (0..10).map(|_| snap(2_000.0, 8_000.0, 0.03, 1_000.0)).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let (with_history, _) = score_participation("m1", &latest, &flat, &mut rng);
        let mut rng = StdRng::seed_from_u64(7);
        let (without, _) = score_participation("m1", &latest, &[], &mut rng);
        // Flat history: liquidity stability 100 (+15) and price stability 100
        // (+10) versus the 50-defaults (+7, +0).
        assert_eq!(
            with_history.setup_quality_score,
            without.setup_quality_score + 18
        );
    }
}
