//! Behavior-cluster classification.
//!
//! Assigns one of six cluster labels from the extracted dimension scores.
//! Rules are evaluated in a fixed order and the first match wins, so the
//! classification is total: every input lands in exactly one branch.

use crate::types::{
    BehaviorCluster, BehaviorFeatures, BehaviorProfile, RetailFriendliness, RetailInterpretation,
};

/// Category keywords that short-circuit straight to `sports_scheduled`.
const SPORTS_KEYWORDS: &[&str] = &["sports", "nba", "nfl", "soccer"];

/// Classify a market's behavior cluster. Cluster, confidence, and explanation
/// are always produced together.
pub fn classify_behavior(
    market_id: &str,
    features: BehaviorFeatures,
    category: Option<&str>,
) -> BehaviorProfile {
    let category = category.unwrap_or_default().to_lowercase();

    let (cluster, confidence, explanation) = if SPORTS_KEYWORDS
        .iter()
        .any(|k| category.contains(k))
    {
        (
            BehaviorCluster::SportsScheduled,
            95,
            "Resolves on a scheduled game with a fixed start time; information arrives on a known calendar.",
        )
    } else if features.info_structure > 80 && features.time_to_resolution < 30 {
        (
            BehaviorCluster::BinaryCatalyst,
            85,
            "A single imminent event decides the outcome; expect one sharp repricing around the catalyst.",
        )
    } else if features.info_cadence > 70 && features.liquidity_stability < 40 {
        (
            BehaviorCluster::HighVolatility,
            75,
            "Fast information flow with unstable liquidity; prices whipsaw and fills are unreliable.",
        )
    } else if features.time_to_resolution > 70 {
        (
            BehaviorCluster::LongDuration,
            80,
            "Resolution is months away; prices drift on narrative rather than hard information.",
        )
    } else if features.info_structure > 60 {
        (
            BehaviorCluster::ScheduledEvent,
            70,
            "Outcome hinges on a known upcoming event; most movement clusters around its date.",
        )
    } else {
        (
            BehaviorCluster::ContinuousInfo,
            65,
            "Information arrives continuously with no single catalyst; prices adjust gradually.",
        )
    };

    let interp = retail_interpretation(cluster);

    BehaviorProfile {
        market_id: market_id.to_string(),
        features,
        cluster,
        confidence,
        explanation: explanation.to_string(),
        retail_friendliness: interp.friendliness,
        what_it_means: interp.what_it_means.to_string(),
        what_to_watch: interp.what_to_watch.to_string(),
        typical_mistake: interp.typical_mistake.to_string(),
    }
}

/// Static retail-interpretation lookup. The fallback tuple is neutral so an
/// unmapped cluster never breaks the profile.
pub fn retail_interpretation(cluster: BehaviorCluster) -> RetailInterpretation {
    const TABLE: &[(BehaviorCluster, RetailInterpretation)] = &[
        (
            BehaviorCluster::SportsScheduled,
            RetailInterpretation {
                friendliness: RetailFriendliness::Favorable,
                what_it_means: "Outcome decided by a game on a known schedule.",
                what_to_watch: "Lineups, injuries, and line movement right before start.",
                typical_mistake: "Holding through the game expecting to exit mid-play.",
            },
        ),
        (
            BehaviorCluster::BinaryCatalyst,
            RetailInterpretation {
                friendliness: RetailFriendliness::Neutral,
                what_it_means: "One imminent event flips the market to 0 or 100.",
                what_to_watch: "The exact event time and any early leaks.",
                typical_mistake: "Entering at a price that already reflects the likely outcome.",
            },
        ),
        (
            BehaviorCluster::HighVolatility,
            RetailInterpretation {
                friendliness: RetailFriendliness::Unfavorable,
                what_it_means: "Prices swing hard on every headline.",
                what_to_watch: "Liquidity drying up right when you need to exit.",
                typical_mistake: "Chasing moves after the repricing already happened.",
            },
        ),
        (
            BehaviorCluster::LongDuration,
            RetailInterpretation {
                friendliness: RetailFriendliness::Neutral,
                what_it_means: "Capital sits locked up while the story develops slowly.",
                what_to_watch: "Narrative shifts that change the base rate, not daily noise.",
                typical_mistake: "Overtrading a market that only moves a few times a year.",
            },
        ),
        (
            BehaviorCluster::ScheduledEvent,
            RetailInterpretation {
                friendliness: RetailFriendliness::Favorable,
                what_it_means: "A dated event dominates the outcome.",
                what_to_watch: "Positioning changes in the final days before the date.",
                typical_mistake: "Ignoring the dead time where nothing reprices.",
            },
        ),
        (
            BehaviorCluster::ContinuousInfo,
            RetailInterpretation {
                friendliness: RetailFriendliness::Neutral,
                what_it_means: "A steady information drip moves the price in small steps.",
                what_to_watch: "Slow drifts that compound into a real trend.",
                typical_mistake: "Expecting a single decisive move that never comes.",
            },
        ),
    ];

    TABLE
        .iter()
        .find(|(c, _)| *c == cluster)
        .map(|(_, interp)| *interp)
        .unwrap_or(RetailInterpretation {
            friendliness: RetailFriendliness::Neutral,
            what_it_means: "No interpretation available for this cluster.",
            what_to_watch: "General market activity.",
            typical_mistake: "Trading without understanding the market's rhythm.",
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn features(
        cadence: u8,
        structure: u8,
        liquidity: u8,
        time: u8,
        concentration: u8,
    ) -> BehaviorFeatures {
        BehaviorFeatures {
            info_cadence: cadence,
            info_structure: structure,
            liquidity_stability: liquidity,
            time_to_resolution: time,
            participant_concentration: concentration,
        }
    }

    #[test]
    fn sports_category_fires_first() {
        // Features that would otherwise match binary_catalyst.
        let p = classify_behavior("m1", features(50, 90, 50, 10, 50), Some("NBA Sports"));
        assert_eq!(p.cluster, BehaviorCluster::SportsScheduled);
        assert_eq!(p.confidence, 95);
        assert_eq!(p.retail_friendliness, RetailFriendliness::Favorable);
    }

    #[test]
    fn binary_catalyst_needs_structure_and_imminence() {
        let p = classify_behavior("m1", features(50, 90, 50, 10, 50), None);
        assert_eq!(p.cluster, BehaviorCluster::BinaryCatalyst);
        assert_eq!(p.confidence, 85);

        // Structure at the boundary (not > 80) falls through.
        let p = classify_behavior("m1", features(50, 80, 50, 10, 50), None);
        assert_ne!(p.cluster, BehaviorCluster::BinaryCatalyst);
    }

    #[test]
    fn high_volatility_rule() {
        let p = classify_behavior("m1", features(80, 50, 30, 50, 50), None);
        assert_eq!(p.cluster, BehaviorCluster::HighVolatility);
        assert_eq!(p.confidence, 75);
        assert_eq!(p.retail_friendliness, RetailFriendliness::Unfavorable);
    }

    #[test]
    fn long_duration_rule() {
        let p = classify_behavior("m1", features(50, 50, 50, 90, 50), None);
        assert_eq!(p.cluster, BehaviorCluster::LongDuration);
        assert_eq!(p.confidence, 80);
    }

    #[test]
    fn scheduled_event_rule() {
        let p = classify_behavior("m1", features(50, 70, 50, 50, 50), None);
        assert_eq!(p.cluster, BehaviorCluster::ScheduledEvent);
        assert_eq!(p.confidence, 70);
    }

    #[test]
    fn continuous_info_is_the_fallback() {
        let p = classify_behavior("m1", features(50, 50, 50, 50, 50), None);
        assert_eq!(p.cluster, BehaviorCluster::ContinuousInfo);
        assert_eq!(p.confidence, 65);
    }

    #[test]
    fn classification_is_total_and_idempotent() {
        // Sweep a coarse grid; every point must classify, and twice the same.
        for cadence in [0u8, 40, 75, 100] {
            for structure in [0u8, 65, 85, 100] {
                for liquidity in [0u8, 35, 70, 100] {
                    for time in [0u8, 25, 75, 100] {
                        let f = features(cadence, structure, liquidity, time, 50);
                        let a = classify_behavior("m1", f, None);
                        let b = classify_behavior("m1", f, None);
                        assert_eq!(a.cluster, b.cluster);
                        assert_eq!(a.confidence, b.confidence);
                        assert_eq!(a.explanation, b.explanation);
                        assert!(!a.explanation.is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn every_cluster_has_an_interpretation() {
        for cluster in [
            BehaviorCluster::SportsScheduled,
            BehaviorCluster::BinaryCatalyst,
            BehaviorCluster::HighVolatility,
            BehaviorCluster::LongDuration,
            BehaviorCluster::ScheduledEvent,
            BehaviorCluster::ContinuousInfo,
        ] {
            let interp = retail_interpretation(cluster);
            assert!(!interp.what_it_means.is_empty());
        }
    }
}
