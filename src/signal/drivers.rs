//! Resolution-driver extraction from market question text.
//!
//! Dictionaries are ordered slices, not maps — the first matching entry wins
//! and the iteration order is part of the contract.

use chrono::Duration;

use crate::types::{
    AssetCategory, MarketMeta, NarrativeDependency, ResolutionDrivers, ResolutionSource,
};

/// Crypto assets, checked first.
const CRYPTO_ASSETS: &[(&str, &str)] = &[
    ("bitcoin", "BTC"),
    ("btc", "BTC"),
    ("ethereum", "ETH"),
    ("eth", "ETH"),
    ("solana", "SOL"),
    ("sol", "SOL"),
    ("dogecoin", "DOGE"),
    ("doge", "DOGE"),
    ("xrp", "XRP"),
];

/// Political figures, checked only when no crypto asset matched.
const POLITICAL_FIGURES: &[(&str, &str)] = &[
    ("trump", "TRUMP"),
    ("biden", "BIDEN"),
    ("harris", "HARRIS"),
    ("desantis", "DESANTIS"),
    ("newsom", "NEWSOM"),
];

/// Economic indicators, checked last.
const ECONOMIC_INDICATORS: &[(&str, &str)] = &[
    ("fed", "FED"),
    ("inflation", "INFLATION"),
    ("recession", "RECESSION"),
    ("unemployment", "UNEMPLOYMENT"),
];

/// Hours before the end date where resolution data starts to matter.
const RESOLUTION_WINDOW_HOURS: i64 = 24;

pub fn extract_drivers(meta: &MarketMeta) -> ResolutionDrivers {
    let question = meta.question.to_lowercase();
    let category = meta.category.as_deref().unwrap_or_default().to_lowercase();

    let (underlying_asset, asset_category) = match_asset(&question);
    let narrative_dependency = narrative_dependency(&question, asset_category);
    let resolution_source = resolution_source(asset_category, &category);

    let (resolution_window_start, resolution_window_end) = match meta.end_date {
        Some(end) => (Some(end - Duration::hours(RESOLUTION_WINDOW_HOURS)), Some(end)),
        None => (None, None),
    };

    ResolutionDrivers {
        market_id: meta.market_id.clone(),
        underlying_asset,
        asset_category,
        narrative_dependency,
        resolution_source,
        resolution_window_start,
        resolution_window_end,
    }
}

fn match_asset(question: &str) -> (Option<String>, Option<AssetCategory>) {
    let dictionaries: &[(&[(&str, &str)], AssetCategory)] = &[
        (CRYPTO_ASSETS, AssetCategory::Crypto),
        (POLITICAL_FIGURES, AssetCategory::Politics),
        (ECONOMIC_INDICATORS, AssetCategory::Economics),
    ];
    for (dictionary, asset_category) in dictionaries {
        for (keyword, code) in *dictionary {
            if question.contains(keyword) {
                return (Some((*code).to_string()), Some(*asset_category));
            }
        }
    }
    (None, None)
}

/// Keyword presence in priority order.
fn narrative_dependency(
    question: &str,
    asset_category: Option<AssetCategory>,
) -> Option<NarrativeDependency> {
    if question.contains("election") || question.contains("vote") {
        Some(NarrativeDependency::Election)
    } else if question.contains("approve") || question.contains("approval") {
        Some(NarrativeDependency::ApprovalRating)
    } else if question.contains("price") && asset_category == Some(AssetCategory::Crypto) {
        Some(NarrativeDependency::PriceMovement)
    } else if question.contains("win") || question.contains("winner") {
        Some(NarrativeDependency::CompetitionOutcome)
    } else {
        None
    }
}

fn resolution_source(
    asset_category: Option<AssetCategory>,
    category: &str,
) -> Option<ResolutionSource> {
    match asset_category {
        Some(AssetCategory::Crypto) => Some(ResolutionSource::ExchangePrice),
        Some(AssetCategory::Politics) => Some(ResolutionSource::OfficialResults),
        _ if category.contains("sports") => Some(ResolutionSource::GameResult),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn meta(question: &str, category: Option<&str>) -> MarketMeta {
        MarketMeta {
            market_id: "m1".to_string(),
            question: question.to_string(),
            category: category.map(str::to_string),
            end_date: None,
        }
    }

    #[test]
    fn bitcoin_maps_to_btc_crypto() {
        let d = extract_drivers(&meta("Will Bitcoin reach $100k by March?", None));
        assert_eq!(d.underlying_asset.as_deref(), Some("BTC"));
        assert_eq!(d.asset_category, Some(AssetCategory::Crypto));
        assert_eq!(d.resolution_source, Some(ResolutionSource::ExchangePrice));
    }

    #[test]
    fn crypto_dictionary_shadows_politics() {
        // Both "btc" and "trump" present — crypto is checked first.
        let d = extract_drivers(&meta("Will Trump mention BTC this week?", None));
        assert_eq!(d.underlying_asset.as_deref(), Some("BTC"));
        assert_eq!(d.asset_category, Some(AssetCategory::Crypto));
    }

    #[test]
    fn political_figure_matches_when_no_crypto() {
        let d = extract_drivers(&meta("Will Trump win the nomination?", None));
        assert_eq!(d.underlying_asset.as_deref(), Some("TRUMP"));
        assert_eq!(d.asset_category, Some(AssetCategory::Politics));
        assert_eq!(d.resolution_source, Some(ResolutionSource::OfficialResults));
    }

    #[test]
    fn economics_checked_last() {
        let d = extract_drivers(&meta("Will inflation stay above 3%?", None));
        assert_eq!(d.underlying_asset.as_deref(), Some("INFLATION"));
        assert_eq!(d.asset_category, Some(AssetCategory::Economics));
        assert_eq!(d.resolution_source, None);
    }

    #[test]
    fn unmatched_question_yields_nulls() {
        let d = extract_drivers(&meta("Will it rain in Paris tomorrow?", None));
        assert_eq!(d.underlying_asset, None);
        assert_eq!(d.asset_category, None);
        assert_eq!(d.narrative_dependency, None);
        assert_eq!(d.resolution_source, None);
    }

    #[test]
    fn narrative_priority_order() {
        // "election" beats "win" even though both appear.
        let d = extract_drivers(&meta("Who will win the election vote?", None));
        assert_eq!(d.narrative_dependency, Some(NarrativeDependency::Election));

        let d = extract_drivers(&meta("Will his approval rating rise?", None));
        assert_eq!(d.narrative_dependency, Some(NarrativeDependency::ApprovalRating));

        let d = extract_drivers(&meta("Will the BTC price double?", None));
        assert_eq!(d.narrative_dependency, Some(NarrativeDependency::PriceMovement));

        // "price" without a crypto asset does not read as price movement.
        let d = extract_drivers(&meta("Will the gas price fall?", None));
        assert_eq!(d.narrative_dependency, None);

        let d = extract_drivers(&meta("Will the Lakers win tonight?", None));
        assert_eq!(d.narrative_dependency, Some(NarrativeDependency::CompetitionOutcome));
    }

    #[test]
    fn sports_category_sets_game_result_source() {
        let d = extract_drivers(&meta("Will the Lakers cover?", Some("NBA Sports")));
        assert_eq!(d.resolution_source, Some(ResolutionSource::GameResult));
    }

    #[test]
    fn resolution_window_is_last_24_hours() {
        let end = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let mut m = meta("Will BTC close green?", None);
        m.end_date = Some(end);
        let d = extract_drivers(&m);
        assert_eq!(d.resolution_window_end, Some(end));
        assert_eq!(
            d.resolution_window_start,
            Some(end - Duration::hours(24))
        );

        let d = extract_drivers(&meta("Will BTC close green?", None));
        assert_eq!(d.resolution_window_start, None);
        assert_eq!(d.resolution_window_end, None);
    }
}
