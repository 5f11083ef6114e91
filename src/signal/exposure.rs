//! Hidden cross-market exposure classification.
//!
//! Two markets that resolve on the same underlying driver are correlated
//! positions even when their questions look unrelated. Rules run in order,
//! first match wins; the label and shared driver are symmetric in A/B.

use crate::types::{
    ExposureClassification, ExposureLabel, ResolutionDrivers, SharedDriverType,
};

pub fn classify_exposure(a: &ResolutionDrivers, b: &ResolutionDrivers) -> ExposureClassification {
    if let (Some(asset_a), Some(asset_b)) = (&a.underlying_asset, &b.underlying_asset) {
        if asset_a == asset_b {
            return classification(
                ExposureLabel::HighlyLinked,
                SharedDriverType::Asset,
                format!("Both markets resolve on the same underlying asset ({asset_a})."),
                format!("A sharp move in {asset_a} settles both markets the same way at once."),
                format!(
                    "Holding both felt like two bets, but it was one doubled-up {asset_a} position."
                ),
            );
        }
    }

    if let (Some(narrative_a), Some(narrative_b)) = (a.narrative_dependency, b.narrative_dependency)
    {
        if narrative_a == narrative_b {
            return classification(
                ExposureLabel::HighlyLinked,
                SharedDriverType::Narrative,
                format!("Both markets hinge on the same narrative ({narrative_a})."),
                format!("One {narrative_a} headline swings both markets together."),
                "Sizing both positions as if their outcomes were independent.".to_string(),
            );
        }
    }

    if let (Some(category_a), Some(category_b)) = (a.asset_category, b.asset_category) {
        if category_a == category_b {
            let windows_overlap = match (
                a.resolution_window_start,
                a.resolution_window_end,
                b.resolution_window_start,
                b.resolution_window_end,
            ) {
                (Some(start_a), Some(end_a), Some(start_b), Some(end_b)) => {
                    start_a <= end_b && start_b <= end_a
                }
                _ => false,
            };
            if windows_overlap {
                return classification(
                    ExposureLabel::PartiallyLinked,
                    SharedDriverType::CategoryTime,
                    format!(
                        "Both are {category_a} markets resolving in overlapping windows."
                    ),
                    format!(
                        "A {category_a}-wide shock near resolution hits both markets in the same session."
                    ),
                    "Treating same-sector, same-week positions as diversification.".to_string(),
                );
            }
            return classification(
                ExposureLabel::PartiallyLinked,
                SharedDriverType::Category,
                format!("Both markets sit in the same asset category ({category_a})."),
                format!("Broad {category_a} sentiment pushes both prices in the same direction."),
                "Assuming same-sector markets move independently.".to_string(),
            );
        }
    }

    if let (Some(source_a), Some(source_b)) = (a.resolution_source, b.resolution_source) {
        if source_a == source_b {
            return classification(
                ExposureLabel::PartiallyLinked,
                SharedDriverType::ResolutionSource,
                format!("Both markets resolve from the same data source ({source_a})."),
                format!("An error or delay in {source_a} data affects both resolutions."),
                "Ignoring shared resolution-source risk across positions.".to_string(),
            );
        }
    }

    classification(
        ExposureLabel::Independent,
        SharedDriverType::None,
        "No shared driver detected between these markets.".to_string(),
        "These markets can settle in any combination.".to_string(),
        "None — treating these as independent is reasonable.".to_string(),
    )
}

fn classification(
    label: ExposureLabel,
    shared_driver_type: SharedDriverType,
    explanation: String,
    example_outcome: String,
    mistake_prevented: String,
) -> ExposureClassification {
    ExposureClassification {
        label,
        shared_driver_type,
        explanation,
        example_outcome,
        mistake_prevented,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::drivers::extract_drivers;
    use crate::types::{AssetCategory, MarketMeta, NarrativeDependency, ResolutionSource};
    use chrono::{Duration, TimeZone, Utc};

    fn drivers(id: &str) -> ResolutionDrivers {
        ResolutionDrivers {
            market_id: id.to_string(),
            underlying_asset: None,
            asset_category: None,
            narrative_dependency: None,
            resolution_source: None,
            resolution_window_start: None,
            resolution_window_end: None,
        }
    }

    #[test]
    fn same_asset_is_highly_linked() {
        let mut a = drivers("a");
        a.underlying_asset = Some("BTC".to_string());
        a.asset_category = Some(AssetCategory::Crypto);
        let mut b = drivers("b");
        b.underlying_asset = Some("BTC".to_string());
        b.asset_category = Some(AssetCategory::Crypto);

        let c = classify_exposure(&a, &b);
        assert_eq!(c.label, ExposureLabel::HighlyLinked);
        assert_eq!(c.shared_driver_type, SharedDriverType::Asset);
        assert!(c.explanation.contains("BTC"));
    }

    #[test]
    fn two_bitcoin_questions_end_to_end() {
        let meta = |id: &str, q: &str| MarketMeta {
            market_id: id.to_string(),
            question: q.to_string(),
            category: None,
            end_date: None,
        };
        let a = extract_drivers(&meta("a", "Will Bitcoin hit $100k?"));
        let b = extract_drivers(&meta("b", "Bitcoin above $90k on Friday?"));
        assert_eq!(a.underlying_asset.as_deref(), Some("BTC"));
        assert_eq!(b.underlying_asset.as_deref(), Some("BTC"));

        let c = classify_exposure(&a, &b);
        assert_eq!(c.label, ExposureLabel::HighlyLinked);
        assert_eq!(c.shared_driver_type, SharedDriverType::Asset);
    }

    #[test]
    fn shared_narrative_beats_category() {
        let mut a = drivers("a");
        a.narrative_dependency = Some(NarrativeDependency::Election);
        a.asset_category = Some(AssetCategory::Politics);
        let mut b = drivers("b");
        b.narrative_dependency = Some(NarrativeDependency::Election);
        b.asset_category = Some(AssetCategory::Politics);

        let c = classify_exposure(&a, &b);
        assert_eq!(c.label, ExposureLabel::HighlyLinked);
        assert_eq!(c.shared_driver_type, SharedDriverType::Narrative);
    }

    #[test]
    fn same_category_overlapping_windows() {
        let end = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let mut a = drivers("a");
        a.asset_category = Some(AssetCategory::Crypto);
        a.resolution_window_start = Some(end - Duration::hours(24));
        a.resolution_window_end = Some(end);
        let mut b = drivers("b");
        b.asset_category = Some(AssetCategory::Crypto);
        b.resolution_window_start = Some(end - Duration::hours(12));
        b.resolution_window_end = Some(end + Duration::hours(12));

        let c = classify_exposure(&a, &b);
        assert_eq!(c.label, ExposureLabel::PartiallyLinked);
        assert_eq!(c.shared_driver_type, SharedDriverType::CategoryTime);
    }

    #[test]
    fn same_category_disjoint_windows() {
        let end = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let mut a = drivers("a");
        a.asset_category = Some(AssetCategory::Crypto);
        a.resolution_window_start = Some(end - Duration::hours(24));
        a.resolution_window_end = Some(end);
        let mut b = drivers("b");
        b.asset_category = Some(AssetCategory::Crypto);
        b.resolution_window_start = Some(end + Duration::days(10));
        b.resolution_window_end = Some(end + Duration::days(10) + Duration::hours(24));

        let c = classify_exposure(&a, &b);
        assert_eq!(c.label, ExposureLabel::PartiallyLinked);
        assert_eq!(c.shared_driver_type, SharedDriverType::Category);
    }

    #[test]
    fn shared_resolution_source_only() {
        let mut a = drivers("a");
        a.resolution_source = Some(ResolutionSource::GameResult);
        let mut b = drivers("b");
        b.resolution_source = Some(ResolutionSource::GameResult);

        let c = classify_exposure(&a, &b);
        assert_eq!(c.label, ExposureLabel::PartiallyLinked);
        assert_eq!(c.shared_driver_type, SharedDriverType::ResolutionSource);
    }

    #[test]
    fn nothing_shared_is_independent() {
        let c = classify_exposure(&drivers("a"), &drivers("b"));
        assert_eq!(c.label, ExposureLabel::Independent);
        assert_eq!(c.shared_driver_type, SharedDriverType::None);
    }

    #[test]
    fn classification_is_symmetric() {
        let end = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let mut a = drivers("a");
        a.underlying_asset = Some("ETH".to_string());
        a.asset_category = Some(AssetCategory::Crypto);
        a.resolution_window_start = Some(end - Duration::hours(24));
        a.resolution_window_end = Some(end);
        let mut b = drivers("b");
        b.asset_category = Some(AssetCategory::Crypto);
        b.resolution_window_start = Some(end - Duration::hours(6));
        b.resolution_window_end = Some(end + Duration::hours(18));

        let ab = classify_exposure(&a, &b);
        let ba = classify_exposure(&b, &a);
        assert_eq!(ab.label, ba.label);
        assert_eq!(ab.shared_driver_type, ba.shared_driver_type);
    }
}
