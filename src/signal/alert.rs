//! Alert condition evaluation.
//!
//! Pure decision logic: one condition plus the market's latest state in,
//! trigger/no-trigger plus a message out. Status flips and notification
//! writes happen in the refresher, not here.

use crate::config::SIGNAL_FRESHNESS_SECS;
use crate::types::{
    AlertCondition, AlertDecision, FlowSignalState, MarketState, PriceDirection, SignalConfidence,
};

pub fn evaluate_alert(condition: &AlertCondition, state: &MarketState) -> AlertDecision {
    match condition {
        AlertCondition::PriceMove { direction, threshold } => {
            let crossed = match direction {
                PriceDirection::Above => state.price >= *threshold,
                PriceDirection::Below => state.price <= *threshold,
            };
            let dir_word = match direction {
                PriceDirection::Above => "above",
                PriceDirection::Below => "below",
            };
            decision(
                crossed,
                format!(
                    "Price crossed {dir_word} the {:.0}% threshold: now at {:.1}%",
                    threshold * 100.0,
                    state.price * 100.0
                ),
            )
        }

        AlertCondition::VolumeSpike { multiplier } => {
            let baseline = state.avg_volume_baseline;
            let triggered = state.volume_24h > baseline * multiplier;
            decision(
                triggered,
                format!(
                    "24h volume ${:.0} exceeded {multiplier:.1}x the ${baseline:.0} baseline",
                    state.volume_24h
                ),
            )
        }

        // Needs a historical-liquidity collaborator that does not exist yet.
        AlertCondition::LiquidityDrop { drop_pct } => decision(
            false,
            format!("Liquidity-drop tracking ({drop_pct:.0}%) is not available for this market"),
        ),

        AlertCondition::ResolutionApproaching { hours_before_end } => {
            let triggered = matches!(
                state.hours_until_end,
                Some(h) if h > 0.0 && h <= *hours_before_end
            );
            let hours = state.hours_until_end.unwrap_or(0.0);
            decision(
                triggered,
                format!("Market resolves in {hours:.1}h (alert window: {hours_before_end:.0}h)"),
            )
        }

        AlertCondition::FavorableStructure { min_confidence }
        | AlertCondition::StructuralMispricing { min_confidence }
        | AlertCondition::EventWindow { min_confidence }
        | AlertCondition::RetailFriendly { min_confidence } => {
            let triggered = fresh_signal(state)
                .map(|s| s.is_favorable && s.confidence >= *min_confidence)
                .unwrap_or(false);
            decision(
                triggered,
                signal_message(condition.kind(), fresh_signal(state), *min_confidence),
            )
        }

        // Warning alert with inverted polarity: fires on unfavorable flow.
        AlertCondition::CrowdChasing { min_confidence } => {
            let triggered = fresh_signal(state)
                .map(|s| !s.is_favorable && s.confidence >= *min_confidence)
                .unwrap_or(false);
            decision(
                triggered,
                signal_message("crowd_chasing", fresh_signal(state), *min_confidence),
            )
        }
    }
}

fn decision(should_trigger: bool, message: String) -> AlertDecision {
    AlertDecision { should_trigger, message }
}

/// The flow signal, if one was computed within the freshness window.
fn fresh_signal(state: &MarketState) -> Option<FlowSignalState> {
    state.flow_signal.filter(|s| {
        (state.now - s.computed_at).num_seconds() <= SIGNAL_FRESHNESS_SECS
    })
}

fn signal_message(
    kind: &str,
    signal: Option<FlowSignalState>,
    min_confidence: SignalConfidence,
) -> String {
    match signal {
        Some(s) => format!(
            "{kind}: flow signal is {} with {} confidence (minimum {min_confidence})",
            if s.is_favorable { "favorable" } else { "unfavorable" },
            s.confidence
        ),
        None => format!("{kind}: no recent flow signal for this market"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
