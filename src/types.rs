use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Market telemetry
// ---------------------------------------------------------------------------

/// Immutable point-in-time observation of one market.
/// Produced by an external ingestion collaborator; the core only reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub market_id: String,
    /// Implied YES probability, 0..1.
    pub price: f64,
    pub volume_24h: f64,
    pub liquidity: f64,
    pub spread: f64,
    pub depth: f64,
    pub taken_at: DateTime<Utc>,
}

/// Static/slow-changing market descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketMeta {
    pub market_id: String,
    pub question: String,
    pub category: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Behavior clustering
// ---------------------------------------------------------------------------

/// Five 0–100 dimension scores feeding the behavior classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorFeatures {
    pub info_cadence: u8,
    pub info_structure: u8,
    pub liquidity_stability: u8,
    pub time_to_resolution: u8,
    pub participant_concentration: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorCluster {
    SportsScheduled,
    BinaryCatalyst,
    HighVolatility,
    LongDuration,
    ScheduledEvent,
    ContinuousInfo,
}

impl std::fmt::Display for BehaviorCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BehaviorCluster::SportsScheduled => "sports_scheduled",
            BehaviorCluster::BinaryCatalyst => "binary_catalyst",
            BehaviorCluster::HighVolatility => "high_volatility",
            BehaviorCluster::LongDuration => "long_duration",
            BehaviorCluster::ScheduledEvent => "scheduled_event",
            BehaviorCluster::ContinuousInfo => "continuous_info",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetailFriendliness {
    Favorable,
    Neutral,
    Unfavorable,
}

impl std::fmt::Display for RetailFriendliness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RetailFriendliness::Favorable => "favorable",
            RetailFriendliness::Neutral => "neutral",
            RetailFriendliness::Unfavorable => "unfavorable",
        };
        write!(f, "{s}")
    }
}

/// Static retail-interpretation lookup attached to a classified cluster.
#[derive(Debug, Clone, Copy)]
pub struct RetailInterpretation {
    pub friendliness: RetailFriendliness,
    pub what_it_means: &'static str,
    pub what_to_watch: &'static str,
    pub typical_mistake: &'static str,
}

/// Derived behavior profile, one per market (upsert semantics).
/// Cluster and confidence are always computed together.
#[derive(Debug, Clone, Serialize)]
pub struct BehaviorProfile {
    pub market_id: String,
    pub features: BehaviorFeatures,
    pub cluster: BehaviorCluster,
    pub confidence: u8,
    pub explanation: String,
    pub retail_friendliness: RetailFriendliness,
    pub what_it_means: String,
    pub what_to_watch: String,
    pub typical_mistake: String,
}

// ---------------------------------------------------------------------------
// Flow guard
// ---------------------------------------------------------------------------

/// Four 0–100 flow metrics. None until at least 2 snapshots exist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowFeatures {
    pub large_early_trades_pct: f64,
    pub order_book_concentration: f64,
    pub depth_shift_speed: f64,
    pub repricing_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowLabel {
    HistoricallyNoisy,
    ProDominant,
    RetailActionable,
}

impl std::fmt::Display for FlowLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FlowLabel::HistoricallyNoisy => "historically_noisy",
            FlowLabel::ProDominant => "pro_dominant",
            FlowLabel::RetailActionable => "retail_actionable",
        };
        write!(f, "{s}")
    }
}

/// Ordinal confidence band: low < medium < high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalConfidence {
    Low,
    Medium,
    High,
}

impl SignalConfidence {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(SignalConfidence::Low),
            "medium" => Some(SignalConfidence::Medium),
            "high" => Some(SignalConfidence::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for SignalConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SignalConfidence::Low => "low",
            SignalConfidence::Medium => "medium",
            SignalConfidence::High => "high",
        };
        write!(f, "{s}")
    }
}

/// One human-readable justification line with its backing metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhyBullet {
    pub text: String,
    pub metric: String,
    pub value: f64,
    pub unit: String,
}

/// Derived flow profile, one per market (upsert semantics).
#[derive(Debug, Clone, Serialize)]
pub struct FlowProfile {
    pub market_id: String,
    pub label: FlowLabel,
    pub confidence: SignalConfidence,
    pub why_bullets: Vec<WhyBullet>,
    pub metrics: Option<FlowFeatures>,
}

// ---------------------------------------------------------------------------
// Resolution drivers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Crypto,
    Politics,
    Economics,
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssetCategory::Crypto => "crypto",
            AssetCategory::Politics => "politics",
            AssetCategory::Economics => "economics",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeDependency {
    Election,
    ApprovalRating,
    PriceMovement,
    CompetitionOutcome,
}

impl std::fmt::Display for NarrativeDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NarrativeDependency::Election => "election",
            NarrativeDependency::ApprovalRating => "approval_rating",
            NarrativeDependency::PriceMovement => "price_movement",
            NarrativeDependency::CompetitionOutcome => "competition_outcome",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    ExchangePrice,
    OfficialResults,
    GameResult,
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolutionSource::ExchangePrice => "exchange_price",
            ResolutionSource::OfficialResults => "official_results",
            ResolutionSource::GameResult => "game_result",
        };
        write!(f, "{s}")
    }
}

/// What a market's resolution actually depends on, extracted from its question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionDrivers {
    pub market_id: String,
    pub underlying_asset: Option<String>,
    pub asset_category: Option<AssetCategory>,
    pub narrative_dependency: Option<NarrativeDependency>,
    pub resolution_source: Option<ResolutionSource>,
    pub resolution_window_start: Option<DateTime<Utc>>,
    pub resolution_window_end: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Exposure links
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureLabel {
    Independent,
    PartiallyLinked,
    HighlyLinked,
}

impl std::fmt::Display for ExposureLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExposureLabel::Independent => "independent",
            ExposureLabel::PartiallyLinked => "partially_linked",
            ExposureLabel::HighlyLinked => "highly_linked",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedDriverType {
    Asset,
    Narrative,
    CategoryTime,
    Category,
    ResolutionSource,
    None,
}

impl std::fmt::Display for SharedDriverType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SharedDriverType::Asset => "asset",
            SharedDriverType::Narrative => "narrative",
            SharedDriverType::CategoryTime => "category_time",
            SharedDriverType::Category => "category",
            SharedDriverType::ResolutionSource => "resolution_source",
            SharedDriverType::None => "none",
        };
        write!(f, "{s}")
    }
}

/// Result of classifying one unordered market pair.
#[derive(Debug, Clone, Serialize)]
pub struct ExposureClassification {
    pub label: ExposureLabel,
    pub shared_driver_type: SharedDriverType,
    pub explanation: String,
    pub example_outcome: String,
    pub mistake_prevented: String,
}

// ---------------------------------------------------------------------------
// Participation structure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketSide {
    Yes,
    No,
}

impl std::fmt::Display for MarketSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketSide::Yes => write!(f, "YES"),
            MarketSide::No => write!(f, "NO"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupQualityBand {
    HistoricallyFavorable,
    MixedWorkable,
    Neutral,
    HistoricallyUnforgiving,
}

impl std::fmt::Display for SetupQualityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SetupQualityBand::HistoricallyFavorable => "historically_favorable",
            SetupQualityBand::MixedWorkable => "mixed_workable",
            SetupQualityBand::Neutral => "neutral",
            SetupQualityBand::HistoricallyUnforgiving => "historically_unforgiving",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantQualityBand {
    Strong,
    Moderate,
    Limited,
}

impl std::fmt::Display for ParticipantQualityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParticipantQualityBand::Strong => "strong",
            ParticipantQualityBand::Moderate => "moderate",
            ParticipantQualityBand::Limited => "limited",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationSummary {
    FewDominant,
    MixedParticipation,
    BroadRetail,
}

impl std::fmt::Display for ParticipationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParticipationSummary::FewDominant => "few_dominant",
            ParticipationSummary::MixedParticipation => "mixed_participation",
            ParticipationSummary::BroadRetail => "broad_retail",
        };
        write!(f, "{s}")
    }
}

/// Heuristic holder-size estimate. Sums to 100 by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipBreakdown {
    pub large_pct: u8,
    pub mid_pct: u8,
    pub small_pct: u8,
}

/// Derived participation profile, (market, side) scoped — two rows per market.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipationProfile {
    pub market_id: String,
    pub side: MarketSide,
    pub setup_quality_score: u8,
    pub setup_quality_band: SetupQualityBand,
    pub participant_quality_score: u8,
    pub participant_quality_band: ParticipantQualityBand,
    pub participation_summary: ParticipationSummary,
    pub breakdown: OwnershipBreakdown,
    pub behavior_insight: String,
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceDirection {
    Above,
    Below,
}

/// User-configured trigger condition, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertCondition {
    PriceMove {
        direction: PriceDirection,
        /// Probability threshold, 0..1.
        threshold: f64,
    },
    VolumeSpike {
        multiplier: f64,
    },
    LiquidityDrop {
        drop_pct: f64,
    },
    ResolutionApproaching {
        hours_before_end: f64,
    },
    FavorableStructure {
        min_confidence: SignalConfidence,
    },
    StructuralMispricing {
        min_confidence: SignalConfidence,
    },
    CrowdChasing {
        min_confidence: SignalConfidence,
    },
    EventWindow {
        min_confidence: SignalConfidence,
    },
    RetailFriendly {
        min_confidence: SignalConfidence,
    },
}

impl AlertCondition {
    /// Wire tag, used as the notification kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AlertCondition::PriceMove { .. } => "price_move",
            AlertCondition::VolumeSpike { .. } => "volume_spike",
            AlertCondition::LiquidityDrop { .. } => "liquidity_drop",
            AlertCondition::ResolutionApproaching { .. } => "resolution_approaching",
            AlertCondition::FavorableStructure { .. } => "favorable_structure",
            AlertCondition::StructuralMispricing { .. } => "structural_mispricing",
            AlertCondition::CrowdChasing { .. } => "crowd_chasing",
            AlertCondition::EventWindow { .. } => "event_window",
            AlertCondition::RetailFriendly { .. } => "retail_friendly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Triggered,
}

impl AlertStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(AlertStatus::Active),
            "triggered" => Some(AlertStatus::Triggered),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertStatus::Active => write!(f, "active"),
            AlertStatus::Triggered => write!(f, "triggered"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: String,
    pub user_id: String,
    pub market_id: String,
    pub condition: AlertCondition,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub triggered_at: Option<DateTime<Utc>>,
}

/// Freshest flow signal for a market, as seen by the alert evaluator.
#[derive(Debug, Clone, Copy)]
pub struct FlowSignalState {
    pub is_favorable: bool,
    pub confidence: SignalConfidence,
    pub computed_at: DateTime<Utc>,
}

/// Everything the alert evaluator reads about one market.
#[derive(Debug, Clone)]
pub struct MarketState {
    pub price: f64,
    pub volume_24h: f64,
    pub liquidity: f64,
    pub hours_until_end: Option<f64>,
    pub avg_volume_baseline: f64,
    pub flow_signal: Option<FlowSignalState>,
    pub now: DateTime<Utc>,
}

/// Trigger decision for one alert condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertDecision {
    pub should_trigger: bool,
    pub message: String,
}
