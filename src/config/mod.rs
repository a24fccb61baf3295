//! Declarative algorithm configurations.
//!
//! Configs are produced externally (JSON documents, CSV-derived catalogs) and
//! are read-only to the engine: one tagged `{kind, parameters}` record per
//! tracked metric. The closed set of kinds lives in [`AlgorithmConfig`]; the
//! shared value types live in [`primitives`].

mod primitives;

pub use primitives::{
    CategoryFilter, Comparison, Component, ComponentMethod, RangeBound, RangeTier, TierScore,
    VarianceBand, Zone,
};

use serde::{Deserialize, Serialize};

pub(crate) fn full_credit() -> f64 {
    100.0
}

/// Closed family of scoring strategies, tagged by `kind` with a per-kind
/// parameter record under `parameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "parameters", rename_all = "snake_case")]
pub enum AlgorithmConfig {
    BinaryThreshold(BinaryThresholdParams),
    Proportional(ProportionalParams),
    ZoneBased(ZoneBasedParams),
    MinimumFrequency(MinimumFrequencyParams),
    WeeklyElimination(EliminationParams),
    ConstrainedWeeklyAllowance(AllowanceParams),
    CategoricalFilter(CategoricalFilterParams),
    CompositeWeighted(CompositeParams),
    SleepComposite(SleepCompositeParams),
    BiomarkerRange(BiomarkerRangeParams),
}

impl AlgorithmConfig {
    /// Stable tag used in config documents and reports.
    pub const fn kind(&self) -> &'static str {
        match self {
            AlgorithmConfig::BinaryThreshold(_) => "binary_threshold",
            AlgorithmConfig::Proportional(_) => "proportional",
            AlgorithmConfig::ZoneBased(_) => "zone_based",
            AlgorithmConfig::MinimumFrequency(_) => "minimum_frequency",
            AlgorithmConfig::WeeklyElimination(_) => "weekly_elimination",
            AlgorithmConfig::ConstrainedWeeklyAllowance(_) => "constrained_weekly_allowance",
            AlgorithmConfig::CategoricalFilter(_) => "categorical_filter",
            AlgorithmConfig::CompositeWeighted(_) => "composite_weighted",
            AlgorithmConfig::SleepComposite(_) => "sleep_composite",
            AlgorithmConfig::BiomarkerRange(_) => "biomarker_range",
        }
    }
}

/// Pass/fail comparison of a single value against a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryThresholdParams {
    pub threshold: f64,
    #[serde(default)]
    pub comparison: Comparison,
    #[serde(default = "full_credit")]
    pub success_value: f64,
    #[serde(default)]
    pub failure_value: f64,
    /// When present, daily pass/fail results are aggregated over a weekly
    /// window: 100 iff at least this many days pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_days: Option<u8>,
}

/// Linear credit toward a target, optionally gated by a qualifying floor and
/// a weekly frequency requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProportionalParams {
    pub target: f64,
    #[serde(default = "full_credit")]
    pub maximum_cap: f64,
    /// Raw values below this floor earn no credit and do not count as
    /// qualifying days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_threshold: Option<f64>,
    /// Weekly top-N gate: fewer qualifying days than this scores 0, otherwise
    /// the best `required_days` qualifying daily scores are averaged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_days: Option<u8>,
}

/// Fixed-score zone lookup with optional weekly aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneBasedParams {
    pub zones: Vec<Zone>,
    /// Declared tier count (3 or 5); must match `zones.len()` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_count: Option<u8>,
    /// Weekly frequency form: count days whose zone score reaches
    /// `minimum_zone_score` and compare against this requirement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_days: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_zone_score: Option<f64>,
}

/// Binary weekly goal: at least `required_days` of 7 must pass the daily test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimumFrequencyParams {
    pub daily_threshold: f64,
    #[serde(default)]
    pub daily_comparison: Comparison,
    pub required_days: u8,
}

fn equal_comparison() -> Comparison {
    Comparison::Equal
}

/// Zero-tolerance elimination over a weekly or monthly window.
///
/// Exactly one mode must be configured: `elimination_threshold` for the daily
/// zero-tolerance form, `weekly_limit` or `monthly_limit` for the sum-limit
/// forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliminationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elimination_threshold: Option<f64>,
    #[serde(default = "equal_comparison")]
    pub elimination_comparison: Comparison,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_limit: Option<f64>,
}

/// Dual-constraint weekly allowance with optional carryover of unused amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowanceParams {
    pub weekly_allowance: f64,
    pub max_days_per_week: u8,
    /// Deducted from 100 on any violation; 100 means zero tolerance.
    #[serde(default = "full_credit")]
    pub penalty_for_overage: f64,
    #[serde(default)]
    pub rollover_enabled: bool,
    /// Cap on the carried-over amount, as a percentage of the base allowance.
    #[serde(default)]
    pub max_rollover_percentage: f64,
}

/// First-match category lookup with a fixed half-credit default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalFilterParams {
    pub filters: Vec<CategoryFilter>,
    pub default_threshold: f64,
    #[serde(default = "full_credit")]
    pub default_success_value: f64,
}

/// Weighted sum over named components, each scored by its own nested method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeParams {
    pub components: Vec<Component>,
}

/// Specialized sleep composite: duration zones plus two consistency lookups.
///
/// Component weights are fixed (see `scoring::sleep`); only the lookup tables
/// are configurable, and they default to the standard sleep rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepCompositeParams {
    #[serde(default = "default_duration_zones")]
    pub duration_zones: Vec<Zone>,
    #[serde(default = "default_consistency_bands")]
    pub sleep_consistency_bands: Vec<VarianceBand>,
    #[serde(default = "default_consistency_bands")]
    pub wake_consistency_bands: Vec<VarianceBand>,
}

impl Default for SleepCompositeParams {
    fn default() -> Self {
        Self {
            duration_zones: default_duration_zones(),
            sleep_consistency_bands: default_consistency_bands(),
            wake_consistency_bands: default_consistency_bands(),
        }
    }
}

fn zone(min: f64, max: f64, score: f64, label: &str) -> Zone {
    Zone {
        min,
        max,
        score,
        label: label.to_string(),
    }
}

fn default_duration_zones() -> Vec<Zone> {
    vec![
        zone(0.0, 5.0, 0.0, "Severely short"),
        zone(5.0, 6.0, 25.0, "Short"),
        zone(6.0, 7.0, 50.0, "Slightly short"),
        zone(7.0, 9.0, 100.0, "Optimal"),
        zone(9.0, 12.0, 75.0, "Long"),
    ]
}

fn default_consistency_bands() -> Vec<VarianceBand> {
    vec![
        VarianceBand {
            max_variance: 60.0,
            score: 100.0,
        },
        VarianceBand {
            max_variance: 90.0,
            score: 75.0,
        },
        VarianceBand {
            max_variance: 120.0,
            score: 50.0,
        },
        VarianceBand {
            max_variance: 180.0,
            score: 25.0,
        },
    ]
}

/// Ordered range tiers for one biomarker; first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerRangeParams {
    pub marker: String,
    pub tiers: Vec<RangeTier>,
}
