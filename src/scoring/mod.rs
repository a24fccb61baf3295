//! Scoring strategies and the evaluation façade.
//!
//! Every strategy is a pure function from `(params, sample)` to a
//! [`ScoreResult`]; the only mutable state in the engine is the
//! [`RolloverLedger`] consumed by the constrained weekly allowance.

mod allowance;
mod biomarker;
mod categorical;
mod composite;
mod elimination;
mod frequency;
mod proportional;
mod sleep;
mod threshold;
mod zone_based;

pub use allowance::{AllowanceContext, RolloverLedger};
pub use biomarker::{normalize_marker, BiomarkerPanel};
pub use frequency::progressive_scores;
pub use sleep::{DURATION_WEIGHT, SLEEP_CONSISTENCY_WEIGHT, WAKE_CONSISTENCY_WEIGHT};

use crate::config::{AlgorithmConfig, Comparison};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw measurements for one tracked metric, immutable per evaluation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSample {
    /// A single numeric measurement.
    Value(f64),
    /// Day-indexed values: exactly 7 for weekly windows, 28–31 for monthly.
    Daily(Vec<f64>),
    /// Named numeric fields consumed by composite algorithms.
    Fields(BTreeMap<String, f64>),
    /// A categorical field paired with a numeric value.
    Categorical { category: String, value: f64 },
}

impl MetricSample {
    /// Convenience constructor for composite samples.
    pub fn fields<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        MetricSample::Fields(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            MetricSample::Value(_) => "single value",
            MetricSample::Daily(_) => "daily series",
            MetricSample::Fields(_) => "field map",
            MetricSample::Categorical { .. } => "categorical value",
        }
    }
}

/// Require a 7-entry weekly series.
pub(crate) fn weekly_window(values: &[f64]) -> Result<&[f64], EngineError> {
    if values.len() == 7 {
        Ok(values)
    } else {
        Err(EngineError::WindowLength {
            period: "weekly",
            expected: "7",
            actual: values.len(),
        })
    }
}

/// Require a 28–31 entry monthly series.
pub(crate) fn monthly_window(values: &[f64]) -> Result<&[f64], EngineError> {
    if (28..=31).contains(&values.len()) {
        Ok(values)
    } else {
        Err(EngineError::WindowLength {
            period: "monthly",
            expected: "28-31",
            actual: values.len(),
        })
    }
}

pub(crate) fn shape_error(kind: &'static str, sample: &MetricSample) -> EngineError {
    EngineError::SampleShape {
        kind,
        detail: format!("got a {}", sample.describe()),
    }
}

/// Normalized scoring outcome with an auditable breakdown.
///
/// `score: None` is the distinguished no-match outcome (value outside every
/// configured zone/range, unknown marker); it is never conflated with 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: Option<f64>,
    pub status: String,
    pub breakdown: ScoreBreakdown,
}

impl ScoreResult {
    pub(crate) fn scored(
        score: f64,
        status: impl Into<String>,
        breakdown: ScoreBreakdown,
    ) -> Self {
        Self {
            score: Some(score),
            status: status.into(),
            breakdown,
        }
    }

    pub(crate) fn no_match(status: impl Into<String>, breakdown: ScoreBreakdown) -> Self {
        Self {
            score: None,
            status: status.into(),
            breakdown,
        }
    }
}

/// Per-component contribution inside a composite breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub name: String,
    pub field_name: String,
    pub raw_value: f64,
    pub weight: f64,
    pub score: f64,
    pub weighted: f64,
}

/// Structured audit detail attached to every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum ScoreBreakdown {
    BinaryThreshold {
        value: f64,
        threshold: f64,
        comparison: Comparison,
        passed: bool,
    },
    ThresholdFrequency {
        daily_passes: Vec<bool>,
        successful_days: u8,
        required_days: u8,
    },
    Proportional {
        daily_scores: Vec<f64>,
        /// Days whose raw value met the qualifying floor.
        qualifying_days: Vec<usize>,
        /// Days whose scores were actually averaged.
        counted_days: Vec<usize>,
    },
    ZoneMatch {
        value: f64,
        matched_zone: Option<String>,
        zone_score: Option<f64>,
    },
    ZoneWeekly {
        daily_scores: Vec<Option<f64>>,
        qualifying_days: Option<u8>,
        required_days: Option<u8>,
    },
    Frequency {
        daily_passes: Vec<bool>,
        successful_days: u8,
        required_days: u8,
        /// Day-by-day achievability signal, 100 while the goal is still
        /// reachable and 0 afterwards.
        progressive: Vec<f64>,
    },
    Elimination {
        violation_days: Vec<usize>,
        total: Option<f64>,
        limit: Option<f64>,
        remaining_allowance: Option<f64>,
    },
    Allowance {
        total_used: f64,
        active_days: u8,
        base_allowance: f64,
        rollover_applied: f64,
        effective_allowance: f64,
        within_amount: bool,
        within_days: bool,
    },
    Categorical {
        matched_category: String,
        value: f64,
        threshold: f64,
        passed: bool,
    },
    Composite {
        components: Vec<ComponentScore>,
    },
    Sleep {
        duration_score: f64,
        sleep_consistency_score: f64,
        wake_consistency_score: f64,
    },
    Biomarker {
        marker: String,
        matched_tier: Option<String>,
    },
}

/// Validated façade over one algorithm configuration.
///
/// Construction runs the validator and refuses configs with errors, so every
/// live engine scores against a structurally sound config.
pub struct ScoringEngine {
    config: AlgorithmConfig,
}

impl ScoringEngine {
    pub fn new(config: AlgorithmConfig) -> Result<Self, EngineError> {
        let report = crate::validation::validate(&config);
        if !report.valid {
            return Err(EngineError::InvalidConfig(report.errors.join("; ")));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &AlgorithmConfig {
        &self.config
    }

    /// Score one sample. Pure: identical inputs yield identical results.
    pub fn score(&self, sample: &MetricSample) -> Result<ScoreResult, EngineError> {
        evaluate(&self.config, sample)
    }

    /// Score one sample, threading the rollover ledger for allowance configs.
    ///
    /// Only the constrained weekly allowance consults or mutates the ledger;
    /// any other kind scores exactly as [`ScoringEngine::score`].
    pub fn score_with_rollover(
        &self,
        sample: &MetricSample,
        context: &AllowanceContext<'_>,
        ledger: &mut RolloverLedger,
    ) -> Result<ScoreResult, EngineError> {
        match &self.config {
            AlgorithmConfig::ConstrainedWeeklyAllowance(params) => {
                allowance::score(params, sample, Some((context, ledger)))
            }
            _ => evaluate(&self.config, sample),
        }
    }
}

/// Dispatch a sample to the strategy selected by the config's kind tag.
pub fn evaluate(
    config: &AlgorithmConfig,
    sample: &MetricSample,
) -> Result<ScoreResult, EngineError> {
    match config {
        AlgorithmConfig::BinaryThreshold(params) => threshold::score(params, sample),
        AlgorithmConfig::Proportional(params) => proportional::score(params, sample),
        AlgorithmConfig::ZoneBased(params) => zone_based::score(params, sample),
        AlgorithmConfig::MinimumFrequency(params) => frequency::score(params, sample),
        AlgorithmConfig::WeeklyElimination(params) => elimination::score(params, sample),
        AlgorithmConfig::ConstrainedWeeklyAllowance(params) => {
            allowance::score(params, sample, None)
        }
        AlgorithmConfig::CategoricalFilter(params) => categorical::score(params, sample),
        AlgorithmConfig::CompositeWeighted(params) => composite::score(params, sample),
        AlgorithmConfig::SleepComposite(params) => sleep::score(params, sample),
        AlgorithmConfig::BiomarkerRange(params) => biomarker::score(params, sample),
    }
}
