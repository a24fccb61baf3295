use super::{shape_error, MetricSample, ScoreBreakdown, ScoreResult};
use crate::config::{BiomarkerRangeParams, RangeBound, RangeTier, TierScore};
use crate::error::EngineError;
use std::collections::BTreeMap;

const KIND: &str = "biomarker_range";

/// Canonical form for marker-name lookup: lowercased, whitespace collapsed.
pub fn normalize_marker(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Score a marker value against its ordered tiers; first match wins.
pub(crate) fn score(
    params: &BiomarkerRangeParams,
    sample: &MetricSample,
) -> Result<ScoreResult, EngineError> {
    let MetricSample::Value(value) = sample else {
        return Err(shape_error(KIND, sample));
    };
    Ok(score_value(params, *value))
}

fn score_value(params: &BiomarkerRangeParams, value: f64) -> ScoreResult {
    for tier in &params.tiers {
        if tier.range.matches(value) {
            let tier_label = tier.range.to_string();
            return ScoreResult::scored(
                round2(resolve(tier, value)),
                tier_label.clone(),
                ScoreBreakdown::Biomarker {
                    marker: params.marker.clone(),
                    matched_tier: Some(tier_label),
                },
            );
        }
    }
    // Out of every configured range: a distinguished absence, never a 0.
    ScoreResult::no_match(
        "out_of_range",
        ScoreBreakdown::Biomarker {
            marker: params.marker.clone(),
            matched_tier: None,
        },
    )
}

fn resolve(tier: &RangeTier, value: f64) -> f64 {
    match (tier.score, tier.range) {
        (TierScore::Fixed(score), _) => score,
        (TierScore::Linear { start, end }, RangeBound::Bounded { low, high }) => {
            start + (value - low) / (high - low) * (end - start)
        }
        (TierScore::Linear { start, .. }, RangeBound::Below(_)) => start,
        (TierScore::Linear { end, .. }, RangeBound::Above(_)) => end,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Lookup table over many markers, keyed by normalized name.
#[derive(Debug, Clone, Default)]
pub struct BiomarkerPanel {
    markers: BTreeMap<String, BiomarkerRangeParams>,
}

impl BiomarkerPanel {
    pub fn new<I>(configs: I) -> Self
    where
        I: IntoIterator<Item = BiomarkerRangeParams>,
    {
        Self {
            markers: configs
                .into_iter()
                .map(|params| (normalize_marker(&params.marker), params))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Score `value` for `marker`; an unknown marker is a no-match result
    /// (`status = "unknown_marker"`), not an error and not a zero.
    pub fn score(&self, marker: &str, value: f64) -> ScoreResult {
        match self.markers.get(&normalize_marker(marker)) {
            Some(params) => score_value(params, value),
            None => ScoreResult::no_match(
                "unknown_marker",
                ScoreBreakdown::Biomarker {
                    marker: marker.to_string(),
                    matched_tier: None,
                },
            ),
        }
    }
}
