use super::{shape_error, zone_based, MetricSample, ScoreBreakdown, ScoreResult};
use crate::config::{SleepCompositeParams, VarianceBand};
use crate::error::EngineError;

const KIND: &str = "sleep_composite";

pub const DURATION_WEIGHT: f64 = 0.55;
pub const SLEEP_CONSISTENCY_WEIGHT: f64 = 0.225;
pub const WAKE_CONSISTENCY_WEIGHT: f64 = 0.225;

pub(crate) const DURATION_FIELD: &str = "duration";
pub(crate) const SLEEP_CONSISTENCY_FIELD: &str = "sleep_consistency";
pub(crate) const WAKE_CONSISTENCY_FIELD: &str = "wake_consistency";

/// Sleep composite over three fixed components: duration (hours), sleep-time
/// consistency and wake-time consistency (variance in minutes).
pub(crate) fn score(
    params: &SleepCompositeParams,
    sample: &MetricSample,
) -> Result<ScoreResult, EngineError> {
    let MetricSample::Fields(fields) = sample else {
        return Err(shape_error(KIND, sample));
    };
    let field = |name: &str| {
        fields
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::MissingField(name.to_string()))
    };

    let duration = field(DURATION_FIELD)?;
    let sleep_variance = field(SLEEP_CONSISTENCY_FIELD)?;
    let wake_variance = field(WAKE_CONSISTENCY_FIELD)?;

    let duration_score = duration_score(params, duration);
    let sleep_consistency_score = variance_score(&params.sleep_consistency_bands, sleep_variance);
    let wake_consistency_score = variance_score(&params.wake_consistency_bands, wake_variance);

    let total = (DURATION_WEIGHT * duration_score
        + SLEEP_CONSISTENCY_WEIGHT * sleep_consistency_score
        + WAKE_CONSISTENCY_WEIGHT * wake_consistency_score)
        .clamp(0.0, 100.0);

    Ok(ScoreResult::scored(
        total,
        "scored",
        ScoreBreakdown::Sleep {
            duration_score,
            sleep_consistency_score,
            wake_consistency_score,
        },
    ))
}

/// Zone lookup for duration, with the documented exception: exactly 9.0 hours
/// always scores 100, even though the "Optimal" zone is half-open at 9.0.
/// Upstream treats this as intentional; do not fold it into the zone rule.
fn duration_score(params: &SleepCompositeParams, duration: f64) -> f64 {
    if (duration - 9.0).abs() < f64::EPSILON {
        return 100.0;
    }
    zone_based::lookup(&params.duration_zones, duration)
        .map(|zone| zone.score)
        .unwrap_or(0.0)
}

/// First band whose `variance < max_variance` wins; past the final band the
/// lookup falls through to 0.
fn variance_score(bands: &[VarianceBand], variance: f64) -> f64 {
    bands
        .iter()
        .find(|band| variance < band.max_variance)
        .map(|band| band.score)
        .unwrap_or(0.0)
}
