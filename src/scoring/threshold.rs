use super::{shape_error, weekly_window, MetricSample, ScoreBreakdown, ScoreResult};
use crate::config::BinaryThresholdParams;
use crate::error::EngineError;

const KIND: &str = "binary_threshold";

/// Pass/fail threshold scoring: no partial credit in either form.
pub(crate) fn score(
    params: &BinaryThresholdParams,
    sample: &MetricSample,
) -> Result<ScoreResult, EngineError> {
    match sample {
        MetricSample::Value(value) => Ok(score_value(params, *value)),
        MetricSample::Daily(values) => score_week(params, values),
        other => Err(shape_error(KIND, other)),
    }
}

fn score_value(params: &BinaryThresholdParams, value: f64) -> ScoreResult {
    let passed = params.comparison.holds(value, params.threshold);
    let score = if passed {
        params.success_value
    } else {
        params.failure_value
    };
    let status = if passed { "met" } else { "not_met" };
    ScoreResult::scored(
        score,
        status,
        ScoreBreakdown::BinaryThreshold {
            value,
            threshold: params.threshold,
            comparison: params.comparison,
            passed,
        },
    )
}

/// Weekly frequency form: binary 100/0 on the count of passing days.
fn score_week(params: &BinaryThresholdParams, values: &[f64]) -> Result<ScoreResult, EngineError> {
    let required_days = params.required_days.ok_or_else(|| EngineError::SampleShape {
        kind: KIND,
        detail: "daily series supplied but required_days is not configured".to_string(),
    })?;
    let values = weekly_window(values)?;

    let daily_passes: Vec<bool> = values
        .iter()
        .map(|value| params.comparison.holds(*value, params.threshold))
        .collect();
    let successful_days = daily_passes.iter().filter(|passed| **passed).count() as u8;
    let met = successful_days >= required_days;

    Ok(ScoreResult::scored(
        if met { 100.0 } else { 0.0 },
        if met { "met" } else { "not_met" },
        ScoreBreakdown::ThresholdFrequency {
            daily_passes,
            successful_days,
            required_days,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Comparison;

    fn params(threshold: f64, comparison: Comparison) -> BinaryThresholdParams {
        BinaryThresholdParams {
            threshold,
            comparison,
            success_value: 100.0,
            failure_value: 0.0,
            required_days: None,
        }
    }

    #[test]
    fn result_is_closed_over_success_and_failure_values() {
        let config = BinaryThresholdParams {
            success_value: 80.0,
            failure_value: 15.0,
            ..params(10.0, Comparison::GreaterOrEqual)
        };
        for value in [-3.0, 0.0, 9.99, 10.0, 250.0] {
            let result = score_value(&config, value);
            let score = result.score.expect("threshold always scores");
            assert!(
                score == 80.0 || score == 15.0,
                "score {score} escaped the configured pair"
            );
        }
    }

    #[test]
    fn weekly_form_needs_enough_passing_days() {
        let config = BinaryThresholdParams {
            required_days: Some(3),
            ..params(30.0, Comparison::GreaterOrEqual)
        };
        let week = MetricSample::Daily(vec![45.0, 0.0, 30.0, 10.0, 31.0, 0.0, 5.0]);
        let result = score(&config, &week).expect("weekly threshold scores");
        assert_eq!(result.score, Some(100.0));

        let sparse = MetricSample::Daily(vec![45.0, 0.0, 0.0, 10.0, 0.0, 0.0, 5.0]);
        let result = score(&config, &sparse).expect("weekly threshold scores");
        assert_eq!(result.score, Some(0.0), "two passing days is not three");
    }

    #[test]
    fn daily_series_without_required_days_is_a_shape_error() {
        let config = params(1.0, Comparison::GreaterOrEqual);
        let week = MetricSample::Daily(vec![1.0; 7]);
        assert!(matches!(
            score(&config, &week),
            Err(EngineError::SampleShape { .. })
        ));
    }

    #[test]
    fn short_weeks_are_rejected_not_padded() {
        let config = BinaryThresholdParams {
            required_days: Some(2),
            ..params(1.0, Comparison::GreaterOrEqual)
        };
        let short = MetricSample::Daily(vec![1.0; 5]);
        assert!(matches!(
            score(&config, &short),
            Err(EngineError::WindowLength { actual: 5, .. })
        ));
    }
}
