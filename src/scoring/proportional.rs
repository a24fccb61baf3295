use super::{shape_error, weekly_window, MetricSample, ScoreBreakdown, ScoreResult};
use crate::config::ProportionalParams;
use crate::error::EngineError;

const KIND: &str = "proportional";

/// Linear credit toward a target with optional top-N weekly aggregation.
pub(crate) fn score(
    params: &ProportionalParams,
    sample: &MetricSample,
) -> Result<ScoreResult, EngineError> {
    match sample {
        MetricSample::Value(value) => Ok(score_value(params, *value)),
        MetricSample::Daily(values) => score_week(params, values),
        other => Err(shape_error(KIND, other)),
    }
}

/// Daily formula: `clamp(value / target * 100, 0, maximum_cap)`, with no
/// credit at or below zero, and none below the qualifying floor.
pub(crate) fn linear_score(value: f64, target: f64, maximum_cap: f64, floor: Option<f64>) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    if let Some(floor) = floor {
        if value < floor {
            return 0.0;
        }
    }
    ((value / target) * 100.0).clamp(0.0, maximum_cap)
}

fn qualifies(value: f64, floor: Option<f64>) -> bool {
    match floor {
        Some(floor) => value >= floor && value > 0.0,
        None => value > 0.0,
    }
}

fn score_value(params: &ProportionalParams, value: f64) -> ScoreResult {
    let daily = linear_score(value, params.target, params.maximum_cap, params.minimum_threshold);
    let qualifying: Vec<usize> = if qualifies(value, params.minimum_threshold) {
        vec![0]
    } else {
        Vec::new()
    };
    ScoreResult::scored(
        daily,
        "scored",
        ScoreBreakdown::Proportional {
            daily_scores: vec![daily],
            qualifying_days: qualifying.clone(),
            counted_days: qualifying,
        },
    )
}

fn score_week(params: &ProportionalParams, values: &[f64]) -> Result<ScoreResult, EngineError> {
    let values = weekly_window(values)?;
    let daily_scores: Vec<f64> = values
        .iter()
        .map(|value| {
            linear_score(*value, params.target, params.maximum_cap, params.minimum_threshold)
        })
        .collect();

    let Some(required_days) = params.required_days else {
        // Plain weekly proportional: mean of all seven capped daily scores.
        let mean = daily_scores.iter().sum::<f64>() / daily_scores.len() as f64;
        let counted: Vec<usize> = (0..daily_scores.len()).collect();
        return Ok(ScoreResult::scored(
            mean,
            "scored",
            ScoreBreakdown::Proportional {
                daily_scores,
                qualifying_days: counted.clone(),
                counted_days: counted,
            },
        ));
    };

    // Frequency hybrid: only days meeting the floor qualify; the best
    // `required_days` of them are averaged, the rest are ignored entirely.
    let qualifying_days: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, value)| qualifies(**value, params.minimum_threshold))
        .map(|(day, _)| day)
        .collect();

    if qualifying_days.len() < required_days as usize {
        return Ok(ScoreResult::scored(
            0.0,
            "insufficient_days",
            ScoreBreakdown::Proportional {
                daily_scores,
                qualifying_days,
                counted_days: Vec::new(),
            },
        ));
    }

    let mut ranked: Vec<usize> = qualifying_days.clone();
    ranked.sort_by(|a, b| {
        daily_scores[*b]
            .partial_cmp(&daily_scores[*a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(required_days as usize);

    let mean = ranked.iter().map(|day| daily_scores[*day]).sum::<f64>() / ranked.len() as f64;
    let mut counted_days = ranked;
    counted_days.sort_unstable();

    Ok(ScoreResult::scored(
        mean,
        "scored",
        ScoreBreakdown::Proportional {
            daily_scores,
            qualifying_days,
            counted_days,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(target: f64) -> ProportionalParams {
        ProportionalParams {
            target,
            maximum_cap: 100.0,
            minimum_threshold: None,
            required_days: None,
        }
    }

    #[test]
    fn daily_scores_are_linear_and_capped() {
        assert_eq!(linear_score(5000.0, 10000.0, 100.0, None), 50.0);
        assert_eq!(linear_score(15000.0, 10000.0, 100.0, None), 100.0);
        assert_eq!(linear_score(15000.0, 10000.0, 120.0, None), 120.0);
        assert_eq!(linear_score(0.0, 10000.0, 100.0, None), 0.0);
        assert_eq!(linear_score(-4.0, 10000.0, 100.0, None), 0.0);
    }

    #[test]
    fn floor_removes_partial_credit_below_it() {
        assert_eq!(linear_score(19.0, 60.0, 100.0, Some(20.0)), 0.0);
        let at_floor = linear_score(20.0, 60.0, 100.0, Some(20.0));
        assert!((at_floor - 33.333333).abs() < 1e-4);
    }

    #[test]
    fn plain_weekly_is_the_mean_of_capped_days() {
        let config = params(100.0);
        let week = MetricSample::Daily(vec![100.0, 50.0, 0.0, 200.0, 100.0, 25.0, 75.0]);
        let result = score(&config, &week).expect("weekly proportional scores");
        // 100 + 50 + 0 + 100 (capped) + 100 + 25 + 75 = 450
        assert_eq!(result.score, Some(450.0 / 7.0));
    }

    #[test]
    fn frequency_hybrid_averages_only_the_top_required_days() {
        let config = ProportionalParams {
            minimum_threshold: Some(20.0),
            required_days: Some(3),
            ..params(100.0)
        };
        let week = MetricSample::Daily(vec![90.0, 10.0, 40.0, 0.0, 70.0, 19.0, 30.0]);
        let result = score(&config, &week).expect("hybrid scores");
        // Qualifying raw values: 90, 40, 70, 30; top three scores 90, 70, 40.
        assert_eq!(result.score, Some(200.0 / 3.0));
        match result.breakdown {
            ScoreBreakdown::Proportional {
                qualifying_days,
                counted_days,
                ..
            } => {
                assert_eq!(qualifying_days, vec![0, 2, 4, 6]);
                assert_eq!(counted_days, vec![0, 2, 4]);
            }
            other => panic!("unexpected breakdown {other:?}"),
        }
    }

    #[test]
    fn too_few_qualifying_days_scores_zero() {
        let config = ProportionalParams {
            minimum_threshold: Some(50.0),
            required_days: Some(4),
            ..params(100.0)
        };
        let week = MetricSample::Daily(vec![90.0, 60.0, 40.0, 0.0, 70.0, 19.0, 30.0]);
        let result = score(&config, &week).expect("hybrid scores");
        assert_eq!(result.score, Some(0.0));
        assert_eq!(result.status, "insufficient_days");
    }
}
