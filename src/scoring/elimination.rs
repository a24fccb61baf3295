use super::{monthly_window, shape_error, weekly_window, MetricSample, ScoreBreakdown, ScoreResult};
use crate::config::EliminationParams;
use crate::error::EngineError;

const KIND: &str = "weekly_elimination";

/// Zero-tolerance elimination: all three modes are binary, with violations
/// and remaining allowance reported for diagnostics only.
pub(crate) fn score(
    params: &EliminationParams,
    sample: &MetricSample,
) -> Result<ScoreResult, EngineError> {
    let MetricSample::Daily(values) = sample else {
        return Err(shape_error(KIND, sample));
    };

    if let Some(threshold) = params.elimination_threshold {
        return daily_zero_tolerance(params, threshold, values);
    }
    if let Some(limit) = params.weekly_limit {
        return sum_limit(weekly_window(values)?, limit);
    }
    if let Some(limit) = params.monthly_limit {
        return sum_limit(monthly_window(values)?, limit);
    }

    // The validator rejects configs with no mode; reaching here means the
    // config bypassed validation.
    Err(EngineError::InvalidConfig(
        "weekly_elimination config has no threshold or limit".to_string(),
    ))
}

fn daily_zero_tolerance(
    params: &EliminationParams,
    threshold: f64,
    values: &[f64],
) -> Result<ScoreResult, EngineError> {
    let values = weekly_window(values)?;
    let violation_days: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, value)| !params.elimination_comparison.holds(**value, threshold))
        .map(|(day, _)| day)
        .collect();
    let clean = violation_days.is_empty();

    Ok(ScoreResult::scored(
        if clean { 100.0 } else { 0.0 },
        if clean { "clean" } else { "violated" },
        ScoreBreakdown::Elimination {
            violation_days,
            total: None,
            limit: None,
            remaining_allowance: None,
        },
    ))
}

fn sum_limit(values: &[f64], limit: f64) -> Result<ScoreResult, EngineError> {
    let total: f64 = values.iter().sum();
    let within = total <= limit;

    Ok(ScoreResult::scored(
        if within { 100.0 } else { 0.0 },
        if within { "clean" } else { "violated" },
        ScoreBreakdown::Elimination {
            violation_days: Vec::new(),
            total: Some(total),
            limit: Some(limit),
            remaining_allowance: Some(limit - total),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Comparison;

    fn zero_tolerance() -> EliminationParams {
        EliminationParams {
            elimination_threshold: Some(0.0),
            elimination_comparison: Comparison::Equal,
            weekly_limit: None,
            monthly_limit: None,
        }
    }

    #[test]
    fn one_violation_flips_a_clean_week() {
        let clean = MetricSample::Daily(vec![0.0; 7]);
        let result = score(&zero_tolerance(), &clean).expect("elimination scores");
        assert_eq!(result.score, Some(100.0));
        assert_eq!(result.status, "clean");

        let slipped = MetricSample::Daily(vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let result = score(&zero_tolerance(), &slipped).expect("elimination scores");
        assert_eq!(result.score, Some(0.0));
        match result.breakdown {
            ScoreBreakdown::Elimination { violation_days, .. } => {
                assert_eq!(violation_days, vec![2]);
            }
            other => panic!("unexpected breakdown {other:?}"),
        }
    }

    #[test]
    fn weekly_sum_limit_is_binary_at_the_boundary() {
        let config = EliminationParams {
            elimination_threshold: None,
            elimination_comparison: Comparison::Equal,
            weekly_limit: Some(3.0),
            monthly_limit: None,
        };
        let at_limit = MetricSample::Daily(vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(
            score(&config, &at_limit).expect("scores").score,
            Some(100.0),
            "the limit itself is allowed"
        );

        let over = MetricSample::Daily(vec![1.0, 1.0, 1.5, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(score(&config, &over).expect("scores").score, Some(0.0));
    }

    #[test]
    fn monthly_mode_accepts_28_to_31_days_only() {
        let config = EliminationParams {
            elimination_threshold: None,
            elimination_comparison: Comparison::Equal,
            weekly_limit: None,
            monthly_limit: Some(10.0),
        };
        for days in [28usize, 31] {
            let month = MetricSample::Daily(vec![0.0; days]);
            assert_eq!(score(&config, &month).expect("scores").score, Some(100.0));
        }
        let truncated = MetricSample::Daily(vec![0.0; 27]);
        assert!(matches!(
            score(&config, &truncated),
            Err(EngineError::WindowLength { actual: 27, .. })
        ));
    }
}
