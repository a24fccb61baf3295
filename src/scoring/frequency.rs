use super::{shape_error, weekly_window, MetricSample, ScoreBreakdown, ScoreResult};
use crate::config::MinimumFrequencyParams;
use crate::error::EngineError;

const KIND: &str = "minimum_frequency";

/// Weekly minimum-frequency goal: binary 100/0 on the count of passing days.
///
/// The score depends only on how many days pass, never on their order; the
/// breakdown additionally carries the order-sensitive progressive signal.
pub(crate) fn score(
    params: &MinimumFrequencyParams,
    sample: &MetricSample,
) -> Result<ScoreResult, EngineError> {
    let MetricSample::Daily(values) = sample else {
        return Err(shape_error(KIND, sample));
    };
    let values = weekly_window(values)?;

    let daily_passes: Vec<bool> = values
        .iter()
        .map(|value| params.daily_comparison.holds(*value, params.daily_threshold))
        .collect();
    let successful_days = daily_passes.iter().filter(|passed| **passed).count() as u8;
    let met = successful_days >= params.required_days;
    let progressive = progressive_scores(&daily_passes, params.required_days);

    Ok(ScoreResult::scored(
        if met { 100.0 } else { 0.0 },
        if met { "goal_met" } else { "goal_missed" },
        ScoreBreakdown::Frequency {
            daily_passes,
            successful_days,
            required_days: params.required_days,
            progressive,
        },
    ))
}

/// Day-by-day achievability signal for user-facing display.
///
/// Each entry is 100 while `successes_so_far + remaining_days >=
/// required_days` still holds after observing that day, and 0 from the first
/// day the weekly goal becomes mathematically impossible.
pub fn progressive_scores(daily_passes: &[bool], required_days: u8) -> Vec<f64> {
    let total_days = daily_passes.len();
    let mut successes = 0usize;
    daily_passes
        .iter()
        .enumerate()
        .map(|(day, passed)| {
            if *passed {
                successes += 1;
            }
            let remaining = total_days - day - 1;
            if successes + remaining >= required_days as usize {
                100.0
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Comparison;

    fn params(threshold: f64, comparison: Comparison, required: u8) -> MinimumFrequencyParams {
        MinimumFrequencyParams {
            daily_threshold: threshold,
            daily_comparison: comparison,
            required_days: required,
        }
    }

    #[test]
    fn worked_example_from_the_product_sheet() {
        // daily_threshold=1, comparison="<=", required_days=2
        let config = params(1.0, Comparison::LessOrEqual, 2);
        let week = MetricSample::Daily(vec![5.0, 0.0, 10.0, 1.0, 3.0, 2.0, 1.0]);
        let result = score(&config, &week).expect("frequency scores");
        assert_eq!(result.score, Some(100.0));
        match result.breakdown {
            ScoreBreakdown::Frequency {
                successful_days, ..
            } => assert_eq!(successful_days, 3),
            other => panic!("unexpected breakdown {other:?}"),
        }
    }

    #[test]
    fn score_is_invariant_under_day_permutation() {
        let config = params(30.0, Comparison::GreaterOrEqual, 3);
        let base = vec![45.0, 0.0, 31.0, 0.0, 60.0, 0.0, 0.0];
        let rotations: Vec<Vec<f64>> = (0..7)
            .map(|shift| {
                let mut week = base.clone();
                week.rotate_left(shift);
                week
            })
            .collect();
        let scores: Vec<Option<f64>> = rotations
            .into_iter()
            .map(|week| {
                score(&config, &MetricSample::Daily(week))
                    .expect("frequency scores")
                    .score
            })
            .collect();
        assert!(scores.iter().all(|s| *s == Some(100.0)));
    }

    #[test]
    fn progressive_signal_drops_the_moment_the_goal_is_impossible() {
        // Required 6 of 7: failing the first two days already sinks the week.
        let passes = [false, false, true, true, true, true, true];
        let progressive = progressive_scores(&passes, 6);
        assert_eq!(progressive[0], 100.0, "still reachable after one miss");
        assert_eq!(progressive[1], 0.0, "impossible mid-week");
        assert!(
            progressive[2..].iter().all(|s| *s == 0.0),
            "never recovers once impossible"
        );
    }

    #[test]
    fn progressive_signal_stays_up_for_achieved_goals() {
        let passes = [true, true, false, false, false, false, false];
        let progressive = progressive_scores(&passes, 2);
        assert!(progressive.iter().all(|s| *s == 100.0));
    }
}
