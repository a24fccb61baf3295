use super::{shape_error, weekly_window, MetricSample, ScoreBreakdown, ScoreResult};
use crate::config::{Zone, ZoneBasedParams};
use crate::error::EngineError;

const KIND: &str = "zone_based";

/// Find the zone containing `value`; only the final zone closes its upper
/// bound.
pub(crate) fn lookup<'a>(zones: &'a [Zone], value: f64) -> Option<&'a Zone> {
    let last = zones.len().checked_sub(1)?;
    zones
        .iter()
        .enumerate()
        .find(|(index, zone)| zone.contains(value, *index == last))
        .map(|(_, zone)| zone)
}

pub(crate) fn score(
    params: &ZoneBasedParams,
    sample: &MetricSample,
) -> Result<ScoreResult, EngineError> {
    match sample {
        MetricSample::Value(value) => Ok(score_value(params, *value)),
        MetricSample::Daily(values) => score_week(params, values),
        other => Err(shape_error(KIND, other)),
    }
}

fn score_value(params: &ZoneBasedParams, value: f64) -> ScoreResult {
    match lookup(&params.zones, value) {
        Some(zone) => ScoreResult::scored(
            zone.score,
            zone.label.clone(),
            ScoreBreakdown::ZoneMatch {
                value,
                matched_zone: Some(zone.label.clone()),
                zone_score: Some(zone.score),
            },
        ),
        None => ScoreResult::no_match(
            "out_of_range",
            ScoreBreakdown::ZoneMatch {
                value,
                matched_zone: None,
                zone_score: None,
            },
        ),
    }
}

/// Weekly aggregation: frequency counting when configured, otherwise the
/// average of per-day zone scores (unmatched days contribute nothing).
fn score_week(params: &ZoneBasedParams, values: &[f64]) -> Result<ScoreResult, EngineError> {
    let values = weekly_window(values)?;
    let daily_scores: Vec<Option<f64>> = values
        .iter()
        .map(|value| lookup(&params.zones, *value).map(|zone| zone.score))
        .collect();

    if let (Some(required_days), Some(minimum_zone_score)) =
        (params.required_days, params.minimum_zone_score)
    {
        let qualifying_days = daily_scores
            .iter()
            .filter(|day| day.map(|score| score >= minimum_zone_score).unwrap_or(false))
            .count() as u8;
        let met = qualifying_days >= required_days;
        return Ok(ScoreResult::scored(
            if met { 100.0 } else { 0.0 },
            if met { "met" } else { "not_met" },
            ScoreBreakdown::ZoneWeekly {
                daily_scores,
                qualifying_days: Some(qualifying_days),
                required_days: Some(required_days),
            },
        ));
    }

    let mean = daily_scores
        .iter()
        .map(|day| day.unwrap_or(0.0))
        .sum::<f64>()
        / daily_scores.len() as f64;
    Ok(ScoreResult::scored(
        mean,
        "scored",
        ScoreBreakdown::ZoneWeekly {
            daily_scores,
            qualifying_days: None,
            required_days: None,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_tier() -> Vec<Zone> {
        vec![
            Zone {
                min: 0.0,
                max: 4.0,
                score: 25.0,
                label: "Low".to_string(),
            },
            Zone {
                min: 4.0,
                max: 8.0,
                score: 100.0,
                label: "Target".to_string(),
            },
            Zone {
                min: 8.0,
                max: 14.0,
                score: 50.0,
                label: "High".to_string(),
            },
        ]
    }

    fn params() -> ZoneBasedParams {
        ZoneBasedParams {
            zones: three_tier(),
            tier_count: Some(3),
            required_days: None,
            minimum_zone_score: None,
        }
    }

    #[test]
    fn shared_boundary_resolves_to_the_upper_zone() {
        let zones = three_tier();
        assert_eq!(lookup(&zones, 4.0).map(|zone| zone.score), Some(100.0));
        assert_eq!(lookup(&zones, 8.0).map(|zone| zone.score), Some(50.0));
        assert_eq!(
            lookup(&zones, 14.0).map(|zone| zone.score),
            Some(50.0),
            "final zone is closed at its upper bound"
        );
        assert!(lookup(&zones, 14.5).is_none());
    }

    #[test]
    fn out_of_range_values_yield_no_match_not_zero() {
        let result = score(&params(), &MetricSample::Value(20.0)).expect("zone lookup runs");
        assert_eq!(result.score, None);
        assert_eq!(result.status, "out_of_range");
    }

    #[test]
    fn weekly_average_spans_all_seven_days() {
        let week = MetricSample::Daily(vec![5.0, 5.0, 1.0, 9.0, 5.0, 5.0, 5.0]);
        let result = score(&params(), &week).expect("weekly zone scores");
        // 100*5 + 25 + 50 = 575
        assert_eq!(result.score, Some(575.0 / 7.0));
    }

    #[test]
    fn weekly_frequency_form_counts_qualifying_zone_days() {
        let config = ZoneBasedParams {
            required_days: Some(4),
            minimum_zone_score: Some(100.0),
            ..params()
        };
        let week = MetricSample::Daily(vec![5.0, 5.0, 1.0, 9.0, 5.0, 5.0, 5.0]);
        let result = score(&config, &week).expect("frequency form scores");
        assert_eq!(result.score, Some(100.0), "five days reached Target");

        let config = ZoneBasedParams {
            required_days: Some(6),
            ..config
        };
        let result = score(&config, &week).expect("frequency form scores");
        assert_eq!(result.score, Some(0.0));
    }
}
