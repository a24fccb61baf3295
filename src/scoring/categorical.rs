use super::{shape_error, MetricSample, ScoreBreakdown, ScoreResult};
use crate::config::CategoricalFilterParams;
use crate::error::EngineError;

const KIND: &str = "categorical_filter";

/// First-match category scoring with a fixed half-credit default.
///
/// When no filter claims the sample's category, the result is scored against
/// `default_threshold` but always awards exactly half of
/// `default_success_value`, reporting `matched_category = "default"`. The
/// half-credit constant reproduces observed upstream behavior.
pub(crate) fn score(
    params: &CategoricalFilterParams,
    sample: &MetricSample,
) -> Result<ScoreResult, EngineError> {
    let MetricSample::Categorical { category, value } = sample else {
        return Err(shape_error(KIND, sample));
    };

    let matched = params
        .filters
        .iter()
        .find(|filter| filter.category_values.contains(category));

    let result = match matched {
        Some(filter) => {
            let passed = filter.comparison.holds(*value, filter.threshold);
            ScoreResult::scored(
                if passed {
                    filter.success_value
                } else {
                    filter.failure_value
                },
                filter.category.clone(),
                ScoreBreakdown::Categorical {
                    matched_category: filter.category.clone(),
                    value: *value,
                    threshold: filter.threshold,
                    passed,
                },
            )
        }
        None => ScoreResult::scored(
            params.default_success_value * 0.5,
            "default",
            ScoreBreakdown::Categorical {
                matched_category: "default".to_string(),
                value: *value,
                threshold: params.default_threshold,
                passed: *value >= params.default_threshold,
            },
        ),
    };

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryFilter, Comparison};
    use std::collections::BTreeSet;

    fn filter(category: &str, values: &[&str], threshold: f64) -> CategoryFilter {
        CategoryFilter {
            category: category.to_string(),
            category_values: values
                .iter()
                .map(|value| value.to_string())
                .collect::<BTreeSet<_>>(),
            threshold,
            comparison: Comparison::LessOrEqual,
            success_value: 100.0,
            failure_value: 0.0,
            weight: None,
        }
    }

    fn params() -> CategoricalFilterParams {
        CategoricalFilterParams {
            filters: vec![
                filter("sugary_drinks", &["soda", "energy_drink"], 1.0),
                filter("fried_food", &["fries", "fried_chicken"], 2.0),
            ],
            default_threshold: 1.0,
            default_success_value: 100.0,
        }
    }

    #[test]
    fn first_matching_filter_wins() {
        let sample = MetricSample::Categorical {
            category: "soda".to_string(),
            value: 1.0,
        };
        let result = score(&params(), &sample).expect("categorical scores");
        assert_eq!(result.score, Some(100.0));
        assert_eq!(result.status, "sugary_drinks");

        let over = MetricSample::Categorical {
            category: "fries".to_string(),
            value: 3.0,
        };
        let result = score(&params(), &over).expect("categorical scores");
        assert_eq!(result.score, Some(0.0));
    }

    #[test]
    fn unmatched_categories_earn_half_of_default_success() {
        let sample = MetricSample::Categorical {
            category: "sparkling_water".to_string(),
            value: 4.0,
        };
        let result = score(&params(), &sample).expect("categorical scores");
        assert_eq!(result.score, Some(50.0));
        match result.breakdown {
            ScoreBreakdown::Categorical {
                matched_category, ..
            } => assert_eq!(matched_category, "default"),
            other => panic!("unexpected breakdown {other:?}"),
        }
    }

    #[test]
    fn default_credit_scales_with_the_configured_success_value() {
        let config = CategoricalFilterParams {
            default_success_value: 80.0,
            ..params()
        };
        let sample = MetricSample::Categorical {
            category: "unlisted".to_string(),
            value: 0.0,
        };
        let result = score(&config, &sample).expect("categorical scores");
        assert_eq!(result.score, Some(40.0));
    }
}
