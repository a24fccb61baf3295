use super::{proportional, shape_error, zone_based, ComponentScore, MetricSample, ScoreBreakdown, ScoreResult};
use crate::config::{Component, ComponentMethod, CompositeParams};
use crate::error::EngineError;

const KIND: &str = "composite_weighted";

/// Weighted composite: each component scores its own field with its declared
/// nested method, and the weighted contributions are summed without a
/// further clamp (the validator keeps weights summing to 1.0).
pub(crate) fn score(
    params: &CompositeParams,
    sample: &MetricSample,
) -> Result<ScoreResult, EngineError> {
    let MetricSample::Fields(fields) = sample else {
        return Err(shape_error(KIND, sample));
    };

    let mut components = Vec::with_capacity(params.components.len());
    let mut total = 0.0;
    for component in &params.components {
        let raw_value = *fields
            .get(&component.field_name)
            .ok_or_else(|| EngineError::MissingField(component.field_name.clone()))?;
        let component_score = nested_score(component, raw_value);
        let weighted = component.weight * component_score;
        total += weighted;
        components.push(ComponentScore {
            name: component.name.clone(),
            field_name: component.field_name.clone(),
            raw_value,
            weight: component.weight,
            score: component_score,
            weighted,
        });
    }

    Ok(ScoreResult::scored(
        total,
        "scored",
        ScoreBreakdown::Composite { components },
    ))
}

fn nested_score(component: &Component, value: f64) -> f64 {
    match &component.method {
        ComponentMethod::Proportional {
            target,
            maximum_cap,
        } => proportional::linear_score(value, *target, *maximum_cap, None),
        ComponentMethod::Zone { zones } => zone_based::lookup(zones, value)
            .map(|zone| zone.score)
            .unwrap_or(0.0),
        ComponentMethod::Binary {
            threshold,
            comparison,
            success_value,
            failure_value,
        } => {
            if comparison.holds(value, *threshold) {
                *success_value
            } else {
                *failure_value
            }
        }
    }
}
