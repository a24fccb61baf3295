//! Kind-specific business rules, one checker per algorithm kind.
//!
//! Dispatch is an exhaustive match over the closed config enum: adding a kind
//! without a checker fails to compile.

use super::ValidationReport;
use crate::config::{
    AlgorithmConfig, AllowanceParams, BinaryThresholdParams, BiomarkerRangeParams,
    CategoricalFilterParams, ComponentMethod, CompositeParams, EliminationParams,
    MinimumFrequencyParams, ProportionalParams, RangeBound, SleepCompositeParams, TierScore,
    VarianceBand, Zone, ZoneBasedParams,
};
use std::collections::BTreeSet;

const WEIGHT_SUM_TOLERANCE: f64 = 0.001;
const ZONE_GAP_TOLERANCE: f64 = 1e-9;

pub(crate) fn apply(config: &AlgorithmConfig, report: &mut ValidationReport) {
    match config {
        AlgorithmConfig::BinaryThreshold(params) => check_binary_threshold(params, report),
        AlgorithmConfig::Proportional(params) => check_proportional(params, report),
        AlgorithmConfig::ZoneBased(params) => check_zone_based(params, report),
        AlgorithmConfig::MinimumFrequency(params) => check_minimum_frequency(params, report),
        AlgorithmConfig::WeeklyElimination(params) => check_elimination(params, report),
        AlgorithmConfig::ConstrainedWeeklyAllowance(params) => check_allowance(params, report),
        AlgorithmConfig::CategoricalFilter(params) => check_categorical(params, report),
        AlgorithmConfig::CompositeWeighted(params) => check_composite(params, report),
        AlgorithmConfig::SleepComposite(params) => check_sleep(params, report),
        AlgorithmConfig::BiomarkerRange(params) => check_biomarker(params, report),
    }
}

fn check_required_days(required_days: Option<u8>, report: &mut ValidationReport) {
    if let Some(days) = required_days {
        if !(1..=7).contains(&days) {
            report.error(format!("required_days must be within 1-7, got {days}"));
        }
    }
}

fn check_binary_threshold(params: &BinaryThresholdParams, report: &mut ValidationReport) {
    check_required_days(params.required_days, report);
    if params.success_value == params.failure_value {
        report.warn("success_value equals failure_value; the threshold has no effect");
    }
}

fn check_proportional(params: &ProportionalParams, report: &mut ValidationReport) {
    if params.target <= 0.0 {
        report.error(format!("target must be positive, got {}", params.target));
    }
    if params.maximum_cap <= 0.0 {
        report.error(format!(
            "maximum_cap must be positive, got {}",
            params.maximum_cap
        ));
    } else if params.maximum_cap < 100.0 {
        report.warn(format!(
            "maximum_cap {} keeps full credit out of reach",
            params.maximum_cap
        ));
    }
    if let Some(floor) = params.minimum_threshold {
        if floor < 0.0 {
            report.error(format!("minimum_threshold must not be negative, got {floor}"));
        }
        if params.target > 0.0 && floor > params.target {
            report.warn(format!(
                "minimum_threshold {floor} exceeds the target {}; no day can qualify below full credit",
                params.target
            ));
        }
    }
    check_required_days(params.required_days, report);
    if params.required_days.is_some() && params.minimum_threshold.is_none() {
        report.warn("required_days without minimum_threshold: any nonzero day qualifies");
    }
}

/// Zones must be sorted ascending, internally ordered, and contiguous.
fn check_zone_set(zones: &[Zone], allowed_counts: &[usize], report: &mut ValidationReport) {
    if !allowed_counts.contains(&zones.len()) {
        report.error(format!(
            "zone set must have {} zones, got {}",
            allowed_counts
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(" or "),
            zones.len()
        ));
    }
    for zone in zones {
        if zone.min >= zone.max {
            report.error(format!(
                "zone '{}' has min {} >= max {}",
                zone.label, zone.min, zone.max
            ));
        }
    }
    for pair in zones.windows(2) {
        let gap = pair[1].min - pair[0].max;
        if gap > ZONE_GAP_TOLERANCE {
            report.error(format!(
                "gap between zone '{}' (max {}) and zone '{}' (min {})",
                pair[0].label, pair[0].max, pair[1].label, pair[1].min
            ));
        } else if gap < -ZONE_GAP_TOLERANCE {
            report.error(format!(
                "overlap between zone '{}' (max {}) and zone '{}' (min {})",
                pair[0].label, pair[0].max, pair[1].label, pair[1].min
            ));
        }
    }
}

fn check_zone_based(params: &ZoneBasedParams, report: &mut ValidationReport) {
    check_zone_set(&params.zones, &[3, 5], report);
    if let Some(tier_count) = params.tier_count {
        if tier_count as usize != params.zones.len() {
            report.error(format!(
                "tier_count {} does not match the {} configured zones",
                tier_count,
                params.zones.len()
            ));
        }
    }
    check_required_days(params.required_days, report);
    match (params.required_days, params.minimum_zone_score) {
        (Some(_), None) => {
            report.error("required_days needs minimum_zone_score to define a qualifying day")
        }
        (None, Some(_)) => {
            report.error("minimum_zone_score needs required_days to aggregate against")
        }
        (Some(_), Some(minimum)) => {
            if !params.zones.iter().any(|zone| zone.score >= minimum) {
                report.warn(format!(
                    "no zone reaches minimum_zone_score {minimum}; the weekly goal is unreachable"
                ));
            }
        }
        (None, None) => {}
    }
}

fn check_minimum_frequency(params: &MinimumFrequencyParams, report: &mut ValidationReport) {
    if !(1..=7).contains(&params.required_days) {
        report.error(format!(
            "required_days must be within 1-7, got {}",
            params.required_days
        ));
    }
}

fn check_elimination(params: &EliminationParams, report: &mut ValidationReport) {
    let modes = [
        params.elimination_threshold.is_some(),
        params.weekly_limit.is_some(),
        params.monthly_limit.is_some(),
    ]
    .iter()
    .filter(|set| **set)
    .count();
    if modes != 1 {
        report.error(
            "exactly one of elimination_threshold, weekly_limit, monthly_limit must be set",
        );
    }
    for (name, limit) in [
        ("weekly_limit", params.weekly_limit),
        ("monthly_limit", params.monthly_limit),
    ] {
        if let Some(limit) = limit {
            if limit < 0.0 {
                report.error(format!("{name} must not be negative, got {limit}"));
            }
        }
    }
}

fn check_allowance(params: &AllowanceParams, report: &mut ValidationReport) {
    if params.weekly_allowance <= 0.0 {
        report.error(format!(
            "weekly_allowance must be positive, got {}",
            params.weekly_allowance
        ));
    }
    if !(1..=7).contains(&params.max_days_per_week) {
        report.error(format!(
            "max_days_per_week must be within 1-7, got {}",
            params.max_days_per_week
        ));
    }
    if !(0.0..=100.0).contains(&params.penalty_for_overage) {
        report.error(format!(
            "penalty_for_overage must be within 0-100, got {}",
            params.penalty_for_overage
        ));
    }
    if !(0.0..=100.0).contains(&params.max_rollover_percentage) {
        report.error(format!(
            "max_rollover_percentage must be within 0-100, got {}",
            params.max_rollover_percentage
        ));
    }
    if params.rollover_enabled && params.max_rollover_percentage == 0.0 {
        report.warn("rollover_enabled with max_rollover_percentage 0 carries nothing over");
    }
}

fn check_categorical(params: &CategoricalFilterParams, report: &mut ValidationReport) {
    if params.filters.is_empty() {
        report.error("categorical_filter needs at least one filter");
    }
    let mut seen_values: BTreeSet<&str> = BTreeSet::new();
    for filter in &params.filters {
        if filter.category.trim().is_empty() {
            report.error("filter category name must not be empty");
        }
        if filter.category_values.is_empty() {
            report.error(format!(
                "filter '{}' has an empty category_values set",
                filter.category
            ));
        }
        if let Some(weight) = filter.weight {
            if weight <= 0.0 {
                report.error(format!(
                    "filter '{}' has non-positive weight {weight}",
                    filter.category
                ));
            }
        }
        for value in &filter.category_values {
            if !seen_values.insert(value) {
                report.warn(format!(
                    "category value '{value}' appears in more than one filter; only the first matches"
                ));
            }
        }
    }
    if params.default_success_value <= 0.0 {
        report.warn("default_success_value is not positive; unmatched categories earn nothing");
    }
}

fn check_composite(params: &CompositeParams, report: &mut ValidationReport) {
    if params.components.is_empty() {
        report.error("composite_weighted needs at least one component");
        return;
    }

    let weight_sum: f64 = params.components.iter().map(|c| c.weight).sum();
    if (weight_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        report.error(format!(
            "component weights must sum to 1.0 (±{WEIGHT_SUM_TOLERANCE}), got {weight_sum}"
        ));
    }

    let mut fields: BTreeSet<&str> = BTreeSet::new();
    for component in &params.components {
        if component.weight < 0.0 {
            report.error(format!(
                "component '{}' has negative weight {}",
                component.name, component.weight
            ));
        } else if component.weight == 0.0 {
            report.warn(format!(
                "component '{}' has zero weight and never contributes",
                component.name
            ));
        }
        if !fields.insert(component.field_name.as_str()) {
            report.error(format!(
                "field_name '{}' is used by more than one component",
                component.field_name
            ));
        }
        match &component.method {
            ComponentMethod::Proportional {
                target,
                maximum_cap,
            } => {
                if *target <= 0.0 {
                    report.error(format!(
                        "component '{}' has non-positive target {target}",
                        component.name
                    ));
                }
                if *maximum_cap <= 0.0 {
                    report.error(format!(
                        "component '{}' has non-positive maximum_cap {maximum_cap}",
                        component.name
                    ));
                }
            }
            ComponentMethod::Zone { zones } => check_zone_set(zones, &[3, 5], report),
            ComponentMethod::Binary { .. } => {}
        }
    }
}

fn check_variance_bands(name: &str, bands: &[VarianceBand], report: &mut ValidationReport) {
    if bands.is_empty() {
        report.error(format!("{name} must not be empty"));
        return;
    }
    for pair in bands.windows(2) {
        if pair[0].max_variance >= pair[1].max_variance {
            report.error(format!(
                "{name} thresholds must be strictly ascending ({} then {})",
                pair[0].max_variance, pair[1].max_variance
            ));
        }
    }
}

fn check_sleep(params: &SleepCompositeParams, report: &mut ValidationReport) {
    check_zone_set(&params.duration_zones, &[5], report);
    check_variance_bands("sleep_consistency_bands", &params.sleep_consistency_bands, report);
    check_variance_bands("wake_consistency_bands", &params.wake_consistency_bands, report);
}

fn check_biomarker(params: &BiomarkerRangeParams, report: &mut ValidationReport) {
    if params.marker.trim().is_empty() {
        report.error("marker name must not be empty");
    }
    if params.tiers.is_empty() {
        report.error(format!("marker '{}' has no tiers", params.marker));
    }
    for tier in &params.tiers {
        if let RangeBound::Bounded { low, high } = tier.range {
            if low > high {
                report.error(format!(
                    "tier '{}' of marker '{}' has low above high",
                    tier.range, params.marker
                ));
            }
            if low == high && matches!(tier.score, TierScore::Linear { .. }) {
                report.error(format!(
                    "tier '{}' of marker '{}' cannot interpolate over a zero-width range",
                    tier.range, params.marker
                ));
            }
        }
    }
}
