//! Generic structural validation of raw config documents.
//!
//! The expected shape of each kind's parameter record is declarative data: a
//! table of field specs checked uniformly against the JSON document. Deeper
//! numeric invariants belong to [`super::rules`].

use super::ValidationReport;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Number,
    Integer,
    Boolean,
    Text,
    List,
    Comparison,
}

impl FieldKind {
    fn describe(self) -> &'static str {
        match self {
            FieldKind::Number => "a number",
            FieldKind::Integer => "an integer",
            FieldKind::Boolean => "a boolean",
            FieldKind::Text => "a string",
            FieldKind::List => "an array",
            FieldKind::Comparison => "one of \"<=\", \">=\", \"==\"",
        }
    }

    fn admits(self, value: &Value) -> bool {
        match self {
            FieldKind::Number => value.is_number(),
            FieldKind::Integer => value.is_u64() || value.is_i64(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Text => value.is_string(),
            FieldKind::List => value.is_array(),
            FieldKind::Comparison => matches!(value.as_str(), Some("<=" | ">=" | "==")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: false,
    }
}

const BINARY_THRESHOLD: &[FieldSpec] = &[
    required("threshold", FieldKind::Number),
    optional("comparison", FieldKind::Comparison),
    optional("success_value", FieldKind::Number),
    optional("failure_value", FieldKind::Number),
    optional("required_days", FieldKind::Integer),
];

const PROPORTIONAL: &[FieldSpec] = &[
    required("target", FieldKind::Number),
    optional("maximum_cap", FieldKind::Number),
    optional("minimum_threshold", FieldKind::Number),
    optional("required_days", FieldKind::Integer),
];

const ZONE_BASED: &[FieldSpec] = &[
    required("zones", FieldKind::List),
    optional("tier_count", FieldKind::Integer),
    optional("required_days", FieldKind::Integer),
    optional("minimum_zone_score", FieldKind::Number),
];

const MINIMUM_FREQUENCY: &[FieldSpec] = &[
    required("daily_threshold", FieldKind::Number),
    optional("daily_comparison", FieldKind::Comparison),
    required("required_days", FieldKind::Integer),
];

const WEEKLY_ELIMINATION: &[FieldSpec] = &[
    optional("elimination_threshold", FieldKind::Number),
    optional("elimination_comparison", FieldKind::Comparison),
    optional("weekly_limit", FieldKind::Number),
    optional("monthly_limit", FieldKind::Number),
];

const CONSTRAINED_WEEKLY_ALLOWANCE: &[FieldSpec] = &[
    required("weekly_allowance", FieldKind::Number),
    required("max_days_per_week", FieldKind::Integer),
    optional("penalty_for_overage", FieldKind::Number),
    optional("rollover_enabled", FieldKind::Boolean),
    optional("max_rollover_percentage", FieldKind::Number),
];

const CATEGORICAL_FILTER: &[FieldSpec] = &[
    required("filters", FieldKind::List),
    required("default_threshold", FieldKind::Number),
    optional("default_success_value", FieldKind::Number),
];

const COMPOSITE_WEIGHTED: &[FieldSpec] = &[required("components", FieldKind::List)];

const SLEEP_COMPOSITE: &[FieldSpec] = &[
    optional("duration_zones", FieldKind::List),
    optional("sleep_consistency_bands", FieldKind::List),
    optional("wake_consistency_bands", FieldKind::List),
];

const BIOMARKER_RANGE: &[FieldSpec] = &[
    required("marker", FieldKind::Text),
    required("tiers", FieldKind::List),
];

pub(crate) fn schema_for(kind: &str) -> Option<&'static [FieldSpec]> {
    match kind {
        "binary_threshold" => Some(BINARY_THRESHOLD),
        "proportional" => Some(PROPORTIONAL),
        "zone_based" => Some(ZONE_BASED),
        "minimum_frequency" => Some(MINIMUM_FREQUENCY),
        "weekly_elimination" => Some(WEEKLY_ELIMINATION),
        "constrained_weekly_allowance" => Some(CONSTRAINED_WEEKLY_ALLOWANCE),
        "categorical_filter" => Some(CATEGORICAL_FILTER),
        "composite_weighted" => Some(COMPOSITE_WEIGHTED),
        "sleep_composite" => Some(SLEEP_COMPOSITE),
        "biomarker_range" => Some(BIOMARKER_RANGE),
        _ => None,
    }
}

/// Check a raw `{kind, parameters}` document against the declarative schema.
pub(crate) fn check(document: &Value, report: &mut ValidationReport) {
    let Some(object) = document.as_object() else {
        report.error("config document must be a JSON object");
        return;
    };

    let Some(kind) = object.get("kind").and_then(Value::as_str) else {
        report.error("config document is missing the 'kind' tag");
        return;
    };
    let Some(fields) = schema_for(kind) else {
        report.error(format!("unknown algorithm kind '{kind}'"));
        return;
    };

    let Some(parameters) = object.get("parameters").and_then(Value::as_object) else {
        report.error(format!("kind '{kind}' is missing its 'parameters' object"));
        return;
    };

    for spec in fields {
        match parameters.get(spec.name) {
            Some(value) => {
                if !spec.kind.admits(value) {
                    report.error(format!(
                        "{kind}: parameter '{}' must be {}",
                        spec.name,
                        spec.kind.describe()
                    ));
                }
            }
            None if spec.required => {
                report.error(format!("{kind}: missing required parameter '{}'", spec.name));
            }
            None => {}
        }
    }

    for name in parameters.keys() {
        if !fields.iter().any(|spec| spec.name == name) {
            report.warn(format!("{kind}: unrecognized parameter '{name}' is ignored"));
        }
    }
}
