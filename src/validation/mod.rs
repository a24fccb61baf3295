//! Configuration validation.
//!
//! Two layers: a generic structural pass over raw JSON documents driven by a
//! declarative per-kind field schema ([`schema`]), then kind-specific
//! business rules over the typed config ([`rules`]), dispatched by an
//! exhaustive match rather than any name-based lookup.

mod rules;
mod schema;

use crate::config::AlgorithmConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of validating one config: errors reject it outright, warnings
/// travel with a passing report so callers can surface them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.valid = false;
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Run the kind-specific business rules over an already-typed config.
pub fn validate(config: &AlgorithmConfig) -> ValidationReport {
    let mut report = ValidationReport::new();
    rules::apply(config, &mut report);
    report
}

/// Validate a raw JSON config document: schema first, then (when the shape
/// holds) the typed business rules.
pub fn validate_document(document: &serde_json::Value) -> ValidationReport {
    let mut report = ValidationReport::new();
    schema::check(document, &mut report);
    if !report.valid {
        return report;
    }

    match serde_json::from_value::<AlgorithmConfig>(document.clone()) {
        Ok(config) => rules::apply(&config, &mut report),
        Err(err) => report.error(format!("config does not parse: {err}")),
    }
    report
}

/// Validate a named batch of documents; one bad config never hides another.
pub fn validate_batch<'a, I>(documents: I) -> BTreeMap<String, ValidationReport>
where
    I: IntoIterator<Item = (&'a str, &'a serde_json::Value)>,
{
    documents
        .into_iter()
        .map(|(name, document)| (name.to_string(), validate_document(document)))
        .collect()
}
