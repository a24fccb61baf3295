use super::{shape_error, weekly_window, MetricSample, ScoreBreakdown, ScoreResult};
use crate::config::AllowanceParams;
use crate::error::EngineError;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

const KIND: &str = "constrained_weekly_allowance";

/// Identifies one tracked allowance stream for rollover purposes.
#[derive(Debug, Clone, Copy)]
pub struct AllowanceContext<'a> {
    pub subject: &'a str,
    pub recommendation: &'a str,
    /// First day of the week being scored.
    pub week_start: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct LedgerKey {
    subject: String,
    recommendation: String,
}

#[derive(Debug, Clone, Copy)]
struct LedgerEntry {
    week_start: NaiveDate,
    /// Rollover that was applied when this week was scored. Kept so that
    /// re-scoring the same week replays the identical carryover.
    applied: f64,
    /// Unused allowance banked by this week for the following one.
    banked: f64,
}

/// Per (subject, recommendation) record of unused allowance carried into the
/// following week.
///
/// This is the engine's only mutable cross-call state. Writes for one key
/// must arrive in non-decreasing week order; re-recording the same week
/// overwrites it, and an earlier week is rejected. Different keys are fully
/// independent.
#[derive(Debug, Default, Clone)]
pub struct RolloverLedger {
    entries: BTreeMap<LedgerKey, LedgerEntry>,
}

impl RolloverLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Carryover available to the week starting at `week_start`: the amount
    /// banked by the immediately preceding week, or the amount already
    /// applied if `week_start` is the recorded week itself (an equal-week
    /// re-run). A gap in evaluation forfeits the carryover.
    pub fn carryover(&self, subject: &str, recommendation: &str, week_start: NaiveDate) -> f64 {
        let key = LedgerKey {
            subject: subject.to_string(),
            recommendation: recommendation.to_string(),
        };
        match self.entries.get(&key) {
            Some(entry) if entry.week_start + Duration::days(7) == week_start => entry.banked,
            Some(entry) if entry.week_start == week_start => entry.applied,
            _ => 0.0,
        }
    }

    fn record(
        &mut self,
        context: &AllowanceContext<'_>,
        applied: f64,
        banked: f64,
    ) -> Result<(), EngineError> {
        let key = LedgerKey {
            subject: context.subject.to_string(),
            recommendation: context.recommendation.to_string(),
        };
        if let Some(existing) = self.entries.get(&key) {
            if existing.week_start > context.week_start {
                return Err(EngineError::LedgerOrder {
                    subject: key.subject,
                    recommendation: key.recommendation,
                    have: existing.week_start,
                    requested: context.week_start,
                });
            }
        }
        self.entries.insert(
            key,
            LedgerEntry {
                week_start: context.week_start,
                applied,
                banked,
            },
        );
        Ok(())
    }
}

/// Dual-constraint allowance: the weekly total and the count of active days
/// must both stay within their caps for full credit.
pub(crate) fn score(
    params: &AllowanceParams,
    sample: &MetricSample,
    rollover: Option<(&AllowanceContext<'_>, &mut RolloverLedger)>,
) -> Result<ScoreResult, EngineError> {
    let MetricSample::Daily(values) = sample else {
        return Err(shape_error(KIND, sample));
    };
    let values = weekly_window(values)?;

    let total_used: f64 = values.iter().sum();
    let active_days = values.iter().filter(|value| **value > 0.0).count() as u8;

    let rollover_applied = match &rollover {
        Some((context, ledger)) if params.rollover_enabled => {
            ledger.carryover(context.subject, context.recommendation, context.week_start)
        }
        _ => 0.0,
    };
    let effective_allowance = params.weekly_allowance + rollover_applied;

    let within_amount = total_used <= effective_allowance;
    let within_days = active_days <= params.max_days_per_week;
    let passed = within_amount && within_days;
    let score = if passed {
        100.0
    } else {
        (100.0 - params.penalty_for_overage).max(0.0)
    };

    if let Some((context, ledger)) = rollover {
        if params.rollover_enabled {
            // Carryover banks unused *base* allowance, capped as a share of it.
            let cap = params.weekly_allowance * params.max_rollover_percentage / 100.0;
            let unused = (params.weekly_allowance - total_used).max(0.0).min(cap);
            ledger.record(context, rollover_applied, unused)?;
        }
    }

    Ok(ScoreResult::scored(
        score,
        if passed {
            "within_allowance"
        } else {
            "over_allowance"
        },
        ScoreBreakdown::Allowance {
            total_used,
            active_days,
            base_allowance: params.weekly_allowance,
            rollover_applied,
            effective_allowance,
            within_amount,
            within_days,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> AllowanceParams {
        AllowanceParams {
            weekly_allowance: 3.0,
            max_days_per_week: 2,
            penalty_for_overage: 100.0,
            rollover_enabled: false,
            max_rollover_percentage: 0.0,
        }
    }

    fn week(values: [f64; 7]) -> MetricSample {
        MetricSample::Daily(values.to_vec())
    }

    #[test]
    fn dual_constraint_examples() {
        let cases = [
            ([1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0], 0.0), // 3 days used
            ([2.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0], 100.0),
            ([1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0], 100.0),
            ([1.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0], 100.0),
            ([3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 100.0),
            ([4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 0.0), // amount over
        ];
        for (values, expected) in cases {
            let result = score(&params(), &week(values), None).expect("allowance scores");
            assert_eq!(
                result.score,
                Some(expected),
                "values {values:?} should score {expected}"
            );
        }
    }

    #[test]
    fn partial_penalty_reduces_instead_of_zeroing() {
        let config = AllowanceParams {
            penalty_for_overage: 40.0,
            ..params()
        };
        let result = score(&config, &week([4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]), None)
            .expect("allowance scores");
        assert_eq!(result.score, Some(60.0));
    }

    #[test]
    fn breakdown_separates_the_two_constraints() {
        let result = score(&params(), &week([1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]), None)
            .expect("allowance scores");
        match result.breakdown {
            ScoreBreakdown::Allowance {
                within_amount,
                within_days,
                active_days,
                total_used,
                ..
            } => {
                assert!(within_amount, "3.0 is inside the 3.0 allowance");
                assert!(!within_days, "3 active days exceeds the 2-day cap");
                assert_eq!(active_days, 3);
                assert_eq!(total_used, 3.0);
            }
            other => panic!("unexpected breakdown {other:?}"),
        }
    }
}
