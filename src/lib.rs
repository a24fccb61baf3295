//! Configuration-driven adherence and health scoring.
//!
//! Given a declarative [`config::AlgorithmConfig`] and a
//! [`scoring::MetricSample`], the engine computes a normalized 0–100
//! [`scoring::ScoreResult`] with an auditable breakdown. All scoring is pure
//! and deterministic; the only mutable state is the weekly-allowance
//! [`scoring::RolloverLedger`].

pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;
pub mod validation;
