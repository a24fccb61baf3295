use chrono::NaiveDate;

/// Failures raised while scoring a single (config, sample) pair.
///
/// Every variant is fatal to that one evaluation only; batch callers are
/// expected to record the failure and move to the next item.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The configuration did not pass validation and must not be scored.
    #[error("configuration rejected: {0}")]
    InvalidConfig(String),

    /// A day-indexed sample had the wrong number of entries for its window.
    #[error("expected {expected} daily values for a {period} window, got {actual}")]
    WindowLength {
        period: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// A composite or sleep sample did not carry a required field.
    #[error("sample is missing field '{0}'")]
    MissingField(String),

    /// The sample shape does not fit the selected algorithm.
    #[error("algorithm '{kind}' cannot score this sample: {detail}")]
    SampleShape { kind: &'static str, detail: String },

    /// A rollover ledger write arrived out of chronological week order.
    #[error(
        "rollover ledger for {subject}/{recommendation} already holds week {have}, \
         cannot apply earlier week {requested}"
    )]
    LedgerOrder {
        subject: String,
        recommendation: String,
        have: NaiveDate,
        requested: NaiveDate,
    },
}
