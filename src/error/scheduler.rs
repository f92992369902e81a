use thiserror::Error;

use super::ConfigError;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler is not running.")]
    Unavailable,
    #[error("Scheduler dropped the reply.")]
    NoReply,
    #[error("Rejected {routine} interval; restarted with {fallback_ms}ms: {source}")]
    IntervalRejected {
        routine: &'static str,
        fallback_ms: u128,
        #[source]
        source: ConfigError,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
