use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Controller host must not be empty.")]
    EmptyHost,
    #[error("Controller port must be > 0.")]
    ZeroPort,
    #[error("Invalid controller port '{value}': {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid control listen address '{value}': {source}")]
    InvalidListenAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("Invalid boolean value '{value}'. Use true/false, yes/no, on/off or 1/0.")]
    InvalidBoolean { value: String },
    #[error("Invalid {field}: {source}")]
    InvalidInterval {
        field: &'static str,
        #[source]
        source: super::ConfigError,
    },
    #[error("Unknown routine '{value}'. Use queue, get, or move.")]
    UnknownRoutine { value: String },
    #[error("Invalid wash package '{value}': {source}")]
    InvalidPackage {
        value: String,
        #[source]
        source: std::num::ParseIntError,
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
