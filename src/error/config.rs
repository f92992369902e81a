use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[error("Interval must not be empty.")]
    IntervalEmpty,
    #[error("Invalid interval '{value}'. Expected seconds (e.g. 2 or 0.5) or a number with ms/s/m/h.")]
    InvalidInterval { value: String },
    #[error("Invalid interval unit '{unit}' in '{value}'.")]
    InvalidIntervalUnit { value: String, unit: String },
    #[error("Interval '{value}' must be > 0.")]
    IntervalNotPositive { value: String },
    #[error("Interval '{value}' is too large.")]
    IntervalOverflow { value: String },
    #[error("Config '{field}': {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: Box<ConfigError>,
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
