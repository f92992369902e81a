use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::routines::parse_interval;

/// Options accepted from `rtc-loadgen.toml` / `rtc-loadgen.json`. Every key
/// mirrors the CLI flag of the same name.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub client: Option<String>,
    pub port: Option<u16>,
    pub listen: Option<String>,
    pub output_dir: Option<String>,
    pub package: Option<u32>,
    pub keep_queued: Option<bool>,
    pub exclude_head: Option<bool>,
    pub no_autostart: Option<bool>,
    pub intervals: Option<IntervalsConfig>,
    pub timeouts: Option<TimeoutsConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntervalsConfig {
    pub queue: Option<DurationValue>,
    pub get: Option<DurationValue>,
    #[serde(rename = "move")]
    pub relocate: Option<DurationValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutsConfig {
    pub connect: Option<DurationValue>,
    pub write: Option<DurationValue>,
    pub read: Option<DurationValue>,
    pub close_grace: Option<DurationValue>,
    pub shutdown_grace: Option<DurationValue>,
}

/// A duration written either as seconds (`2`, `0.5`) or as text (`"250ms"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(f64),
    Text(String),
}

impl DurationValue {
    /// # Errors
    ///
    /// Returns an error when the value is not a valid positive interval.
    pub fn to_duration(&self) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => parse_interval(&secs.to_string()),
            DurationValue::Text(text) => parse_interval(text),
        }
    }
}
