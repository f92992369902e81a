use std::time::Duration;

use crate::error::{AppError, AppResult, ValidationError};
use crate::routines::parse_interval;

pub(crate) fn parse_bool_env(s: &str) -> AppResult<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        _ => Err(AppError::validation(ValidationError::InvalidBoolean {
            value: s.to_owned(),
        })),
    }
}

/// Routine intervals and timeouts share one duration grammar.
pub(crate) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    parse_interval(s).map_err(|err| {
        AppError::validation(ValidationError::InvalidInterval {
            field: "duration",
            source: err,
        })
    })
}

pub(crate) fn parse_host(s: &str) -> Result<String, ValidationError> {
    let host = s.trim();
    if host.is_empty() {
        return Err(ValidationError::EmptyHost);
    }
    Ok(host.to_owned())
}

pub(crate) fn parse_port(s: &str) -> Result<u16, ValidationError> {
    match s.trim().parse::<u16>() {
        Ok(0) => Err(ValidationError::ZeroPort),
        Ok(port) => Ok(port),
        Err(err) => Err(ValidationError::InvalidPort {
            value: s.to_owned(),
            source: err,
        }),
    }
}
