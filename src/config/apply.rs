use std::path::PathBuf;
use std::time::Duration;

use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::LoadArgs;
use crate::error::{AppError, AppResult, ConfigError, ValidationError};

use super::types::{ConfigFile, DurationValue};

/// Applies configuration values to CLI arguments. A flag given on the
/// command line always wins over the file.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_config(
    args: &mut LoadArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "host")
        && let Some(host) = config.client.as_deref()
    {
        let host = host.trim();
        if host.is_empty() {
            return Err(AppError::validation(ValidationError::EmptyHost));
        }
        args.host = host.to_owned();
    }

    if !is_cli(matches, "port")
        && let Some(port) = config.port
    {
        if port == 0 {
            return Err(AppError::validation(ValidationError::ZeroPort));
        }
        args.port = port;
    }

    if !is_cli(matches, "listen")
        && let Some(listen) = config.listen.as_deref()
    {
        args.listen = listen.parse().map_err(|err| {
            AppError::validation(ValidationError::InvalidListenAddr {
                value: listen.to_owned(),
                source: err,
            })
        })?;
    }

    if !is_cli(matches, "output_dir")
        && let Some(dir) = config.output_dir.as_deref()
    {
        args.output_dir = PathBuf::from(dir);
    }

    if !is_cli(matches, "package")
        && let Some(package) = config.package
    {
        args.package = package;
    }

    apply_flag(matches, "keep_queued", config.keep_queued, &mut args.keep_queued);
    apply_flag(
        matches,
        "exclude_head",
        config.exclude_head,
        &mut args.exclude_head,
    );
    apply_flag(
        matches,
        "no_autostart",
        config.no_autostart,
        &mut args.no_autostart,
    );

    if let Some(intervals) = config.intervals.as_ref() {
        apply_duration(
            matches,
            "queue_interval",
            "intervals.queue",
            intervals.queue.as_ref(),
            &mut args.queue_interval,
        )?;
        apply_duration(
            matches,
            "get_interval",
            "intervals.get",
            intervals.get.as_ref(),
            &mut args.get_interval,
        )?;
        apply_duration(
            matches,
            "move_interval",
            "intervals.move",
            intervals.relocate.as_ref(),
            &mut args.move_interval,
        )?;
    }

    if let Some(timeouts) = config.timeouts.as_ref() {
        apply_duration(
            matches,
            "connect_timeout",
            "timeouts.connect",
            timeouts.connect.as_ref(),
            &mut args.connect_timeout,
        )?;
        apply_duration(
            matches,
            "write_timeout",
            "timeouts.write",
            timeouts.write.as_ref(),
            &mut args.write_timeout,
        )?;
        apply_duration(
            matches,
            "read_timeout",
            "timeouts.read",
            timeouts.read.as_ref(),
            &mut args.read_timeout,
        )?;
        apply_duration(
            matches,
            "close_grace",
            "timeouts.close_grace",
            timeouts.close_grace.as_ref(),
            &mut args.close_grace,
        )?;
        apply_duration(
            matches,
            "shutdown_grace",
            "timeouts.shutdown_grace",
            timeouts.shutdown_grace.as_ref(),
            &mut args.shutdown_grace,
        )?;
    }

    Ok(())
}

fn apply_flag(matches: &ArgMatches, name: &str, value: Option<bool>, target: &mut bool) {
    if !is_cli(matches, name)
        && let Some(value) = value
    {
        *target = value;
    }
}

fn apply_duration(
    matches: &ArgMatches,
    name: &str,
    field: &'static str,
    value: Option<&DurationValue>,
    target: &mut Duration,
) -> AppResult<()> {
    if is_cli(matches, name) {
        return Ok(());
    }
    if let Some(value) = value {
        *target = value.to_duration().map_err(|err| {
            AppError::config(ConfigError::InvalidField {
                field,
                source: Box::new(err),
            })
        })?;
    }
    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}
