use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};
use tempfile::tempdir;

use super::{apply_config, load_config_file};
use crate::args::LoadArgs;
use crate::error::{AppError, AppResult};

fn parse_with_matches(argv: &[&str]) -> AppResult<(LoadArgs, clap::ArgMatches)> {
    let matches = LoadArgs::command().try_get_matches_from(argv)?;
    let args = LoadArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}

#[test]
fn parse_toml_config_with_intervals() -> AppResult<()> {
    let dir = tempdir()?;
    let path = dir.path().join("rtc-loadgen.toml");
    let content = r#"
client = "10.1.2.3"
port = 20251
package = 4
keep_queued = true

[intervals]
queue = 1
get = "750ms"
move = 0.25

[timeouts]
read = "5s"
"#;
    std::fs::write(&path, content)?;

    let config = load_config_file(&path)?;
    if config.client.as_deref() != Some("10.1.2.3") || config.port != Some(20251) {
        return Err(AppError::config("Unexpected controller target"));
    }
    let Some(intervals) = config.intervals.as_ref() else {
        return Err(AppError::config("Expected intervals"));
    };
    let queue = intervals.queue.as_ref().map(|value| value.to_duration());
    let get = intervals.get.as_ref().map(|value| value.to_duration());
    let relocate = intervals.relocate.as_ref().map(|value| value.to_duration());
    match (queue, get, relocate) {
        (Some(Ok(queue)), Some(Ok(get)), Some(Ok(relocate)))
            if queue == Duration::from_secs(1)
                && get == Duration::from_millis(750)
                && relocate == Duration::from_millis(250) => {}
        other => {
            return Err(AppError::config(format!("Unexpected intervals: {:?}", other)));
        }
    }
    Ok(())
}

#[test]
fn parse_json_config() -> AppResult<()> {
    let dir = tempdir()?;
    let path = dir.path().join("rtc-loadgen.json");
    std::fs::write(
        &path,
        r#"{"listen": "127.0.0.1:4000", "exclude_head": true, "timeouts": {"close_grace": "2s"}}"#,
    )?;

    let config = load_config_file(&path)?;
    if config.listen.as_deref() != Some("127.0.0.1:4000") || config.exclude_head != Some(true) {
        return Err(AppError::config("Unexpected JSON values"));
    }
    Ok(())
}

#[test]
fn unknown_keys_and_extensions_are_rejected() -> AppResult<()> {
    let dir = tempdir()?;
    let toml_path = dir.path().join("rtc-loadgen.toml");
    std::fs::write(&toml_path, "hostname = \"x\"\n")?;
    if load_config_file(&toml_path).is_ok() {
        return Err(AppError::config("Unknown key should be rejected"));
    }

    let yaml_path = dir.path().join("rtc-loadgen.yaml");
    std::fs::write(&yaml_path, "client: x\n")?;
    if load_config_file(&yaml_path).is_ok() {
        return Err(AppError::config("Unsupported extension should be rejected"));
    }
    Ok(())
}

#[test]
fn cli_flags_win_over_config_values() -> AppResult<()> {
    let dir = tempdir()?;
    let path = dir.path().join("rtc-loadgen.toml");
    std::fs::write(
        &path,
        r#"
client = "10.9.9.9"
port = 20999
no_autostart = true

[intervals]
queue = "10s"
get = "20s"
"#,
    )?;
    let config = load_config_file(&path)?;
    let (mut args, matches) =
        parse_with_matches(&["rtc-loadgen", "--client", "127.0.0.1", "--queue", "3"])?;

    apply_config(&mut args, &matches, &config)?;

    let checks = [
        (args.host == "127.0.0.1", "CLI host should win"),
        (args.port == 20999, "Config port should apply"),
        (args.no_autostart, "Config no_autostart should apply"),
        (
            args.queue_interval == Duration::from_secs(3),
            "CLI queue interval should win",
        ),
        (
            args.get_interval == Duration::from_secs(20),
            "Config get interval should apply",
        ),
        (
            args.move_interval == Duration::from_secs(6),
            "Default move interval expected",
        ),
    ];
    for (ok, message) in checks {
        if !ok {
            return Err(AppError::config(message));
        }
    }
    Ok(())
}

#[test]
fn invalid_config_interval_names_the_field() -> AppResult<()> {
    let dir = tempdir()?;
    let path = dir.path().join("rtc-loadgen.toml");
    std::fs::write(&path, "[intervals]\nmove = \"fast\"\n")?;
    let config = load_config_file(&path)?;
    let (mut args, matches) = parse_with_matches(&["rtc-loadgen"])?;

    match apply_config(&mut args, &matches, &config) {
        Err(err) if err.to_string().contains("intervals.move") => Ok(()),
        other => Err(AppError::config(format!("Unexpected result: {:?}", other))),
    }
}
