use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use super::parsers::{parse_bool_env, parse_duration_arg, parse_host, parse_port};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Load generator for a car wash tunnel controller - periodic enqueue, list and relocate traffic, per-operation timings in CSV, HTTP control on the side.",
    next_help_heading = "Advanced Options"
)]
pub struct LoadArgs {
    /// Interval between enqueue ticks (seconds, fractional allowed, or ms/s/m/h)
    #[arg(
        long = "queue",
        default_value = "2",
        value_parser = parse_duration_arg,
        help_heading = "Routines"
    )]
    pub queue_interval: Duration,

    /// Interval between queue listings (seconds, fractional allowed, or ms/s/m/h)
    #[arg(
        long = "get",
        default_value = "4",
        value_parser = parse_duration_arg,
        help_heading = "Routines"
    )]
    pub get_interval: Duration,

    /// Interval between relocations (seconds, fractional allowed, or ms/s/m/h)
    #[arg(
        long = "move",
        default_value = "6",
        value_parser = parse_duration_arg,
        help_heading = "Routines"
    )]
    pub move_interval: Duration,

    /// Do not start the routines until /start is called
    #[arg(long = "no-autostart", help_heading = "Routines")]
    pub no_autostart: bool,

    /// Wash package sent with every enqueue and purged on stop
    #[arg(long, default_value_t = 1, help_heading = "Routines")]
    pub package: u32,

    /// Keep the washes queued by the enqueue routine instead of deleting them
    #[arg(long = "keep-queued", help_heading = "Routines")]
    pub keep_queued: bool,

    /// Never move a wash in front of the queue head
    #[arg(long = "exclude-head", help_heading = "Routines")]
    pub exclude_head: bool,

    /// Controller host
    #[arg(
        long = "client",
        default_value = "192.168.1.80",
        value_parser = parse_host,
        help_heading = "Controller"
    )]
    pub host: String,

    /// Controller port
    #[arg(
        long,
        default_value = "20250",
        value_parser = parse_port,
        help_heading = "Controller"
    )]
    pub port: u16,

    /// Timeout for establishing a controller connection
    #[arg(
        long = "connect-timeout",
        default_value = "3s",
        value_parser = parse_duration_arg,
        help_heading = "Controller"
    )]
    pub connect_timeout: Duration,

    /// Timeout for writing a request
    #[arg(long = "write-timeout", default_value = "1500ms", value_parser = parse_duration_arg)]
    pub write_timeout: Duration,

    /// Timeout for reading a response line
    #[arg(long = "read-timeout", default_value = "3s", value_parser = parse_duration_arg)]
    pub read_timeout: Duration,

    /// Wait before the single retry of a failed connection close
    #[arg(long = "close-grace", default_value = "5s", value_parser = parse_duration_arg)]
    pub close_grace: Duration,

    /// How long shutdown waits for routines that are mid-tick
    #[arg(long = "shutdown-grace", default_value = "15s", value_parser = parse_duration_arg)]
    pub shutdown_grace: Duration,

    /// Address of the HTTP control server
    #[arg(long, default_value = "0.0.0.0:3001", help_heading = "Common Options")]
    pub listen: SocketAddr,

    /// Directory that receives the load-test-<timestamp>.csv timing log
    #[arg(long = "output-dir", default_value = ".", help_heading = "Common Options")]
    pub output_dir: PathBuf,

    /// Path to config file (TOML/JSON). Defaults to ./rtc-loadgen.toml or ./rtc-loadgen.json if present.
    #[arg(long, short = 'c', help_heading = "Common Options")]
    pub config: Option<String>,

    /// Enable verbose logging (sets log level to debug unless overridden by RTC_LOADGEN_LOG/RUST_LOG)
    #[arg(long, short = 'v', alias = "debug", help_heading = "Common Options")]
    pub verbose: bool,

    /// Disable color output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,
}
