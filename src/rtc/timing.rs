use std::fmt::Display;

use chrono::{DateTime, Local, SecondsFormat};

use super::types::Operation;

/// Number of columns in every timing row.
pub const RECORD_FIELDS: usize = 7;

/// Header row of the timing log.
pub const RECORD_HEADER: [&str; RECORD_FIELDS] = [
    "Command",
    "Connected",
    "CommandInitiated",
    "CommandRetrieved",
    "Closed",
    "Error",
    "ErrorMessage",
];

/// Outcome of one controller operation, filled stage by stage.
///
/// A stage that was never reached keeps an empty timestamp, so the record
/// always renders to exactly [`RECORD_FIELDS`] columns whichever stage
/// failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingRecord {
    operation: Operation,
    connected: Option<DateTime<Local>>,
    command_initiated: Option<DateTime<Local>>,
    command_retrieved: Option<DateTime<Local>>,
    closed: Option<DateTime<Local>>,
    error: Option<String>,
}

impl TimingRecord {
    #[must_use]
    pub const fn new(operation: Operation) -> Self {
        Self {
            operation,
            connected: None,
            command_initiated: None,
            command_retrieved: None,
            closed: None,
            error: None,
        }
    }

    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    pub fn mark_connected(&mut self) {
        self.connected = Some(Local::now());
    }

    pub fn mark_command_initiated(&mut self) {
        self.command_initiated = Some(Local::now());
    }

    pub fn mark_command_retrieved(&mut self) {
        self.command_retrieved = Some(Local::now());
    }

    pub fn mark_closed(&mut self) {
        self.closed = Some(Local::now());
    }

    /// Flags the record as failed. Timestamps already taken are kept.
    pub fn fail(&mut self, error: &impl Display) {
        self.error = Some(error.to_string());
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn connected(&self) -> Option<&DateTime<Local>> {
        self.connected.as_ref()
    }

    #[must_use]
    pub const fn command_initiated(&self) -> Option<&DateTime<Local>> {
        self.command_initiated.as_ref()
    }

    #[must_use]
    pub const fn command_retrieved(&self) -> Option<&DateTime<Local>> {
        self.command_retrieved.as_ref()
    }

    #[must_use]
    pub const fn closed(&self) -> Option<&DateTime<Local>> {
        self.closed.as_ref()
    }

    #[must_use]
    pub fn to_fields(&self) -> [String; RECORD_FIELDS] {
        [
            self.operation.as_str().to_owned(),
            format_stamp(self.connected.as_ref()),
            format_stamp(self.command_initiated.as_ref()),
            format_stamp(self.command_retrieved.as_ref()),
            format_stamp(self.closed.as_ref()),
            if self.is_error() { "true" } else { "false" }.to_owned(),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

fn format_stamp(stamp: Option<&DateTime<Local>>) -> String {
    stamp
        .map(|value| value.to_rfc3339_opts(SecondsFormat::Micros, false))
        .unwrap_or_default()
}
