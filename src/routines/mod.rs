//! The three load routines and the periodic loop that drives them.
mod instance;
mod interval;
mod ticks;

#[cfg(test)]
pub(crate) mod test_support;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ValidationError;
use crate::rtc::RtcApi;
use crate::sink::RecordSender;

pub(crate) use instance::RoutineInstance;
pub use interval::{MAX_INTERVAL, parse_interval};
pub use ticks::pick_target;
pub(crate) use ticks::run_tick;

/// Identifies one load routine. The names double as control route segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineKind {
    /// Queues a wash, optionally deleting it right away.
    Enqueue,
    /// Lists the controller queue.
    List,
    /// Queues a wash, moves it to a random position and deletes it.
    Relocate,
}

impl RoutineKind {
    pub const ALL: [RoutineKind; 3] = [
        RoutineKind::Enqueue,
        RoutineKind::List,
        RoutineKind::Relocate,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            RoutineKind::Enqueue => "queue",
            RoutineKind::List => "get",
            RoutineKind::Relocate => "move",
        }
    }
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoutineKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "queue" | "enqueue" => Ok(RoutineKind::Enqueue),
            "get" | "list" => Ok(RoutineKind::List),
            "move" | "relocate" => Ok(RoutineKind::Relocate),
            _ => Err(ValidationError::UnknownRoutine {
                value: value.to_owned(),
            }),
        }
    }
}

/// Knobs that change what a tick does, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutinePolicy {
    /// Wash package of the synthetic enqueue request.
    pub package: u32,
    /// Enqueue routine deletes the wash it just queued.
    pub delete_after_enqueue: bool,
    /// Relocate routine may pick position 0 as the move target.
    pub include_head: bool,
}

impl Default for RoutinePolicy {
    fn default() -> Self {
        Self {
            package: 1,
            delete_after_enqueue: true,
            include_head: true,
        }
    }
}

/// What every routine instance shares: the client, the sink and the policy.
#[derive(Clone)]
pub struct RoutineContext {
    pub api: Arc<dyn RtcApi>,
    pub records: RecordSender,
    pub policy: RoutinePolicy,
}

impl fmt::Debug for RoutineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutineContext")
            .field("records", &self.records)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
