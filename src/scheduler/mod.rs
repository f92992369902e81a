//! Ownership of the routine instances and the commands that change them.
mod commands;
mod purge;
mod state;


pub use commands::{SchedulerHandle, spawn_scheduler};
pub use purge::{PurgeReport, purge_package};
pub use state::{RoutineIntervals, RoutineStatus, Scheduler};
