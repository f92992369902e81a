use std::time::Duration;

use serde::Serialize;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{info, warn};

use crate::error::SchedulerError;
use crate::routines::{RoutineContext, RoutineInstance, RoutineKind, parse_interval};

/// Startup interval of each routine, also its fallback after a rejected update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineIntervals {
    pub enqueue: Duration,
    pub list: Duration,
    pub relocate: Duration,
}

impl RoutineIntervals {
    #[must_use]
    pub const fn get(&self, kind: RoutineKind) -> Duration {
        match kind {
            RoutineKind::Enqueue => self.enqueue,
            RoutineKind::List => self.list,
            RoutineKind::Relocate => self.relocate,
        }
    }
}

impl Default for RoutineIntervals {
    fn default() -> Self {
        Self {
            enqueue: Duration::from_secs(2),
            list: Duration::from_secs(4),
            relocate: Duration::from_secs(6),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineStatus {
    pub routine: &'static str,
    pub interval_ms: u128,
    pub running: bool,
}

#[derive(Debug)]
struct RoutineSlot {
    kind: RoutineKind,
    default_interval: Duration,
    interval: Duration,
    active: Option<RoutineInstance>,
    /// Task of the last stopped instance, handed to the next one.
    draining: Option<JoinHandle<()>>,
}

impl RoutineSlot {
    fn retire_active(&mut self, retired: &mut Vec<AbortHandle>) {
        if let Some(instance) = self.active.take() {
            let task = instance.stop();
            retired.push(task.abort_handle());
            self.draining = Some(task);
        }
    }

    fn take_draining(&mut self) -> Option<JoinHandle<()>> {
        self.draining.take().filter(|task| !task.is_finished())
    }

    fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|instance| !instance.is_finished())
    }

    fn status(&self) -> RoutineStatus {
        RoutineStatus {
            routine: self.kind.name(),
            interval_ms: self.interval.as_millis(),
            running: self.is_running(),
        }
    }
}

/// Routine state, mutated only by the task that owns it.
///
/// Every interval change goes through cancel-then-spawn: the running
/// instance is signalled and retired before its replacement exists, and
/// the replacement waits for the retired task before its first tick.
#[derive(Debug)]
pub struct Scheduler {
    ctx: RoutineContext,
    slots: Vec<RoutineSlot>,
    retired: Vec<AbortHandle>,
}

impl Scheduler {
    #[must_use]
    pub fn new(ctx: RoutineContext, intervals: RoutineIntervals) -> Self {
        let slots = RoutineKind::ALL
            .into_iter()
            .map(|kind| RoutineSlot {
                kind,
                default_interval: intervals.get(kind),
                interval: intervals.get(kind),
                active: None,
                draining: None,
            })
            .collect();
        Self {
            ctx,
            slots,
            retired: Vec::new(),
        }
    }

    #[must_use]
    pub const fn context(&self) -> &RoutineContext {
        &self.ctx
    }

    /// Starts the routines that are not already running.
    pub fn start(&mut self, kinds: &[RoutineKind]) {
        for kind in kinds {
            let Some(slot) = self.slots.iter_mut().find(|slot| slot.kind == *kind) else {
                continue;
            };
            if slot.is_running() {
                info!(routine = %slot.kind, "Routine already running");
                continue;
            }
            slot.retire_active(&mut self.retired);
            let previous = slot.take_draining();
            slot.active = Some(RoutineInstance::spawn(
                slot.kind,
                slot.interval,
                self.ctx.clone(),
                previous,
            ));
        }
        self.prune_retired();
    }

    /// Signals the given routines to stop. In-flight ticks finish on their own.
    pub fn stop(&mut self, kinds: &[RoutineKind]) {
        for kind in kinds {
            let Some(slot) = self.slots.iter_mut().find(|slot| slot.kind == *kind) else {
                continue;
            };
            if slot.active.is_some() {
                info!(routine = %slot.kind, "Stopping routine");
                slot.retire_active(&mut self.retired);
            }
        }
        self.prune_retired();
    }

    /// Replaces the routine's ticker with one running at `text`.
    ///
    /// The routine is running afterwards either way. Invalid text restarts
    /// it on its startup interval.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::IntervalRejected`] when `text` is not a
    /// valid interval; the fallback is already applied at that point.
    pub fn update_interval(
        &mut self,
        kind: RoutineKind,
        text: &str,
    ) -> Result<Duration, SchedulerError> {
        self.stop(&[kind]);
        let parsed = parse_interval(text);
        let Some(slot) = self.slot_mut(kind) else {
            return Err(SchedulerError::Unavailable);
        };
        let outcome = match parsed {
            Ok(interval) => {
                slot.interval = interval;
                info!(routine = %kind, interval_ms = interval.as_millis(), "Routine interval updated");
                Ok(interval)
            }
            Err(err) => {
                slot.interval = slot.default_interval;
                warn!(
                    routine = %kind,
                    value = text,
                    fallback_ms = slot.default_interval.as_millis(),
                    error = %err,
                    "Invalid routine interval; using startup interval"
                );
                Err(SchedulerError::IntervalRejected {
                    routine: kind.name(),
                    fallback_ms: slot.default_interval.as_millis(),
                    source: err,
                })
            }
        };
        self.start(&[kind]);
        outcome
    }

    #[must_use]
    pub fn status(&self) -> Vec<RoutineStatus> {
        self.slots.iter().map(RoutineSlot::status).collect()
    }

    /// Stops every routine and waits up to `grace` for in-flight ticks.
    pub async fn shutdown(&mut self, grace: Duration) {
        self.stop(&RoutineKind::ALL);
        // Each draining task awaits its own predecessors.
        let pending: Vec<JoinHandle<()>> = self
            .slots
            .iter_mut()
            .filter_map(|slot| slot.draining.take())
            .collect();
        let aborts = std::mem::take(&mut self.retired);
        let drained = tokio::time::timeout(grace, async {
            for handle in pending {
                if let Err(err) = handle.await
                    && !err.is_cancelled()
                {
                    warn!(error = %err, "Routine task failed");
                }
            }
        })
        .await;
        if drained.is_err() {
            warn!(
                grace_ms = grace.as_millis(),
                "Routines still busy after shutdown grace; aborting them"
            );
            for abort in aborts {
                abort.abort();
            }
        } else {
            info!("All routines stopped");
        }
    }

    fn slot_mut(&mut self, kind: RoutineKind) -> Option<&mut RoutineSlot> {
        self.slots.iter_mut().find(|slot| slot.kind == kind)
    }

    fn prune_retired(&mut self) {
        self.retired.retain(|task| !task.is_finished());
    }
}
