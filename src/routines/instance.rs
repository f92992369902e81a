use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{info, warn};

use super::{RoutineContext, RoutineKind, run_tick};

/// One running loop of a routine. Never resumed once stopped; a new interval
/// means a new instance.
///
/// An instance spawned with the task of its stopped predecessor does not
/// tick until that task has exited, so ticks of one routine never overlap.
#[derive(Debug)]
pub(crate) struct RoutineInstance {
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl RoutineInstance {
    #[must_use]
    pub(crate) fn spawn(
        kind: RoutineKind,
        period: Duration,
        ctx: RoutineContext,
        previous: Option<JoinHandle<()>>,
    ) -> Self {
        let (cancel, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(run_loop(kind, period, ctx, cancel_rx, previous));
        Self { cancel, task }
    }

    #[must_use]
    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the loop and hands back its task. A tick already executing
    /// runs to completion before the loop observes the signal.
    pub(crate) fn stop(self) -> JoinHandle<()> {
        if self.cancel.send(()).is_err() {
            // Loop already exited.
        }
        self.task
    }
}

async fn run_loop(
    kind: RoutineKind,
    period: Duration,
    ctx: RoutineContext,
    mut cancel: oneshot::Receiver<()>,
    previous: Option<JoinHandle<()>>,
) {
    // A cancel that arrives while waiting is seen by the first select below.
    if let Some(task) = previous
        && let Err(err) = task.await
        && !err.is_cancelled()
    {
        warn!(routine = %kind, error = %err, "Previous routine task failed");
    }

    let start = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(routine = %kind, interval_ms = period.as_millis(), "Routine started");

    loop {
        tokio::select! {
            biased;
            _ = &mut cancel => break,
            _ = ticker.tick() => {}
        }
        run_tick(kind, &ctx).await;
    }

    info!(routine = %kind, "Routine stopped");
}
