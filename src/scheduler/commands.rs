use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{ProtocolError, SchedulerError};
use crate::routines::{RoutineContext, RoutineKind, RoutinePolicy};

use super::purge::{PurgeReport, purge_package};
use super::state::{RoutineStatus, Scheduler};

enum SchedulerCommand {
    Start {
        kinds: Vec<RoutineKind>,
        respond_to: oneshot::Sender<Vec<RoutineStatus>>,
    },
    Stop {
        kinds: Vec<RoutineKind>,
        respond_to: oneshot::Sender<Vec<RoutineStatus>>,
    },
    UpdateInterval {
        kind: RoutineKind,
        interval: String,
        respond_to: oneshot::Sender<Result<Duration, SchedulerError>>,
    },
    Status {
        respond_to: oneshot::Sender<Vec<RoutineStatus>>,
    },
}

/// Cloneable front of the scheduler task used by the control surface.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<SchedulerCommand>,
    ctx: RoutineContext,
}

impl std::fmt::Debug for SchedulerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SchedulerCommand::Start { .. } => "Start",
            SchedulerCommand::Stop { .. } => "Stop",
            SchedulerCommand::UpdateInterval { .. } => "UpdateInterval",
            SchedulerCommand::Status { .. } => "Status",
        };
        f.write_str(name)
    }
}

/// Moves `scheduler` into its own task.
///
/// The task ends when every handle is dropped or `shutdown_rx` fires, and
/// then stops all routines, waiting up to `grace` for in-flight ticks.
#[must_use]
pub fn spawn_scheduler(
    scheduler: Scheduler,
    mut shutdown_rx: broadcast::Receiver<()>,
    grace: Duration,
) -> (SchedulerHandle, JoinHandle<()>) {
    let (commands, mut command_rx) = mpsc::unbounded_channel();
    let handle = SchedulerHandle {
        commands,
        ctx: scheduler.context().clone(),
    };

    let task = tokio::spawn(async move {
        let mut scheduler = scheduler;
        loop {
            let command = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Scheduler received shutdown signal");
                    break;
                }
                command = command_rx.recv() => command,
            };
            let Some(command) = command else {
                debug!("All scheduler handles dropped");
                break;
            };
            handle_command(&mut scheduler, command);
        }
        scheduler.shutdown(grace).await;
    });

    (handle, task)
}

fn handle_command(scheduler: &mut Scheduler, command: SchedulerCommand) {
    debug!(command = ?command, "Scheduler command");
    let delivered = match command {
        SchedulerCommand::Start { kinds, respond_to } => {
            scheduler.start(&kinds);
            respond_to.send(scheduler.status()).is_ok()
        }
        SchedulerCommand::Stop { kinds, respond_to } => {
            scheduler.stop(&kinds);
            respond_to.send(scheduler.status()).is_ok()
        }
        SchedulerCommand::UpdateInterval {
            kind,
            interval,
            respond_to,
        } => respond_to
            .send(scheduler.update_interval(kind, &interval))
            .is_ok(),
        SchedulerCommand::Status { respond_to } => respond_to.send(scheduler.status()).is_ok(),
    };
    if !delivered {
        // Requester dropped the response channel.
    }
}

impl SchedulerHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SchedulerCommand,
    ) -> Result<T, SchedulerError> {
        let (respond_to, reply) = oneshot::channel();
        self.commands
            .send(build(respond_to))
            .map_err(|_closed| SchedulerError::Unavailable)?;
        reply.await.map_err(|_dropped| SchedulerError::NoReply)
    }

    /// # Errors
    ///
    /// Fails when the scheduler task is gone.
    pub async fn start_all(&self) -> Result<Vec<RoutineStatus>, SchedulerError> {
        self.start_subset(&RoutineKind::ALL).await
    }

    /// # Errors
    ///
    /// Fails when the scheduler task is gone.
    pub async fn stop_all(&self) -> Result<Vec<RoutineStatus>, SchedulerError> {
        self.stop_subset(&RoutineKind::ALL).await
    }

    /// # Errors
    ///
    /// Fails when the scheduler task is gone.
    pub async fn start_subset(
        &self,
        kinds: &[RoutineKind],
    ) -> Result<Vec<RoutineStatus>, SchedulerError> {
        let kinds = kinds.to_vec();
        self.request(|respond_to| SchedulerCommand::Start { kinds, respond_to })
            .await
    }

    /// # Errors
    ///
    /// Fails when the scheduler task is gone.
    pub async fn stop_subset(
        &self,
        kinds: &[RoutineKind],
    ) -> Result<Vec<RoutineStatus>, SchedulerError> {
        let kinds = kinds.to_vec();
        self.request(|respond_to| SchedulerCommand::Stop { kinds, respond_to })
            .await
    }

    /// Restarts `kind` on the interval given as text.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::IntervalRejected`] when the text is invalid (the
    /// routine then runs on its startup interval), or an error when the
    /// scheduler task is gone.
    pub async fn update_interval(
        &self,
        kind: RoutineKind,
        interval: &str,
    ) -> Result<Duration, SchedulerError> {
        let interval = interval.to_owned();
        self.request(|respond_to| SchedulerCommand::UpdateInterval {
            kind,
            interval,
            respond_to,
        })
        .await?
    }

    /// # Errors
    ///
    /// Fails when the scheduler task is gone.
    pub async fn status(&self) -> Result<Vec<RoutineStatus>, SchedulerError> {
        self.request(|respond_to| SchedulerCommand::Status { respond_to })
            .await
    }

    /// Deletes every queued wash of `package`. Runs on the caller's task so
    /// the controller round trips never stall other commands.
    ///
    /// # Errors
    ///
    /// Returns the error of the queue listing that the purge depends on.
    pub async fn delete_all_matching(&self, package: u32) -> Result<PurgeReport, ProtocolError> {
        purge_package(&self.ctx, package).await
    }

    #[must_use]
    pub const fn policy(&self) -> RoutinePolicy {
        self.ctx.policy
    }
}
