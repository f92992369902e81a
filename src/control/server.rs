use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use serde::Serialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult, ControlError, SchedulerError};
use crate::routines::RoutineKind;
use crate::scheduler::{PurgeReport, RoutineStatus, SchedulerHandle};

use super::http::{ControlFailure, read_http_request, write_error_response, write_json_response};
use super::routes::{Route, parse_route};

const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(5);
const SCHEDULER_REPLY_TIMEOUT: Duration = Duration::from_secs(5);
const PURGE_LIST_FAILED: &str = "failed to fetch rtc queue";

#[derive(Debug, Serialize)]
struct ControlResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    routines: Option<Vec<RoutineStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purge: Option<PurgeReport>,
}

impl ControlResponse {
    const fn ok(routines: Option<Vec<RoutineStatus>>, purge: Option<PurgeReport>) -> Self {
        Self {
            status: "ok",
            routines,
            purge,
        }
    }
}

/// Binds the control listener.
///
/// # Errors
///
/// Returns an error when the address cannot be bound.
pub async fn bind_control_listener(addr: SocketAddr) -> AppResult<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::control(ControlError::Bind { addr, source: err }))?;
    let local = listener
        .local_addr()
        .map_err(|err| AppError::control(ControlError::LocalAddr { source: err }))?;
    info!(addr = %local, "Control server listening");
    Ok(listener)
}

/// Accepts control connections until `shutdown_rx` fires. Each connection
/// carries one request and is handled on its own task.
pub async fn serve_control(
    listener: TcpListener,
    scheduler: SchedulerHandle,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        let accepted = tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                info!("Control server shutting down");
                break;
            }
            accepted = listener.accept() => accepted,
        };
        let (socket, peer) = match accepted {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "Failed to accept control connection");
                continue;
            }
        };
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            handle_control_connection(socket, peer, &scheduler).await;
        });
    }
}

async fn handle_control_connection(
    mut socket: TcpStream,
    peer: SocketAddr,
    scheduler: &SchedulerHandle,
) {
    let request = match tokio::time::timeout(REQUEST_READ_TIMEOUT, read_http_request(&mut socket))
        .await
    {
        Ok(Ok(request)) => request,
        Ok(Err(failure)) => {
            respond_failure(&mut socket, &failure).await;
            return;
        }
        Err(_elapsed) => {
            respond_failure(&mut socket, &ControlFailure::new(408, "Request timed out")).await;
            return;
        }
    };
    debug!(peer = %peer, method = %request.method, path = %request.path, "Control request");

    let outcome = match parse_route(&request.method, &request.path) {
        Ok(route) => dispatch(route, scheduler).await,
        Err(failure) => Err(failure),
    };
    match outcome {
        Ok(response) => {
            if let Err(err) = write_json_response(&mut socket, 200, &response).await {
                debug!(peer = %peer, error = %err, "Failed to write control response");
            }
        }
        Err(failure) => respond_failure(&mut socket, &failure).await,
    }
}

async fn respond_failure(socket: &mut TcpStream, failure: &ControlFailure) {
    if write_error_response(socket, failure.status, &failure.message)
        .await
        .is_err()
    {
        // Socket closed while writing error response.
    }
}

async fn dispatch(
    route: Route,
    scheduler: &SchedulerHandle,
) -> Result<ControlResponse, ControlFailure> {
    let both = [RoutineKind::Enqueue, RoutineKind::Relocate];
    match route {
        Route::StartAll => {
            let routines = ask(scheduler.start_all()).await?;
            Ok(ControlResponse::ok(Some(routines), None))
        }
        Route::StopAll => {
            let routines = ask(scheduler.stop_all()).await?;
            let purge = purge(scheduler, None).await?;
            Ok(ControlResponse::ok(Some(routines), Some(purge)))
        }
        Route::StartList => {
            let routines = ask(scheduler.start_subset(&[RoutineKind::List])).await?;
            Ok(ControlResponse::ok(Some(routines), None))
        }
        Route::StopList => {
            let routines = ask(scheduler.stop_subset(&[RoutineKind::List])).await?;
            Ok(ControlResponse::ok(Some(routines), None))
        }
        Route::StartEnqueueAndRelocate => {
            let routines = ask(scheduler.start_subset(&both)).await?;
            Ok(ControlResponse::ok(Some(routines), None))
        }
        Route::StopEnqueueAndRelocate => {
            let routines = ask(scheduler.stop_subset(&both)).await?;
            let purge = purge(scheduler, None).await?;
            Ok(ControlResponse::ok(Some(routines), Some(purge)))
        }
        Route::Delete { package } => {
            let purge = purge(scheduler, package).await?;
            Ok(ControlResponse::ok(None, Some(purge)))
        }
        Route::UpdateOne { kind, interval } => {
            ask(scheduler.update_interval(kind, &interval)).await?;
            let routines = ask(scheduler.status()).await?;
            Ok(ControlResponse::ok(Some(routines), None))
        }
        Route::UpdateAll {
            enqueue,
            relocate,
            list,
        } => {
            // Every routine is restarted even when an earlier one was rejected.
            let mut rejected = Vec::new();
            for (kind, interval) in [
                (RoutineKind::Enqueue, enqueue),
                (RoutineKind::Relocate, relocate),
                (RoutineKind::List, list),
            ] {
                if let Err(failure) = ask(scheduler.update_interval(kind, &interval)).await {
                    if failure.status != 400 {
                        return Err(failure);
                    }
                    rejected.push(failure.message);
                }
            }
            if !rejected.is_empty() {
                return Err(ControlFailure::new(400, rejected.join("; ")));
            }
            let routines = ask(scheduler.status()).await?;
            Ok(ControlResponse::ok(Some(routines), None))
        }
        Route::Status => {
            let routines = ask(scheduler.status()).await?;
            Ok(ControlResponse::ok(Some(routines), None))
        }
    }
}

/// Awaits a scheduler reply and maps its failure onto a status code.
async fn ask<T, F>(request: F) -> Result<T, ControlFailure>
where
    F: Future<Output = Result<T, SchedulerError>>,
{
    match tokio::time::timeout(SCHEDULER_REPLY_TIMEOUT, request).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err @ SchedulerError::IntervalRejected { .. })) => {
            Err(ControlFailure::new(400, err.to_string()))
        }
        Ok(Err(err)) => Err(ControlFailure::new(503, err.to_string())),
        Err(_elapsed) => Err(ControlFailure::new(504, "Scheduler response timed out")),
    }
}

async fn purge(
    scheduler: &SchedulerHandle,
    package: Option<u32>,
) -> Result<PurgeReport, ControlFailure> {
    let package = package.unwrap_or(scheduler.policy().package);
    scheduler
        .delete_all_matching(package)
        .await
        .map_err(|err| {
            error!(package, error = %err, "Purge aborted");
            ControlFailure::new(500, PURGE_LIST_FAILED)
        })
}
