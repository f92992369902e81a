use crate::error::ValidationError;
use crate::routines::RoutineKind;

use super::http::ControlFailure;

/// Control routes. Every route answers both `GET` and `POST`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route {
    StartAll,
    /// Stops every routine, then purges the configured package.
    StopAll,
    StartList,
    StopList,
    StartEnqueueAndRelocate,
    /// Stops the enqueue and relocate routines, then purges.
    StopEnqueueAndRelocate,
    /// Purge of `package`, or of the configured package when absent.
    Delete { package: Option<u32> },
    UpdateOne { kind: RoutineKind, interval: String },
    UpdateAll {
        enqueue: String,
        relocate: String,
        list: String,
    },
    Status,
}

pub(crate) fn parse_route(method: &str, target: &str) -> Result<Route, ControlFailure> {
    if !matches!(method, "GET" | "POST") {
        return Err(ControlFailure::new(405, "Method not allowed"));
    }
    let path = target.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();

    let route = match segments.as_slice() {
        ["start"] => Route::StartAll,
        ["stop"] => Route::StopAll,
        ["start", "get"] => Route::StartList,
        ["stop", "get"] => Route::StopList,
        ["start", "queue-and-move"] => Route::StartEnqueueAndRelocate,
        ["stop", "queue-and-move"] => Route::StopEnqueueAndRelocate,
        ["delete"] => Route::Delete { package: None },
        ["delete", package] => {
            let package = package.parse::<u32>().map_err(|err| {
                let invalid = ValidationError::InvalidPackage {
                    value: (*package).to_owned(),
                    source: err,
                };
                ControlFailure::new(400, invalid.to_string())
            })?;
            Route::Delete {
                package: Some(package),
            }
        }
        ["status"] => Route::Status,
        ["update", routine] if routine.parse::<RoutineKind>().is_ok() => {
            return Err(ControlFailure::new(400, "no time span specified"));
        }
        ["update", routine, interval] => {
            let kind = routine
                .parse::<RoutineKind>()
                .map_err(|_unknown| ControlFailure::new(404, "Not found"))?;
            Route::UpdateOne {
                kind,
                interval: (*interval).to_owned(),
            }
        }
        ["update", enqueue, relocate, list] => Route::UpdateAll {
            enqueue: (*enqueue).to_owned(),
            relocate: (*relocate).to_owned(),
            list: (*list).to_owned(),
        },
        _ => return Err(ControlFailure::new(404, "Not found")),
    };
    Ok(route)
}
