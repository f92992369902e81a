use serde::Serialize;
use tracing::{error, info};

use crate::error::ProtocolError;
use crate::rtc::CallOutcome;
use crate::routines::RoutineContext;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub matched: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Lists the controller queue and deletes every entry of `package`, in
/// listing order. Every timing record goes to the sink.
///
/// # Errors
///
/// Returns the listing error; failures of single deletes are only counted.
pub async fn purge_package(
    ctx: &RoutineContext,
    package: u32,
) -> Result<PurgeReport, ProtocolError> {
    let CallOutcome { record, result } = ctx.api.list_queue().await;
    ctx.records.submit(record).await;
    let entries = match result {
        Ok(entries) => entries.unwrap_or_default(),
        Err(err) => {
            error!(package, error = %err, "Failed to list queue for purge");
            return Err(err);
        }
    };

    let mut report = PurgeReport::default();
    for entry in entries.iter().filter(|entry| entry.package == package) {
        report.matched = report.matched.saturating_add(1);
        let CallOutcome { record, result } = ctx.api.delete_wash(entry.id).await;
        ctx.records.submit(record).await;
        match result {
            Ok(()) => report.deleted = report.deleted.saturating_add(1),
            Err(err) => {
                report.failed = report.failed.saturating_add(1);
                error!(wash_id = %entry.id, position = entry.position, error = %err, "Failed to delete queued wash");
            }
        }
    }

    info!(
        package,
        matched = report.matched,
        deleted = report.deleted,
        failed = report.failed,
        "Purged queued washes"
    );
    Ok(report)
}
