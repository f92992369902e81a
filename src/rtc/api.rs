use async_trait::async_trait;

use crate::error::ProtocolError;

use super::timing::TimingRecord;
use super::types::{QueueEntry, WashId};

/// Result of one controller operation together with its timing row.
///
/// The record is always present, whichever stage failed; `Ok(None)` means
/// the controller answered with an empty line.
#[derive(Debug)]
pub struct CallOutcome<T> {
    pub record: TimingRecord,
    pub result: Result<T, ProtocolError>,
}

impl<T> CallOutcome<T> {
    #[must_use]
    pub const fn new(record: TimingRecord, result: Result<T, ProtocolError>) -> Self {
        Self { record, result }
    }
}

/// The four controller operations the routines drive.
#[async_trait]
pub trait RtcApi: Send + Sync {
    async fn enqueue_wash(&self, package: u32) -> CallOutcome<Option<WashId>>;

    async fn move_wash(&self, wash: WashId, before: i64) -> CallOutcome<Option<Vec<QueueEntry>>>;

    async fn delete_wash(&self, wash: WashId) -> CallOutcome<()>;

    async fn list_queue(&self) -> CallOutcome<Option<Vec<QueueEntry>>>;
}
