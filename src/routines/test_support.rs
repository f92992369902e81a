use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{RoutineContext, RoutinePolicy};
use crate::error::{AppResult, ProtocolError};
use crate::rtc::{CallOutcome, Operation, QueueEntry, RtcApi, TimingRecord, WashId};
use crate::sink::{SinkHandle, spawn_result_sink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Enqueue(u32),
    List,
    Move(WashId, i64),
    Delete(WashId),
}

#[derive(Default)]
pub(crate) struct FakeApi {
    pub(crate) calls: Mutex<Vec<Call>>,
    pub(crate) enqueue_fails: bool,
    pub(crate) list_fails: bool,
    pub(crate) failing_deletes: Vec<WashId>,
    pub(crate) queue: Vec<QueueEntry>,
    /// How long each listing takes to answer.
    pub(crate) list_delay: Duration,
    pub(crate) in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
}

impl FakeApi {
    pub(crate) fn with_queue(len: usize) -> Self {
        Self::with_packages(&vec![1; len])
    }

    /// Queue with one entry per package, ids counting up from 100.
    pub(crate) fn with_packages(packages: &[u32]) -> Self {
        let queue = (0_i64..)
            .zip(packages)
            .map(|(position, package)| QueueEntry {
                id: WashId(position.saturating_add(100)),
                state: "queued".to_owned(),
                position,
                package: *package,
            })
            .collect();
        Self {
            queue,
            ..Self::default()
        }
    }

    fn push(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Most listings ever running at the same time.
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn finished(operation: Operation) -> TimingRecord {
    let mut record = TimingRecord::new(operation);
    record.mark_connected();
    record.mark_command_initiated();
    record.mark_command_retrieved();
    record.mark_closed();
    record
}

fn failed(operation: Operation) -> (TimingRecord, ProtocolError) {
    let err = ProtocolError::ReadTimeout { timeout_ms: 10 };
    let mut record = TimingRecord::new(operation);
    record.fail(&err);
    (record, err)
}

#[async_trait]
impl RtcApi for FakeApi {
    async fn enqueue_wash(&self, package: u32) -> CallOutcome<Option<WashId>> {
        self.push(Call::Enqueue(package));
        if self.enqueue_fails {
            let (record, err) = failed(Operation::Queue);
            return CallOutcome::new(record, Err(err));
        }
        CallOutcome::new(finished(Operation::Queue), Ok(Some(WashId(42))))
    }

    async fn move_wash(
        &self,
        wash: WashId,
        before: i64,
    ) -> CallOutcome<Option<Vec<QueueEntry>>> {
        self.push(Call::Move(wash, before));
        CallOutcome::new(finished(Operation::Move), Ok(Some(self.queue.clone())))
    }

    async fn delete_wash(&self, wash: WashId) -> CallOutcome<()> {
        self.push(Call::Delete(wash));
        if self.failing_deletes.contains(&wash) {
            let (record, err) = failed(Operation::Delete);
            return CallOutcome::new(record, Err(err));
        }
        CallOutcome::new(finished(Operation::Delete), Ok(()))
    }

    async fn list_queue(&self) -> CallOutcome<Option<Vec<QueueEntry>>> {
        self.push(Call::List);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.list_fails {
            let (record, err) = failed(Operation::Get);
            return CallOutcome::new(record, Err(err));
        }
        CallOutcome::new(finished(Operation::Get), Ok(Some(self.queue.clone())))
    }
}

pub(crate) fn context(
    api: &Arc<FakeApi>,
    policy: RoutinePolicy,
) -> (RoutineContext, SinkHandle<Vec<u8>>) {
    let (records, sink) = spawn_result_sink(Vec::new());
    let api: Arc<dyn RtcApi> = api.clone();
    (
        RoutineContext {
            api,
            records,
            policy,
        },
        sink,
    )
}

/// Closes the sink and returns the command column of every data row.
pub(crate) async fn logged_commands(
    ctx: RoutineContext,
    sink: SinkHandle<Vec<u8>>,
) -> AppResult<Vec<String>> {
    drop(ctx);
    let report = sink.finish().await?;
    Ok(String::from_utf8_lossy(&report.writer)
        .lines()
        .skip(1)
        .filter_map(|line| line.split(',').next())
        .map(str::to_owned)
        .collect())
}
