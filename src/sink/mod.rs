//! Result sink: a bounded queue of timing records drained by one writer.
//!
//! Producers are the routines and the control handlers; the only consumer
//! appends each record as a CSV row to the timing log.
mod file;
mod format;

#[cfg(test)]
mod tests;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult, SinkError};
use crate::rtc::{RECORD_HEADER, TimingRecord};

pub use file::create_timing_log;
pub use format::describe_rows;
use format::format_row;

/// Records buffered between producers and the writer.
pub const RECORD_QUEUE_CAPACITY: usize = 100;

/// Producer side of the sink. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RecordSender {
    tx: mpsc::Sender<TimingRecord>,
}

impl RecordSender {
    /// Queues a record, waiting only while the buffer is full.
    ///
    /// Returns `false` when the sink has already shut down; the record is
    /// then logged instead of persisted.
    pub async fn submit(&self, record: TimingRecord) -> bool {
        match self.tx.send(record).await {
            Ok(()) => true,
            Err(mpsc::error::SendError(record)) => {
                warn!(
                    operation = %record.operation(),
                    record = ?record.to_fields(),
                    "Result sink is closed; record not persisted"
                );
                false
            }
        }
    }
}

#[derive(Debug)]
pub struct SinkReport<W> {
    pub writer: W,
    pub rows_written: u64,
    pub rows_failed: u64,
}

/// Owner side of the sink: shutdown signal plus the writer task.
#[derive(Debug)]
pub struct SinkHandle<W> {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<AppResult<SinkReport<W>>>,
}

impl<W> SinkHandle<W> {
    /// Signals the writer to stop. Calling it again has no further effect.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Shuts the sink down and waits for the already queued records.
    ///
    /// # Errors
    ///
    /// Returns an error when the header could not be written, the final
    /// flush fails, or the writer task panicked.
    pub async fn finish(self) -> AppResult<SinkReport<W>> {
        self.shutdown();
        self.task.await?
    }
}

/// Spawns the writer task over `writer` and returns both ends.
#[must_use]
pub fn spawn_result_sink<W>(writer: W) -> (RecordSender, SinkHandle<W>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, records) = mpsc::channel(RECORD_QUEUE_CAPACITY);
    let (shutdown_tx, shutdown) = watch::channel(false);
    let sink = ResultSink {
        writer,
        records,
        shutdown,
        rows_written: 0,
        rows_failed: 0,
    };
    let task = tokio::spawn(sink.run());
    (RecordSender { tx }, SinkHandle { shutdown_tx, task })
}

enum SinkEvent {
    Shutdown,
    Record(TimingRecord),
    Disconnected,
}

struct ResultSink<W> {
    writer: W,
    records: mpsc::Receiver<TimingRecord>,
    shutdown: watch::Receiver<bool>,
    rows_written: u64,
    rows_failed: u64,
}

impl<W> ResultSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn run(mut self) -> AppResult<SinkReport<W>> {
        self.write_row(&format_row(&RECORD_HEADER))
            .await
            .map_err(|err| AppError::sink(SinkError::WriteHeader { source: err }))?;

        loop {
            let event = tokio::select! {
                biased;
                () = wait_for_shutdown(&mut self.shutdown) => SinkEvent::Shutdown,
                next = self.records.recv() => next.map_or(SinkEvent::Disconnected, SinkEvent::Record),
            };
            match event {
                SinkEvent::Record(record) => self.persist(&record).await,
                SinkEvent::Shutdown => {
                    info!("Result sink received shutdown signal");
                    break;
                }
                SinkEvent::Disconnected => {
                    debug!("All record producers dropped");
                    break;
                }
            }
        }

        // Whatever was queued before the shutdown is still written.
        self.records.close();
        while let Ok(record) = self.records.try_recv() {
            self.persist(&record).await;
        }
        self.writer
            .flush()
            .await
            .map_err(|err| AppError::sink(SinkError::Flush { source: err }))?;

        info!(
            rows_written = self.rows_written,
            rows_failed = self.rows_failed,
            "Result sink stopped"
        );
        Ok(SinkReport {
            writer: self.writer,
            rows_written: self.rows_written,
            rows_failed: self.rows_failed,
        })
    }

    async fn persist(&mut self, record: &TimingRecord) {
        let fields = record.to_fields();
        debug!(record = ?fields, "Writing timing record");
        match self.write_row(&format_row(&fields)).await {
            Ok(()) => self.rows_written = self.rows_written.saturating_add(1),
            Err(err) => {
                self.rows_failed = self.rows_failed.saturating_add(1);
                let err = SinkError::WriteRow { source: err };
                error!(error = %err, record = ?fields, "Failed to persist timing record");
            }
        }
    }

    /// Every row is flushed on its own, so the log on disk is complete up
    /// to the last finished call even if the process is killed.
    async fn write_row(&mut self, line: &str) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    // A dropped handle counts as shutdown as well.
    drop(shutdown.wait_for(|stop| *stop).await);
}
