use std::time::Duration;

use tokio::io::AsyncReadExt;

use super::*;
use crate::error::ProtocolError;
use crate::rtc::Operation;

fn completed(operation: Operation) -> TimingRecord {
    let mut record = TimingRecord::new(operation);
    record.mark_connected();
    record.mark_command_initiated();
    record.mark_command_retrieved();
    record.mark_closed();
    record
}

fn lines(report: &SinkReport<Vec<u8>>) -> Vec<String> {
    String::from_utf8_lossy(&report.writer)
        .lines()
        .map(str::to_owned)
        .collect()
}

#[tokio::test]
async fn header_is_written_even_without_records() -> AppResult<()> {
    let (_records, handle) = spawn_result_sink(Vec::new());
    let report = handle.finish().await?;
    let lines = lines(&report);
    if lines
        != ["Command,Connected,CommandInitiated,CommandRetrieved,Closed,Error,ErrorMessage"]
    {
        return Err(AppError::sink(format!("unexpected log: {:?}", lines)));
    }
    if report.rows_written != 0 {
        return Err(AppError::sink("no rows expected"));
    }
    Ok(())
}

#[tokio::test]
async fn records_are_written_in_submission_order() -> AppResult<()> {
    let (records, handle) = spawn_result_sink(Vec::new());
    for operation in [Operation::Queue, Operation::Delete, Operation::Get] {
        if !records.submit(completed(operation)).await {
            return Err(AppError::sink("sink closed early"));
        }
    }
    let report = handle.finish().await?;
    let lines = lines(&report);
    let commands: Vec<&str> = lines
        .iter()
        .skip(1)
        .filter_map(|line| line.split(',').next())
        .collect();
    if commands != ["QUEUE", "DELETE", "GET"] {
        return Err(AppError::sink(format!("unexpected order: {:?}", commands)));
    }
    if report.rows_written != 3 || report.rows_failed != 0 {
        return Err(AppError::sink(format!(
            "unexpected counts: {}",
            describe_rows(report.rows_written, report.rows_failed)
        )));
    }
    Ok(())
}

#[tokio::test]
async fn queued_records_survive_shutdown() -> AppResult<()> {
    let (records, handle) = spawn_result_sink(Vec::new());
    // Queue a full buffer before the writer gets a chance to run.
    for _ in 0..RECORD_QUEUE_CAPACITY {
        if !records.submit(completed(Operation::Move)).await {
            return Err(AppError::sink("sink closed early"));
        }
    }
    handle.shutdown();
    let report = handle.finish().await?;
    if u64::try_from(RECORD_QUEUE_CAPACITY).ok() != Some(report.rows_written) {
        return Err(AppError::sink(format!(
            "expected every queued row, got {}",
            report.rows_written
        )));
    }
    Ok(())
}

#[tokio::test]
async fn full_queue_makes_submit_wait_for_a_slow_writer() -> AppResult<()> {
    // Nobody reads the other end yet, so the writer stalls on the header.
    let (writer, mut reader) = tokio::io::duplex(64);
    let (records, handle) = spawn_result_sink(writer);
    let total = RECORD_QUEUE_CAPACITY.saturating_add(5);

    let producer = tokio::spawn(async move {
        let mut accepted = 0_usize;
        for _ in 0..total {
            if records.submit(completed(Operation::Get)).await {
                accepted = accepted.saturating_add(1);
            }
        }
        accepted
    });
    tokio::time::sleep(Duration::from_millis(200)).await;
    if producer.is_finished() {
        return Err(AppError::sink("submit should wait while the queue is full"));
    }

    let drain = tokio::spawn(async move {
        let mut text = String::new();
        reader.read_to_string(&mut text).await.map(|_| text)
    });
    let accepted = tokio::time::timeout(Duration::from_secs(5), producer)
        .await
        .map_err(|_elapsed| AppError::sink("producer stayed blocked after the writer resumed"))??;
    if accepted != total {
        return Err(AppError::sink(format!("only {} of {} records accepted", accepted, total)));
    }

    let report = handle.finish().await?;
    drop(report.writer);
    let text = drain.await??;
    let rows = text.lines().skip(1).filter(|line| line.starts_with("GET,")).count();
    if rows != total || u64::try_from(total).ok() != Some(report.rows_written) {
        return Err(AppError::sink(format!(
            "expected {} rows, log has {} and sink reported {}",
            total, rows, report.rows_written
        )));
    }
    Ok(())
}

#[tokio::test]
async fn submit_after_shutdown_reports_closed() -> AppResult<()> {
    let (records, handle) = spawn_result_sink(Vec::new());
    let report = handle.finish().await?;
    if records.submit(completed(Operation::Get)).await {
        return Err(AppError::sink("submit should fail once the sink stopped"));
    }
    if report.rows_written != 0 {
        return Err(AppError::sink("late record must not be written"));
    }
    Ok(())
}

#[tokio::test]
async fn failed_record_keeps_its_message() -> AppResult<()> {
    let (records, handle) = spawn_result_sink(Vec::new());
    let mut record = TimingRecord::new(Operation::Queue);
    record.fail(&ProtocolError::ReadTimeout { timeout_ms: 3000 });
    if !records.submit(record).await {
        return Err(AppError::sink("sink closed early"));
    }
    let report = handle.finish().await?;
    let lines = lines(&report);
    let Some(row) = lines.get(1) else {
        return Err(AppError::sink("missing data row"));
    };
    if !row.starts_with("QUEUE,,,,,true,") || !row.contains("3000") {
        return Err(AppError::sink(format!("unexpected row: {}", row)));
    }
    Ok(())
}
