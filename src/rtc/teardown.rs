use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::error::ProtocolError;

use super::timing::TimingRecord;

/// Closing side of a controller connection.
#[async_trait]
pub trait Teardown: Send {
    async fn close(&mut self) -> std::io::Result<()>;

    /// Aborts any pending I/O so that a following close cannot block.
    fn force_deadline(&mut self) -> std::io::Result<()>;
}

/// Closes `conn`, retrying exactly once after `grace` when the first close
/// fails. Stamps the closed column on success and the error columns when the
/// retry fails too.
///
/// # Errors
///
/// Returns `ProtocolError::Close` when both attempts fail.
pub async fn close_with_retry<C>(
    conn: &mut C,
    record: &mut TimingRecord,
    grace: Duration,
) -> Result<(), ProtocolError>
where
    C: Teardown + ?Sized,
{
    let first_err = match conn.close().await {
        Ok(()) => {
            record.mark_closed();
            return Ok(());
        }
        Err(err) => err,
    };

    warn!(
        operation = %record.operation(),
        error = %first_err,
        grace_ms = grace.as_millis(),
        "Failed to close controller connection; forcing deadline before retry"
    );
    if let Err(err) = conn.force_deadline() {
        info!(
            operation = %record.operation(),
            error = %err,
            "Failed to force deadline on controller connection"
        );
    }
    tokio::time::sleep(grace).await;

    match conn.close().await {
        Ok(()) => {
            record.mark_closed();
            Ok(())
        }
        Err(err) => {
            let err = ProtocolError::Close { source: err };
            error!(operation = %record.operation(), error = %err, "Forced close failed");
            record.fail(&err);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Instant;

    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::rtc::types::Operation;

    const TEST_GRACE: Duration = Duration::from_millis(20);

    struct ScriptedClose {
        failures_left: usize,
        close_calls: usize,
        forced: usize,
    }

    impl ScriptedClose {
        const fn failing(failures: usize) -> Self {
            Self {
                failures_left: failures,
                close_calls: 0,
                forced: 0,
            }
        }
    }

    #[async_trait]
    impl Teardown for ScriptedClose {
        async fn close(&mut self) -> io::Result<()> {
            self.close_calls = self.close_calls.saturating_add(1);
            if self.failures_left > 0 {
                self.failures_left = self.failures_left.saturating_sub(1);
                return Err(io::Error::other("close refused"));
            }
            Ok(())
        }

        fn force_deadline(&mut self) -> io::Result<()> {
            self.forced = self.forced.saturating_add(1);
            Ok(())
        }
    }

    #[tokio::test]
    async fn clean_close_needs_no_retry() -> AppResult<()> {
        let mut conn = ScriptedClose::failing(0);
        let mut record = TimingRecord::new(Operation::Queue);
        close_with_retry(&mut conn, &mut record, TEST_GRACE).await?;
        if conn.close_calls != 1 || conn.forced != 0 {
            return Err(AppError::protocol(format!(
                "expected one close and no forced deadline, got {} / {}",
                conn.close_calls, conn.forced
            )));
        }
        if record.closed().is_none() || record.is_error() {
            return Err(AppError::protocol("expected closed stamp without error"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn first_failure_is_retried_once_after_grace() -> AppResult<()> {
        let mut conn = ScriptedClose::failing(1);
        let mut record = TimingRecord::new(Operation::Get);
        let started = Instant::now();
        close_with_retry(&mut conn, &mut record, TEST_GRACE).await?;
        if started.elapsed() < TEST_GRACE {
            return Err(AppError::protocol("retry happened before the grace period"));
        }
        if conn.close_calls != 2 || conn.forced != 1 {
            return Err(AppError::protocol(format!(
                "expected two closes and one forced deadline, got {} / {}",
                conn.close_calls, conn.forced
            )));
        }
        if record.is_error() || record.closed().is_none() {
            return Err(AppError::protocol("successful retry must not record an error"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn second_failure_reports_close_error() -> AppResult<()> {
        let mut conn = ScriptedClose::failing(5);
        let mut record = TimingRecord::new(Operation::Delete);
        let result = close_with_retry(&mut conn, &mut record, TEST_GRACE).await;
        if !matches!(result, Err(ProtocolError::Close { .. })) {
            return Err(AppError::protocol(format!("expected close error, got {:?}", result)));
        }
        if conn.close_calls != 2 {
            return Err(AppError::protocol(format!(
                "expected exactly one retry, got {} closes",
                conn.close_calls
            )));
        }
        let fields = record.to_fields();
        if fields.get(4).is_some_and(|value| !value.is_empty())
            || fields.get(5).map(String::as_str) != Some("true")
        {
            return Err(AppError::protocol(format!("unexpected fields: {:?}", fields)));
        }
        Ok(())
    }
}
