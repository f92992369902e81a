use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, Timelike};
use tokio::fs::File;

use crate::error::{AppError, AppResult, SinkError};

/// Creates `load-test-<date>-<time>.csv` in `dir`, one file per run.
///
/// # Errors
///
/// Returns an error when the directory or the file cannot be created.
pub async fn create_timing_log(dir: &Path) -> AppResult<(PathBuf, File)> {
    tokio::fs::create_dir_all(dir).await.map_err(|err| {
        AppError::sink(SinkError::CreateDir {
            path: dir.to_path_buf(),
            source: err,
        })
    })?;
    let path = dir.join(timing_log_name());
    let file = File::create(&path).await.map_err(|err| {
        AppError::sink(SinkError::CreateLog {
            path: path.clone(),
            source: err,
        })
    })?;
    Ok((path, file))
}

fn timing_log_name() -> String {
    let now = Local::now();
    format!(
        "load-test-{:04}-{:02}-{:02}-{:02}-{:02}-{:02}.csv",
        now.year(),
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
