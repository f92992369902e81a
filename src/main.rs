mod args;
mod config;
mod control;
mod entry;
mod error;
mod logger;
mod routines;
mod rtc;
mod scheduler;
mod shutdown;
mod shutdown_handlers;
mod sink;

use error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
