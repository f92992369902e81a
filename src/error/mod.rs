mod app;
mod config;
mod control;
mod protocol;
mod scheduler;
mod sink;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use control::ControlError;
pub use protocol::ProtocolError;
pub use scheduler::SchedulerError;
pub use sink::SinkError;
pub use validation::ValidationError;
