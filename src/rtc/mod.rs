//! Controller protocol: wire codec, per-operation client and timing rows.
mod api;
pub mod codec;
mod client;
mod teardown;
mod timing;
mod types;


pub use api::{CallOutcome, RtcApi};
pub use client::{ClientTimeouts, RtcClient};
pub use teardown::{Teardown, close_with_retry};
pub use timing::{RECORD_FIELDS, RECORD_HEADER, TimingRecord};
pub use types::{ConnectionTarget, Operation, QueueEntry, WashId};
