//! HTTP client for the posture report backend.
//!
//! Reports are upserted into a PostgREST-style table keyed by
//! `(user_id, device_id)`, so repeated submissions overwrite the previous
//! row for the same device.

mod client;
mod retry;
mod types;

pub use client::Client;
pub use retry::RetryPolicy;
pub use types::{
    BackendRejection, BackendSettings, ReportRow, DEFAULT_REPORT_TABLE, DEFAULT_TIMEOUT,
    DEFAULT_USER_TABLE,
};
