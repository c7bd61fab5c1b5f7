//! Background SMS delivery-status monitor
//!
//! Messages still in the `发送中` state are polled against the SMS status API
//! on a fixed interval. Each message backs off exponentially between polls
//! and is marked `发送中(已停止查询)` once it hits the retry ceiling.

mod config;
mod service;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use config::{MonitorConfig, MAX_RETRY_COUNT};
pub use service::BackgroundSmsMonitor;
pub use traits::SmsStatusClient;
pub use types::{MonitorStatus, TaskOutcome, TaskReport, TickReport};
