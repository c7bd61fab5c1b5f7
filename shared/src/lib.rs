//! Shared utilities and common types for the SmsDesk server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types loaded from the environment
//! - API response envelope
//! - Phone number utilities (validation, normalization, masking)

pub mod config;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, DatabaseConfig, Environment, LoggingConfig, LookupConfig, MonitorSettings,
    ServerConfig,
};
pub use types::{ApiResponse, HealthResponse};
pub use utils::phone;
