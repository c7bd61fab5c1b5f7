//! # SmsDesk Core
//!
//! Core business logic and domain layer for the SmsDesk backend.
//! This crate contains the lookup and monitoring domain: entities, the error
//! taxonomy, the phone carrier lookup orchestrator with its provider contract,
//! the background SMS delivery-status monitor and the repository interfaces
//! they persist through.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod errors;

// Re-export commonly used types for convenience
pub use domain::*;
pub use services::*;
pub use repositories::*;
pub use errors::*;
