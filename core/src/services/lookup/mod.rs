//! Phone carrier lookup
//!
//! This module provides the lookup facade used by the rest of the system:
//! - The [`PhoneProvider`] contract every carrier source implements
//! - The always-available [`OfflineProvider`] backed by a prefix table
//! - A TTL cache shared by the orchestrator and network providers
//! - [`PhoneLookupService`], which orders providers by priority, caches,
//!   retries and reconciles batch results with single-number fallback

mod cache;
mod config;
mod offline;
mod service;
mod traits;
mod types;


pub use cache::TtlCache;
pub use config::{LookupServiceConfig, DEFAULT_CACHE_TTL};
pub use offline::{carrier_for_prefix, OfflineProvider, OFFLINE_PROVIDER_NAME};
pub use service::PhoneLookupService;
pub use traits::PhoneProvider;
pub use types::ProviderStatus;
