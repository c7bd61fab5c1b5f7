//! Route handlers
//!
//! - `health` - liveness and component health
//! - `lookup` - carrier lookup facade
//! - `monitor` - background SMS monitor lifecycle and tasks

pub mod health;
pub mod lookup;
pub mod monitor;

use std::sync::Arc;

use sd_core::repositories::SmsRecordRepository;
use sd_core::services::lookup::PhoneLookupService;
use sd_core::services::monitor::{BackgroundSmsMonitor, SmsStatusClient};
use sd_shared::config::Environment;

/// Application state that holds shared services
pub struct AppState<R, C>
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    pub lookup: Arc<PhoneLookupService>,
    pub monitor: Arc<BackgroundSmsMonitor<R, C>>,
    /// Selects the CORS policy
    pub environment: Environment,
}

impl<R, C> AppState<R, C>
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    pub fn new(lookup: Arc<PhoneLookupService>, monitor: Arc<BackgroundSmsMonitor<R, C>>) -> Self {
        Self {
            lookup,
            monitor,
            environment: Environment::default(),
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }
}
