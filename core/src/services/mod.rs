//! Business services containing domain logic and use cases.

pub mod lookup;
pub mod monitor;
pub mod retry;

// Re-export commonly used types
pub use lookup::{
    LookupServiceConfig, OfflineProvider, PhoneLookupService, PhoneProvider, ProviderStatus,
    TtlCache,
};
pub use monitor::{
    BackgroundSmsMonitor, MonitorConfig, MonitorStatus, SmsStatusClient, TaskOutcome, TickReport,
};
pub use retry::{Backoff, RetryPolicy};
