//! Domain entities representing core business objects.

pub mod monitor_task;
pub mod phone_info;
pub mod sms_record;


// Re-export commonly used types
pub use monitor_task::BackgroundSmsTask;
pub use phone_info::{
    BatchPhoneResult, PhoneInfo, PhoneResult,
    CARRIER_BROADNET, CARRIER_MOBILE, CARRIER_OTHER, CARRIER_TELECOM, CARRIER_UNICOM, UNKNOWN_REGION,
};
pub use sms_record::{DeliveryReport, SmsRecord, SmsStatus, StatusUpdate};
