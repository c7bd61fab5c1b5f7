//! Repository interfaces for persistence, implemented in the infrastructure layer.

pub mod sms_record;

pub use sms_record::SmsRecordRepository;

#[cfg(test)]
pub use sms_record::MockSmsRecordRepository;
