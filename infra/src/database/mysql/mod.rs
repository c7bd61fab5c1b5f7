//! MySQL repository implementations

pub mod sms_record_repository_impl;

pub use sms_record_repository_impl::MySqlSmsRecordRepository;
