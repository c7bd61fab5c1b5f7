//! Domain-specific error types for carrier lookup
//!
//! Lookup errors carry bilingual `English | 中文` messages and are surfaced
//! verbatim in lookup results.

use thiserror::Error;

/// Failure taxonomy of a carrier lookup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Invalid phone format: {phone} | 无效的手机号码格式: {phone}")]
    InvalidPhoneFormat { phone: String },

    #[error("{provider} request timed out after {seconds}s | {provider} 请求超时 ({seconds}秒)")]
    Timeout { provider: String, seconds: u64 },

    #[error("{provider} network error: {message} | {provider} 网络错误: {message}")]
    Network { provider: String, message: String },

    #[error("{provider} authentication failed: {message} | {provider} 认证失败: {message}")]
    Authentication { provider: String, message: String },

    #[error("{provider} returned an error: {message} | {provider} 返回错误: {message}")]
    Upstream { provider: String, message: String },

    #[error("{provider} token is not configured | {provider} 未配置令牌")]
    NotConfigured { provider: String },

    #[error("No lookup provider is available | 没有可用的查询服务")]
    NoProviderAvailable,

    #[error("All providers failed: {last_error} | 所有查询服务均失败: {last_error}")]
    Exhausted { last_error: String },
}

impl LookupError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LookupError::Timeout { .. } | LookupError::Network { .. } | LookupError::Upstream { .. }
        )
    }

    pub fn invalid_phone(phone: impl Into<String>) -> Self {
        LookupError::InvalidPhoneFormat { phone: phone.into() }
    }

    pub fn network(provider: impl Into<String>, message: impl ToString) -> Self {
        LookupError::Network {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub fn upstream(provider: impl Into<String>, message: impl ToString) -> Self {
        LookupError::Upstream {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub fn authentication(provider: impl Into<String>, message: impl ToString) -> Self {
        LookupError::Authentication {
            provider: provider.into(),
            message: message.to_string(),
        }
    }
}

/// Helper function to extract English message from bilingual error
pub fn extract_english_message(message: &str) -> &str {
    message.split(" | ").next().unwrap_or(message)
}

/// Helper function to extract Chinese message from bilingual error
pub fn extract_chinese_message(message: &str) -> &str {
    message.split(" | ").nth(1).unwrap_or(message)
}
