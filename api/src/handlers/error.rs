//! Mapping of domain errors onto HTTP responses
//!
//! Every error leaves the API in the `ApiResponse` envelope. Bilingual
//! domain messages ("English | 中文") are reduced to the language the
//! client asked for.

use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::http::{header, StatusCode};
use actix_web::{HttpRequest, HttpResponse};
use validator::ValidationErrors;

use sd_core::errors::{extract_chinese_message, extract_english_message, DomainError, LookupError};
use sd_shared::types::ApiResponse;

/// Language preference for error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Chinese,
}

impl Language {
    /// Detect the preferred language from `Accept-Language`
    pub fn from_request(req: &HttpRequest) -> Self {
        let Some(value) = req
            .headers()
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
        else {
            return Language::English;
        };

        let mut preferred = Language::English;
        let mut best_quality = 0.0_f32;
        for entry in value.split(',') {
            let mut parts = entry.trim().split(';');
            let tag = parts.next().unwrap_or_default().to_lowercase();
            let quality = parts
                .next()
                .and_then(|q| q.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);

            let language = if tag.starts_with("zh") {
                Language::Chinese
            } else if tag.starts_with("en") {
                Language::English
            } else {
                continue;
            };
            if quality > best_quality {
                preferred = language;
                best_quality = quality;
            }
        }
        preferred
    }

    /// Pick this language's half of a bilingual message
    pub fn localize<'a>(&self, message: &'a str) -> &'a str {
        match self {
            Language::English => extract_english_message(message),
            Language::Chinese => extract_chinese_message(message),
        }
    }
}

/// Error envelope with the given status
pub fn error_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ApiResponse::<()>::error(message))
}

/// HTTP status for a domain error
pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Validation { .. } => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
        DomainError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        DomainError::Lookup(lookup) => match lookup {
            LookupError::InvalidPhoneFormat { .. } => StatusCode::BAD_REQUEST,
            LookupError::NotConfigured { .. } | LookupError::NoProviderAvailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            LookupError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        },
    }
}

/// Convert a domain error into an envelope response
pub fn handle_domain_error_with_lang(error: DomainError, lang: Language) -> HttpResponse {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!(error = %error, "Request failed");
    } else {
        tracing::warn!(error = %error, "Request rejected");
    }

    let message = error.to_string();
    error_response(status, lang.localize(&message))
}

/// 400 listing every invalid field
pub fn validation_error(errors: &ValidationErrors, lang: Language) -> HttpResponse {
    let mut fields: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let reasons: Vec<String> = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            format!("{}: {}", field, reasons.join(", "))
        })
        .collect();
    fields.sort();

    let prefix = match lang {
        Language::English => "Invalid request",
        Language::Chinese => "请求参数无效",
    };
    tracing::warn!(fields = ?fields, "Request validation failed");
    error_response(StatusCode::BAD_REQUEST, format!("{}: {}", prefix, fields.join("; ")))
}

/// Keeps malformed JSON bodies inside the envelope
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let message = match Language::from_request(req) {
        Language::English => format!("Malformed JSON body: {}", err),
        Language::Chinese => format!("JSON 请求体格式错误: {}", err),
    };
    let response = error_response(StatusCode::BAD_REQUEST, message);
    InternalError::from_response(err, response).into()
}

/// Keeps malformed query strings inside the envelope
pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    let message = match Language::from_request(req) {
        Language::English => format!("Malformed query string: {}", err),
        Language::Chinese => format!("查询参数格式错误: {}", err),
    };
    let response = error_response(StatusCode::BAD_REQUEST, message);
    InternalError::from_response(err, response).into()
}
