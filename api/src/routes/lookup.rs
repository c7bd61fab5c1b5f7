//! Carrier lookup endpoints

use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use sd_core::repositories::SmsRecordRepository;
use sd_core::services::monitor::SmsStatusClient;
use sd_shared::phone::mask_phone_number;
use sd_shared::types::ApiResponse;

use crate::dto::{
    BatchLookupRequest, ClearCacheResponse, PhoneQuery, SetTokensRequest, SetTokensResponse,
};
use crate::handlers::{validation_error, Language};

use super::AppState;

/// Handler for GET /api/phone-lookup?phone=
///
/// Always answers 200 once the query is well-formed; an unresolved lookup
/// carries `success: false` with the `PhoneResult` as data.
pub async fn lookup_phone<R, C>(
    req: HttpRequest,
    state: web::Data<AppState<R, C>>,
    query: web::Query<PhoneQuery>,
) -> HttpResponse
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    let lang = Language::from_request(&req);
    if let Err(errors) = query.validate() {
        return validation_error(&errors, lang);
    }

    tracing::info!(phone = %mask_phone_number(&query.phone), "Phone lookup requested");
    let result = state.lookup.lookup(&query.phone).await;

    if result.success {
        HttpResponse::Ok().json(ApiResponse::success(result))
    } else {
        let error = result
            .error
            .as_deref()
            .map(|e| lang.localize(e).to_string())
            .unwrap_or_default();
        HttpResponse::Ok().json(ApiResponse::failure_with(result, error))
    }
}

/// Handler for POST /api/phone-lookup/batch
pub async fn batch_lookup<R, C>(
    req: HttpRequest,
    state: web::Data<AppState<R, C>>,
    body: web::Json<BatchLookupRequest>,
) -> HttpResponse
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    if let Err(errors) = body.validate() {
        return validation_error(&errors, Language::from_request(&req));
    }

    tracing::info!(count = body.phones.len(), "Batch phone lookup requested");
    let result = state.lookup.batch_lookup(&body.phones).await;
    tracing::info!(
        total = result.total_count,
        succeeded = result.success_count,
        failed = result.failure_count,
        "Batch phone lookup finished"
    );

    HttpResponse::Ok().json(ApiResponse::success(result))
}

/// Handler for GET /api/phone-lookup/providers
pub async fn provider_status<R, C>(state: web::Data<AppState<R, C>>) -> HttpResponse
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    HttpResponse::Ok().json(ApiResponse::success(state.lookup.provider_status().await))
}

/// Handler for PUT /api/phone-lookup/tokens
pub async fn set_tokens<R, C>(
    req: HttpRequest,
    state: web::Data<AppState<R, C>>,
    body: web::Json<SetTokensRequest>,
) -> HttpResponse
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    if let Err(errors) = body.validate() {
        return validation_error(&errors, Language::from_request(&req));
    }

    let applied = state.lookup.set_tokens(&body.tokens).await;
    tracing::info!(requested = body.tokens.len(), applied, "Provider tokens updated");
    HttpResponse::Ok().json(ApiResponse::success(SetTokensResponse { applied }))
}

/// Handler for DELETE /api/phone-lookup/cache
pub async fn clear_cache<R, C>(state: web::Data<AppState<R, C>>) -> HttpResponse
where
    R: SmsRecordRepository + 'static,
    C: SmsStatusClient + 'static,
{
    let cleared_entries = state.lookup.cache_size().await;
    state.lookup.clear_cache().await;
    tracing::info!(cleared_entries, "Lookup caches cleared");
    HttpResponse::Ok().json(ApiResponse::success(ClearCacheResponse { cleared_entries }))
}
