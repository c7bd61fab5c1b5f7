//! Integration tests for the lookup endpoints

mod common;

#[cfg(test)]
mod lookup_tests {
    use actix_web::http::{header, StatusCode};
    use actix_web::test;
    use serde_json::{json, Value};

    use sd_api::app::create_app;

    use sd_shared::config::Environment;

    use crate::common::{fixture, fixture_for};

    const PAYLOAD_LIMIT: usize = 256 * 1024;

    #[actix_web::test]
    async fn test_health_reports_components() {
        let fx = fixture();
        let app = test::init_service(create_app(fx.state.clone(), PAYLOAD_LIMIT)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["services"]["lookup"]["status"], "healthy");
        assert!(body["services"]["monitor"]["message"]
            .as_str()
            .unwrap()
            .starts_with("idle"));
    }

    #[actix_web::test]
    async fn test_single_lookup() {
        let fx = fixture();
        let app = test::init_service(create_app(fx.state.clone(), PAYLOAD_LIMIT)).await;

        let req = test::TestRequest::get()
            .uri("/api/phone-lookup?phone=13800138000")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["data"]["carrier"], "中国移动");
        assert_eq!(body["data"]["provider"], "offline");
        assert!(body["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn test_second_lookup_is_cached() {
        let fx = fixture();
        let app = test::init_service(create_app(fx.state.clone(), PAYLOAD_LIMIT)).await;

        for expected in ["offline", "offline(cached)"] {
            let req = test::TestRequest::get()
                .uri("/api/phone-lookup?phone=13800138000")
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["data"]["provider"], expected);
        }
    }

    #[actix_web::test]
    async fn test_invalid_number_is_unsuccessful_lookup() {
        let fx = fixture();
        let app = test::init_service(create_app(fx.state.clone(), PAYLOAD_LIMIT)).await;

        let req = test::TestRequest::get()
            .uri("/api/phone-lookup?phone=12345")
            .insert_header((header::ACCEPT_LANGUAGE, "zh-CN"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["data"]["success"], false);
        assert!(body["error"].as_str().unwrap().contains("无效的手机号码格式"));
    }

    #[actix_web::test]
    async fn test_missing_phone_is_bad_request() {
        let fx = fixture();
        let app = test::init_service(create_app(fx.state.clone(), PAYLOAD_LIMIT)).await;

        let req = test::TestRequest::get().uri("/api/phone-lookup").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_batch_lookup() {
        let fx = fixture();
        let app = test::init_service(create_app(fx.state.clone(), PAYLOAD_LIMIT)).await;

        let req = test::TestRequest::post()
            .uri("/api/phone-lookup/batch")
            .set_json(json!({ "phones": ["13800138000", "18600001111", "bad"] }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["totalCount"], 3);
        assert_eq!(body["data"]["successCount"], 2);
        assert_eq!(body["data"]["results"]["18600001111"]["data"]["carrier"], "中国联通");
        assert_eq!(body["data"]["results"]["bad"]["success"], false);
    }

    #[actix_web::test]
    async fn test_batch_limits() {
        let fx = fixture();
        let app = test::init_service(create_app(fx.state.clone(), PAYLOAD_LIMIT)).await;

        let empty = test::TestRequest::post()
            .uri("/api/phone-lookup/batch")
            .set_json(json!({ "phones": [] }))
            .to_request();
        assert_eq!(test::call_service(&app, empty).await.status(), StatusCode::BAD_REQUEST);

        let phones: Vec<String> = (0..501).map(|i| format!("1380000{:04}", i)).collect();
        let too_many = test::TestRequest::post()
            .uri("/api/phone-lookup/batch")
            .set_json(json!({ "phones": phones }))
            .to_request();
        assert_eq!(test::call_service(&app, too_many).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_malformed_json_stays_in_envelope() {
        let fx = fixture();
        let app = test::init_service(create_app(fx.state.clone(), PAYLOAD_LIMIT)).await;

        let req = test::TestRequest::post()
            .uri("/api/phone-lookup/batch")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Malformed JSON body"));
    }

    #[actix_web::test]
    async fn test_provider_status_and_tokens() {
        let fx = fixture();
        let app = test::init_service(create_app(fx.state.clone(), PAYLOAD_LIMIT)).await;

        let req = test::TestRequest::get()
            .uri("/api/phone-lookup/providers")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let providers = body["data"].as_array().unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0]["name"], "offline");

        // the offline provider has no token
        let req = test::TestRequest::put()
            .uri("/api/phone-lookup/tokens")
            .set_json(json!({ "tokens": { "chahaoba": "abc" } }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["applied"], 0);
    }

    #[actix_web::test]
    async fn test_clear_cache() {
        let fx = fixture();
        let app = test::init_service(create_app(fx.state.clone(), PAYLOAD_LIMIT)).await;

        let req = test::TestRequest::get()
            .uri("/api/phone-lookup?phone=13800138000")
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::delete()
            .uri("/api/phone-lookup/cache")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["clearedEntries"], 1);
        assert_eq!(fx.state.lookup.cache_size().await, 0);
    }

    #[actix_web::test]
    async fn test_unknown_route() {
        let fx = fixture();
        let app = test::init_service(create_app(fx.state.clone(), PAYLOAD_LIMIT)).await;

        let req = test::TestRequest::get().uri("/api/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_cors_follows_configured_environment() {
        let dev = fixture_for(Environment::Development);
        let app = test::init_service(create_app(dev.state.clone(), PAYLOAD_LIMIT)).await;
        let req = test::TestRequest::get()
            .uri("/health")
            .insert_header((header::ORIGIN, "https://unlisted.example.com"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

        let prod = fixture_for(Environment::Production);
        let app = test::init_service(create_app(prod.state.clone(), PAYLOAD_LIMIT)).await;
        let req = test::TestRequest::get()
            .uri("/health")
            .insert_header((header::ORIGIN, "https://unlisted.example.com"))
            .to_request();
        let resp = test::try_call_service(&app, req).await;
        assert!(resp.map(|r| !r.status().is_success()).unwrap_or(true));
    }
}
