//! Router

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{
    credit_webhook, health_check, invoke_entrypoint, list_entrypoints, logo, verify_credits,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/logo.jpg", get(logo))

        // Entrypoints
        .route("/entrypoints", get(list_entrypoints))
        .route("/entrypoints/{key}/invoke", post(invoke_entrypoint))

        // Credits
        .route("/api/credits/verify", post(verify_credits))
        .route("/webhook/credits", post(credit_webhook))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use agent_payments::{sign, CreditKey, MemoryCreditLedger, PaymentsConfig};
    use yield_advisor::assess::FixedPicker;
    use yield_advisor::source::MockPoolSource;
    use yield_advisor::YieldContext;

    use crate::handlers::CREDIT_BALANCE_HEADER;
    use crate::state::{yield_registry, AgentInfo};

    const SECRET: &str = "whsec_test";
    const KEY: &str = "AB12-CD34-EF56-7890";

    fn state(metering: bool, secret: Option<&str>) -> AppState {
        let ctx = YieldContext::new(Arc::new(MockPoolSource::new())).with_picker(Arc::new(FixedPicker(0)));
        let payments = PaymentsConfig {
            enabled: metering,
            webhook_secret: secret.map(String::from),
            daily_limit: 100,
        };
        AppState::new(
            AgentInfo {
                name: "yield-finder".into(),
                version: "1.0.0".into(),
                description: "test".into(),
            },
            yield_registry(ctx, None, None),
            &payments,
            Arc::new(MemoryCreditLedger::new(payments.daily_limit)),
            PathBuf::from("does-not-exist"),
        )
        .unwrap()
    }

    fn credit_key() -> CreditKey {
        CreditKey::parse(KEY).unwrap()
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    fn invoke(key: &str, body: Value, credit: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/entrypoints/{key}/invoke"))
            .header("content-type", "application/json");
        if let Some(credit) = credit {
            builder = builder.header("x-credit-key", credit);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, _, body) = send(state(false, None), request).await;

        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["entrypoints"], 4);
    }

    #[tokio::test]
    async fn test_entrypoint_listing() {
        let request = Request::builder().uri("/entrypoints").body(Body::empty()).unwrap();
        let (status, _, body) = send(state(false, None), request).await;

        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        let keys: Vec<&str> = body["entrypoints"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["key"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["analyze-protocol", "compare", "find", "optimize"]);
        assert_eq!(body["entrypoints"][2]["price"], "0.25");
    }

    #[tokio::test]
    async fn test_free_invoke_without_metering() {
        let (status, _, body) = send(state(false, None), invoke("find", json!({"input": {"limit": 2}}), None)).await;

        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["key"], "find");
        assert_eq!(body["success"], true);
        assert!(body["id"].is_string());
        assert_eq!(body["output"]["yields"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_and_invalid() {
        let (status, _, _) = send(state(false, None), invoke("nope", json!({}), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, body) = send(state(false, None), invoke("optimize", json!({"input": {}}), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body)["code"], "INVALID_INPUT");

        let (status, _, _) = send(state(false, None), invoke("find", json!({"input": {"limit": 51}}), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_metered_call_requires_credit() {
        let state = state(true, None);

        let (status, _, _) = send(state.clone(), invoke("find", json!({}), None)).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

        let (status, _, _) = send(state.clone(), invoke("find", json!({}), Some(KEY))).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

        state.ledger.credit(&credit_key(), "0.30".parse().unwrap()).unwrap();
        let (status, headers, _) = send(state.clone(), invoke("find", json!({}), Some(KEY))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CREDIT_BALANCE_HEADER], "0.05");

        let (status, _, _) = send(state, invoke("find", json!({}), Some(KEY))).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn test_failed_call_is_refunded() {
        let state = state(true, None);
        state.ledger.credit(&credit_key(), "1.00".parse().unwrap()).unwrap();

        let (status, _, _) = send(state.clone(), invoke("find", json!({"input": {"limit": 51}}), Some(KEY))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let verification = state.ledger.verify(&credit_key()).unwrap();
        assert_eq!(verification.balance.unwrap().to_string(), "1.00");
    }

    #[tokio::test]
    async fn test_signed_top_up_then_verify() {
        let state = state(true, Some(SECRET));
        let payload = json!({"creditKey": KEY, "amount": "2.00"}).to_string();

        let unsigned = Request::builder()
            .method("POST")
            .uri("/webhook/credits")
            .body(Body::from(payload.clone()))
            .unwrap();
        let (status, _, _) = send(state.clone(), unsigned).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let signed = Request::builder()
            .method("POST")
            .uri("/webhook/credits")
            .header("x-payment-signature", sign(SECRET, payload.as_bytes()).unwrap())
            .body(Body::from(payload))
            .unwrap();
        let (status, _, body) = send(state.clone(), signed).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["created"], true);

        let verify = Request::builder()
            .method("POST")
            .uri("/api/credits/verify")
            .header("content-type", "application/json")
            .body(Body::from(json!({"creditKey": KEY}).to_string()))
            .unwrap();
        let (status, _, body) = send(state, verify).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["valid"], true);
        assert_eq!(body["balance"], "2.00");
    }

    #[tokio::test]
    async fn test_webhook_disabled_without_secret() {
        let request = Request::builder()
            .method("POST")
            .uri("/webhook/credits")
            .body(Body::from("{}"))
            .unwrap();
        let (status, _, _) = send(state(true, None), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_missing_logo() {
        let request = Request::builder().uri("/logo.jpg").body(Body::empty()).unwrap();
        let (status, _, body) = send(state(false, None), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Logo not found");
    }
}
