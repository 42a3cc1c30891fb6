//! HTTP Handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use agent_core::{AgentError, EntrypointCall, EntrypointManifest};
use agent_payments::{ChargeReceipt, CreditKey, CreditVerification, PaymentError, SIGNATURE_HEADER};

use crate::state::AppState;

pub const CREDIT_KEY_HEADER: &str = "x-credit-key";
pub const CREDIT_BALANCE_HEADER: &str = "x-credit-balance";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub agent: String,
    pub version: String,
    pub entrypoints: usize,
    pub payments_enabled: bool,
}

#[derive(Serialize)]
pub struct EntrypointsResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub entrypoints: Vec<EntrypointManifest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvokeRequest {
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCreditsRequest {
    pub credit_key: String,
}

/// Errors surfaced to HTTP clients
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Entrypoint not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PaymentRequired(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "ENTRYPOINT_NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ApiError::PaymentRequired(_) => (StatusCode::PAYMENT_REQUIRED, "PAYMENT_REQUIRED"),
            ApiError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(ErrorResponse { error: self.to_string(), code })).into_response()
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::EntrypointNotFound(key) => ApiError::NotFound(key),
            AgentError::InvalidInput(msg) => ApiError::BadRequest(msg),
            AgentError::RateLimited(_) => ApiError::RateLimited(err.user_message()),
            AgentError::ProviderUnavailable(_) => ApiError::Unavailable(err.user_message()),
            other => ApiError::Internal(other.user_message()),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        if err.is_payment_required() {
            return ApiError::PaymentRequired(err.user_message().into());
        }
        match err {
            PaymentError::RateLimited(_) => ApiError::RateLimited(err.user_message().into()),
            PaymentError::WebhookSignature(_) | PaymentError::WebhookParse(_) | PaymentError::InvalidAmount(_) => {
                ApiError::BadRequest(err.to_string())
            }
            other => ApiError::Internal(other.user_message().into()),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        agent: state.agent.name.clone(),
        version: state.agent.version.clone(),
        entrypoints: state.registry.len(),
        payments_enabled: state.metering,
    })
}

/// Manifest of every entrypoint with its price
pub async fn list_entrypoints(State(state): State<AppState>) -> Json<EntrypointsResponse> {
    Json(EntrypointsResponse {
        name: state.agent.name.clone(),
        version: state.agent.version.clone(),
        description: state.agent.description.clone(),
        entrypoints: state.registry.manifests(),
    })
}

/// Charge the caller for a priced entrypoint; `None` when nothing is owed
fn charge(state: &AppState, key: &str, headers: &HeaderMap) -> Result<Option<(CreditKey, ChargeReceipt)>, ApiError> {
    let price = state.prices.price(key);
    if !state.metering || price.is_zero() {
        return Ok(None);
    }

    let raw = headers
        .get(CREDIT_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::PaymentRequired(format!("{key} costs ${price} per call; send {CREDIT_KEY_HEADER}")))?;
    let credit_key = CreditKey::parse(raw)?;
    let receipt = state.ledger.charge(&credit_key, price)?;

    tracing::info!(entrypoint = key, credit_key = %credit_key.masked(), charged = %receipt.charged, "Charged call");
    Ok(Some((credit_key, receipt)))
}

/// Invoke an entrypoint by key
pub async fn invoke_entrypoint(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let entrypoint = state
        .registry
        .get(&key)
        .ok_or_else(|| ApiError::NotFound(key.clone()))?;

    let request: InvokeRequest = if body.is_empty() {
        InvokeRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };

    let id = request.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let call = EntrypointCall::new(key.clone(), request.input).with_id(id);

    // Missing parameters are rejected before charging; later failures are refunded
    entrypoint.validate(&call)?;
    let charged = charge(&state, &key, &headers)?;

    match state.registry.invoke(&call).await {
        Ok(output) => {
            tracing::debug!(entrypoint = %key, success = output.success, "Entrypoint invoked");
            let mut response = Json(output).into_response();
            if let Some((_, receipt)) = &charged {
                if let Ok(value) = HeaderValue::from_str(&receipt.balance.to_string()) {
                    response.headers_mut().insert(CREDIT_BALANCE_HEADER, value);
                }
            }
            Ok(response)
        }
        Err(e) => {
            if let Some((credit_key, receipt)) = charged {
                if let Err(refund) = state.ledger.credit(&credit_key, receipt.charged) {
                    tracing::error!(credit_key = %credit_key.masked(), error = %refund, "Refund failed");
                }
            }
            tracing::warn!(entrypoint = %key, error = %e, "Entrypoint failed");
            Err(e.into())
        }
    }
}

/// Signed credit top-up from the payment processor
pub async fn credit_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let handler = state
        .top_ups
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("Payments not configured".into()))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing {SIGNATURE_HEADER} header")))?;

    let outcome = handler.handle(&body, signature).map_err(|e| {
        tracing::warn!(error = %e, "Top-up rejected");
        ApiError::from(e)
    })?;

    Ok(Json(outcome).into_response())
}

/// Balance and remaining daily requests for a credit key
pub async fn verify_credits(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCreditsRequest>,
) -> Result<Json<CreditVerification>, ApiError> {
    let Ok(key) = CreditKey::parse(&payload.credit_key) else {
        return Ok(Json(CreditVerification::invalid("Credit key not found")));
    };
    Ok(Json(state.ledger.verify(&key)?))
}

/// Agent logo for directory listings
pub async fn logo(State(state): State<AppState>) -> Response {
    match tokio::fs::read(state.public_dir.join("logo.jpg")).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "image/jpeg"),
                (header::CACHE_CONTROL, "public, max-age=86400"),
            ],
            bytes,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Logo not found").into_response(),
    }
}
