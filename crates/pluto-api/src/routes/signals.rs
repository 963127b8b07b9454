//! 트레이드 시그널 라우트.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::services::{RelayError, TradeSignalRequest};
use crate::state::AppState;

/// 트레이드 시그널 수신.
///
/// 시그널은 텔레메트리로 발행되고, 설정된 채널로 best-effort 알림이
/// 발송됩니다.
///
/// # 엔드포인트
///
/// `POST /api/trade-signal`
pub async fn trade_signal(
    AuthUser(_claims): AuthUser,
    State(state): State<Arc<AppState>>,
    Json(request): Json<TradeSignalRequest>,
) -> ApiResult<Json<Value>> {
    state.relay.ingest_signal(request).await.map_err(|e| match e {
        RelayError::Validation(message) => (
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::new("VALIDATION_FAILED", message)),
        ),
        RelayError::Broker(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ApiErrorResponse::new("BROKER_UNAVAILABLE", e.to_string())),
        ),
    })?;

    Ok(Json(json!({ "status": "ok" })))
}

/// 시그널 라우터 생성.
pub fn signals_router() -> Router<Arc<AppState>> {
    Router::new().route("/api/trade-signal", post(trade_signal))
}
