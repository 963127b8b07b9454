//! 브로커 패스스루 라우트.
//!
//! 계좌/포지션/주문 조회와 주문 제출/취소, 시세 조회 엔드포인트.
//! 조회 실패의 degrade는 게이트웨이가 처리하므로 핸들러는 빈 결과를
//! 그대로 반환합니다.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use pluto_broker::{AccountSnapshot, BrokerError, OrderInfo, PositionInfo};

use crate::auth::AuthUser;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::services::{OrderSubmitRequest, RelayError};
use crate::state::AppState;

/// 주문 내역 조회 쿼리.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    /// 주문 상태 필터 ("all" | "open" | "closed")
    #[serde(default = "default_status")]
    pub status: String,
    /// 최대 결과 개수
    #[serde(default = "default_orders_limit")]
    pub limit: u32,
}

fn default_status() -> String {
    "all".to_string()
}

fn default_orders_limit() -> u32 {
    50
}

/// 봉 데이터 조회 쿼리.
#[derive(Debug, Deserialize)]
pub struct BarsQuery {
    /// 봉 주기 (예: "1Day", "1Hour")
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// 최대 결과 개수
    #[serde(default = "default_bars_limit")]
    pub limit: u32,
}

fn default_timeframe() -> String {
    "1Day".to_string()
}

fn default_bars_limit() -> u32 {
    100
}

/// 릴레이 에러를 API 에러 응답으로 변환.
fn relay_error_response(error: RelayError) -> (StatusCode, Json<ApiErrorResponse>) {
    match error {
        RelayError::Validation(message) => (
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::new("VALIDATION_FAILED", message)),
        ),
        RelayError::Broker(BrokerError::NotConfigured) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiErrorResponse::new(
                "NOT_CONFIGURED",
                "Alpaca API not configured",
            )),
        ),
        RelayError::Broker(BrokerError::Rejected { body }) => (
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::new("BROKER_REJECTED", body)),
        ),
        RelayError::Broker(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ApiErrorResponse::new("BROKER_UNAVAILABLE", e.to_string())),
        ),
    }
}

/// 계좌 정보 조회.
///
/// # 엔드포인트
///
/// `GET /api/alpaca/account`
pub async fn get_account(
    AuthUser(_claims): AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<AccountSnapshot>> {
    match state.broker.account().await {
        Some(account) => Ok(Json(account)),
        None => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiErrorResponse::new(
                "NOT_CONFIGURED",
                "Alpaca not connected or not configured",
            )),
        )),
    }
}

/// 보유 포지션 조회.
///
/// # 엔드포인트
///
/// `GET /api/alpaca/positions`
pub async fn get_positions(
    AuthUser(_claims): AuthUser,
    State(state): State<Arc<AppState>>,
) -> Json<Vec<PositionInfo>> {
    Json(state.broker.positions().await)
}

/// 주문 내역 조회.
///
/// # 엔드포인트
///
/// `GET /api/alpaca/orders?status=all&limit=50`
pub async fn get_orders(
    AuthUser(_claims): AuthUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrdersQuery>,
) -> Json<Vec<OrderInfo>> {
    Json(state.broker.orders(&query.status, query.limit).await)
}

/// 주문 제출.
///
/// # 엔드포인트
///
/// `POST /api/alpaca/order`
pub async fn submit_order(
    AuthUser(_claims): AuthUser,
    State(state): State<Arc<AppState>>,
    Json(request): Json<OrderSubmitRequest>,
) -> ApiResult<Json<OrderInfo>> {
    state
        .relay
        .relay_order(request)
        .await
        .map(Json)
        .map_err(relay_error_response)
}

/// 주문 취소.
///
/// # 엔드포인트
///
/// `DELETE /api/alpaca/order/{order_id}`
pub async fn cancel_order(
    AuthUser(_claims): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<Value>> {
    if state.relay.relay_cancel(&order_id).await {
        Ok(Json(json!({ "status": "cancelled", "order_id": order_id })))
    } else {
        Err((
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::new(
                "CANCEL_FAILED",
                "Failed to cancel order",
            )),
        ))
    }
}

/// 최신 호가 조회.
///
/// # 엔드포인트
///
/// `GET /api/alpaca/quote/{symbol}`
pub async fn get_quote(
    AuthUser(_claims): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<Value>> {
    match state.broker.latest_quote(&symbol).await {
        Some(quote) => Ok(Json(quote)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiErrorResponse::new(
                "QUOTE_NOT_AVAILABLE",
                "Quote not available",
            )),
        )),
    }
}

/// 과거 봉 데이터 조회.
///
/// # 엔드포인트
///
/// `GET /api/alpaca/bars/{symbol}?timeframe=1Day&limit=100`
pub async fn get_bars(
    AuthUser(_claims): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<BarsQuery>,
) -> Json<Value> {
    match state
        .broker
        .bars(&symbol, &query.timeframe, query.limit)
        .await
    {
        Some(bars) => Json(bars),
        // 조회 실패는 빈 결과로 degrade
        None => Json(json!([])),
    }
}

/// 브로커 라우터 생성.
pub fn broker_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/account", get(get_account))
        .route("/positions", get(get_positions))
        .route("/orders", get(get_orders))
        .route("/order", post(submit_order))
        .route("/order/{order_id}", axum::routing::delete(cancel_order))
        .route("/quote/{symbol}", get(get_quote))
        .route("/bars/{symbol}", get(get_bars))
}
