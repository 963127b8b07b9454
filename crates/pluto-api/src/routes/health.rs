//! 헬스 체크 및 시스템 상태 라우트.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::state::AppState;

/// 헬스 체크 응답.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 전체 서비스 상태
    pub status: String,
    /// 서비스 이름
    pub service: String,
    /// API 버전
    pub version: String,
    /// 서버 업타임(초)
    pub uptime_secs: i64,
    /// 연결된 텔레메트리 구독자 수
    pub websocket_clients: usize,
}

/// 시스템 상태 응답.
#[derive(Debug, Serialize)]
pub struct SystemStatusResponse {
    /// 백엔드 상태
    pub backend: String,
    /// 브로커 연결 여부 (계좌 조회 성공 기준)
    pub alpaca_connected: bool,
    /// 모의투자 모드 여부
    pub alpaca_paper: bool,
    /// 연결된 텔레메트리 구독자 수
    pub websocket_clients: usize,
    /// 브로커 계좌 상태 (연결된 경우)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_status: Option<String>,
}

/// 헬스 체크 (공개).
///
/// # 엔드포인트
///
/// `GET /api/health`
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "Pluto Lander Backend".to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        websocket_clients: state.subscriber_count().await,
    })
}

/// 전체 시스템 상태 조회.
///
/// # 엔드포인트
///
/// `GET /api/system/status`
pub async fn system_status(
    AuthUser(_claims): AuthUser,
    State(state): State<Arc<AppState>>,
) -> Json<SystemStatusResponse> {
    let settings = state.settings.current();
    let account = state.broker.account().await;

    Json(SystemStatusResponse {
        backend: "online".to_string(),
        alpaca_connected: account.is_some(),
        alpaca_paper: settings.alpaca_paper,
        websocket_clients: state.subscriber_count().await,
        account_status: account.map(|a| a.status),
    })
}

/// 헬스/상태 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/system/status", get(system_status))
}
