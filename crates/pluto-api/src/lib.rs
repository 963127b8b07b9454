//! REST API 및 WebSocket 텔레메트리 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (인증, 설정, 브로커 패스스루, 시그널 수신)
//! - 실시간 텔레메트리 팬아웃을 위한 WebSocket 서버
//! - 주기적 시장 데이터 폴러
//! - JWT 인증
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: JWT 인증 및 비밀번호 해싱
//! - [`websocket`]: 구독자 registry, 텔레메트리 허브, 연결 handler
//! - [`services`]: 시그널/주문 릴레이, 시장 데이터 폴러
//! - [`metrics`]: Prometheus 메트릭 수집

pub mod auth;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod services;
pub mod state;
pub mod websocket;

pub use auth::{ensure_default_user, AuthUser, Claims, JwtConfig};
pub use error::{ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use routes::create_api_router;
pub use services::{start_market_poller, MarketPoller, SignalRelay};
pub use state::AppState;
pub use websocket::{
    create_subscriber_registry, create_telemetry_hub, telemetry_ws_router, SubscriberRegistry,
    TelemetryHub, WsState,
};
