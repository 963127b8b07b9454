//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/api/health` - 헬스 체크 (공개)
//! - `/api/system/status` - 시스템 상태
//! - `/api/auth` - 로그인, 현재 사용자
//! - `/api/settings` - 설정 조회/갱신
//! - `/api/alpaca` - 계좌/포지션/주문/시세 패스스루
//! - `/api/trade-signal` - 트레이드 시그널 수신

pub mod auth;
pub mod broker;
pub mod health;
pub mod settings;
pub mod signals;

pub use auth::{auth_router, LoginResponse, UserPublic};
pub use broker::{broker_router, BarsQuery, OrdersQuery};
pub use health::{health_router, HealthResponse, SystemStatusResponse};
pub use settings::{settings_router, SettingsResponse};
pub use signals::signals_router;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 모든 서브 라우터를 조합하여 하나의 라우터로 반환합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health_router())
        .merge(signals_router())
        .merge(settings_router())
        .nest("/api/auth", auth_router())
        .nest("/api/alpaca", broker_router())
}
