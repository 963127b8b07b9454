//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 안전하게 공유됩니다.
//! 프로세스 전역 싱글턴 대신 registry/허브를 명시적으로 주입합니다.

use std::sync::Arc;

use pluto_broker::Brokerage;
use pluto_core::SettingsStore;

use crate::services::SignalRelay;
use crate::websocket::SharedTelemetryHub;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 설정 저장소 (자격증명, 알림 설정)
    pub settings: Arc<SettingsStore>,

    /// 브로커 게이트웨이
    pub broker: Arc<dyn Brokerage>,

    /// 텔레메트리 허브 - 실시간 이벤트 브로드캐스트
    pub hub: SharedTelemetryHub,

    /// 시그널/주문 릴레이
    pub relay: Arc<SignalRelay>,

    /// JWT 서명 시크릿
    pub jwt_secret: String,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    pub fn new(
        settings: Arc<SettingsStore>,
        broker: Arc<dyn Brokerage>,
        hub: SharedTelemetryHub,
        jwt_secret: impl Into<String>,
    ) -> Self {
        let relay = Arc::new(SignalRelay::new(
            broker.clone(),
            hub.clone(),
            settings.clone(),
        ));

        Self {
            settings,
            broker,
            hub,
            relay,
            jwt_secret: jwt_secret.into(),
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 현재 연결된 텔레메트리 구독자 수.
    pub async fn subscriber_count(&self) -> usize {
        self.hub.registry().count().await
    }

    /// 서버 업타임(초) 반환.
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}
