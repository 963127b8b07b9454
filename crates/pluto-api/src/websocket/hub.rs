//! 텔레메트리 팬아웃 허브.
//!
//! 프로듀서(시그널 유입, 주문 릴레이, 폴러)가 발행한 이벤트를 현재
//! 연결된 모든 구독자에게 전달하고, 죽은 구독자를 정리합니다.
//!
//! # 전달 보장
//!
//! - 한 번의 publish는 호출 시점 스냅샷 크기만큼의 전달 시도를
//!   수행합니다 (결정적).
//! - publish 호출은 내부 뮤텍스로 직렬화되어, 구독자 단위로는 전역
//!   publish 순서가 보존됩니다. 구독자 간 순서는 보장하지 않습니다.
//! - 개별 구독자 송신 실패는 해당 구독자만 죽은 것으로 표시하며,
//!   같은 패스의 나머지 구독자에게는 영향을 주지 않습니다. 죽은
//!   구독자는 패스 종료 후 registry에서 제거됩니다.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use pluto_core::TelemetryEvent;

use super::registry::SharedSubscriberRegistry;
use crate::metrics::record_telemetry_publish;

/// 텔레메트리 허브.
pub struct TelemetryHub {
    registry: SharedSubscriberRegistry,
    /// publish 패스 직렬화 (구독자별 전역 순서 보장)
    publish_lock: Mutex<()>,
}

impl TelemetryHub {
    /// 새 허브 생성.
    pub fn new(registry: SharedSubscriberRegistry) -> Self {
        Self {
            registry,
            publish_lock: Mutex::new(()),
        }
    }

    /// 구독자 registry 참조.
    pub fn registry(&self) -> &SharedSubscriberRegistry {
        &self.registry
    }

    /// 이벤트를 모든 구독자에게 발행.
    ///
    /// # Returns
    ///
    /// 전달 시도 횟수 (호출 시점 스냅샷 크기와 동일).
    pub async fn publish(&self, event: TelemetryEvent) -> usize {
        let _pass = self.publish_lock.lock().await;

        let snapshot = self.registry.snapshot().await;
        let attempts = snapshot.len();
        if attempts == 0 {
            return 0;
        }

        let mut dead: Vec<Uuid> = Vec::new();
        for (id, tx) in &snapshot {
            // 실패해도 루프는 계속. 나머지 구독자는 여전히 수신해야 함
            if tx.send(event.clone()).is_err() {
                dead.push(*id);
            }
        }

        for id in &dead {
            if self.registry.remove(id).await {
                warn!(subscriber = %id, "Removed dead telemetry subscriber");
            }
        }

        record_telemetry_publish(event.kind(), attempts - dead.len());
        debug!(
            kind = event.kind(),
            attempts,
            failed = dead.len(),
            "Telemetry published"
        );

        attempts
    }
}

/// 공유 가능한 허브 타입.
pub type SharedTelemetryHub = Arc<TelemetryHub>;

/// 새 공유 허브 생성.
pub fn create_telemetry_hub(registry: SharedSubscriberRegistry) -> SharedTelemetryHub {
    Arc::new(TelemetryHub::new(registry))
}
