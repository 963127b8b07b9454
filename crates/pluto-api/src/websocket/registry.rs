//! 텔레메트리 구독자 registry.
//!
//! 현재 연결된 구독자를 추적합니다. 각 구독자는 연결 시점에 고유
//! ID를 부여받고 자신만의 unbounded 채널을 가지므로, 느린 구독자가
//! 다른 구독자로의 전달을 막지 못합니다.
//!
//! 팬아웃 중 registry가 변경되어도 안전합니다. 브로드캐스트는 스냅샷
//! 위에서 이루어지고, 제거는 락 아래에서 일어납니다.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use pluto_core::TelemetryEvent;

/// 구독자로의 이벤트 송신 핸들.
pub type SubscriberSender = mpsc::UnboundedSender<TelemetryEvent>;

/// 구독자 registry.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<Uuid, SubscriberSender>>,
}

impl SubscriberRegistry {
    /// 새 registry 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 새 구독자 등록.
    ///
    /// # Returns
    ///
    /// (구독자 ID, 구독자 측 송신 핸들, 이벤트 수신기).
    /// 송신 핸들은 구독자 자신의 수신 루프가 pong을 큐잉할 때
    /// 사용합니다.
    pub async fn add(
        &self,
    ) -> (
        Uuid,
        SubscriberSender,
        mpsc::UnboundedReceiver<TelemetryEvent>,
    ) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut subscribers = self.subscribers.write().await;
        subscribers.insert(id, tx.clone());

        (id, tx, rx)
    }

    /// 구독자 제거.
    pub async fn remove(&self, id: &Uuid) -> bool {
        let mut subscribers = self.subscribers.write().await;
        subscribers.remove(id).is_some()
    }

    /// 현재 구독자 스냅샷 반환.
    ///
    /// 반환된 스냅샷을 순회하는 동안 registry가 변경되어도 안전합니다.
    pub async fn snapshot(&self) -> Vec<(Uuid, SubscriberSender)> {
        let subscribers = self.subscribers.read().await;
        subscribers
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }

    /// 연결된 구독자 수.
    pub async fn count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// 구독자가 없는지 확인.
    pub async fn is_empty(&self) -> bool {
        self.subscribers.read().await.is_empty()
    }
}

/// 공유 가능한 registry 타입.
pub type SharedSubscriberRegistry = Arc<SubscriberRegistry>;

/// 새 공유 registry 생성.
pub fn create_subscriber_registry() -> SharedSubscriberRegistry {
    Arc::new(SubscriberRegistry::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_assigns_unique_ids() {
        let registry = SubscriberRegistry::new();

        let (id1, _tx1, _rx1) = registry.add().await;
        let (id2, _tx2, _rx2) = registry.add().await;

        assert_ne!(id1, id2);
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = SubscriberRegistry::new();
        let (id, _tx, _rx) = registry.add().await;

        assert!(registry.remove(&id).await);
        assert!(!registry.remove(&id).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_snapshot_decoupled_from_mutation() {
        let registry = SubscriberRegistry::new();
        let (id1, _tx1, mut rx1) = registry.add().await;
        let (_id2, _tx2, _rx2) = registry.add().await;

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 2);

        // 스냅샷을 잡은 뒤 제거해도 스냅샷 송신은 여전히 동작
        registry.remove(&id1).await;
        assert_eq!(registry.count().await, 1);

        for (_, tx) in &snapshot {
            let _ = tx.send(TelemetryEvent::Pong);
        }
        assert!(matches!(rx1.try_recv(), Ok(TelemetryEvent::Pong)));
    }
}
