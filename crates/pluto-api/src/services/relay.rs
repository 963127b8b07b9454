//! 시그널/주문 릴레이.
//!
//! 유입된 트레이드 시그널과 주문 요청을 검증하고 브로커 게이트웨이와
//! 텔레메트리 허브로 전달합니다. 검증 실패는 어떤 외부 호출보다
//! 먼저 거부됩니다.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use pluto_broker::{BrokerError, Brokerage, OrderInfo};
use pluto_core::{
    OrderKind, OrderTicket, SettingsStore, Side, TelemetryEvent, TimeInForce, TradeSignal,
};
use pluto_notification::dispatch_trade_notification;

use crate::metrics::record_order;
use crate::websocket::SharedTelemetryHub;

/// 릴레이 에러.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// 요청 유효성 검증 실패 (외부 호출 전 거부)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// 브로커 에러 (미설정, 거부, 전송 실패)
    #[error(transparent)]
    Broker(#[from] BrokerError),
}

fn default_confidence() -> f64 {
    0.5
}

/// 유입 트레이드 시그널 요청.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeSignalRequest {
    /// 심볼
    pub symbol: String,
    /// 방향 문자열 ("buy" | "sell")
    pub side: String,
    /// 신뢰도 (0.0 ~ 1.0)
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// 시그널 사유
    #[serde(default)]
    pub reason: Option<String>,
    /// 참고 가격
    #[serde(default)]
    pub price: Option<f64>,
    /// 부가 데이터
    #[serde(default)]
    pub extra: Map<String, Value>,
}

fn default_order_type() -> String {
    "market".to_string()
}

fn default_time_in_force() -> String {
    "day".to_string()
}

/// 주문 제출 요청.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderSubmitRequest {
    /// 심볼
    pub symbol: String,
    /// 수량
    pub qty: Decimal,
    /// 방향 문자열 ("buy" | "sell")
    pub side: String,
    /// 주문 유형 ("market" | "limit")
    #[serde(rename = "type", default = "default_order_type")]
    pub order_type: String,
    /// 유효 기간
    #[serde(default = "default_time_in_force")]
    pub time_in_force: String,
    /// 지정가 (limit 주문 필수)
    #[serde(default)]
    pub limit_price: Option<Decimal>,
}

/// 시그널/주문 릴레이.
pub struct SignalRelay {
    broker: Arc<dyn Brokerage>,
    hub: SharedTelemetryHub,
    settings: Arc<SettingsStore>,
}

impl SignalRelay {
    /// 새 릴레이 생성.
    pub fn new(
        broker: Arc<dyn Brokerage>,
        hub: SharedTelemetryHub,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            broker,
            hub,
            settings,
        }
    }

    /// 트레이드 시그널 수신 처리.
    ///
    /// 검증 → 텔레메트리 발행 → 알림 발송(fire-and-forget) 순서로
    /// 진행합니다. 알림 실패는 발행을 되돌리지 않습니다.
    pub async fn ingest_signal(&self, req: TradeSignalRequest) -> Result<(), RelayError> {
        let side = Side::parse(&req.side)
            .ok_or_else(|| RelayError::Validation("side must be 'buy' or 'sell'".to_string()))?;

        let signal = TradeSignal {
            symbol: req.symbol,
            side,
            confidence: req.confidence,
            reason: req.reason,
            price: req.price,
            extra: req.extra,
        };
        signal
            .validate()
            .map_err(|e| RelayError::Validation(e.to_string()))?;

        info!(
            symbol = %signal.symbol,
            side = %signal.side,
            confidence = signal.confidence,
            "Trade signal received"
        );

        self.hub.publish(TelemetryEvent::from_signal(&signal)).await;

        dispatch_trade_notification(&self.settings.current(), signal);

        Ok(())
    }

    /// 주문 요청을 브로커로 릴레이.
    ///
    /// 성공 시 제출된 주문을 반영하는 `order_submitted` 이벤트를
    /// 발행합니다. 거부된 주문은 텔레메트리에 남기지 않습니다.
    pub async fn relay_order(&self, req: OrderSubmitRequest) -> Result<OrderInfo, RelayError> {
        let ticket = Self::build_ticket(req)?;

        let order = match self.broker.submit_order(&ticket).await {
            Ok(order) => order,
            Err(e) => {
                record_order(ticket.side.as_str(), "rejected");
                return Err(e.into());
            }
        };
        record_order(ticket.side.as_str(), "submitted");

        let mut extra = Map::new();
        extra.insert("qty".to_string(), Value::String(ticket.qty.to_string()));
        extra.insert(
            "order_type".to_string(),
            Value::String(ticket.kind.as_str().to_string()),
        );

        self.hub
            .publish(TelemetryEvent::OrderSubmitted {
                symbol: ticket.symbol,
                side: ticket.side,
                extra,
            })
            .await;

        Ok(order)
    }

    /// 주문 취소 릴레이.
    ///
    /// 취소는 텔레메트리 이벤트를 발행하지 않습니다.
    pub async fn relay_cancel(&self, order_id: &str) -> bool {
        self.broker.cancel_order(order_id).await
    }

    /// 요청 DTO를 검증된 주문 티켓으로 변환.
    fn build_ticket(req: OrderSubmitRequest) -> Result<OrderTicket, RelayError> {
        let side = Side::parse(&req.side)
            .ok_or_else(|| RelayError::Validation("side must be 'buy' or 'sell'".to_string()))?;
        let kind = OrderKind::parse(&req.order_type).ok_or_else(|| {
            RelayError::Validation("type must be 'market' or 'limit'".to_string())
        })?;
        let time_in_force = TimeInForce::parse(&req.time_in_force)
            .ok_or_else(|| RelayError::Validation("invalid time_in_force".to_string()))?;

        let ticket = OrderTicket {
            symbol: req.symbol,
            qty: req.qty,
            side,
            kind,
            time_in_force,
            limit_price: req.limit_price,
        };
        ticket
            .validate()
            .map_err(|e| RelayError::Validation(e.to_string()))?;

        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    use pluto_broker::{AccountSnapshot, BrokerResult, PositionInfo};
    use crate::websocket::{create_subscriber_registry, create_telemetry_hub};

    /// 제출 호출 횟수를 기록하는 테스트 브로커.
    struct MockBroker {
        submit_calls: AtomicUsize,
        reject: bool,
    }

    impl MockBroker {
        fn new(reject: bool) -> Self {
            Self {
                submit_calls: AtomicUsize::new(0),
                reject,
            }
        }
    }

    #[async_trait]
    impl Brokerage for MockBroker {
        fn name(&self) -> &str {
            "mock"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn account(&self) -> Option<AccountSnapshot> {
            None
        }

        async fn positions(&self) -> Vec<PositionInfo> {
            Vec::new()
        }

        async fn orders(&self, _status: &str, _limit: u32) -> Vec<OrderInfo> {
            Vec::new()
        }

        async fn submit_order(&self, ticket: &OrderTicket) -> BrokerResult<OrderInfo> {
            self.submit_calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(BrokerError::Rejected {
                    body: "insufficient buying power".to_string(),
                });
            }
            Ok(OrderInfo {
                id: "ord-1".to_string(),
                client_order_id: None,
                symbol: ticket.symbol.clone(),
                side: ticket.side.as_str().to_string(),
                order_type: ticket.kind.as_str().to_string(),
                qty: Some(ticket.qty),
                filled_qty: Decimal::ZERO,
                status: "accepted".to_string(),
                time_in_force: ticket.time_in_force.as_str().to_string(),
                limit_price: ticket.limit_price,
                filled_avg_price: None,
                submitted_at: None,
            })
        }

        async fn cancel_order(&self, _order_id: &str) -> bool {
            true
        }

        async fn latest_quote(&self, _symbol: &str) -> Option<Value> {
            None
        }

        async fn bars(&self, _symbol: &str, _timeframe: &str, _limit: u32) -> Option<Value> {
            None
        }
    }

    fn temp_settings() -> Arc<SettingsStore> {
        let dir = std::env::temp_dir().join(format!("pluto-relay-{}", uuid::Uuid::new_v4()));
        Arc::new(SettingsStore::open(dir).unwrap())
    }

    fn relay_with(broker: Arc<MockBroker>) -> (SignalRelay, crate::websocket::SharedSubscriberRegistry) {
        let registry = create_subscriber_registry();
        let hub = create_telemetry_hub(registry.clone());
        let relay = SignalRelay::new(broker, hub, temp_settings());
        (relay, registry)
    }

    fn order_request() -> OrderSubmitRequest {
        OrderSubmitRequest {
            symbol: "AAPL".to_string(),
            qty: dec!(10),
            side: "buy".to_string(),
            order_type: "market".to_string(),
            time_in_force: "day".to_string(),
            limit_price: None,
        }
    }

    #[tokio::test]
    async fn test_zero_qty_rejected_before_broker_call() {
        let broker = Arc::new(MockBroker::new(false));
        let (relay, _registry) = relay_with(broker.clone());

        let mut req = order_request();
        req.qty = Decimal::ZERO;

        let result = relay.relay_order(req).await;
        assert!(matches!(result, Err(RelayError::Validation(_))));
        assert_eq!(broker.submit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hold_side_rejected_before_broker_call() {
        let broker = Arc::new(MockBroker::new(false));
        let (relay, _registry) = relay_with(broker.clone());

        let mut req = order_request();
        req.side = "hold".to_string();

        let result = relay.relay_order(req).await;
        assert!(matches!(result, Err(RelayError::Validation(_))));
        assert_eq!(broker.submit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_limit_without_price_rejected() {
        let broker = Arc::new(MockBroker::new(false));
        let (relay, _registry) = relay_with(broker.clone());

        let mut req = order_request();
        req.order_type = "limit".to_string();

        let result = relay.relay_order(req).await;
        assert!(matches!(result, Err(RelayError::Validation(_))));
        assert_eq!(broker.submit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_order_publishes_telemetry() {
        let broker = Arc::new(MockBroker::new(false));
        let (relay, registry) = relay_with(broker.clone());
        let (_id, _tx, mut rx) = registry.add().await;

        let order = relay.relay_order(order_request()).await.unwrap();
        assert_eq!(order.id, "ord-1");

        let event = rx.try_recv().unwrap();
        match event {
            TelemetryEvent::OrderSubmitted { symbol, side, extra } => {
                assert_eq!(symbol, "AAPL");
                assert_eq!(side, Side::Buy);
                assert_eq!(extra["qty"], "10");
                assert_eq!(extra["order_type"], "market");
            }
            other => panic!("Expected OrderSubmitted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_order_publishes_nothing() {
        let broker = Arc::new(MockBroker::new(true));
        let (relay, registry) = relay_with(broker.clone());
        let (_id, _tx, mut rx) = registry.add().await;

        let result = relay.relay_order(order_request()).await;
        assert!(matches!(
            result,
            Err(RelayError::Broker(BrokerError::Rejected { .. }))
        ));
        assert_eq!(broker.submit_calls.load(Ordering::SeqCst), 1);
        // 거부된 주문은 텔레메트리에 남지 않음
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_signal_validation() {
        let broker = Arc::new(MockBroker::new(false));
        let (relay, registry) = relay_with(broker);
        let (_id, _tx, mut rx) = registry.add().await;

        let bad_confidence = TradeSignalRequest {
            symbol: "BTCUSD".to_string(),
            side: "buy".to_string(),
            confidence: 1.5,
            reason: None,
            price: None,
            extra: Map::new(),
        };
        assert!(matches!(
            relay.ingest_signal(bad_confidence).await,
            Err(RelayError::Validation(_))
        ));
        assert!(rx.try_recv().is_err());

        let valid = TradeSignalRequest {
            symbol: "BTCUSD".to_string(),
            side: "buy".to_string(),
            confidence: 0.8,
            reason: Some("breakout".to_string()),
            price: Some(105000.0),
            extra: Map::new(),
        };
        relay.ingest_signal(valid).await.unwrap();

        match rx.try_recv().unwrap() {
            TelemetryEvent::TradeSignal { symbol, confidence, .. } => {
                assert_eq!(symbol, "BTCUSD");
                assert_eq!(confidence, 0.8);
            }
            other => panic!("Expected TradeSignal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_relay_cancel_delegates() {
        let broker = Arc::new(MockBroker::new(false));
        let (relay, registry) = relay_with(broker);
        let (_id, _tx, mut rx) = registry.add().await;

        assert!(relay.relay_cancel("ord-1").await);
        // 취소는 텔레메트리 이벤트를 만들지 않음
        assert!(rx.try_recv().is_err());
    }
}
