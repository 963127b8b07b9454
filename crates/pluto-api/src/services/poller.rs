//! 시장 데이터 폴러.
//!
//! 고정 주기로 외부 시세와 브로커 계좌를 조회하여 텔레메트리
//! 스냅샷을 합성하고 허브로 발행합니다. 개별 소스의 실패는 해당
//! 필드만 중립값으로 degrade하며, 틱 자체는 절대 루프를 죽이지
//! 않습니다.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::prelude::ToPrimitive;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use pluto_broker::{Brokerage, SpotPriceProvider};
use pluto_core::{TelemetryEvent, TelemetryMode};

use crate::metrics::record_poll_degrade;
use crate::websocket::SharedTelemetryHub;

/// 폴링 주기 (초).
pub const POLL_INTERVAL_SECS: u64 = 5;

/// 스파크라인 샘플 개수.
const SPARKLINE_LEN: usize = 20;

/// 손익 계산 기준이 되는 페이퍼 계좌 시작 자산 (USD).
const PAPER_START_EQUITY_USD: f64 = 100_000.0;

/// 금일 손익 근사에 쓰는 데이트레이딩 매수력 비율.
const DAYTRADE_PROFIT_RATIO: f64 = 0.01;

/// 시장 데이터 폴러.
pub struct MarketPoller {
    spot: Arc<dyn SpotPriceProvider>,
    broker: Arc<dyn Brokerage>,
    hub: SharedTelemetryHub,
    /// 최근 관측 가격 윈도우 (스파크라인/변화율 계산용)
    window: VecDeque<f64>,
}

impl MarketPoller {
    /// 새 폴러 생성.
    pub fn new(
        spot: Arc<dyn SpotPriceProvider>,
        broker: Arc<dyn Brokerage>,
        hub: SharedTelemetryHub,
    ) -> Self {
        Self {
            spot,
            broker,
            hub,
            window: VecDeque::with_capacity(SPARKLINE_LEN),
        }
    }

    /// 폴러 메인 루프.
    ///
    /// 타이머는 구독자 유무와 무관하게 계속 돌며, CancellationToken으로
    /// 종료될 때까지 실행됩니다.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(interval_secs = POLL_INTERVAL_SECS, "Market poller started");

        let mut ticker = tokio::time::interval(Duration::from_secs(POLL_INTERVAL_SECS));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.cancelled() => {
                    info!("Market poller stopped");
                    break;
                }
            }
        }
    }

    /// 한 틱 수행.
    ///
    /// 구독자가 없으면 외부 조회를 생략합니다 (빈 팬아웃은 무해하지만
    /// 브로커/시세 API 호출은 아낍니다).
    pub async fn tick(&mut self) {
        if self.hub.registry().is_empty().await {
            return;
        }

        let event = self.collect().await;
        self.hub.publish(event).await;
    }

    /// 텔레메트리 스냅샷 합성.
    ///
    /// 한 소스의 실패가 다른 소스의 데이터 발행을 막지 않습니다.
    async fn collect(&mut self) -> TelemetryEvent {
        let btc_price = match self.spot.spot_price().await {
            Ok(price) => price,
            Err(e) => {
                warn!(error = %e, "Spot price fetch failed, degrading to 0.0");
                record_poll_degrade("spot");
                0.0
            }
        };

        if btc_price > 0.0 {
            if self.window.len() == SPARKLINE_LEN {
                self.window.pop_front();
            }
            self.window.push_back(btc_price);
        }

        let account = self.broker.account().await;
        let (profit_usd, profit_today, mode) = match &account {
            Some(snapshot) => (
                snapshot.portfolio_value.to_f64().unwrap_or(0.0) - PAPER_START_EQUITY_USD,
                snapshot.daytrading_buying_power.to_f64().unwrap_or(0.0) * DAYTRADE_PROFIT_RATIO,
                TelemetryMode::Live,
            ),
            None => {
                record_poll_degrade("broker");
                (0.0, 0.0, TelemetryMode::Standby)
            }
        };

        TelemetryEvent::Telemetry {
            btc_price,
            btc_change_24h: self.window_change_percent(),
            profit_usd,
            profit_today,
            mode,
            sparkline: self.window.iter().copied().collect(),
        }
    }

    /// 관측 윈도우 기준 변화율 (%).
    ///
    /// 샘플이 둘 미만이면 0.0.
    fn window_change_percent(&self) -> f64 {
        match (self.window.front(), self.window.back()) {
            (Some(first), Some(last)) if self.window.len() >= 2 && *first != 0.0 => {
                (last - first) / first * 100.0
            }
            _ => 0.0,
        }
    }
}

/// 폴러를 백그라운드 태스크로 시작.
pub fn start_market_poller(
    spot: Arc<dyn SpotPriceProvider>,
    broker: Arc<dyn Brokerage>,
    hub: SharedTelemetryHub,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let poller = MarketPoller::new(spot, broker, hub);

    tokio::spawn(async move {
        poller.run(shutdown).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    use pluto_broker::{
        AccountSnapshot, BrokerError, BrokerResult, OrderInfo, PositionInfo,
    };
    use pluto_core::OrderTicket;
    use crate::websocket::{create_subscriber_registry, create_telemetry_hub};

    struct StubSpot {
        price: Option<f64>,
    }

    #[async_trait]
    impl SpotPriceProvider for StubSpot {
        async fn spot_price(&self) -> BrokerResult<f64> {
            self.price
                .ok_or_else(|| BrokerError::Timeout("spot source down".to_string()))
        }
    }

    struct StubBroker {
        connected: bool,
    }

    #[async_trait]
    impl Brokerage for StubBroker {
        fn name(&self) -> &str {
            "stub"
        }

        fn is_configured(&self) -> bool {
            self.connected
        }

        async fn account(&self) -> Option<AccountSnapshot> {
            if !self.connected {
                return None;
            }
            Some(AccountSnapshot {
                status: "ACTIVE".to_string(),
                currency: "USD".to_string(),
                cash: dec!(25000),
                portfolio_value: dec!(102500),
                buying_power: dec!(50000),
                daytrading_buying_power: dec!(100000),
            })
        }

        async fn positions(&self) -> Vec<PositionInfo> {
            Vec::new()
        }

        async fn orders(&self, _status: &str, _limit: u32) -> Vec<OrderInfo> {
            Vec::new()
        }

        async fn submit_order(&self, _ticket: &OrderTicket) -> BrokerResult<OrderInfo> {
            Err(BrokerError::NotConfigured)
        }

        async fn cancel_order(&self, _order_id: &str) -> bool {
            false
        }

        async fn latest_quote(&self, _symbol: &str) -> Option<serde_json::Value> {
            None
        }

        async fn bars(
            &self,
            _symbol: &str,
            _timeframe: &str,
            _limit: u32,
        ) -> Option<serde_json::Value> {
            None
        }
    }

    fn poller_with(
        price: Option<f64>,
        connected: bool,
    ) -> (MarketPoller, crate::websocket::SharedSubscriberRegistry) {
        let registry = create_subscriber_registry();
        let hub = create_telemetry_hub(registry.clone());
        let poller = MarketPoller::new(
            Arc::new(StubSpot { price }),
            Arc::new(StubBroker { connected }),
            hub,
        );
        (poller, registry)
    }

    #[tokio::test]
    async fn test_spot_failure_still_publishes_broker_fields() {
        let (mut poller, registry) = poller_with(None, true);
        let (_id, _tx, mut rx) = registry.add().await;

        poller.tick().await;

        match rx.try_recv().unwrap() {
            TelemetryEvent::Telemetry {
                btc_price,
                profit_usd,
                profit_today,
                mode,
                ..
            } => {
                assert_eq!(btc_price, 0.0);
                assert_eq!(profit_usd, 2500.0);
                assert_eq!(profit_today, 1000.0);
                assert_eq!(mode, TelemetryMode::Live);
            }
            other => panic!("Expected Telemetry, got {:?}", other),
        }
        // 정확히 한 건만 발행
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broker_failure_still_publishes_price() {
        let (mut poller, registry) = poller_with(Some(105000.0), false);
        let (_id, _tx, mut rx) = registry.add().await;

        poller.tick().await;

        match rx.try_recv().unwrap() {
            TelemetryEvent::Telemetry {
                btc_price,
                profit_usd,
                mode,
                sparkline,
                ..
            } => {
                assert_eq!(btc_price, 105000.0);
                assert_eq!(profit_usd, 0.0);
                assert_eq!(mode, TelemetryMode::Standby);
                assert_eq!(sparkline, vec![105000.0]);
            }
            other => panic!("Expected Telemetry, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_subscribers_skips_publish() {
        let (mut poller, registry) = poller_with(Some(105000.0), true);

        poller.tick().await;

        // 틱은 돌았지만 윈도우도 비어 있음 (외부 조회 생략)
        assert!(registry.is_empty().await);
        assert!(poller.window.is_empty());
    }

    #[tokio::test]
    async fn test_sparkline_window_accumulates_and_caps() {
        let (mut poller, registry) = poller_with(Some(100.0), true);
        let (_id, _tx, mut rx) = registry.add().await;

        for _ in 0..SPARKLINE_LEN + 5 {
            poller.tick().await;
        }

        assert_eq!(poller.window.len(), SPARKLINE_LEN);

        // 마지막 이벤트의 스파크라인도 상한을 지킴
        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        match last.unwrap() {
            TelemetryEvent::Telemetry { sparkline, .. } => {
                assert_eq!(sparkline.len(), SPARKLINE_LEN);
            }
            other => panic!("Expected Telemetry, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_window_change_percent() {
        let (mut poller, _registry) = poller_with(Some(100.0), true);

        assert_eq!(poller.window_change_percent(), 0.0);

        poller.window.push_back(100.0);
        assert_eq!(poller.window_change_percent(), 0.0);

        poller.window.push_back(110.0);
        assert!((poller.window_change_percent() - 10.0).abs() < 1e-9);
    }
}
