//! 텔레메트리 이벤트 타입.
//!
//! 연결된 모든 구독자(대시보드, ESP32 디스플레이)에게 푸시되는
//! 팬아웃 단위입니다. 한 번 생성되면 불변이며 값으로 전달됩니다.
//!
//! # 와이어 형식
//!
//! ```json
//! {"type": "trade_signal", "symbol": "BTCUSD", "side": "buy", "confidence": 0.8}
//! {"type": "order_submitted", "symbol": "AAPL", "side": "sell", "extra": {"qty": 10}}
//! {"type": "telemetry", "btc_price": 105000.0, "mode": "live", "sparkline": [...]}
//! {"type": "pong"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Side, TradeSignal};

/// 폴러 모드 표시자.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryMode {
    /// 브로커 자격증명이 설정되고 수락된 상태
    Live,
    /// 브로커 미연결 상태
    Standby,
}

/// 서버에서 구독자로 보내는 텔레메트리 이벤트.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// 유입된 트레이드 시그널
    TradeSignal {
        /// 심볼
        symbol: String,
        /// 매수/매도
        side: Side,
        /// 신뢰도 (0.0 ~ 1.0)
        confidence: f64,
        /// 시그널 사유
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        /// 참고 가격
        #[serde(default, skip_serializing_if = "Option::is_none")]
        price: Option<f64>,
        /// 부가 데이터
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        extra: Map<String, Value>,
    },
    /// 브로커에 제출된 주문
    OrderSubmitted {
        /// 심볼
        symbol: String,
        /// 매수/매도
        side: Side,
        /// 부가 데이터 (수량, 주문 유형 등)
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        extra: Map<String, Value>,
    },
    /// 주기적 텔레메트리 스냅샷
    Telemetry {
        /// BTC 현재가 (USD, 조회 실패 시 0.0)
        btc_price: f64,
        /// 24시간 변화율 (%)
        btc_change_24h: f64,
        /// 누적 손익 (USD)
        profit_usd: f64,
        /// 금일 손익 (USD)
        profit_today: f64,
        /// live/standby 모드
        mode: TelemetryMode,
        /// 최근 가격 스파크라인
        sparkline: Vec<f64>,
    },
    /// 구독자 ping에 대한 응답
    Pong,
}

impl TelemetryEvent {
    /// JSON 문자열로 직렬화.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// 유입된 시그널을 텔레메트리 이벤트로 변환.
    pub fn from_signal(signal: &TradeSignal) -> Self {
        TelemetryEvent::TradeSignal {
            symbol: signal.symbol.clone(),
            side: signal.side,
            confidence: signal.confidence,
            reason: signal.reason.clone(),
            price: signal.price,
            extra: signal.extra.clone(),
        }
    }

    /// 이벤트 종류 문자열 반환 (로깅/메트릭용).
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryEvent::TradeSignal { .. } => "trade_signal",
            TelemetryEvent::OrderSubmitted { .. } => "order_submitted",
            TelemetryEvent::Telemetry { .. } => "telemetry",
            TelemetryEvent::Pong => "pong",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pong_wire_shape() {
        let json = TelemetryEvent::Pong.to_json().unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let event = TelemetryEvent::Telemetry {
            btc_price: 105000.0,
            btc_change_24h: 2.5,
            profit_usd: 1200.0,
            profit_today: 45.0,
            mode: TelemetryMode::Live,
            sparkline: vec![104900.0, 105000.0],
        };

        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "telemetry");
        assert_eq!(value["btc_price"], 105000.0);
        assert_eq!(value["mode"], "live");
        assert!(value["sparkline"].is_array());
    }

    #[test]
    fn test_trade_signal_omits_empty_fields() {
        let event = TelemetryEvent::TradeSignal {
            symbol: "BTCUSD".to_string(),
            side: Side::Buy,
            confidence: 0.8,
            reason: None,
            price: None,
            extra: Map::new(),
        };

        let json = event.to_json().unwrap();
        assert!(json.contains(r#""type":"trade_signal""#));
        assert!(!json.contains("reason"));
        assert!(!json.contains("extra"));
    }

    #[test]
    fn test_from_signal() {
        let signal = TradeSignal {
            symbol: "ETHUSD".to_string(),
            side: Side::Sell,
            confidence: 0.6,
            reason: Some("rsi overbought".to_string()),
            price: Some(3350.0),
            extra: Map::new(),
        };

        let event = TelemetryEvent::from_signal(&signal);
        assert_eq!(event.kind(), "trade_signal");

        match event {
            TelemetryEvent::TradeSignal { symbol, side, .. } => {
                assert_eq!(symbol, "ETHUSD");
                assert_eq!(side, Side::Sell);
            }
            _ => panic!("Expected TradeSignal event"),
        }
    }
}
