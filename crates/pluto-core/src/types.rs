//! 주문 및 트레이드 시그널 도메인 타입.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 주문 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl Side {
    /// 와이어 문자열에서 파싱.
    ///
    /// `"hold"` 등 알 수 없는 값은 None을 반환하여 호출자가
    /// 유효성 에러로 처리하게 합니다.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buy" => Some(Side::Buy),
            "sell" => Some(Side::Sell),
            _ => None,
        }
    }

    /// 와이어 문자열 반환.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 주문 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// 시장가
    Market,
    /// 지정가
    Limit,
}

impl OrderKind {
    /// 와이어 문자열에서 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "market" => Some(OrderKind::Market),
            "limit" => Some(OrderKind::Limit),
            _ => None,
        }
    }

    /// 와이어 문자열 반환.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Market => "market",
            OrderKind::Limit => "limit",
        }
    }
}

/// 주문 유효 기간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// 당일
    Day,
    /// 취소 시까지
    Gtc,
    /// 즉시 체결, 잔량 취소
    Ioc,
    /// 전량 즉시 체결
    Fok,
}

impl TimeInForce {
    /// 와이어 문자열에서 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "day" => Some(TimeInForce::Day),
            "gtc" => Some(TimeInForce::Gtc),
            "ioc" => Some(TimeInForce::Ioc),
            "fok" => Some(TimeInForce::Fok),
            _ => None,
        }
    }

    /// 와이어 문자열 반환.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Day => "day",
            TimeInForce::Gtc => "gtc",
            TimeInForce::Ioc => "ioc",
            TimeInForce::Fok => "fok",
        }
    }
}

/// 브로커로 전송할 주문 요청.
///
/// 브로커가 주문의 단일 원천(system of record)이며, 이 티켓은
/// 로컬에 저장되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTicket {
    /// 심볼 (예: "AAPL", "BTCUSD")
    pub symbol: String,
    /// 수량 (0보다 커야 함)
    pub qty: Decimal,
    /// 매수/매도
    pub side: Side,
    /// 주문 유형
    pub kind: OrderKind,
    /// 유효 기간
    pub time_in_force: TimeInForce,
    /// 지정가 (kind가 Limit인 경우 필수)
    pub limit_price: Option<Decimal>,
}

impl OrderTicket {
    /// 전송 전 유효성 검증.
    ///
    /// 실패 시 브로커 호출 없이 즉시 거부되어야 합니다.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.symbol.trim().is_empty() {
            return Err("symbol is required");
        }
        if self.qty <= Decimal::ZERO {
            return Err("qty must be greater than zero");
        }
        if self.kind == OrderKind::Limit && self.limit_price.is_none() {
            return Err("limit_price is required for limit orders");
        }
        Ok(())
    }
}

/// 전략에서 유입되는 트레이드 시그널.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    /// 심볼
    pub symbol: String,
    /// 매수/매도
    pub side: Side,
    /// 신뢰도 (0.0 ~ 1.0)
    pub confidence: f64,
    /// 시그널 사유
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// 참고 가격
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// 부가 데이터
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl TradeSignal {
    /// 수신 시그널 유효성 검증.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.symbol.trim().is_empty() {
            return Err("symbol is required");
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err("confidence must be within [0.0, 1.0]");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn market_ticket() -> OrderTicket {
        OrderTicket {
            symbol: "AAPL".to_string(),
            qty: dec!(1),
            side: Side::Buy,
            kind: OrderKind::Market,
            time_in_force: TimeInForce::Day,
            limit_price: None,
        }
    }

    #[test]
    fn test_side_parse() {
        assert_eq!(Side::parse("buy"), Some(Side::Buy));
        assert_eq!(Side::parse("SELL"), Some(Side::Sell));
        assert_eq!(Side::parse("hold"), None);
    }

    #[test]
    fn test_ticket_validate_ok() {
        assert!(market_ticket().validate().is_ok());
    }

    #[test]
    fn test_ticket_rejects_zero_qty() {
        let mut ticket = market_ticket();
        ticket.qty = Decimal::ZERO;
        assert!(ticket.validate().is_err());
    }

    #[test]
    fn test_limit_requires_price() {
        let mut ticket = market_ticket();
        ticket.kind = OrderKind::Limit;
        assert!(ticket.validate().is_err());

        ticket.limit_price = Some(dec!(150.25));
        assert!(ticket.validate().is_ok());
    }

    #[test]
    fn test_signal_confidence_range() {
        let mut signal = TradeSignal {
            symbol: "BTCUSD".to_string(),
            side: Side::Buy,
            confidence: 0.8,
            reason: None,
            price: None,
            extra: Map::new(),
        };
        assert!(signal.validate().is_ok());

        signal.confidence = 1.5;
        assert!(signal.validate().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Side::Buy).unwrap();
        assert_eq!(json, r#""buy""#);

        let tif: TimeInForce = serde_json::from_str(r#""gtc""#).unwrap();
        assert_eq!(tif, TimeInForce::Gtc);
    }
}
