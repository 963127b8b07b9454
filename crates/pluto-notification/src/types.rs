//! 알림 타입 및 trait 정의.

use async_trait::async_trait;

use pluto_core::TradeSignal;

/// 알림 작업용 Result 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 에러.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("알림 전송 실패: {0}")]
    SendFailed(String),

    #[error("잘못된 설정: {0}")]
    InvalidConfig(String),

    #[error("네트워크 에러: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("직렬화 에러: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// 알림 전송기 trait.
///
/// 모든 전송기는 best-effort입니다. 전송 실패는 호출 경로(텔레메트리
/// 퍼블리시)로 전파되지 않고 로깅으로 끝납니다.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 트레이드 시그널 알림을 전송합니다.
    async fn send(&self, recipient: &str, signal: &TradeSignal) -> NotificationResult<()>;

    /// 전송기가 활성화되어 있는지 확인합니다.
    fn is_enabled(&self) -> bool;

    /// 전송기 이름을 반환합니다.
    fn name(&self) -> &str;
}

/// 시그널을 사람이 읽을 수 있는 본문으로 포맷합니다.
pub fn format_signal_body(signal: &TradeSignal) -> String {
    format!(
        "New trade signal:\n\n\
         Symbol: {}\n\
         Side: {}\n\
         Confidence: {}\n\
         Reason: {}\n\
         Price: {}\n",
        signal.symbol,
        signal.side,
        signal.confidence,
        signal.reason.as_deref().unwrap_or("-"),
        signal
            .price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string()),
    )
}

/// 시그널 알림 제목.
pub fn format_signal_subject(signal: &TradeSignal) -> String {
    format!("Pluto Lander trade signal: {} {}", signal.symbol, signal.side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pluto_core::Side;
    use serde_json::Map;

    #[test]
    fn test_format_signal() {
        let signal = TradeSignal {
            symbol: "BTCUSD".to_string(),
            side: Side::Buy,
            confidence: 0.9,
            reason: Some("breakout".to_string()),
            price: Some(105000.0),
            extra: Map::new(),
        };

        let subject = format_signal_subject(&signal);
        assert_eq!(subject, "Pluto Lander trade signal: BTCUSD buy");

        let body = format_signal_body(&signal);
        assert!(body.contains("Symbol: BTCUSD"));
        assert!(body.contains("Reason: breakout"));
    }
}
