//! SMS 알림 전송기.
//!
//! 실제 SMS 게이트웨이는 아직 연동되지 않았습니다. 설정된 번호로의
//! 발송 요청을 구조화된 로그로 남기는 스텁입니다.
//! TODO: SMS_PROVIDER 값에 따라 실제 게이트웨이(HTTP API) 연동.

use async_trait::async_trait;
use tracing::info;

use pluto_core::TradeSignal;

use crate::types::{format_signal_subject, NotificationResult, NotificationSender};

/// SMS 전송기 스텁.
pub struct SmsSender {
    provider: Option<String>,
}

impl SmsSender {
    /// 새 SMS 전송기를 생성합니다.
    pub fn new(provider: Option<String>) -> Self {
        Self { provider }
    }

    /// 환경 변수에서 전송기를 생성합니다 (`SMS_PROVIDER`).
    pub fn from_env() -> Self {
        Self::new(std::env::var("SMS_PROVIDER").ok())
    }
}

#[async_trait]
impl NotificationSender for SmsSender {
    async fn send(&self, recipient: &str, signal: &TradeSignal) -> NotificationResult<()> {
        info!(
            recipient = %recipient,
            provider = self.provider.as_deref().unwrap_or("none"),
            message = %format_signal_subject(signal),
            "SMS notification (stub)"
        );
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    fn name(&self) -> &str {
        "sms"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_only_with_provider() {
        assert!(!SmsSender::new(None).is_enabled());
        assert!(SmsSender::new(Some("twilio".to_string())).is_enabled());
    }
}
