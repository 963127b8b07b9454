//! 이메일 알림 전송기.
//!
//! HTTP 메일 릴레이 API를 통해 이메일을 전송합니다.

use async_trait::async_trait;
use tracing::{debug, info};

use pluto_core::TradeSignal;

use crate::types::{
    format_signal_body, format_signal_subject, NotificationError, NotificationResult,
    NotificationSender,
};

/// 이메일 전송 설정.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// 메일 릴레이 API 엔드포인트
    pub api_url: String,
    /// API 키 (Bearer)
    pub api_key: String,
    /// 발신자 주소
    pub from: String,
    /// 전송 활성화 여부
    pub enabled: bool,
}

impl MailConfig {
    /// 새 메일 설정을 생성합니다.
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            enabled: true,
        }
    }

    /// 환경 변수에서 설정을 생성합니다.
    ///
    /// `MAIL_API_URL`, `MAIL_API_KEY`, `MAIL_FROM`이 모두 있어야 합니다.
    pub fn from_env() -> Option<Self> {
        let api_url = std::env::var("MAIL_API_URL").ok()?;
        let api_key = std::env::var("MAIL_API_KEY").ok()?;
        let from = std::env::var("MAIL_FROM").ok()?;
        let enabled = std::env::var("MAIL_ENABLED")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(true);

        Some(Self {
            api_url,
            api_key,
            from,
            enabled,
        })
    }
}

/// 이메일 알림 전송기.
pub struct EmailSender {
    config: MailConfig,
    client: reqwest::Client,
}

impl EmailSender {
    /// 새 이메일 전송기를 생성합니다.
    pub fn new(config: MailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// 환경 변수에서 전송기를 생성합니다.
    pub fn from_env() -> Option<Self> {
        MailConfig::from_env().map(Self::new)
    }
}

#[async_trait]
impl NotificationSender for EmailSender {
    async fn send(&self, recipient: &str, signal: &TradeSignal) -> NotificationResult<()> {
        let payload = serde_json::json!({
            "from": self.config.from,
            "to": recipient,
            "subject": format_signal_subject(signal),
            "text": format_signal_body(signal),
        });

        debug!(recipient = %recipient, "Sending email notification");

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::SendFailed(format!(
                "mail relay returned {}: {}",
                status, body
            )));
        }

        info!(recipient = %recipient, symbol = %signal.symbol, "Email notification sent");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn name(&self) -> &str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pluto_core::Side;
    use serde_json::Map;

    fn signal() -> TradeSignal {
        TradeSignal {
            symbol: "AAPL".to_string(),
            side: Side::Sell,
            confidence: 0.7,
            reason: None,
            price: None,
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn test_send_posts_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/send")
            .match_header("authorization", "Bearer key-123")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "to": "ops@example.com",
                "subject": "Pluto Lander trade signal: AAPL sell",
            })))
            .with_status(200)
            .with_body(r#"{"id":"msg-1"}"#)
            .create_async()
            .await;

        let sender = EmailSender::new(MailConfig::new(
            format!("{}/send", server.url()),
            "key-123".to_string(),
            "pluto@example.com".to_string(),
        ));

        sender.send("ops@example.com", &signal()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_failure_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/send")
            .with_status(500)
            .with_body("relay down")
            .create_async()
            .await;

        let sender = EmailSender::new(MailConfig::new(
            format!("{}/send", server.url()),
            "key-123".to_string(),
            "pluto@example.com".to_string(),
        ));

        let result = sender.send("ops@example.com", &signal()).await;
        assert!(matches!(result, Err(NotificationError::SendFailed(_))));
    }
}
