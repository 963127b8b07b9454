//! 외부 현물 시세 제공자.
//!
//! 브로커와 독립적인 참조 가격 소스입니다. 폴러가 매 틱마다
//! 호출하며, 실패는 폴러 쪽에서 0.0으로 degrade됩니다.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{BrokerError, BrokerResult};

const COINBASE_URL: &str = "https://api.coinbase.com";

/// 시세 조회 타임아웃. 폴링 주기(5초)를 넘기지 않아야 합니다.
const SPOT_TIMEOUT_SECS: u64 = 5;

/// 현물 시세 제공자 인터페이스.
#[async_trait]
pub trait SpotPriceProvider: Send + Sync {
    /// 현재 현물 가격(USD) 조회.
    async fn spot_price(&self) -> BrokerResult<f64>;
}

#[derive(Debug, Deserialize)]
struct CoinbaseSpotResponse {
    data: CoinbaseSpotData,
}

#[derive(Debug, Deserialize)]
struct CoinbaseSpotData {
    amount: String,
}

/// Coinbase 현물 시세 제공자.
pub struct CoinbaseSpot {
    client: Client,
    base_url: String,
    pair: String,
}

impl CoinbaseSpot {
    /// 새 제공자 생성 (기본 페어: BTC-USD).
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `BrokerError::Network`를 반환합니다.
    pub fn new() -> BrokerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(SPOT_TIMEOUT_SECS))
            .build()
            .map_err(|e| BrokerError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: COINBASE_URL.to_string(),
            pair: "BTC-USD".to_string(),
        })
    }

    /// base URL 오버라이드 (테스트용).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 조회할 페어 설정.
    pub fn with_pair(mut self, pair: impl Into<String>) -> Self {
        self.pair = pair.into();
        self
    }
}

#[async_trait]
impl SpotPriceProvider for CoinbaseSpot {
    async fn spot_price(&self) -> BrokerResult<f64> {
        let url = format!("{}/v2/prices/{}/spot", self.base_url, self.pair);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(BrokerError::from)?;

        let status = response.status();
        let body = response.text().await.map_err(BrokerError::from)?;

        if !status.is_success() {
            return Err(BrokerError::Network(format!(
                "Spot price request failed with status {}: {}",
                status, body
            )));
        }

        let parsed: CoinbaseSpotResponse = serde_json::from_str(&body)?;
        parsed
            .data
            .amount
            .parse::<f64>()
            .map_err(|e| BrokerError::Parse(format!("Invalid spot price amount: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spot_price_parses_amount() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/prices/BTC-USD/spot")
            .with_status(200)
            .with_body(r#"{"data":{"base":"BTC","currency":"USD","amount":"105123.45"}}"#)
            .create_async()
            .await;

        let provider = CoinbaseSpot::new().unwrap().with_base_url(server.url());
        let price = provider.spot_price().await.unwrap();

        assert!((price - 105123.45).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_spot_price_error_on_bad_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/prices/BTC-USD/spot")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let provider = CoinbaseSpot::new().unwrap().with_base_url(server.url());
        assert!(provider.spot_price().await.is_err());
    }

    #[tokio::test]
    async fn test_spot_price_error_on_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/prices/BTC-USD/spot")
            .with_status(200)
            .with_body(r#"{"data":{"amount":"not-a-number"}}"#)
            .create_async()
            .await;

        let provider = CoinbaseSpot::new().unwrap().with_base_url(server.url());
        assert!(matches!(
            provider.spot_price().await,
            Err(BrokerError::Parse(_))
        ));
    }
}
