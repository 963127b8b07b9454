//! Alpaca 브로커리지 게이트웨이.
//!
//! Alpaca Markets REST API 어댑터. 모의투자(paper)와 실전(live)
//! 엔드포인트를 모두 지원합니다.
//!
//! 자격증명은 호출 시점에 설정 저장소에서 읽으므로, 설정이 갱신되면
//! 다음 호출부터 즉시 반영됩니다.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use pluto_core::{OrderKind, OrderTicket, SettingsStore};

use crate::error::{BrokerError, BrokerResult};
use crate::traits::{AccountSnapshot, Brokerage, OrderInfo, PositionInfo};

const PAPER_TRADING_URL: &str = "https://paper-api.alpaca.markets";
const LIVE_TRADING_URL: &str = "https://api.alpaca.markets";
const DATA_URL: &str = "https://data.alpaca.markets";

const HEADER_KEY_ID: &str = "APCA-API-KEY-ID";
const HEADER_SECRET_KEY: &str = "APCA-API-SECRET-KEY";

/// 호출당 고정 타임아웃. 재시도는 하지 않습니다. 멱등성 키 없이
/// 주문을 중복 제출하는 것은 안전하지 않습니다.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// 크립토 페어 휴리스틱.
///
/// Alpaca 크립토 심볼은 "BTCUSD"처럼 USD로 끝납니다. "USD"로 끝나는
/// 일부 주식 티커를 크립토로 오분류할 수 있지만, 브로커 라우팅이
/// 실제 Alpaca 심볼 분류와 일치해야 하므로 이 규칙을 그대로
/// 유지합니다.
pub fn is_crypto_pair(symbol: &str) -> bool {
    symbol.ends_with("USD") && symbol.len() > 4
}

// ============================================================================
// API 응답 타입
// ============================================================================

#[derive(Debug, Deserialize)]
struct AlpacaAccount {
    status: String,
    #[serde(default)]
    currency: Option<String>,
    cash: String,
    portfolio_value: String,
    buying_power: String,
    #[serde(default)]
    daytrading_buying_power: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlpacaPosition {
    symbol: String,
    qty: String,
    side: String,
    avg_entry_price: String,
    market_value: String,
    unrealized_pl: String,
    current_price: String,
}

#[derive(Debug, Deserialize)]
struct AlpacaOrder {
    id: String,
    #[serde(default)]
    client_order_id: Option<String>,
    symbol: String,
    side: String,
    #[serde(rename = "type")]
    order_type: String,
    #[serde(default)]
    qty: Option<String>,
    #[serde(default)]
    filled_qty: Option<String>,
    status: String,
    time_in_force: String,
    #[serde(default)]
    limit_price: Option<String>,
    #[serde(default)]
    filled_avg_price: Option<String>,
    #[serde(default)]
    submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// 해석된 엔드포인트와 자격증명.
struct Endpoints {
    api_key: String,
    api_secret: String,
    trading: String,
    data: String,
}

// ============================================================================
// Alpaca 게이트웨이
// ============================================================================

/// Alpaca 브로커리지 게이트웨이.
pub struct AlpacaGateway {
    settings: Arc<SettingsStore>,
    client: Client,
    /// 테스트용 트레이딩 API base URL 오버라이드
    trading_base: Option<String>,
    /// 테스트용 데이터 API base URL 오버라이드
    data_base: Option<String>,
}

impl fmt::Debug for AlpacaGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlpacaGateway")
            .field("configured", &self.is_configured())
            .field("trading_base", &self.trading_base)
            .finish()
    }
}

impl AlpacaGateway {
    /// 새 게이트웨이 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `BrokerError::Network`를 반환합니다.
    pub fn new(settings: Arc<SettingsStore>) -> BrokerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| BrokerError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            settings,
            client,
            trading_base: None,
            data_base: None,
        })
    }

    /// 트레이딩/데이터 API base URL을 오버라이드합니다 (테스트용).
    pub fn with_base_urls(
        mut self,
        trading: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        self.trading_base = Some(trading.into());
        self.data_base = Some(data.into());
        self
    }

    /// 현재 설정에서 엔드포인트 해석. 자격증명이 없으면 None.
    fn resolve(&self) -> Option<Endpoints> {
        let settings = self.settings.current();
        let (api_key, api_secret) = match (settings.alpaca_api_key, settings.alpaca_api_secret)
        {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => (key, secret),
            _ => return None,
        };

        let trading = self.trading_base.clone().unwrap_or_else(|| {
            if settings.alpaca_paper {
                PAPER_TRADING_URL.to_string()
            } else {
                LIVE_TRADING_URL.to_string()
            }
        });
        let data = self
            .data_base
            .clone()
            .unwrap_or_else(|| DATA_URL.to_string());

        Some(Endpoints {
            api_key,
            api_secret,
            trading,
            data,
        })
    }

    /// 인증 헤더가 설정된 요청 빌더 생성.
    fn request(&self, method: Method, url: &str, ep: &Endpoints) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(HEADER_KEY_ID, &ep.api_key)
            .header(HEADER_SECRET_KEY, &ep.api_secret)
    }

    /// GET 요청 후 JSON 파싱.
    async fn get_json<T: DeserializeOwned>(
        &self,
        ep: &Endpoints,
        url: &str,
        params: &[(&str, String)],
    ) -> BrokerResult<T> {
        debug!("GET {}", url);

        let response = self
            .request(Method::GET, url, ep)
            .query(params)
            .send()
            .await
            .map_err(BrokerError::from)?;

        Self::handle_response(response).await
    }

    /// API 응답 처리.
    ///
    /// 비성공 상태는 응답 본문 원문을 담아 `Rejected`로 반환합니다.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> BrokerResult<T> {
        let status = response.status();
        let body = response.text().await.map_err(BrokerError::from)?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse Alpaca response: {} - Body: {}", e, body);
                BrokerError::Parse(e.to_string())
            })
        } else {
            Err(BrokerError::Rejected { body })
        }
    }

    /// 문자열에서 Decimal 파싱.
    fn parse_decimal(s: &str) -> Decimal {
        s.parse().unwrap_or(Decimal::ZERO)
    }

    fn to_account(resp: AlpacaAccount) -> AccountSnapshot {
        AccountSnapshot {
            status: resp.status,
            currency: resp.currency.unwrap_or_else(|| "USD".to_string()),
            cash: Self::parse_decimal(&resp.cash),
            portfolio_value: Self::parse_decimal(&resp.portfolio_value),
            buying_power: Self::parse_decimal(&resp.buying_power),
            daytrading_buying_power: resp
                .daytrading_buying_power
                .as_deref()
                .map(Self::parse_decimal)
                .unwrap_or(Decimal::ZERO),
        }
    }

    fn to_position(resp: AlpacaPosition) -> PositionInfo {
        PositionInfo {
            symbol: resp.symbol,
            qty: Self::parse_decimal(&resp.qty),
            side: resp.side,
            avg_entry_price: Self::parse_decimal(&resp.avg_entry_price),
            market_value: Self::parse_decimal(&resp.market_value),
            unrealized_pl: Self::parse_decimal(&resp.unrealized_pl),
            current_price: Self::parse_decimal(&resp.current_price),
        }
    }

    fn to_order(resp: AlpacaOrder) -> OrderInfo {
        OrderInfo {
            id: resp.id,
            client_order_id: resp.client_order_id,
            symbol: resp.symbol,
            side: resp.side,
            order_type: resp.order_type,
            qty: resp.qty.as_deref().map(Self::parse_decimal),
            filled_qty: resp
                .filled_qty
                .as_deref()
                .map(Self::parse_decimal)
                .unwrap_or(Decimal::ZERO),
            status: resp.status,
            time_in_force: resp.time_in_force,
            limit_price: resp.limit_price.as_deref().map(Self::parse_decimal),
            filled_avg_price: resp.filled_avg_price.as_deref().map(Self::parse_decimal),
            submitted_at: resp.submitted_at,
        }
    }
}

#[async_trait::async_trait]
impl Brokerage for AlpacaGateway {
    fn name(&self) -> &str {
        if self.settings.current().alpaca_paper {
            "alpaca-paper"
        } else {
            "alpaca"
        }
    }

    fn is_configured(&self) -> bool {
        self.settings.current().has_broker_credentials()
    }

    async fn account(&self) -> Option<AccountSnapshot> {
        let ep = self.resolve()?;
        let url = format!("{}/v2/account", ep.trading);

        match self.get_json::<AlpacaAccount>(&ep, &url, &[]).await {
            Ok(account) => Some(Self::to_account(account)),
            Err(e) => {
                warn!(error = %e, "Account fetch failed");
                None
            }
        }
    }

    async fn positions(&self) -> Vec<PositionInfo> {
        let Some(ep) = self.resolve() else {
            return Vec::new();
        };
        let url = format!("{}/v2/positions", ep.trading);

        match self.get_json::<Vec<AlpacaPosition>>(&ep, &url, &[]).await {
            Ok(positions) => positions.into_iter().map(Self::to_position).collect(),
            Err(e) => {
                warn!(error = %e, "Positions fetch failed");
                Vec::new()
            }
        }
    }

    async fn orders(&self, status: &str, limit: u32) -> Vec<OrderInfo> {
        let Some(ep) = self.resolve() else {
            return Vec::new();
        };
        let url = format!("{}/v2/orders", ep.trading);
        let params = [
            ("status", status.to_string()),
            ("limit", limit.to_string()),
            ("direction", "desc".to_string()),
        ];

        match self.get_json::<Vec<AlpacaOrder>>(&ep, &url, &params).await {
            Ok(orders) => orders.into_iter().map(Self::to_order).collect(),
            Err(e) => {
                warn!(error = %e, "Orders fetch failed");
                Vec::new()
            }
        }
    }

    async fn submit_order(&self, ticket: &OrderTicket) -> BrokerResult<OrderInfo> {
        let ep = self.resolve().ok_or(BrokerError::NotConfigured)?;
        let url = format!("{}/v2/orders", ep.trading);

        let mut body = serde_json::json!({
            "symbol": ticket.symbol,
            "qty": ticket.qty.to_string(),
            "side": ticket.side.as_str(),
            "type": ticket.kind.as_str(),
            "time_in_force": ticket.time_in_force.as_str(),
        });
        if ticket.kind == OrderKind::Limit {
            if let Some(price) = ticket.limit_price {
                body["limit_price"] = Value::String(price.to_string());
            }
        }

        info!(
            symbol = %ticket.symbol,
            side = %ticket.side,
            qty = %ticket.qty,
            order_type = ticket.kind.as_str(),
            "Submitting order"
        );

        let response = self
            .request(Method::POST, &url, &ep)
            .json(&body)
            .send()
            .await
            .map_err(BrokerError::from)?;

        let order: AlpacaOrder = Self::handle_response(response).await?;
        info!(order_id = %order.id, "Order submitted");
        Ok(Self::to_order(order))
    }

    async fn cancel_order(&self, order_id: &str) -> bool {
        let Some(ep) = self.resolve() else {
            return false;
        };
        let url = format!("{}/v2/orders/{}", ep.trading, order_id);

        let result = self
            .request(Method::DELETE, &url, &ep)
            .send()
            .await
            .map_err(BrokerError::from);

        match result {
            Ok(response) if response.status().is_success() => {
                info!(order_id = %order_id, "Order cancelled");
                true
            }
            Ok(response) => {
                warn!(order_id = %order_id, status = %response.status(), "Cancel order failed");
                false
            }
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Cancel order failed");
                false
            }
        }
    }

    async fn latest_quote(&self, symbol: &str) -> Option<Value> {
        let ep = self.resolve()?;

        let result = if is_crypto_pair(symbol) {
            let url = format!("{}/v1beta3/crypto/us/latest/quotes", ep.data);
            self.get_json::<Value>(&ep, &url, &[("symbols", symbol.to_string())])
                .await
        } else {
            let url = format!("{}/v2/stocks/{}/quotes/latest", ep.data, symbol);
            self.get_json::<Value>(&ep, &url, &[]).await
        };

        match result {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Quote fetch failed");
                None
            }
        }
    }

    async fn bars(&self, symbol: &str, timeframe: &str, limit: u32) -> Option<Value> {
        let ep = self.resolve()?;

        let result = if is_crypto_pair(symbol) {
            let url = format!("{}/v1beta3/crypto/us/bars", ep.data);
            let params = [
                ("symbols", symbol.to_string()),
                ("timeframe", timeframe.to_string()),
                ("limit", limit.to_string()),
            ];
            self.get_json::<Value>(&ep, &url, &params).await
        } else {
            let url = format!("{}/v2/stocks/{}/bars", ep.data, symbol);
            let params = [
                ("timeframe", timeframe.to_string()),
                ("limit", limit.to_string()),
            ];
            self.get_json::<Value>(&ep, &url, &params).await
        };

        match result {
            Ok(bars) => Some(bars),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Bars fetch failed");
                None
            }
        }
    }
}
