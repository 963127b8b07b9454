//! 브로커리지 trait 정의.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pluto_core::OrderTicket;

use crate::BrokerResult;

/// 브로커 계좌 스냅샷.
///
/// 항상 브로커에서 새로 조회하는 read-only 뷰이며, 로컬에 캐시되지
/// 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// 계좌 상태 (예: "ACTIVE")
    pub status: String,
    /// 통화
    pub currency: String,
    /// 현금 잔고
    pub cash: Decimal,
    /// 포트폴리오 평가액
    pub portfolio_value: Decimal,
    /// 매수 가능 금액
    pub buying_power: Decimal,
    /// 데이트레이딩 매수 가능 금액
    pub daytrading_buying_power: Decimal,
}

/// 보유 포지션 정보.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionInfo {
    /// 심볼
    pub symbol: String,
    /// 수량
    pub qty: Decimal,
    /// 포지션 방향 ("long" | "short")
    pub side: String,
    /// 평균 진입가
    pub avg_entry_price: Decimal,
    /// 평가 금액
    pub market_value: Decimal,
    /// 미실현 손익
    pub unrealized_pl: Decimal,
    /// 현재가
    pub current_price: Decimal,
}

/// 주문 정보.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderInfo {
    /// 브로커 주문 ID
    pub id: String,
    /// 클라이언트 주문 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
    /// 심볼
    pub symbol: String,
    /// 매수/매도
    pub side: String,
    /// 주문 유형
    pub order_type: String,
    /// 주문 수량
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<Decimal>,
    /// 체결 수량
    pub filled_qty: Decimal,
    /// 주문 상태
    pub status: String,
    /// 유효 기간
    pub time_in_force: String,
    /// 지정가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Decimal>,
    /// 평균 체결가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_avg_price: Option<Decimal>,
    /// 제출 시각
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// 통합 브로커리지 인터페이스.
///
/// 읽기 작업은 자격증명 미설정 및 전송 실패 시 빈/부재 결과로
/// degrade합니다 (게이트웨이 내부에서 로깅). 쓰기 작업만 에러를
/// 호출자에게 전달합니다.
#[async_trait]
pub trait Brokerage: Send + Sync {
    /// 브로커 이름 반환.
    fn name(&self) -> &str;

    /// 브로커 자격증명 설정 여부.
    fn is_configured(&self) -> bool;

    // === 계좌 작업 ===

    /// 계좌 정보 조회. 미설정/실패 시 None.
    async fn account(&self) -> Option<AccountSnapshot>;

    /// 보유 포지션 조회. 미설정/실패 시 빈 목록.
    async fn positions(&self) -> Vec<PositionInfo>;

    /// 주문 내역 조회. 미설정/실패 시 빈 목록.
    async fn orders(&self, status: &str, limit: u32) -> Vec<OrderInfo>;

    // === 주문 작업 ===

    /// 새 주문 제출.
    ///
    /// 미설정 시 `BrokerError::NotConfigured`, 브로커 거부 시
    /// 응답 본문 원문을 담은 `BrokerError::Rejected`를 반환합니다.
    /// 멱등성 키가 보장되지 않으므로 재시도하지 않습니다.
    async fn submit_order(&self, ticket: &OrderTicket) -> BrokerResult<OrderInfo>;

    /// 주문 취소. 성공 여부를 반환합니다.
    async fn cancel_order(&self, order_id: &str) -> bool;

    // === 시장 데이터 ===

    /// 최신 호가 조회. 브로커 응답 본문을 그대로 반환합니다.
    async fn latest_quote(&self, symbol: &str) -> Option<serde_json::Value>;

    /// 과거 봉 데이터 조회. 브로커 응답 본문을 그대로 반환합니다.
    async fn bars(&self, symbol: &str, timeframe: &str, limit: u32)
        -> Option<serde_json::Value>;
}
