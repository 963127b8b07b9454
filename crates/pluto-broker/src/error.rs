//! 브로커 게이트웨이 에러 타입.

use thiserror::Error;

/// 브로커 관련 에러.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// 브로커 자격증명 미설정
    #[error("Broker credentials not configured")]
    NotConfigured,

    /// 브로커가 요청을 거부함 (응답 본문 원문 포함)
    #[error("Broker rejected request: {body}")]
    Rejected {
        /// 브로커 응답 본문 원문
        body: String,
    },

    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    Parse(String),
}

/// 브로커 작업을 위한 Result 타입.
pub type BrokerResult<T> = Result<T, BrokerError>;

impl BrokerError {
    /// 전송 계층 에러인지 확인.
    ///
    /// 읽기 경로는 전송 에러를 빈 결과로 degrade합니다.
    pub fn is_transport(&self) -> bool {
        matches!(self, BrokerError::Network(_) | BrokerError::Timeout(_))
    }
}

impl From<reqwest::Error> for BrokerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BrokerError::Timeout(err.to_string())
        } else {
            BrokerError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BrokerError {
    fn from(err: serde_json::Error) -> Self {
        BrokerError::Parse(err.to_string())
    }
}
