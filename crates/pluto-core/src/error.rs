//! 컨트롤 플레인의 공통 에러 타입.

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum PlutoError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 파일 입출력 에러
    #[error("입출력 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    Validation(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type PlutoResult<T> = Result<T, PlutoError>;

impl PlutoError {
    /// 호출자 입력에서 비롯된 에러인지 확인합니다.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, PlutoError::Validation(_))
    }
}
