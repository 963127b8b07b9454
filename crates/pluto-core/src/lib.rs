//! # Pluto Core
//!
//! Pluto Lander 컨트롤 플레인의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 주문 및 트레이드 시그널 타입
//! - 텔레메트리 이벤트 (WebSocket 팬아웃 단위)
//! - 설정 저장소 (브로커 자격증명, 알림 설정)
//! - 로깅 인프라

pub mod config;
pub mod error;
pub mod logging;
pub mod telemetry;
pub mod types;

pub use config::{Settings, SettingsStore, SettingsUpdate, UserRecord};
pub use error::{PlutoError, PlutoResult};
pub use logging::{init_logging, init_logging_from_env, LogConfig, LogFormat};
pub use telemetry::{TelemetryEvent, TelemetryMode};
pub use types::{OrderKind, OrderTicket, Side, TimeInForce, TradeSignal};
