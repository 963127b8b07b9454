//! 실시간 텔레메트리 스트리밍을 위한 WebSocket 서버.
//!
//! ESP32 디스플레이와 대시보드 클라이언트에게 트레이드 시그널,
//! 주문 이벤트, 주기적 텔레메트리 스냅샷을 팬아웃합니다.
//!
//! # 메시지 형식
//!
//! ## 서버 → 클라이언트
//!
//! ```json
//! {"type": "trade_signal", "symbol": "BTCUSD", "side": "buy", "confidence": 0.8}
//! {"type": "telemetry", "btc_price": 105000.0, "mode": "live", "sparkline": [...]}
//! {"type": "pong"}
//! ```
//!
//! ## 클라이언트 → 서버
//!
//! 리터럴 텍스트 `ping`만 해석됩니다. 그 외는 무시됩니다.

pub mod handler;
pub mod hub;
pub mod registry;

pub use handler::{telemetry_ws_handler, telemetry_ws_router, WsState};
pub use hub::{create_telemetry_hub, SharedTelemetryHub, TelemetryHub};
pub use registry::{
    create_subscriber_registry, SharedSubscriberRegistry, SubscriberRegistry, SubscriberSender,
};
