//! WebSocket 텔레메트리 연결 handler.
//!
//! Axum WebSocket 엔드포인트 및 구독자 수명 주기 관리.
//!
//! # 프로토콜
//!
//! 서버는 JSON으로 인코딩된 [`TelemetryEvent`]를 푸시합니다.
//! 클라이언트는 리터럴 텍스트 `ping`을 보내 `{"type":"pong"}` 응답으로
//! 연결을 확인할 수 있습니다. 그 외의 수신 페이로드는 무시되고 연결은
//! 유지됩니다. ESP32 디스플레이의 일시적 오동작이 스트림을 끊지
//! 않아야 합니다.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use pluto_core::TelemetryEvent;

use super::hub::SharedTelemetryHub;
use super::registry::SubscriberSender;
use crate::metrics::{decrement_websocket_connections, increment_websocket_connections};
use crate::state::AppState;

/// WebSocket 상태.
#[derive(Clone)]
pub struct WsState {
    /// 텔레메트리 허브
    pub hub: SharedTelemetryHub,
}

impl WsState {
    /// 새로운 WebSocket 상태 생성.
    pub fn new(hub: SharedTelemetryHub) -> Self {
        Self { hub }
    }
}

/// WebSocket 업그레이드 핸들러.
///
/// # 엔드포인트
///
/// `GET /ws/telemetry`
pub async fn telemetry_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<WsState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// WebSocket 연결 처리.
async fn handle_socket(socket: WebSocket, state: WsState) {
    let registry = state.hub.registry().clone();
    let (subscriber_id, subscriber_tx, mut event_rx) = registry.add().await;

    increment_websocket_connections();
    let total = registry.count().await;
    info!(
        subscriber = %subscriber_id,
        total,
        "Telemetry subscriber connected"
    );

    let (mut sender, mut receiver) = socket.split();

    // 구독자 채널 → 소켓 전송 태스크
    let send_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let json = match event.to_json() {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Failed to encode telemetry event");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // 클라이언트 제어 프레임 수신 태스크
    let receive_tx = subscriber_tx.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if !handle_client_text(&text, &receive_tx) {
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("Close frame received");
                    break;
                }
                Ok(Message::Binary(_)) | Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Err(e) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
            }
        }
    });

    // 하나의 태스크가 종료되면 연결 전체를 정리
    tokio::select! {
        _ = send_task => {
            debug!(subscriber = %subscriber_id, "Send task ended");
        }
        _ = receive_task => {
            debug!(subscriber = %subscriber_id, "Receive task ended");
        }
    }

    registry.remove(&subscriber_id).await;
    decrement_websocket_connections();

    let total = registry.count().await;
    info!(
        subscriber = %subscriber_id,
        total,
        "Telemetry subscriber disconnected"
    );
}

/// 클라이언트 텍스트 프레임 처리.
///
/// `ping`은 구독자 자신의 채널로 pong을 큐잉하여 텔레메트리 이벤트와의
/// 구독자별 순서를 유지합니다. 그 외 입력은 무시합니다.
///
/// # Returns
///
/// `true`면 연결 유지, `false`면 연결 종료 (채널이 닫힌 경우).
fn handle_client_text(text: &str, tx: &SubscriberSender) -> bool {
    if text.trim() == "ping" {
        return tx.send(TelemetryEvent::Pong).is_ok();
    }
    debug!("Ignoring unrecognized client frame");
    true
}

/// WebSocket 라우터 생성.
pub fn telemetry_ws_router(ws_state: WsState) -> Router<Arc<AppState>> {
    Router::new()
        .route("/telemetry", get(telemetry_ws_handler))
        .with_state(ws_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::registry::create_subscriber_registry;

    #[tokio::test]
    async fn test_ping_queues_exactly_one_pong() {
        let registry = create_subscriber_registry();
        let (_id, tx, mut rx) = registry.add().await;

        assert!(handle_client_text("ping", &tx));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.to_json().unwrap(), r#"{"type":"pong"}"#);
        // ping 교환은 다른 이벤트를 유발하지 않음
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_frames_ignored() {
        let registry = create_subscriber_registry();
        let (_id, tx, mut rx) = registry.add().await;

        assert!(handle_client_text("hello", &tx));
        assert!(handle_client_text("{\"type\":\"subscribe\"}", &tx));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_ping_on_closed_channel_ends_connection() {
        let registry = create_subscriber_registry();
        let (_id, tx, rx) = registry.add().await;
        drop(rx);

        assert!(!handle_client_text("ping", &tx));
    }
}
