//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! 폴러/허브의 degrade 지점마다 print 대신 구조화된 관측 지표를
//! 남기고 `/metrics` 엔드포인트로 노출합니다.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Prometheus 메트릭 레코더를 설정하고 핸들을 반환합니다.
///
/// # 패닉
///
/// 레코더가 이미 설치되어 있으면 패닉합니다.
pub fn setup_metrics_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Prometheus 레코더 설치 실패")
}

/// 텔레메트리 publish 기록.
pub fn record_telemetry_publish(kind: &str, delivered: usize) {
    counter!("telemetry_events_published_total", "kind" => kind.to_string()).increment(1);
    counter!("telemetry_deliveries_total", "kind" => kind.to_string())
        .increment(delivered as u64);
}

/// 주문 제출 결과 기록.
pub fn record_order(side: &str, outcome: &str) {
    counter!(
        "trading_orders_total",
        "side" => side.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// 폴러 degrade 지점 기록.
pub fn record_poll_degrade(source: &str) {
    counter!("market_poll_degraded_total", "source" => source.to_string()).increment(1);
}

/// WebSocket 연결 수 증가.
pub fn increment_websocket_connections() {
    gauge!("websocket_connections_active").increment(1.0);
}

/// WebSocket 연결 수 감소.
pub fn decrement_websocket_connections() {
    gauge!("websocket_connections_active").decrement(1.0);
}
