//! Pluto Lander 백엔드 서버.
//!
//! 트레이딩 봇 컨트롤 플레인을 시작합니다: REST API, WebSocket
//! 텔레메트리, 시장 데이터 폴러.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::get, Extension, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use pluto_api::auth::{ensure_default_user, JwtConfig};
use pluto_api::routes::create_api_router;
use pluto_api::services::start_market_poller;
use pluto_api::state::AppState;
use pluto_api::websocket::{
    create_subscriber_registry, create_telemetry_hub, telemetry_ws_router, WsState,
};
use pluto_broker::{AlpacaGateway, Brokerage, CoinbaseSpot};
use pluto_core::{init_logging_from_env, SettingsStore};

/// 서버 설정 구조체.
struct ServerConfig {
    /// 바인딩할 호스트 주소
    host: String,
    /// 바인딩할 포트
    port: u16,
    /// 설정 파일 디렉터리
    config_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            config_dir: "./config".to_string(),
        }
    }
}

impl ServerConfig {
    /// 환경 변수에서 설정 로드.
    fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("API_HOST").unwrap_or(defaults.host);
        let port = std::env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let config_dir = std::env::var("PLUTO_CONFIG_DIR").unwrap_or(defaults.config_dir);

        Self {
            host,
            port,
            config_dir,
        }
    }

    /// 소켓 주소 반환.
    fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// CORS 미들웨어 구성.
///
/// `CORS_ORIGINS` 환경변수가 설정되어 있으면 해당 origin만 허용하고,
/// 없으면 개발 모드로 간주하여 모든 origin을 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600))
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    ws_state: WsState,
    jwt_secret: String,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let ws_router = telemetry_ws_router(ws_state).with_state(state.clone());

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router().with_state(state))
        .nest("/ws", ws_router)
        .layer(Extension(JwtConfig { secret: jwt_secret }))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors_layer())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    init_logging_from_env().map_err(|e| anyhow::anyhow!("logging init failed: {}", e))?;

    info!("Starting Pluto Lander backend...");

    // Prometheus 메트릭 레코더 설정
    let metrics_handle = pluto_api::setup_metrics_recorder();

    // 설정 로드
    let config = ServerConfig::from_env();
    let addr = config.socket_addr().map_err(|e| {
        error!(
            host = %config.host,
            port = config.port,
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. API_HOST, API_PORT 환경변수를 확인하세요."
        );
        e
    })?;

    // 설정 저장소 및 기본 관리자 계정
    let settings = Arc::new(SettingsStore::open(&config.config_dir)?);
    ensure_default_user(&settings)?;
    info!(dir = %config.config_dir, "Settings store ready");

    // JWT 시크릿 로드
    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        warn!("JWT_SECRET not set, using default (INSECURE for development only)");
        "dev-secret-key-change-in-production".to_string()
    });

    // 구독자 registry와 텔레메트리 허브
    let registry = create_subscriber_registry();
    let hub = create_telemetry_hub(registry);
    info!("Telemetry hub initialized");

    // 브로커 게이트웨이 및 시세 제공자
    let broker = Arc::new(AlpacaGateway::new(settings.clone())?);
    let spot = Arc::new(CoinbaseSpot::new()?);
    info!(configured = broker.is_configured(), "Alpaca gateway ready");

    // 전역 종료 토큰 (백그라운드 태스크 graceful shutdown용)
    let shutdown_token = CancellationToken::new();

    // 시장 데이터 폴러 시작
    let _poller_handle =
        start_market_poller(spot, broker.clone(), hub.clone(), shutdown_token.clone());

    // 애플리케이션 상태
    let state = Arc::new(AppState::new(
        settings,
        broker,
        hub.clone(),
        jwt_secret.clone(),
    ));
    let ws_state = WsState::new(hub);

    info!(version = %state.version, "Application state initialized");

    // 라우터 생성
    let app = create_router(state, metrics_handle, ws_state, jwt_secret);

    // 서버 시작
    info!(%addr, "API server listening");
    info!("WebSocket telemetry at ws://{}/ws/telemetry", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server shutdown initiated, cleaning up...");
    shutdown_token.cancel();
    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
