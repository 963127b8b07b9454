//! 설정 라우트.
//!
//! 설정 조회/갱신. 응답에는 원본 값과 함께 마스킹된 보조 필드가
//! 포함됩니다.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use pluto_core::{Settings, SettingsUpdate};

use crate::auth::AuthUser;
use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 설정 응답.
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    #[serde(flatten)]
    pub settings: Settings,
    pub alpaca_api_key_masked: Option<String>,
    pub alpaca_api_secret_masked: Option<String>,
}

impl From<Settings> for SettingsResponse {
    fn from(settings: Settings) -> Self {
        let (alpaca_api_key_masked, alpaca_api_secret_masked) = settings.masked_fields();
        Self {
            settings,
            alpaca_api_key_masked,
            alpaca_api_secret_masked,
        }
    }
}

/// 설정 조회.
///
/// # 엔드포인트
///
/// `GET /api/settings`
pub async fn get_settings(
    AuthUser(_claims): AuthUser,
    State(state): State<Arc<AppState>>,
) -> Json<SettingsResponse> {
    Json(state.settings.current().into())
}

/// 설정 갱신.
///
/// 제공된 필드만 병합되어 저장됩니다.
///
/// # 엔드포인트
///
/// `PUT /api/settings`
pub async fn update_settings(
    AuthUser(_claims): AuthUser,
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<Json<SettingsResponse>> {
    let settings = state.settings.update(update).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new("CONFIG_ERROR", e.to_string())),
        )
    })?;

    Ok(Json(settings.into()))
}

/// 설정 라우터 생성.
pub fn settings_router() -> Router<Arc<AppState>> {
    Router::new().route("/api/settings", get(get_settings).put(update_settings))
}
