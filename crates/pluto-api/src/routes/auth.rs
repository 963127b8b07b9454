//! 인증 라우트.
//!
//! 로그인 및 현재 사용자 조회.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::{authenticate_user, create_access_token, AuthUser};
use crate::error::{ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 로그인 폼 (OAuth2 password flow 호환).
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// 외부에 노출되는 사용자 정보.
#[derive(Debug, Serialize)]
pub struct UserPublic {
    pub username: String,
}

/// 로그인 응답.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserPublic,
}

/// 로그인 처리.
///
/// # 엔드포인트
///
/// `POST /api/auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<LoginResponse>> {
    let user = authenticate_user(&state.settings, &form.username, &form.password).ok_or((
        StatusCode::UNAUTHORIZED,
        Json(ApiErrorResponse::new(
            "INVALID_CREDENTIALS",
            "Incorrect username or password",
        )),
    ))?;

    let access_token = create_access_token(&user.username, &state.jwt_secret).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse::new("TOKEN_ERROR", e.to_string())),
        )
    })?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: UserPublic {
            username: user.username,
        },
    }))
}

/// 현재 인증된 사용자 조회.
///
/// # 엔드포인트
///
/// `GET /api/auth/me`
pub async fn me(AuthUser(claims): AuthUser) -> Json<UserPublic> {
    Json(UserPublic { username: claims.sub })
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
}
