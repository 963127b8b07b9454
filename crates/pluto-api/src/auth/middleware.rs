//! Axum용 JWT 인증 추출기.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::jwt::{decode_token, Claims, JwtError};

/// JWT 인증 추출기.
///
/// 보호된 핸들러에서 인증된 사용자 정보를 추출합니다.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn protected_handler(AuthUser(claims): AuthUser) -> impl IntoResponse {
///     format!("Authenticated user: {}", claims.sub)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

/// JWT 인증 에러.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("인증 토큰이 필요합니다")]
    MissingToken,
    #[error("잘못된 Authorization 헤더 형식")]
    InvalidAuthHeader,
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("유효하지 않은 토큰")]
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let code = match &self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidToken => "INVALID_TOKEN",
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string()
            }
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// JWT 비밀 키 저장소.
///
/// 라우터에 `Extension`으로 주입되어 추출기가 접근합니다.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let jwt_secret = parts
            .extensions
            .get::<JwtConfig>()
            .map(|c| c.secret.clone())
            .unwrap_or_else(|| {
                // 개발/테스트 환경용 기본 시크릿
                std::env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "dev-secret-key-change-in-production".to_string())
            });

        let token_data = decode_token(token, &jwt_secret).map_err(|e| match e {
            JwtError::TokenExpired => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        Ok(AuthUser(token_data.claims))
    }
}
