//! 인증 및 권한 부여.
//!
//! JWT 기반 인증과 단일 관리자 계정 관리를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`Claims`]: JWT 페이로드 구조체
//! - [`AuthUser`]: Axum 핸들러용 JWT 인증 추출기
//! - 토큰 생성/검증 및 비밀번호 해싱 함수

mod jwt;
mod middleware;
mod password;

use tracing::warn;

use pluto_core::{PlutoResult, SettingsStore, UserRecord};

pub use jwt::{create_access_token, create_token, decode_token, Claims, JwtError};
pub use middleware::{AuthError, AuthUser, JwtConfig};
pub use password::{hash_password, verify_password, PasswordError};

/// 기본 관리자 계정.
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "pluto123";

/// 기본 관리자 계정이 없으면 생성합니다.
pub fn ensure_default_user(store: &SettingsStore) -> PlutoResult<()> {
    if store.load_user()?.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(DEFAULT_ADMIN_PASSWORD)
        .map_err(|e| pluto_core::PlutoError::Internal(e.to_string()))?;

    store.save_user(&UserRecord {
        username: DEFAULT_ADMIN_USERNAME.to_string(),
        password_hash,
    })?;

    warn!(
        username = DEFAULT_ADMIN_USERNAME,
        "Default admin user created with default password (CHANGE THIS!)"
    );
    Ok(())
}

/// 사용자 이름/비밀번호 인증.
///
/// 성공 시 저장된 사용자 레코드를 반환합니다.
pub fn authenticate_user(
    store: &SettingsStore,
    username: &str,
    password: &str,
) -> Option<UserRecord> {
    let user = store.load_user().ok().flatten()?;
    if user.username != username {
        return None;
    }
    verify_password(password, &user.password_hash).ok()?;
    Some(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> SettingsStore {
        let dir = std::env::temp_dir().join(format!("pluto-auth-{}", uuid::Uuid::new_v4()));
        SettingsStore::open(dir).unwrap()
    }

    #[test]
    fn test_ensure_default_user_idempotent() {
        let store = temp_store();

        ensure_default_user(&store).unwrap();
        let first = store.load_user().unwrap().unwrap();

        ensure_default_user(&store).unwrap();
        let second = store.load_user().unwrap().unwrap();

        // 두 번째 호출은 기존 계정을 덮어쓰지 않음
        assert_eq!(first.password_hash, second.password_hash);
    }

    #[test]
    fn test_authenticate_user() {
        let store = temp_store();
        ensure_default_user(&store).unwrap();

        assert!(authenticate_user(&store, "admin", "pluto123").is_some());
        assert!(authenticate_user(&store, "admin", "wrong").is_none());
        assert!(authenticate_user(&store, "nobody", "pluto123").is_none());
    }
}
