//! 설정 및 사용자 저장소.
//!
//! 브로커 자격증명과 알림 설정을 JSON 파일로 영속화합니다.
//! 설정은 read-mostly이므로 프로세스 내에 캐시되고, 업데이트 시
//! 명시적으로 다시 기록됩니다.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PlutoError, PlutoResult};

const SETTINGS_FILE: &str = "settings.json";
const USER_FILE: &str = "user.json";

fn default_true() -> bool {
    true
}

fn default_theme() -> String {
    "dark-gold".to_string()
}

fn default_layout() -> String {
    "braiins-style".to_string()
}

/// 사용자 설정.
///
/// 파일에는 마스킹된 보조 필드가 함께 기록되지만, 로드 시에는
/// 무시됩니다 (원본 값이 단일 원천).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Alpaca API 키
    #[serde(default)]
    pub alpaca_api_key: Option<String>,
    /// Alpaca API 시크릿
    #[serde(default)]
    pub alpaca_api_secret: Option<String>,
    /// 모의투자(paper) 모드 사용
    #[serde(default = "default_true")]
    pub alpaca_paper: bool,

    /// 알림 수신 이메일
    #[serde(default)]
    pub notify_email: Option<String>,
    /// 알림 수신 SMS 번호
    #[serde(default)]
    pub notify_sms_number: Option<String>,

    /// 디스플레이 테마
    #[serde(default = "default_theme")]
    pub display_theme: String,
    /// 디스플레이 레이아웃
    #[serde(default = "default_layout")]
    pub display_layout: String,

    /// 디스플레이 위젯 토글
    #[serde(default = "default_true")]
    pub widget_btc_price: bool,
    #[serde(default = "default_true")]
    pub widget_portfolio: bool,
    #[serde(default = "default_true")]
    pub widget_positions: bool,
    #[serde(default = "default_true")]
    pub widget_pnl: bool,
    #[serde(default)]
    pub widget_clock: bool,
    #[serde(default = "default_true")]
    pub widget_alerts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alpaca_api_key: None,
            alpaca_api_secret: None,
            alpaca_paper: true,
            notify_email: None,
            notify_sms_number: None,
            display_theme: default_theme(),
            display_layout: default_layout(),
            widget_btc_price: true,
            widget_portfolio: true,
            widget_positions: true,
            widget_pnl: true,
            widget_clock: false,
            widget_alerts: true,
        }
    }
}

impl Settings {
    /// 브로커 자격증명이 설정되어 있는지 확인.
    pub fn has_broker_credentials(&self) -> bool {
        matches!(
            (&self.alpaca_api_key, &self.alpaca_api_secret),
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty()
        )
    }

    /// API 응답용 마스킹 필드 생성.
    ///
    /// 키는 앞 4자, 시크릿은 뒤 4자만 노출합니다.
    pub fn masked_fields(&self) -> (Option<String>, Option<String>) {
        let key_masked = self.alpaca_api_key.as_deref().map(mask_key);
        let secret_masked = self.alpaca_api_secret.as_deref().map(mask_secret);
        (key_masked, secret_masked)
    }
}

fn mask_key(key: &str) -> String {
    if key.len() > 4 {
        format!("{}********", &key[..4])
    } else {
        "****".to_string()
    }
}

fn mask_secret(secret: &str) -> String {
    if secret.len() > 4 {
        format!("****{}", &secret[secret.len() - 4..])
    } else {
        "****".to_string()
    }
}

/// 설정 업데이트 요청.
///
/// 제공된 필드만 병합됩니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub alpaca_api_key: Option<String>,
    pub alpaca_api_secret: Option<String>,
    pub alpaca_paper: Option<bool>,
    pub notify_email: Option<String>,
    pub notify_sms_number: Option<String>,
    pub display_theme: Option<String>,
    pub display_layout: Option<String>,
    pub widget_btc_price: Option<bool>,
    pub widget_portfolio: Option<bool>,
    pub widget_positions: Option<bool>,
    pub widget_pnl: Option<bool>,
    pub widget_clock: Option<bool>,
    pub widget_alerts: Option<bool>,
}

impl SettingsUpdate {
    /// 제공된 필드를 기존 설정에 병합.
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.alpaca_api_key {
            settings.alpaca_api_key = Some(v);
        }
        if let Some(v) = self.alpaca_api_secret {
            settings.alpaca_api_secret = Some(v);
        }
        if let Some(v) = self.alpaca_paper {
            settings.alpaca_paper = v;
        }
        if let Some(v) = self.notify_email {
            settings.notify_email = Some(v);
        }
        if let Some(v) = self.notify_sms_number {
            settings.notify_sms_number = Some(v);
        }
        if let Some(v) = self.display_theme {
            settings.display_theme = v;
        }
        if let Some(v) = self.display_layout {
            settings.display_layout = v;
        }
        if let Some(v) = self.widget_btc_price {
            settings.widget_btc_price = v;
        }
        if let Some(v) = self.widget_portfolio {
            settings.widget_portfolio = v;
        }
        if let Some(v) = self.widget_positions {
            settings.widget_positions = v;
        }
        if let Some(v) = self.widget_pnl {
            settings.widget_pnl = v;
        }
        if let Some(v) = self.widget_clock {
            settings.widget_clock = v;
        }
        if let Some(v) = self.widget_alerts {
            settings.widget_alerts = v;
        }
    }
}

/// 관리자 계정 레코드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// 사용자 이름
    pub username: String,
    /// argon2 PHC 형식 비밀번호 해시
    pub password_hash: String,
}

/// 파일 기반 설정 저장소.
///
/// 여러 태스크에서 공유되며, 읽기는 캐시에서, 쓰기는 파일과 캐시에
/// 동시에 반영됩니다.
pub struct SettingsStore {
    dir: PathBuf,
    cached: RwLock<Settings>,
}

impl SettingsStore {
    /// 설정 디렉터리를 열거나 생성합니다.
    ///
    /// 설정 파일이 없으면 기본값으로 생성합니다.
    pub fn open(dir: impl Into<PathBuf>) -> PlutoResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let settings_path = dir.join(SETTINGS_FILE);
        let settings = if settings_path.exists() {
            let raw = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&raw)?
        } else {
            let defaults = Settings::default();
            write_settings_file(&settings_path, &defaults)?;
            defaults
        };

        Ok(Self {
            dir,
            cached: RwLock::new(settings),
        })
    }

    /// 현재 설정 스냅샷 반환.
    pub fn current(&self) -> Settings {
        self.cached
            .read()
            .expect("settings lock poisoned")
            .clone()
    }

    /// 설정 병합 후 영속화.
    pub fn update(&self, update: SettingsUpdate) -> PlutoResult<Settings> {
        let mut guard = self.cached.write().expect("settings lock poisoned");
        let mut next = guard.clone();
        update.apply(&mut next);

        write_settings_file(&self.dir.join(SETTINGS_FILE), &next)?;
        *guard = next.clone();

        info!("Settings saved");
        Ok(next)
    }

    /// 저장된 사용자 로드.
    pub fn load_user(&self) -> PlutoResult<Option<UserRecord>> {
        let path = self.dir.join(USER_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// 사용자 저장.
    pub fn save_user(&self, user: &UserRecord) -> PlutoResult<()> {
        let path = self.dir.join(USER_FILE);
        std::fs::write(&path, serde_json::to_string(user)?)?;
        Ok(())
    }

    /// 설정 디렉터리 경로.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// 설정을 마스킹 보조 필드와 함께 파일로 기록.
fn write_settings_file(path: &Path, settings: &Settings) -> PlutoResult<()> {
    let mut data = serde_json::to_value(settings)
        .map_err(PlutoError::from)?
        .as_object()
        .cloned()
        .unwrap_or_default();

    let (key_masked, secret_masked) = settings.masked_fields();
    data.insert(
        "alpaca_api_key_masked".to_string(),
        serde_json::to_value(key_masked)?,
    );
    data.insert(
        "alpaca_api_secret_masked".to_string(),
        serde_json::to_value(secret_masked)?,
    );

    std::fs::write(path, serde_json::to_string_pretty(&data)?)?;
    Ok(())
}
