//! # Pluto Notification
//!
//! 트레이드 시그널에 대한 best-effort 알림 (이메일/SMS).
//!
//! 알림은 텔레메트리 경로와 완전히 분리된 fire-and-forget 태스크로
//! 실행됩니다. 전송 실패는 로깅될 뿐, 시그널 퍼블리시를 막거나
//! 되돌리지 않습니다.

pub mod email;
pub mod sms;
pub mod types;

use std::sync::Arc;

use tracing::warn;

use pluto_core::{Settings, TradeSignal};

pub use email::{EmailSender, MailConfig};
pub use sms::SmsSender;
pub use types::{NotificationError, NotificationResult, NotificationSender};

/// 설정된 모든 채널로 시그널 알림을 발송합니다.
///
/// 전송기마다 독립된 태스크를 생성하며, 호출자는 결과를 기다리지
/// 않습니다.
pub fn dispatch_trade_notification(settings: &Settings, signal: TradeSignal) {
    let mut jobs: Vec<(Arc<dyn NotificationSender>, String)> = Vec::new();

    if let Some(email) = &settings.notify_email {
        if let Some(sender) = EmailSender::from_env() {
            if sender.is_enabled() {
                jobs.push((Arc::new(sender), email.clone()));
            }
        }
    }

    if let Some(number) = &settings.notify_sms_number {
        let sender = SmsSender::from_env();
        if sender.is_enabled() {
            jobs.push((Arc::new(sender), number.clone()));
        }
    }

    for (sender, recipient) in jobs {
        let signal = signal.clone();
        tokio::spawn(async move {
            if let Err(e) = sender.send(&recipient, &signal).await {
                warn!(
                    sender = sender.name(),
                    error = %e,
                    "Notification delivery failed"
                );
            }
        });
    }
}
