//! Per-kind side-effect policy for notifications
//!
//! This module maps each notification kind to a static policy describing
//! which side effects fire and with what display parameters:
//! - toast: in-app banner with a variant and auto-dismiss duration
//! - sound: audio cue (further gated by the session sound preference)
//! - OS notification: native notification (further gated by permission)
//!
//! The table is read-only configuration. It must stay in sync with the
//! producer's type vocabulary; an unrecognized tag resolves to the default
//! policy instead of failing, so a new server-side event category degrades
//! to a plain toast until a policy row is added here.

use serde::{Deserialize, Serialize};

use super::event::NotificationKind;

/// Visual variant of an in-app toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastVariant {
    Default,
    Info,
    Success,
    Warning,
    Error,
}

impl ToastVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastVariant::Default => "default",
            ToastVariant::Info => "info",
            ToastVariant::Success => "success",
            ToastVariant::Warning => "warning",
            ToastVariant::Error => "error",
        }
    }
}

impl std::fmt::Display for ToastVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static per-kind side-effect configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NotificationPolicy {
    pub show_toast: bool,
    pub toast_variant: ToastVariant,
    pub toast_duration_ms: u64,
    pub play_sound: bool,
    pub show_os_notification: bool,
}

/// The guaranteed fallback entry: plain toast, nothing else.
pub const DEFAULT_POLICY: NotificationPolicy = NotificationPolicy {
    show_toast: true,
    toast_variant: ToastVariant::Default,
    toast_duration_ms: 4000,
    play_sound: false,
    show_os_notification: false,
};

/// Resolve the policy for a notification kind
///
/// Pure and total: every kind, including `Unknown`, yields a policy.
/// Leads are the revenue path — they get the full treatment (toast, cue,
/// native notification). Broadcasts stay quiet on purpose; they fan out to
/// every connected session at once.
pub fn resolve(kind: NotificationKind) -> NotificationPolicy {
    match kind {
        NotificationKind::NewMessage => NotificationPolicy {
            show_toast: true,
            toast_variant: ToastVariant::Info,
            toast_duration_ms: 4000,
            play_sound: true,
            show_os_notification: false,
        },
        NotificationKind::LeadAlert => NotificationPolicy {
            show_toast: true,
            toast_variant: ToastVariant::Success,
            toast_duration_ms: 6000,
            play_sound: true,
            show_os_notification: true,
        },
        NotificationKind::VendorApproval => NotificationPolicy {
            show_toast: true,
            toast_variant: ToastVariant::Success,
            toast_duration_ms: 5000,
            play_sound: false,
            show_os_notification: true,
        },
        NotificationKind::Broadcast => NotificationPolicy {
            show_toast: true,
            toast_variant: ToastVariant::Info,
            toast_duration_ms: 5000,
            play_sound: false,
            show_os_notification: false,
        },
        NotificationKind::PaymentReceived => NotificationPolicy {
            show_toast: true,
            toast_variant: ToastVariant::Success,
            toast_duration_ms: 6000,
            play_sound: true,
            show_os_notification: false,
        },
        NotificationKind::Test => NotificationPolicy {
            show_toast: true,
            toast_variant: ToastVariant::Default,
            toast_duration_ms: 4000,
            play_sound: false,
            show_os_notification: false,
        },
        NotificationKind::Unknown => DEFAULT_POLICY,
    }
}
