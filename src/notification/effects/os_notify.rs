//! Native OS notification emitter, gated by an explicit permission grant
//!
//! The emitter never prompts on its own: permission acquisition is a
//! separate user-initiated action on [`PermissionGate`]. Without a grant
//! the executor is a no-op. Notifications carry a stable per-type id so
//! repeated notifications of one type coalesce at the OS level.

use anyhow::Result;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::notification::dispatcher::{EffectResult, SideEffectExecutor};
use crate::notification::event::Notification;
use crate::notification::identity::hash_content;
use crate::notification::policy::NotificationPolicy;

const APP_NAME: &str = "Estate";
const APP_ICON: &str = "estate-notify";

/// Platform notification permission as seen by this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// Never asked; a request will probe the platform.
    Prompt,
    Granted,
    /// Denied stays denied; we do not re-prompt.
    Denied,
}

/// Permission gate for native notifications.
///
/// `request_permission` is only ever called from a direct user action
/// (for example the `enable-os-notifications` CLI command), never from the
/// delivery pipeline.
pub struct PermissionGate {
    state: Mutex<PermissionState>,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PermissionState::Prompt),
        }
    }

    /// Start from a known state (tests, or a host app that already asked).
    pub fn with_state(state: PermissionState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn state(&self) -> PermissionState {
        *self.state.lock().unwrap()
    }

    pub fn is_granted(&self) -> bool {
        self.state() == PermissionState::Granted
    }

    /// Request platform permission; returns whether it is granted.
    ///
    /// Short-circuits when already granted or denied. Freedesktop daemons
    /// have no ask-without-show API, so the probe emits one confirmation
    /// notification; its outcome is recorded for the session.
    pub fn request_permission(&self) -> bool {
        self.request_permission_with(|| {
            notify_rust::Notification::new()
                .appname(APP_NAME)
                .summary("Notifications enabled")
                .body("You will now receive desktop alerts from Estate.")
                .icon(APP_ICON)
                .show()
                .is_ok()
        })
    }

    fn request_permission_with(&self, probe: impl FnOnce() -> bool) -> bool {
        let mut state = self.state.lock().unwrap();
        match *state {
            PermissionState::Granted => true,
            PermissionState::Denied => {
                debug!("Notification permission previously denied, not re-prompting");
                false
            }
            PermissionState::Prompt => {
                let granted = probe();
                *state = if granted {
                    PermissionState::Granted
                } else {
                    PermissionState::Denied
                };
                info!(granted, "Notification permission probe finished");
                granted
            }
        }
    }
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Native notification executor.
pub struct OsNotificationEmitter {
    gate: Arc<PermissionGate>,
}

impl OsNotificationEmitter {
    pub fn new(gate: Arc<PermissionGate>) -> Self {
        Self { gate }
    }
}

/// Stable per-type id; the freedesktop replace-id acts as the coalescing tag.
fn coalescing_id(event_type: &str) -> u32 {
    hash_content(event_type) as u32
}

impl SideEffectExecutor for OsNotificationEmitter {
    fn name(&self) -> &str {
        "os-notification"
    }

    fn execute(
        &self,
        notification: &Notification,
        policy: &NotificationPolicy,
    ) -> Result<EffectResult> {
        if !policy.show_os_notification {
            return Ok(EffectResult::Skipped(
                "policy disables OS notification".to_string(),
            ));
        }
        if !self.gate.is_granted() {
            return Ok(EffectResult::Skipped(
                "notification permission not granted".to_string(),
            ));
        }

        let title = notification.title.clone();
        let body = notification.message.clone();
        let id = coalescing_id(&notification.event_type);

        // show() blocks on the notification bus; keep it off the pipeline.
        std::thread::spawn(move || {
            let result = notify_rust::Notification::new()
                .appname(APP_NAME)
                .summary(&title)
                .body(&body)
                .icon(APP_ICON)
                .id(id)
                .show();
            if let Err(e) = result {
                warn!(error = %e, "Failed to emit OS notification");
            }
        });

        Ok(EffectResult::Executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::policy::DEFAULT_POLICY;

    fn notification(event_type: &str) -> Notification {
        Notification {
            event_type: event_type.to_string(),
            title: "New lead".to_string(),
            message: "Unit 4B".to_string(),
            data: serde_json::Map::new(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            user_id: "v3".to_string(),
        }
    }

    #[test]
    fn test_skipped_when_policy_disables() {
        let gate = Arc::new(PermissionGate::with_state(PermissionState::Granted));
        let emitter = OsNotificationEmitter::new(gate);
        let result = emitter
            .execute(&notification("lead_alert"), &DEFAULT_POLICY)
            .unwrap();
        assert!(matches!(result, EffectResult::Skipped(_)));
    }

    #[test]
    fn test_noop_without_permission() {
        let gate = Arc::new(PermissionGate::new());
        let emitter = OsNotificationEmitter::new(gate);

        let mut policy = DEFAULT_POLICY;
        policy.show_os_notification = true;

        let result = emitter
            .execute(&notification("lead_alert"), &policy)
            .unwrap();
        assert_eq!(
            result,
            EffectResult::Skipped("notification permission not granted".to_string())
        );
    }

    #[test]
    fn test_request_permission_probes_once() {
        let gate = PermissionGate::new();
        assert_eq!(gate.state(), PermissionState::Prompt);

        assert!(gate.request_permission_with(|| true));
        assert_eq!(gate.state(), PermissionState::Granted);

        // Already granted: short-circuits, probe not called again
        assert!(gate.request_permission_with(|| panic!("must not probe again")));
    }

    #[test]
    fn test_denied_is_not_reprompted() {
        let gate = PermissionGate::new();
        assert!(!gate.request_permission_with(|| false));
        assert_eq!(gate.state(), PermissionState::Denied);

        // Denied stays denied without another probe
        assert!(!gate.request_permission_with(|| panic!("must not probe again")));
    }

    #[test]
    fn test_coalescing_id_is_stable_per_type() {
        assert_eq!(coalescing_id("lead_alert"), coalescing_id("lead_alert"));
        assert_ne!(coalescing_id("lead_alert"), coalescing_id("new_message"));
    }
}
