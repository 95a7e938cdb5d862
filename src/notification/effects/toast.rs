//! Toast 执行器 - 向 UI 层投递应用内横幅
//!
//! 呈现本身属于外层 UI；本执行器只负责把 [`Toast`] 推入无界通道，
//! 发送永不阻塞调用方（fire-and-forget）。UI 侧未在消费时仅记
//! debug 日志。

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::debug;

use crate::notification::dispatcher::{EffectResult, SideEffectExecutor};
use crate::notification::event::Notification;
use crate::notification::policy::{NotificationPolicy, ToastVariant};

/// 一条待呈现的应用内横幅
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub variant: ToastVariant,
    /// 自动消失时间
    pub duration_ms: u64,
}

impl Toast {
    /// 构造一条错误横幅（诊断路径专用）
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            variant: ToastVariant::Error,
            duration_ms: 5000,
        }
    }
}

/// Toast 执行器
pub struct ToastPresenter {
    sender: mpsc::UnboundedSender<Toast>,
}

impl ToastPresenter {
    /// 创建执行器，返回 UI 消费端
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// 基于既有发送端创建（与诊断路径共用同一条通道）
    pub fn with_sender(sender: mpsc::UnboundedSender<Toast>) -> Self {
        Self { sender }
    }
}

impl SideEffectExecutor for ToastPresenter {
    fn name(&self) -> &str {
        "toast"
    }

    fn execute(
        &self,
        notification: &Notification,
        policy: &NotificationPolicy,
    ) -> Result<EffectResult> {
        if !policy.show_toast {
            return Ok(EffectResult::Skipped("policy disables toast".to_string()));
        }

        let toast = Toast {
            title: notification.title.clone(),
            message: notification.message.clone(),
            variant: policy.toast_variant,
            duration_ms: policy.toast_duration_ms,
        };

        if self.sender.send(toast).is_err() {
            // UI 侧已放弃消费，不视为错误
            debug!("Toast receiver dropped, toast discarded");
        }

        Ok(EffectResult::Executed)
    }
}
