//! 通知事件结构与帧规范化
//!
//! 服务端通过推送通道下发 JSON 帧。本模块将原始帧解析为类型化的
//! [`Notification`]，并在去重之前过滤掉连接握手等控制帧。
//! 解析失败的帧由调用方记录日志后丢弃，不会影响连接状态。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 已知的通知类别（封闭枚举）
///
/// 策略表以此为键。生产者词表之外的标签归入 [`NotificationKind::Unknown`]，
/// 使用默认策略，不会静默丢失事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// 新私信
    NewMessage,
    /// 潜在客户（lead）提醒
    LeadAlert,
    /// 商家审核结果
    VendorApproval,
    /// 平台广播
    Broadcast,
    /// 收款到账
    PaymentReceived,
    /// 端到端自检事件
    Test,
    /// 词表之外的标签
    Unknown,
}

impl NotificationKind {
    /// 从原始类型标签分类
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "new_message" => NotificationKind::NewMessage,
            "lead_alert" => NotificationKind::LeadAlert,
            "vendor_approval" => NotificationKind::VendorApproval,
            "broadcast" => NotificationKind::Broadcast,
            "payment_received" => NotificationKind::PaymentReceived,
            "test" => NotificationKind::Test,
            _ => NotificationKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewMessage => "new_message",
            NotificationKind::LeadAlert => "lead_alert",
            NotificationKind::VendorApproval => "vendor_approval",
            NotificationKind::Broadcast => "broadcast",
            NotificationKind::PaymentReceived => "payment_received",
            NotificationKind::Test => "test",
            NotificationKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 通知（不可变值）
///
/// `event_type` 保留线上的原始标签：身份键需要逐字节精确。
/// 策略查询走 [`Notification::kind`]。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// 原始类型标签
    #[serde(rename = "type")]
    pub event_type: String,
    /// 展示标题
    pub title: String,
    /// 展示正文
    pub message: String,
    /// 类别相关的附加数据（本子系统不解释）
    #[serde(default)]
    pub data: serde_json::Map<String, Value>,
    /// 生产者分配的 ISO-8601 时间戳
    pub timestamp: String,
    /// 接收者 ID（仅用于归属与展示）
    #[serde(rename = "userId")]
    pub user_id: String,
}

impl Notification {
    /// 分类后的通知类别
    pub fn kind(&self) -> NotificationKind {
        NotificationKind::from_tag(&self.event_type)
    }
}

/// 控制帧类型标签（握手、心跳等管理性帧）
const CONTROL_TAGS: [&str; 4] = ["connected", "handshake", "ping", "pong"];

/// 解析后的入站帧
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// 管理性帧，不进入通知流水线
    Control { tag: String },
    /// 用户可见的通知
    Notification(Notification),
}

/// 将原始文本帧规范化为类型化帧
///
/// 控制帧在去重之前被识别并滤除。格式错误返回 `Err`，由调用方
/// 记录并丢弃，绝不向传输层抛出。
pub fn parse_frame(text: &str) -> anyhow::Result<Frame> {
    let value: Value = serde_json::from_str(text)?;
    let tag = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| anyhow::anyhow!("frame has no type tag"))?;

    if CONTROL_TAGS.contains(&tag) {
        return Ok(Frame::Control {
            tag: tag.to_string(),
        });
    }

    let notification: Notification = serde_json::from_value(value)?;
    Ok(Frame::Notification(notification))
}
