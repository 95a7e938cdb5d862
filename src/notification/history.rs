//! 通知历史 - 有界的最近投递列表
//!
//! 供 UI（通知下拉面板）消费的内存缓冲：最新的在最前面，溢出时截断
//! 尾部。仅在去重之后追加，所以每个逻辑事件至多出现一次。
//! 会话注销即清空，不做跨会话持久化。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::event::Notification;

/// 默认历史容量
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// 一条已投递的通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveredNotification {
    /// 通知本体
    pub notification: Notification,
    /// 客户端收到的时刻（生产者时间戳是不透明文本，UI 需要可排序的本地时刻）
    pub received_at: DateTime<Utc>,
}

/// 通知历史缓冲
pub struct HistoryBuffer {
    /// 最新在前
    entries: VecDeque<DeliveredNotification>,
    capacity: usize,
}

impl HistoryBuffer {
    /// 创建新的缓冲，使用默认容量
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// 指定容量
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 头部插入一条通知，溢出时丢弃最旧的
    pub fn push(&mut self, notification: Notification) {
        self.entries.push_front(DeliveredNotification {
            notification,
            received_at: Utc::now(),
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// 最近优先的快照（供 UI 渲染）
    pub fn snapshot(&self) -> Vec<DeliveredNotification> {
        self.entries.iter().cloned().collect()
    }

    /// 最近优先的迭代
    pub fn iter(&self) -> impl Iterator<Item = &DeliveredNotification> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清空历史（会话注销时调用）
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
