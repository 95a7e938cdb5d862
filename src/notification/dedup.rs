//! 通知去重器 - 抑制重连窗口内的重复投递
//!
//! 服务端在断线重连后可能重发最近的事件。本模块维护一个容量有界的
//! 身份键集合：窗口内的重复投递被抑制，窗口之外的重发视同新事件
//! （尽力而为的取舍）。
//!
//! ## 去重策略
//! 1. 身份键在任何副作用、任何历史记录之前检查
//! 2. 超出容量时按插入顺序淘汰最旧的键（FIFO，不是 LRU）
//! 3. 插入与淘汰均为 O(1)

use std::collections::{HashSet, VecDeque};

/// 默认去重窗口容量
pub const DEFAULT_DEDUP_CAPACITY: usize = 100;

/// 通知去重器
pub struct DedupFilter {
    /// 窗口内的身份键
    seen: HashSet<String>,
    /// 插入顺序，用于 FIFO 淘汰
    order: VecDeque<String>,
    /// 窗口容量
    capacity: usize,
}

impl DedupFilter {
    /// 创建新的去重器，使用默认容量
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_DEDUP_CAPACITY)
    }

    /// 指定窗口容量
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 检查是否应该处理该身份键
    ///
    /// 返回 `true` 表示首次见到（已记录，可以继续流水线），
    /// 返回 `false` 表示窗口内重复，状态不变。
    pub fn should_process(&mut self, identity_key: &str) -> bool {
        if self.seen.contains(identity_key) {
            return false;
        }

        self.seen.insert(identity_key.to_string());
        self.order.push_back(identity_key.to_string());

        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }

        true
    }

    /// 当前窗口内的键数量
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 清空窗口（会话注销时调用）
    pub fn clear(&mut self) {
        self.seen.clear();
        self.order.clear();
    }
}

impl Default for DedupFilter {
    fn default() -> Self {
        Self::new()
    }
}
