//! 副作用分发器 - 管理多个执行器并隔离失败
//!
//! 去重之后的每条通知经策略解析，再交给所有注册的执行器。单个执行器
//! 失败只记日志，绝不影响同一事件的其余执行器，也绝不上抛给流水线。

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

use super::event::Notification;
use super::policy::NotificationPolicy;

/// 执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum EffectResult {
    /// 已执行（或已触发异步执行）
    Executed,
    /// 跳过（策略或偏好不满足）
    Skipped(String),
}

/// 副作用执行器 trait
///
/// 实现方必须快速返回：任何可能阻塞的工作（音频播放、DBus 调用）
/// 在内部派生线程完成。
pub trait SideEffectExecutor: Send + Sync {
    /// 执行器名称（用于日志）
    fn name(&self) -> &str;

    /// 对单条通知执行副作用
    fn execute(
        &self,
        notification: &Notification,
        policy: &NotificationPolicy,
    ) -> Result<EffectResult>;
}

/// 副作用分发器
pub struct EffectDispatcher {
    /// 所有注册的执行器
    executors: Vec<Arc<dyn SideEffectExecutor>>,
}

impl EffectDispatcher {
    /// 创建新的分发器
    pub fn new() -> Self {
        Self {
            executors: Vec::new(),
        }
    }

    /// 注册执行器
    pub fn register(&mut self, executor: Arc<dyn SideEffectExecutor>) {
        debug!(executor = executor.name(), "Registering side-effect executor");
        self.executors.push(executor);
    }

    /// 将通知分发给所有执行器
    ///
    /// 返回每个执行器的结果；失败被就地记录并转为结果项，
    /// 调用方无需处理错误。
    pub fn dispatch(
        &self,
        notification: &Notification,
        policy: &NotificationPolicy,
    ) -> Vec<(String, EffectResult)> {
        let mut results = Vec::with_capacity(self.executors.len());

        for executor in &self.executors {
            let name = executor.name().to_string();
            let result = match executor.execute(notification, policy) {
                Ok(r) => r,
                Err(e) => {
                    warn!(
                        executor = %name,
                        event_type = %notification.event_type,
                        error = %e,
                        "Side-effect executor failed"
                    );
                    EffectResult::Skipped(e.to_string())
                }
            };
            results.push((name, result));
        }

        results
    }

    /// 已注册的执行器数量
    pub fn executor_count(&self) -> usize {
        self.executors.len()
    }

    /// 已注册的执行器名称
    pub fn executor_names(&self) -> Vec<&str> {
        self.executors.iter().map(|e| e.name()).collect()
    }
}

impl Default for EffectDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::policy::DEFAULT_POLICY;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn notification() -> Notification {
        Notification {
            event_type: "new_message".to_string(),
            title: "New message".to_string(),
            message: "Hi".to_string(),
            data: serde_json::Map::new(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            user_id: "u1".to_string(),
        }
    }

    /// 测试用的 mock 执行器
    struct MockExecutor {
        name: String,
        run_count: AtomicUsize,
        fail: bool,
    }

    impl MockExecutor {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                run_count: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing(name: &str) -> Self {
            Self {
                name: name.to_string(),
                run_count: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn runs(&self) -> usize {
            self.run_count.load(Ordering::SeqCst)
        }
    }

    impl SideEffectExecutor for MockExecutor {
        fn name(&self) -> &str {
            &self.name
        }

        fn execute(
            &self,
            _notification: &Notification,
            _policy: &NotificationPolicy,
        ) -> Result<EffectResult> {
            self.run_count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("boom");
            }
            Ok(EffectResult::Executed)
        }
    }

    #[test]
    fn test_register_and_count() {
        let mut dispatcher = EffectDispatcher::new();
        assert_eq!(dispatcher.executor_count(), 0);

        dispatcher.register(Arc::new(MockExecutor::new("toast")));
        assert_eq!(dispatcher.executor_count(), 1);
        assert_eq!(dispatcher.executor_names(), vec!["toast"]);
    }

    #[test]
    fn test_dispatch_reaches_all_executors() {
        let mut dispatcher = EffectDispatcher::new();
        let toast = Arc::new(MockExecutor::new("toast"));
        let audio = Arc::new(MockExecutor::new("audio"));
        dispatcher.register(toast.clone());
        dispatcher.register(audio.clone());

        let results = dispatcher.dispatch(&notification(), &DEFAULT_POLICY);

        assert_eq!(results.len(), 2);
        assert_eq!(toast.runs(), 1);
        assert_eq!(audio.runs(), 1);
    }

    #[test]
    fn test_failure_does_not_stop_other_executors() {
        let mut dispatcher = EffectDispatcher::new();
        let broken = Arc::new(MockExecutor::failing("audio"));
        let toast = Arc::new(MockExecutor::new("toast"));
        dispatcher.register(broken.clone());
        dispatcher.register(toast.clone());

        let results = dispatcher.dispatch(&notification(), &DEFAULT_POLICY);

        // 失败被转为 Skipped，后续执行器照常运行
        assert_eq!(results[0].1, EffectResult::Skipped("boom".to_string()));
        assert_eq!(results[1].1, EffectResult::Executed);
        assert_eq!(toast.runs(), 1);
    }
}
