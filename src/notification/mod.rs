//! 通知投递流水线 - 规范化、去重、策略解析与副作用分发
//!
//! # 设计目标
//! 1. 至多一次的可观察效果：身份键在任何副作用之前经过有界去重窗口
//! 2. 策略驱动：封闭的类别枚举映射到静态策略表，带保证的默认项
//! 3. 失败隔离：每个执行器独立降级，互不影响，绝不上抛给流水线
//! 4. 非阻塞：所有执行器快速返回，阻塞工作在内部派生线程完成
//!
//! # 使用示例
//! ```ignore
//! use estate_notify::notification::{parse_frame, identity_key, resolve, Frame};
//!
//! let frame = parse_frame(raw)?;
//! if let Frame::Notification(n) = frame {
//!     if dedup.should_process(&identity_key(&n)) {
//!         let policy = resolve(n.kind());
//!         history.push(n.clone());
//!         dispatcher.dispatch(&n, &policy);
//!     }
//! }
//! ```

pub mod dedup;
pub mod dispatcher;
pub mod effects;
pub mod event;
pub mod history;
pub mod identity;
pub mod policy;

pub use dedup::{DedupFilter, DEFAULT_DEDUP_CAPACITY};
pub use dispatcher::{EffectDispatcher, EffectResult, SideEffectExecutor};
pub use effects::{
    AudioCuePlayer, CueError, CueStrategy, OsNotificationEmitter, PermissionGate, PermissionState,
    Toast, ToastPresenter,
};
pub use event::{parse_frame, Frame, Notification, NotificationKind};
pub use history::{DeliveredNotification, HistoryBuffer, DEFAULT_HISTORY_CAPACITY};
pub use identity::identity_key;
pub use policy::{resolve, NotificationPolicy, ToastVariant, DEFAULT_POLICY};
