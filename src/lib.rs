//! Estate Notify - 房产市场实时通知投递客户端

pub mod client;
pub mod config;
pub mod notification;
pub mod stats;
pub mod transport;

pub use client::NotificationClient;
pub use config::{ClientConfig, TransportKind};
pub use notification::{
    identity_key, parse_frame, resolve, AudioCuePlayer, CueStrategy, DedupFilter,
    DeliveredNotification, EffectDispatcher, EffectResult, Frame, HistoryBuffer, Notification,
    NotificationKind, NotificationPolicy, OsNotificationEmitter, PermissionGate, PermissionState,
    SideEffectExecutor, Toast, ToastPresenter, ToastVariant, DEFAULT_POLICY,
};
pub use stats::{NotificationStats, StatsClient, StatsClientConfig};
pub use transport::{
    ConnectionState, ConnectionStrategy, FrameSource, LongPollStrategy, TransportAdapter,
    TransportConfig, WebSocketStrategy,
};
