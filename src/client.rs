//! 会话级通知客户端 - 组装传输、流水线与执行器
//!
//! 一个认证会话对应一个 [`NotificationClient`]：独占去重窗口与历史
//! 缓冲，收帧、规范化、去重、策略解析、副作用分发全部在单个处理
//! 任务内顺序完成，两个事件不可能并发越过去重器。会话注销调用
//! [`NotificationClient::shutdown`]，之后不会再处理任何事件。

use anyhow::Result;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, TransportKind};
use crate::notification::{
    identity_key, parse_frame, resolve, AudioCuePlayer, DedupFilter, DeliveredNotification,
    EffectDispatcher, Frame, HistoryBuffer, OsNotificationEmitter, PermissionGate, Toast,
    ToastPresenter,
};
use crate::stats::{NotificationStats, StatsClient, StatsClientConfig};
use crate::transport::{
    ConnectionState, ConnectionStrategy, LongPollStrategy, TransportAdapter, WebSocketStrategy,
};

/// 会话级通知客户端
pub struct NotificationClient {
    adapter: Arc<TransportAdapter>,
    history: Arc<Mutex<HistoryBuffer>>,
    toast_tx: mpsc::UnboundedSender<Toast>,
    toast_rx: Mutex<Option<mpsc::UnboundedReceiver<Toast>>>,
    permission_gate: Arc<PermissionGate>,
    stats: Option<StatsClient>,
    pipeline: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationClient {
    /// 按配置构建客户端（需要在 tokio 运行时内调用）
    pub fn new(config: ClientConfig) -> Result<Self> {
        let strategy: Arc<dyn ConnectionStrategy> = match config.transport {
            TransportKind::Websocket => Arc::new(WebSocketStrategy::new(config.websocket_url())),
            TransportKind::Longpoll => Arc::new(LongPollStrategy::new(config.server_url.clone())?),
        };
        Self::with_strategy(config, strategy)
    }

    /// 使用自定义连接策略构建（测试与嵌入场景）
    pub fn with_strategy(
        config: ClientConfig,
        strategy: Arc<dyn ConnectionStrategy>,
    ) -> Result<Self> {
        let (toast_tx, toast_rx) = mpsc::unbounded_channel();
        let permission_gate = Arc::new(PermissionGate::new());

        let mut dispatcher = EffectDispatcher::new();
        dispatcher.register(Arc::new(ToastPresenter::with_sender(toast_tx.clone())));
        dispatcher.register(Arc::new(AudioCuePlayer::new(
            config.sound_enabled,
            config.cue_asset.clone(),
        )));
        dispatcher.register(Arc::new(OsNotificationEmitter::new(Arc::clone(
            &permission_gate,
        ))));
        let dispatcher = Arc::new(dispatcher);

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let adapter = Arc::new(TransportAdapter::new(
            strategy,
            config.transport_config(),
            frames_tx,
        ));

        let history = Arc::new(Mutex::new(HistoryBuffer::with_capacity(
            config.history_capacity,
        )));
        let dedup = DedupFilter::with_capacity(config.dedup_capacity);

        let pipeline = tokio::spawn(pipeline_loop(
            frames_rx,
            dedup,
            Arc::clone(&history),
            Arc::clone(&dispatcher),
        ));

        let stats = if config.access_token.is_empty() {
            None
        } else {
            Some(StatsClient::new(StatsClientConfig {
                base_url: config.server_url.clone(),
                access_token: config.access_token.clone(),
                timeout_secs: 10,
            })?)
        };

        Ok(Self {
            adapter,
            history,
            toast_tx,
            toast_rx: Mutex::new(Some(toast_rx)),
            permission_gate,
            stats,
            pipeline: Mutex::new(Some(pipeline)),
        })
    }

    /// 建立推送通道（幂等）
    pub fn connect(&self) {
        self.adapter.connect();
    }

    /// 断开推送通道，取消排期中的重连
    pub fn disconnect(&self) {
        self.adapter.disconnect();
    }

    /// 会话注销：断开、停止流水线、清空历史
    ///
    /// 调用开始后不会再处理任何事件。重复调用是安全的 no-op。
    pub fn shutdown(&self) {
        self.adapter.disconnect();
        if let Some(pipeline) = self.pipeline.lock().unwrap().take() {
            pipeline.abort();
        }
        self.history.lock().unwrap().clear();
        info!("Notification client shut down");
    }

    /// 当前连接状态
    pub fn state(&self) -> ConnectionState {
        self.adapter.state()
    }

    /// 订阅连接状态变化（在线指示器）
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.adapter.subscribe_state()
    }

    /// 取走 toast 消费端（UI 层，至多一次）
    pub fn take_toast_receiver(&self) -> Option<mpsc::UnboundedReceiver<Toast>> {
        self.toast_rx.lock().unwrap().take()
    }

    /// 最近优先的历史快照
    pub fn history(&self) -> Vec<DeliveredNotification> {
        self.history.lock().unwrap().snapshot()
    }

    /// 权限门（`request_permission` 只能由用户显式动作触发）
    pub fn permission_gate(&self) -> Arc<PermissionGate> {
        Arc::clone(&self.permission_gate)
    }

    /// 获取聚合连接统计；失败返回 `None`
    pub async fn fetch_stats(&self) -> Option<NotificationStats> {
        match &self.stats {
            Some(stats) => stats.fetch_stats().await,
            None => {
                warn!("No access credential, stats unavailable");
                None
            }
        }
    }

    /// 请求服务端回发一条测试事件
    ///
    /// 失败呈现一条错误横幅并返回 `false`（显式诊断动作是唯一
    /// 允许直接上报失败的路径）。
    pub async fn send_test_event(&self, message: &str) -> bool {
        let result = match &self.stats {
            Some(stats) => stats.send_test_event(message).await,
            None => Err(anyhow::anyhow!("no access credential")),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Test event request failed");
                let _ = self.toast_tx.send(Toast::error(
                    "Test notification failed",
                    format!("Could not reach the server: {}", e),
                ));
                false
            }
        }
    }
}

/// 流水线主循环：规范化 → 去重 → 历史追加 + 副作用分发
async fn pipeline_loop(
    mut frames_rx: mpsc::UnboundedReceiver<String>,
    mut dedup: DedupFilter,
    history: Arc<Mutex<HistoryBuffer>>,
    dispatcher: Arc<EffectDispatcher>,
) {
    while let Some(text) = frames_rx.recv().await {
        let frame = match parse_frame(&text) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "Dropping malformed frame");
                continue;
            }
        };

        let notification = match frame {
            Frame::Control { tag } => {
                debug!(tag = %tag, "Control frame filtered");
                continue;
            }
            Frame::Notification(n) => n,
        };

        // 身份键检查先于任何副作用、任何历史记录
        let key = identity_key(&notification);
        if !dedup.should_process(&key) {
            debug!(
                key = %key,
                event_type = %notification.event_type,
                "Duplicate delivery suppressed"
            );
            continue;
        }

        info!(
            event_type = %notification.event_type,
            title = %notification.title,
            "Notification delivered"
        );

        let policy = resolve(notification.kind());
        history.lock().unwrap().push(notification.clone());
        dispatcher.dispatch(&notification, &policy);
    }
}
