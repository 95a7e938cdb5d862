//! 传输适配器 - 维护唯一的入站事件连接并负责重连
//!
//! 两种连接方式（持久 WebSocket 与长轮询）收敛为同一个
//! [`ConnectionStrategy`] 接口，由配置选择。适配器独占连接对象：
//! 打开、断开、固定间隔重连都在一个后台任务内完成，帧经无界通道
//! 交给流水线，连接状态经 watch 通道暴露给 UI（在线指示器）。

pub mod longpoll;
pub mod websocket;

pub use longpoll::LongPollStrategy;
pub use websocket::WebSocketStrategy;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// 默认重连间隔（固定间隔，非指数退避）
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// 连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 传输层配置
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// 接收者身份
    pub user_id: String,
    /// 访问凭证
    pub access_token: String,
    /// 重连间隔
    pub reconnect_delay: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            access_token: String::new(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

/// 一条已打开连接上的帧流
#[async_trait]
pub trait FrameSource: Send {
    /// 下一个文本帧；`Ok(None)` 表示服务端正常关闭
    async fn next_frame(&mut self) -> Result<Option<String>>;

    /// 确定性关闭底层连接
    async fn close(&mut self);
}

/// 可插拔的连接方式
#[async_trait]
pub trait ConnectionStrategy: Send + Sync {
    /// 策略名称（用于日志）
    fn name(&self) -> &'static str;

    /// 打开一条连接并完成握手
    async fn open(&self, config: &TransportConfig) -> Result<Box<dyn FrameSource>>;
}

/// 传输适配器
pub struct TransportAdapter {
    strategy: Arc<dyn ConnectionStrategy>,
    config: TransportConfig,
    frames_tx: mpsc::UnboundedSender<String>,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TransportAdapter {
    pub fn new(
        strategy: Arc<dyn ConnectionStrategy>,
        config: TransportConfig,
        frames_tx: mpsc::UnboundedSender<String>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            strategy,
            config,
            frames_tx,
            state_tx,
            state_rx,
            task: Mutex::new(None),
        }
    }

    /// 当前连接状态
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// 订阅状态变化（UI 在线指示器）
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// 后台任务是否存活
    pub fn is_active(&self) -> bool {
        self.task
            .lock()
            .unwrap()
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// 建立连接（幂等）
    ///
    /// 任务已存活时调用是 no-op。身份或凭证缺失时静默失败：
    /// 记一条日志并保持 `Disconnected`。
    pub fn connect(&self) {
        let mut task = self.task.lock().unwrap();
        if task.as_ref().map_or(false, |handle| !handle.is_finished()) {
            debug!("connect() ignored, transport already active");
            return;
        }

        if self.config.user_id.is_empty() || self.config.access_token.is_empty() {
            warn!("Missing recipient identity or access credential, staying disconnected");
            let _ = self.state_tx.send(ConnectionState::Disconnected);
            return;
        }

        let strategy = Arc::clone(&self.strategy);
        let config = self.config.clone();
        let frames_tx = self.frames_tx.clone();
        let state_tx = self.state_tx.clone();
        *task = Some(tokio::spawn(run_loop(strategy, config, frames_tx, state_tx)));
    }

    /// 确定性断开
    ///
    /// 同步中止后台任务——包括尚未到期的重连定时器——之后不会再有
    /// 任何帧被投递。重复调用是安全的 no-op。
    pub fn disconnect(&self) {
        let handle = self.task.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.abort();
            info!("Push channel torn down");
        }
        let _ = self.state_tx.send(ConnectionState::Disconnected);
    }
}

/// 连接主循环：打开 → 泵帧 → 断开 → 固定延迟 → 重试，无限次
async fn run_loop(
    strategy: Arc<dyn ConnectionStrategy>,
    config: TransportConfig,
    frames_tx: mpsc::UnboundedSender<String>,
    state_tx: watch::Sender<ConnectionState>,
) {
    loop {
        let _ = state_tx.send(ConnectionState::Connecting);

        match strategy.open(&config).await {
            Ok(mut source) => {
                info!(strategy = strategy.name(), "Push channel connected");
                let _ = state_tx.send(ConnectionState::Connected);

                loop {
                    match source.next_frame().await {
                        Ok(Some(text)) => {
                            if frames_tx.send(text).is_err() {
                                // 流水线已关闭，没有继续保持连接的理由
                                source.close().await;
                                let _ = state_tx.send(ConnectionState::Disconnected);
                                return;
                            }
                        }
                        Ok(None) => {
                            info!("Push channel closed by server");
                            break;
                        }
                        Err(e) => {
                            warn!(error = %e, "Push channel error");
                            break;
                        }
                    }
                }

                // 旧连接完全关闭之后才会建立替代连接
                source.close().await;
            }
            Err(e) => {
                warn!(strategy = strategy.name(), error = %e, "Connect attempt failed");
            }
        }

        let _ = state_tx.send(ConnectionState::Disconnected);
        sleep(config.reconnect_delay).await;
    }
}
