//! 客户端配置 - 文件加载与默认值
//!
//! 配置从 `~/.config/estate-notify/config.json` 读取，CLI 参数可以
//! 逐项覆盖。所有容量与间隔都有经过斟酌的默认值，空配置文件也能
//! 得到可用的客户端。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::notification::{DEFAULT_DEDUP_CAPACITY, DEFAULT_HISTORY_CAPACITY};
use crate::transport::TransportConfig;

/// 连接方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// 持久 WebSocket
    Websocket,
    /// 长轮询
    Longpoll,
}

/// 通知客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// 服务端 URL
    pub server_url: String,
    /// 接收者身份
    pub user_id: String,
    /// 访问凭证
    pub access_token: String,
    /// 连接方式
    pub transport: TransportKind,
    /// 重连间隔（毫秒）
    pub reconnect_delay_ms: u64,
    /// 去重窗口容量
    pub dedup_capacity: usize,
    /// 历史缓冲容量
    pub history_capacity: usize,
    /// 提示音偏好
    pub sound_enabled: bool,
    /// 预录提示音路径
    pub cue_asset: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:4000".to_string(),
            user_id: String::new(),
            access_token: String::new(),
            transport: TransportKind::Websocket,
            reconnect_delay_ms: 5000,
            dedup_capacity: DEFAULT_DEDUP_CAPACITY,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            sound_enabled: true,
            cue_asset: None,
        }
    }
}

impl ClientConfig {
    /// 配置文件路径
    pub fn path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("estate-notify")
            .join("config.json")
    }

    /// 从默认路径加载，文件不存在时返回默认配置
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    /// 从指定路径加载
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// 推送通道的 WebSocket URL（http → ws，https → wss）
    pub fn websocket_url(&self) -> String {
        if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.server_url.clone()
        }
    }

    /// 导出传输层配置
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            user_id: self.user_id.clone(),
            access_token: self.access_token.clone(),
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
        }
    }
}
