//! 统计与自检客户端 - 推送通道之外的带外 REST 调用
//!
//! `fetch_stats` 用于被动展示，失败只记日志并返回空结果；
//! `send_test_event` 是用户显式发起的诊断动作，失败由调用方
//! 以一条错误横幅呈现（唯一允许直接上报失败的执行路径）。

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// REST 客户端配置
#[derive(Debug, Clone)]
pub struct StatsClientConfig {
    /// 服务端 URL（如 https://api.estate.example）
    pub base_url: String,
    /// 访问凭证
    pub access_token: String,
    /// 超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for StatsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            access_token: String::new(),
            timeout_secs: 10,
        }
    }
}

/// 聚合连接统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    /// 当前在线会话数
    pub connected_users: u64,
    /// 历史累计连接数
    pub total_connections: u64,
    /// 排队未投递的通知数
    pub queued_notifications: u64,
}

/// 测试事件请求体
#[derive(Debug, Serialize)]
struct TestEventRequest<'a> {
    #[serde(rename = "type")]
    event_type: &'a str,
    message: &'a str,
}

/// 统计与自检客户端
#[derive(Debug)]
pub struct StatsClient {
    client: Client,
    config: StatsClientConfig,
}

impl StatsClient {
    /// 创建新的客户端
    pub fn new(config: StatsClientConfig) -> Result<Self> {
        if config.access_token.is_empty() {
            anyhow::bail!("access_token is required");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// 获取聚合连接统计
    ///
    /// 失败返回 `None`，错误只记日志，绝不抛给 UI 层。
    pub async fn fetch_stats(&self) -> Option<NotificationStats> {
        match self.try_fetch_stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(error = %e, "Failed to fetch notification stats");
                None
            }
        }
    }

    async fn try_fetch_stats(&self) -> Result<NotificationStats> {
        let stats = self
            .client
            .get(self.endpoint("/notifications/stats"))
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .context("stats request failed")?
            .error_for_status()
            .context("stats request rejected")?
            .json()
            .await
            .context("stats response malformed")?;
        Ok(stats)
    }

    /// 请求生产者通过推送通道回发一条合成测试事件
    ///
    /// 用于验证端到端投递。失败向调用方返回错误。
    pub async fn send_test_event(&self, message: &str) -> Result<()> {
        let payload = TestEventRequest {
            event_type: "test",
            message,
        };

        self.client
            .post(self.endpoint("/notifications/test"))
            .bearer_auth(&self.config.access_token)
            .json(&payload)
            .send()
            .await
            .context("test event request failed")?
            .error_for_status()
            .context("test event request rejected")?;

        info!("Test event requested");
        Ok(())
    }
}
