//! 长轮询连接策略
//!
//! 反复发起带游标的长 GET 请求模拟持久连接。服务端最长挂起
//! 30 秒，批量返回期间积压的事件帧。首轮轮询兼作握手：
//! `Connected` 意味着服务端确实应答过。

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::VecDeque;
use std::time::Duration;

use super::{ConnectionStrategy, FrameSource, TransportConfig};

/// 单次轮询请求的客户端超时，要长于服务端的挂起上限
const POLL_REQUEST_TIMEOUT: Duration = Duration::from_secs(40);

/// 一批轮询结果
#[derive(Debug, Deserialize)]
struct PollBatch {
    /// 下一轮携带的游标
    #[serde(default)]
    cursor: Option<String>,
    /// 期间积压的事件帧
    #[serde(default)]
    events: Vec<serde_json::Value>,
}

/// 长轮询策略
pub struct LongPollStrategy {
    base_url: String,
    client: reqwest::Client,
}

impl LongPollStrategy {
    /// `base_url` 形如 `https://api.estate.example`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(POLL_REQUEST_TIMEOUT)
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn poll_url(&self) -> String {
        format!(
            "{}/notifications/poll",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ConnectionStrategy for LongPollStrategy {
    fn name(&self) -> &'static str {
        "longpoll"
    }

    async fn open(&self, config: &TransportConfig) -> Result<Box<dyn FrameSource>> {
        let mut source = LongPollSource {
            client: self.client.clone(),
            url: self.poll_url(),
            user_id: config.user_id.clone(),
            access_token: config.access_token.clone(),
            cursor: None,
            pending: VecDeque::new(),
        };
        // 首轮轮询即握手：失败走适配器的重连路径
        source.poll_once().await?;
        Ok(Box::new(source))
    }
}

struct LongPollSource {
    client: reqwest::Client,
    url: String,
    user_id: String,
    access_token: String,
    cursor: Option<String>,
    pending: VecDeque<String>,
}

impl LongPollSource {
    async fn poll_once(&mut self) -> Result<()> {
        let mut request = self
            .client
            .get(&self.url)
            .bearer_auth(&self.access_token)
            .query(&[("userId", self.user_id.as_str())]);
        if let Some(cursor) = &self.cursor {
            request = request.query(&[("cursor", cursor.as_str())]);
        }

        let batch: PollBatch = request
            .send()
            .await
            .context("poll request failed")?
            .error_for_status()
            .context("poll request rejected")?
            .json()
            .await
            .context("poll response malformed")?;

        if batch.cursor.is_some() {
            self.cursor = batch.cursor;
        }
        for event in batch.events {
            self.pending.push_back(event.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl FrameSource for LongPollSource {
    async fn next_frame(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }
            // 空批次直接进入下一轮挂起
            self.poll_once().await?;
        }
    }

    async fn close(&mut self) {
        self.pending.clear();
    }
}
