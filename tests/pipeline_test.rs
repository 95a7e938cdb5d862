//! 端到端流水线测试：脚本化连接策略驱动完整客户端

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use estate_notify::{
    ClientConfig, ConnectionState, ConnectionStrategy, FrameSource, NotificationClient,
    ToastVariant, TransportConfig,
};
use tokio::time::timeout;

/// 回放脚本帧的连接策略；脚本耗尽后连接保持挂起
struct ScriptedStrategy {
    frames: Mutex<Option<Vec<String>>>,
}

impl ScriptedStrategy {
    fn new(frames: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            frames: Mutex::new(Some(frames.into_iter().map(String::from).collect())),
        })
    }
}

#[async_trait]
impl ConnectionStrategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn open(&self, _config: &TransportConfig) -> anyhow::Result<Box<dyn FrameSource>> {
        // 第一次打开回放脚本，之后的连接保持静默
        let frames = self.frames.lock().unwrap().take().unwrap_or_default();
        Ok(Box::new(ScriptedSource {
            frames: frames.into(),
        }))
    }
}

struct ScriptedSource {
    frames: VecDeque<String>,
}

#[async_trait]
impl FrameSource for ScriptedSource {
    async fn next_frame(&mut self) -> anyhow::Result<Option<String>> {
        if let Some(frame) = self.frames.pop_front() {
            return Ok(Some(frame));
        }
        std::future::pending::<()>().await;
        unreachable!()
    }

    async fn close(&mut self) {}
}

fn test_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.user_id = "u1".to_string();
    config.access_token = "test-token".to_string();
    // 副作用只验证 toast 通道；提示音在测试环境关闭
    config.sound_enabled = false;
    config
}

fn client_with_frames(frames: Vec<&str>) -> NotificationClient {
    NotificationClient::with_strategy(test_config(), ScriptedStrategy::new(frames)).unwrap()
}

const NEW_MESSAGE: &str = r#"{"type":"new_message","title":"New message","message":"Hi","timestamp":"2024-01-01T00:00:00Z","userId":"u1"}"#;
const LEAD_ALERT: &str = r#"{"type":"lead_alert","title":"New lead","message":"Unit 4B","timestamp":"2024-01-01T00:00:05Z","userId":"u1"}"#;

#[tokio::test]
async fn test_rapid_duplicate_produces_single_set_of_effects() {
    // 1. 同一逻辑事件连续快速推送两次
    let client = client_with_frames(vec![
        r#"{"type":"connected","sessionId":"s-1"}"#,
        NEW_MESSAGE,
        NEW_MESSAGE,
    ]);
    let mut toast_rx = client.take_toast_receiver().unwrap();
    client.connect();

    // 2. 恰好一条 toast
    let toast = timeout(Duration::from_secs(2), toast_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(toast.title, "New message");

    // 第二条被去重：短暂等待后通道应为空
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(toast_rx.try_recv().is_err());

    // 3. 恰好一条历史记录
    let history = client.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].notification.title, "New message");

    client.shutdown();
}

#[tokio::test]
async fn test_history_is_most_recent_first() {
    // A 先到，B 后到
    let client = client_with_frames(vec![NEW_MESSAGE, LEAD_ALERT]);
    let mut toast_rx = client.take_toast_receiver().unwrap();
    client.connect();

    for _ in 0..2 {
        timeout(Duration::from_secs(2), toast_rx.recv())
            .await
            .unwrap()
            .unwrap();
    }

    let history = client.history();
    assert_eq!(history.len(), 2);
    // 最新的 B 在最前面
    assert_eq!(history[0].notification.event_type, "lead_alert");
    assert_eq!(history[1].notification.event_type, "new_message");

    client.shutdown();
}

#[tokio::test]
async fn test_malformed_frames_are_dropped_without_breaking_the_stream() {
    let client = client_with_frames(vec![
        "not json at all",
        r#"{"missing": "type tag"}"#,
        LEAD_ALERT,
    ]);
    let mut toast_rx = client.take_toast_receiver().unwrap();
    client.connect();

    // 坏帧被丢弃，后续事件照常投递
    let toast = timeout(Duration::from_secs(2), toast_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(toast.title, "New lead");
    assert_eq!(client.history().len(), 1);

    client.shutdown();
}

#[tokio::test]
async fn test_control_frames_never_reach_history() {
    let client = client_with_frames(vec![
        r#"{"type":"connected","sessionId":"s-1"}"#,
        r#"{"type":"ping"}"#,
        NEW_MESSAGE,
    ]);
    let mut toast_rx = client.take_toast_receiver().unwrap();
    client.connect();

    timeout(Duration::from_secs(2), toast_rx.recv())
        .await
        .unwrap()
        .unwrap();

    // 只有用户可见的通知进入历史
    assert_eq!(client.history().len(), 1);
    assert_eq!(client.history()[0].notification.event_type, "new_message");

    client.shutdown();
}

#[tokio::test]
async fn test_policy_drives_toast_parameters() {
    let client = client_with_frames(vec![LEAD_ALERT]);
    let mut toast_rx = client.take_toast_receiver().unwrap();
    client.connect();

    let toast = timeout(Duration::from_secs(2), toast_rx.recv())
        .await
        .unwrap()
        .unwrap();
    // lead_alert 的策略：success 横幅，6 秒
    assert_eq!(toast.variant, ToastVariant::Success);
    assert_eq!(toast.duration_ms, 6000);

    client.shutdown();
}

#[tokio::test]
async fn test_unknown_type_falls_back_to_default_policy() {
    let client = client_with_frames(vec![
        r#"{"type":"foo_bar","title":"Mystery","message":"?","timestamp":"2024-01-01T00:00:00Z","userId":"u1"}"#,
    ]);
    let mut toast_rx = client.take_toast_receiver().unwrap();
    client.connect();

    let toast = timeout(Duration::from_secs(2), toast_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(toast.variant, ToastVariant::Default);
    assert_eq!(toast.duration_ms, 4000);

    client.shutdown();
}

#[tokio::test]
async fn test_evicted_identity_is_redeliverable() {
    // 去重窗口容量 2：第 3 个不同事件把第 1 个挤出窗口
    let mut config = test_config();
    config.dedup_capacity = 2;

    let frames = vec![
        NEW_MESSAGE,
        LEAD_ALERT,
        r#"{"type":"broadcast","title":"Maintenance","message":"22:00","timestamp":"2024-01-01T00:01:00Z","userId":"u1"}"#,
        // 窗口外的重发视同新事件
        NEW_MESSAGE,
    ];
    let client =
        NotificationClient::with_strategy(config, ScriptedStrategy::new(frames)).unwrap();
    let mut toast_rx = client.take_toast_receiver().unwrap();
    client.connect();

    let mut titles = Vec::new();
    for _ in 0..4 {
        let toast = timeout(Duration::from_secs(2), toast_rx.recv())
            .await
            .unwrap()
            .unwrap();
        titles.push(toast.title);
    }
    assert_eq!(
        titles,
        vec!["New message", "New lead", "Maintenance", "New message"]
    );

    client.shutdown();
}

#[tokio::test]
async fn test_shutdown_twice_is_safe() {
    let client = client_with_frames(vec![NEW_MESSAGE]);
    client.connect();

    client.shutdown();
    client.shutdown();

    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(client.history().is_empty());
}

#[tokio::test]
async fn test_toast_receiver_can_only_be_taken_once() {
    let client = client_with_frames(vec![]);
    assert!(client.take_toast_receiver().is_some());
    assert!(client.take_toast_receiver().is_none());
    client.shutdown();
}
