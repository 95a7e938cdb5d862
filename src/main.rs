//! Estate Notify CLI
//!
//! 连接 Estate 市场的通知推送通道，实时打印投递结果；也提供
//! 统计查询与端到端自检的诊断入口。

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use estate_notify::{
    ClientConfig, NotificationClient, PermissionGate, StatsClient, StatsClientConfig,
    TransportKind,
};

#[derive(Parser)]
#[command(name = "enotify")]
#[command(about = "Estate Notify - 房产市场实时通知投递客户端")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// 连接参数，逐项覆盖配置文件
#[derive(Args)]
struct ConnectionArgs {
    /// 服务端 URL
    #[arg(long)]
    server: Option<String>,
    /// 接收者身份
    #[arg(long)]
    user: Option<String>,
    /// 访问凭证
    #[arg(long)]
    token: Option<String>,
}

impl ConnectionArgs {
    fn apply(self, mut config: ClientConfig) -> ClientConfig {
        if let Some(server) = self.server {
            config.server_url = server;
        }
        if let Some(user) = self.user {
            config.user_id = user;
        }
        if let Some(token) = self.token {
            config.access_token = token;
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// 连接推送通道并实时打印通知
    Watch {
        #[command(flatten)]
        conn: ConnectionArgs,
        /// 连接方式
        #[arg(long, value_enum)]
        transport: Option<TransportKind>,
        /// 关闭提示音
        #[arg(long)]
        no_sound: bool,
    },
    /// 获取聚合连接统计
    Stats {
        #[command(flatten)]
        conn: ConnectionArgs,
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 请求服务端回发一条测试事件（端到端自检）
    TestEvent {
        #[command(flatten)]
        conn: ConnectionArgs,
        /// 测试事件携带的消息
        #[arg(long, default_value = "End-to-end delivery check")]
        message: String,
    },
    /// 启用系统级通知（显式用户操作，已拒绝时不会重复询问）
    EnableOsNotifications,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug enotify watch
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("estate_notify=info,enotify=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            conn,
            transport,
            no_sound,
        } => {
            let mut config = conn.apply(ClientConfig::load()?);
            if let Some(transport) = transport {
                config.transport = transport;
            }
            if no_sound {
                config.sound_enabled = false;
            }
            watch(config).await?;
        }
        Commands::Stats { conn, json } => {
            let config = conn.apply(ClientConfig::load()?);
            let client = StatsClient::new(StatsClientConfig {
                base_url: config.server_url,
                access_token: config.access_token,
                timeout_secs: 10,
            })?;

            match client.fetch_stats().await {
                Some(stats) if json => {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                }
                Some(stats) => {
                    println!("在线会话数: {}", stats.connected_users);
                    println!("历史连接数: {}", stats.total_connections);
                    println!("排队通知数: {}", stats.queued_notifications);
                }
                None => {
                    eprintln!("暂时无法获取统计数据");
                }
            }
        }
        Commands::TestEvent { conn, message } => {
            let config = conn.apply(ClientConfig::load()?);
            let client = StatsClient::new(StatsClientConfig {
                base_url: config.server_url,
                access_token: config.access_token,
                timeout_secs: 10,
            })?;

            match client.send_test_event(&message).await {
                Ok(()) => println!("已请求测试事件，请在 watch 会话中确认收到"),
                Err(e) => {
                    eprintln!("测试事件发送失败: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::EnableOsNotifications => {
            let gate = PermissionGate::new();
            if gate.request_permission() {
                println!("系统级通知已启用");
            } else {
                println!("系统级通知不可用（平台拒绝或无通知服务）");
            }
        }
    }

    Ok(())
}

/// watch 子命令主体：打印连接状态与每条投递的通知
async fn watch(config: ClientConfig) -> Result<()> {
    if config.user_id.is_empty() || config.access_token.is_empty() {
        eprintln!("缺少 --user 或 --token（也可写入配置文件 {}）", ClientConfig::path().display());
        std::process::exit(1);
    }

    let client = NotificationClient::new(config)?;
    let mut toast_rx = client
        .take_toast_receiver()
        .ok_or_else(|| anyhow::anyhow!("toast receiver already taken"))?;
    let mut state_rx = client.subscribe_state();

    client.connect();
    println!("按 Ctrl-C 退出");

    loop {
        tokio::select! {
            Some(toast) = toast_rx.recv() => {
                println!(
                    "[{}] {} — {} ({}ms)",
                    toast.variant, toast.title, toast.message, toast.duration_ms
                );
            }
            changed = state_rx.changed() => {
                if changed.is_ok() {
                    let state = *state_rx.borrow();
                    println!("-- 连接状态: {}", state);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                client.shutdown();
                break;
            }
        }
    }

    Ok(())
}
