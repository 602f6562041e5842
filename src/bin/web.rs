//! QnABot Web Chat 服务
//!
//! 通过 Bot Framework 活动 Webhook 与机器人对话。
//!
//! 配置（config/default.toml 或环境变量）:
//! - QNABOT__QNA__KNOWLEDGE_BASE_ID / QnAKnowledgebaseId: 知识库 ID
//! - QNABOT__QNA__ENDPOINT_KEY / QnAAuthKey: 终结点密钥
//! - QNABOT__QNA__ENDPOINT_HOST_NAME / QnAEndpointHostName: 主机名（自动补 https:// 与 /qnamaker）
//! - QNABOT__SERVER__PORT: 监听端口（默认 3978）
//! - QNABOT__BOT__SYSTEMS_FILE: 已知 EHR 系统表（可选，SIGHUP 重载）
//! - QNABOT__CONNECTOR__APP_ID / MicrosoftAppId、QNABOT__CONNECTOR__APP_PASSWORD / MicrosoftAppPassword:
//!   回发活动到连接器时的应用凭据（本地 Emulator 可留空）
//!
//! 启动: cargo run --bin qnabot-web

use std::sync::{Arc, PoisonError};

use anyhow::Context;
use qnabot::bot::{ConversationRouter, SharedSystems, SystemDirectory};
use qnabot::config::{load_config, AppConfig};
use qnabot::integrations::connector::ConnectorClient;
use qnabot::integrations::webchat::{create_router, WebchatState};
use qnabot::qna::QnaMakerClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    qnabot::observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    cfg.validate().context("Invalid QnA configuration")?;

    let systems = SystemDirectory::load_or_default(cfg.bot.systems_file.as_deref())
        .context("Failed to load systems file")?
        .shared();
    tracing::info!(
        "Loaded {} known system key(s)",
        systems.read().unwrap_or_else(PoisonError::into_inner).len()
    );

    install_reload(&cfg, &systems)?;

    let answers =
        Arc::new(QnaMakerClient::from_section(&cfg.qna).context("Failed to build QnA client")?);
    let router = ConversationRouter::new(answers, cfg.qna.clone(), systems);
    let connector =
        ConnectorClient::new(cfg.connector.clone()).context("Failed to build connector client")?;
    if !cfg.connector.has_credentials() {
        tracing::warn!("No connector app credentials configured; replies are sent unauthenticated");
    }
    let app = create_router(Arc::new(WebchatState::new(router, connector)));

    let addr: std::net::SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!("QnABot Web Chat server listening on http://{}", addr);
    tracing::info!(
        "Messaging endpoint: http://YOUR_HOST:{}/api/messages",
        cfg.server.port
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 收到 SIGHUP 时重新加载系统表；加载失败保留旧表
#[cfg(unix)]
fn install_reload(cfg: &AppConfig, systems: &SharedSystems) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let Some(path) = cfg.bot.systems_file.clone() else {
        return Ok(());
    };
    let systems = systems.clone();

    let mut hangup = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            match SystemDirectory::load_file(&path) {
                Ok(fresh) => {
                    let count = fresh.len();
                    systems
                        .write()
                        .unwrap_or_else(PoisonError::into_inner)
                        .replace(fresh);
                    tracing::info!(
                        "Reloaded {} known system key(s) from {}",
                        count,
                        path.display()
                    );
                }
                Err(e) => tracing::error!("Systems reload failed, keeping previous table: {}", e),
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn install_reload(_cfg: &AppConfig, _systems: &SharedSystems) -> anyhow::Result<()> {
    Ok(())
}
