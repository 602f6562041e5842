//! QnABot 终端对话
//!
//! 入口：初始化日志、加载配置与已知系统表，在终端里与机器人对话。
//! 问答配置不完整时退回 Mock 客户端，仍可浏览各级菜单。

use std::sync::Arc;

use anyhow::Context;
use qnabot::bot::{ConversationRouter, SystemDirectory};
use qnabot::config::load_config;
use qnabot::integrations::console::run_console;
use qnabot::qna::{AnswerClient, MockAnswerClient, QnaMakerClient};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    qnabot::observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    let systems = SystemDirectory::load_or_default(cfg.bot.systems_file.as_deref())
        .context("Failed to load systems file")?;

    let answers: Arc<dyn AnswerClient> = match cfg.validate() {
        Ok(()) => Arc::new(
            QnaMakerClient::from_section(&cfg.qna).context("Failed to build QnA client")?,
        ),
        Err(e) => {
            tracing::warn!("{}; using offline answers", e);
            Arc::new(MockAnswerClient::answering(
                "(offline) The knowledge base is not configured. Set qna.* in config/default.toml.",
                1.0,
            ))
        }
    };

    let router = ConversationRouter::new(answers, cfg.qna.clone(), systems.shared());

    run_console(
        &router,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
    .context("Console session failed")?;

    Ok(())
}
