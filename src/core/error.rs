//! 机器人错误类型
//!
//! 对终端用户只暴露一种失败：「没有可用答案」。这里的细分仅用于日志、回发失败与启动期校验，
//! Router 会把所有问答服务错误折叠为空结果。

use thiserror::Error;

/// 问答服务调用、配置与通道处理中可能出现的错误
#[derive(Error, Debug)]
pub enum BotError {
    /// 网络层失败（连接、超时、TLS 等）
    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("Answer service returned {status}: {body}")]
    ServiceStatus { status: u16, body: String },

    #[error("Response decode error: {0}")]
    Decode(String),

    /// Bot Framework 连接器拒绝回发的活动或令牌请求
    #[error("Connector returned {status}: {body}")]
    Connector { status: u16, body: String },

    #[error("Config error: {0}")]
    Config(String),

    /// 已知系统表文件读取或解析失败
    #[error("Systems file error: {0}")]
    SystemsFile(String),
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BotError::Decode(err.to_string())
        } else {
            BotError::Transport(err.to_string())
        }
    }
}

impl From<config::ConfigError> for BotError {
    fn from(err: config::ConfigError) -> Self {
        BotError::Config(err.to_string())
    }
}
