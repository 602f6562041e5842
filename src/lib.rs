//! QnABot - e-Measure Survey 问答机器人
//!
//! 模块划分：
//! - **bot**: 入站/出站形状、固定菜单、已知 EHR 系统表、路由决策表
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **integrations**: 通道适配器（终端 / Web Chat）与 Bot Framework 连接器回发
//! - **observability**: 日志初始化
//! - **qna**: 问答服务客户端抽象与实现（QnA Maker / Mock）

pub mod bot;
pub mod config;
pub mod core;
pub mod integrations;
pub mod observability;
pub mod qna;

pub use bot::{ConversationRouter, InboundEvent, OutboundMessage};
