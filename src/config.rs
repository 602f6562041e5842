//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `QNABOT__*` 覆盖（双下划线表示嵌套，如 `QNABOT__QNA__TOP=3`）。
//! 托管平台的扁平键（`QnAKnowledgebaseId`、`MicrosoftAppId` 等）作为最低优先级的默认值，
//! 任何文件或 `QNABOT__*` 变量里显式给出的值都会覆盖它们。

use std::path::PathBuf;

use config::builder::{ConfigBuilder, DefaultState};
use serde::Deserialize;

use crate::core::BotError;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub qna: QnaSection,
    pub server: ServerSection,
    pub bot: BotSection,
    pub connector: ConnectorSection,
}

/// [qna] 段：知识库、密钥、主机名与检索参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QnaSection {
    pub knowledge_base_id: String,
    pub endpoint_key: String,
    /// 原始主机名，未经规范化（如 `my-kb.azurewebsites.net`）
    pub endpoint_host_name: String,
    /// 最多取回的候选答案数
    pub top: usize,
    /// 置信度阈值（0..1），不高于此值的候选被丢弃
    pub score_threshold: f64,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for QnaSection {
    fn default() -> Self {
        Self {
            knowledge_base_id: String::new(),
            endpoint_key: String::new(),
            endpoint_host_name: String::new(),
            top: 1,
            score_threshold: 0.3,
            timeout_secs: 30,
        }
    }
}

/// [server] 段：Web Chat 监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3978,
        }
    }
}

/// [bot] 段：已知 EHR 系统表文件，未设置时使用内置表
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BotSection {
    pub systems_file: Option<PathBuf>,
}

/// [connector] 段：向 Bot Framework 连接器回发活动时使用的应用凭据
///
/// app_id / app_password 为空时不带 Authorization 头（本地 Emulator 即如此）。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectorSection {
    pub app_id: String,
    pub app_password: String,
    pub token_url: String,
    pub scope: String,
    pub timeout_secs: u64,
}

impl Default for ConnectorSection {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_password: String::new(),
            token_url: "https://login.microsoftonline.com/botframework.com/oauth2/v2.0/token"
                .to_string(),
            scope: "https://api.botframework.com/.default".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ConnectorSection {
    pub fn has_credentials(&self) -> bool {
        !self.app_id.trim().is_empty() && !self.app_password.trim().is_empty()
    }
}

/// 托管平台扁平键 -> 嵌套键
const LEGACY_KEYS: &[(&str, &str)] = &[
    ("QnAKnowledgebaseId", "qna.knowledge_base_id"),
    ("QnAAuthKey", "qna.endpoint_key"),
    ("QnAEndpointHostName", "qna.endpoint_host_name"),
    ("MicrosoftAppId", "connector.app_id"),
    ("MicrosoftAppPassword", "connector.app_password"),
];

impl AppConfig {
    /// 检查问答服务必需项是否齐全（启动期校验，不属于单轮错误）
    pub fn validate(&self) -> Result<(), BotError> {
        let missing: Vec<&str> = [
            ("qna.knowledge_base_id", &self.qna.knowledge_base_id),
            ("qna.endpoint_key", &self.qna.endpoint_key),
            ("qna.endpoint_host_name", &self.qna.endpoint_host_name),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(BotError::Config(format!("missing {}", missing.join(", "))))
        }
    }
}

/// 把非空的扁平键登记为默认值（最低优先级）
fn with_legacy_defaults<F>(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: F,
) -> Result<ConfigBuilder<DefaultState>, BotError>
where
    F: Fn(&str) -> Option<String>,
{
    for (legacy, key) in LEGACY_KEYS {
        if let Some(value) = lookup(legacy).filter(|v| !v.trim().is_empty()) {
            builder = builder.set_default(*key, value)?;
        }
    }
    Ok(builder)
}

/// 从 config 目录加载配置，环境变量 QNABOT__* 可覆盖
///
/// 优先级由低到高：扁平键、default.toml（config/、../config/、当前目录中首个存在者）、
/// 显式传入的 config_path、环境变量 QNABOT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, BotError> {
    build_config(config_path, |key| std::env::var(key).ok())
}

fn build_config<F>(config_path: Option<PathBuf>, legacy: F) -> Result<AppConfig, BotError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = with_legacy_defaults(config::Config::builder(), legacy)?;

    if let Some(name) = ["config/default", "../config/default", "default"]
        .into_iter()
        .find(|name| std::path::Path::new(&format!("{}.toml", name)).exists())
    {
        builder = builder.add_source(config::File::with_name(name).required(false));
    }

    if let Some(path) = config_path.filter(|p| p.exists()) {
        builder = builder.add_source(config::File::from(path).required(false));
    }

    let cfg = builder
        .add_source(
            config::Environment::with_prefix("QNABOT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.qna.top, 1);
        assert!((cfg.qna.score_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(cfg.server.port, 3978);
        assert!(cfg.bot.systems_file.is_none());
        assert!(!cfg.connector.has_credentials());
        assert!(cfg.connector.token_url.starts_with("https://login.microsoftonline.com/"));
    }

    #[test]
    fn test_validate_reports_missing_keys() {
        let mut cfg = AppConfig::default();
        cfg.qna.knowledge_base_id = "kb-1".to_string();
        let err = cfg.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("qna.endpoint_key"));
        assert!(msg.contains("qna.endpoint_host_name"));
        assert!(!msg.contains("qna.knowledge_base_id"));
    }

    #[test]
    fn test_legacy_keys_sit_below_explicit_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[qna]\nendpoint_key = \"nested-key\"").unwrap();

        let env: HashMap<&str, &str> = [
            ("QnAKnowledgebaseId", "kb-legacy"),
            ("QnAAuthKey", "legacy-key"),
            ("QnAEndpointHostName", "legacy.azurewebsites.net"),
            ("MicrosoftAppId", "app-1"),
            ("MicrosoftAppPassword", "   "),
        ]
        .into_iter()
        .collect();
        let cfg = build_config(Some(file.path().to_path_buf()), |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(cfg.qna.knowledge_base_id, "kb-legacy");
        assert_eq!(cfg.qna.endpoint_key, "nested-key");
        assert_eq!(cfg.qna.endpoint_host_name, "legacy.azurewebsites.net");
        assert_eq!(cfg.connector.app_id, "app-1");
        assert!(cfg.connector.app_password.is_empty());
        assert!(!cfg.connector.has_credentials());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[qna]
knowledge_base_id = "kb-file"
endpoint_key = "file-key"
endpoint_host_name = "file.azurewebsites.net"
top = 3

[server]
port = 8080
"#
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.qna.knowledge_base_id, "kb-file");
        assert_eq!(cfg.qna.top, 3);
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "0.0.0.0");
    }
}
