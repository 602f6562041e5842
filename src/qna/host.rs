//! 问答服务主机名规范化
//!
//! 配置里的主机名可能不带协议、不带路径；统一补成 `https://<host>/qnamaker`。

use crate::config::QnaSection;

/// 问答服务固定路径段
pub const ENDPOINT_SUFFIX: &str = "/qnamaker";

const SCHEME: &str = "https://";

/// 补齐 `https://` 前缀与 `/qnamaker` 后缀；幂等
pub fn normalize_host(raw: &str) -> String {
    let mut host = raw.to_string();
    if !host.starts_with(SCHEME) {
        host.insert_str(0, SCHEME);
    }
    if !host.ends_with(ENDPOINT_SUFFIX) {
        host.push_str(ENDPOINT_SUFFIX);
    }
    host
}

/// 一次调用所需的知识库端点（每次调用时由配置解析）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QnaEndpoint {
    pub knowledge_base_id: String,
    pub endpoint_key: String,
    /// 已规范化的主机地址
    pub host: String,
}

impl QnaEndpoint {
    pub fn new(knowledge_base_id: &str, endpoint_key: &str, raw_host: &str) -> Self {
        Self {
            knowledge_base_id: knowledge_base_id.to_string(),
            endpoint_key: endpoint_key.to_string(),
            host: normalize_host(raw_host),
        }
    }

    pub fn from_section(section: &QnaSection) -> Self {
        Self::new(
            &section.knowledge_base_id,
            &section.endpoint_key,
            &section.endpoint_host_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bare_host() {
        assert_eq!(
            normalize_host("my-kb.azurewebsites.net"),
            "https://my-kb.azurewebsites.net/qnamaker"
        );
    }

    #[test]
    fn test_normalize_keeps_existing_parts() {
        assert_eq!(
            normalize_host("https://my-kb.azurewebsites.net/qnamaker"),
            "https://my-kb.azurewebsites.net/qnamaker"
        );
        assert_eq!(
            normalize_host("https://my-kb.azurewebsites.net"),
            "https://my-kb.azurewebsites.net/qnamaker"
        );
        assert_eq!(
            normalize_host("my-kb.azurewebsites.net/qnamaker"),
            "https://my-kb.azurewebsites.net/qnamaker"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "",
            "host",
            "http://host",
            "https://",
            "/qnamaker",
            "https://host/qnamaker",
            "host/qnamaker/",
            "Ünïcode.example",
        ];
        for raw in inputs {
            let once = normalize_host(raw);
            assert_eq!(normalize_host(&once), once, "input {:?}", raw);
            assert!(once.starts_with("https://"));
            assert!(once.ends_with(ENDPOINT_SUFFIX));
        }
    }

    #[test]
    fn test_endpoint_from_section() {
        let section = QnaSection {
            knowledge_base_id: "kb-1".to_string(),
            endpoint_key: "key-1".to_string(),
            endpoint_host_name: "kb.example.net".to_string(),
            ..QnaSection::default()
        };
        let endpoint = QnaEndpoint::from_section(&section);
        assert_eq!(endpoint.knowledge_base_id, "kb-1");
        assert_eq!(endpoint.endpoint_key, "key-1");
        assert_eq!(endpoint.host, "https://kb.example.net/qnamaker");
    }
}
