//! Bot Framework 连接器客户端
//!
//! 通道未要求 expectReplies 时，回复不放在响应体里，而是逐条
//! `POST {serviceUrl}/v3/conversations/{conversation.id}/activities/{replyToId}` 发回通道。
//! 配置了应用凭据时先以 client_credentials 换取访问令牌，缓存到过期前一分钟。

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::ConnectorSection;
use crate::core::BotError;

const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// 连接器客户端：持有 reqwest Client、应用凭据与令牌缓存
pub struct ConnectorClient {
    client: reqwest::Client,
    section: ConnectorSection,
    token: Mutex<Option<CachedToken>>,
}

impl ConnectorClient {
    pub fn new(section: ConnectorSection) -> Result<Self, BotError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(section.timeout_secs))
            .user_agent(concat!("qnabot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            section,
            token: Mutex::new(None),
        })
    }

    /// 回复地址：有 replyToId 时回复到该活动，否则追加到会话末尾
    pub fn activities_url(
        service_url: &str,
        conversation_id: &str,
        reply_to_id: Option<&str>,
    ) -> String {
        let base = format!(
            "{}/v3/conversations/{}/activities",
            service_url.trim_end_matches('/'),
            conversation_id
        );
        match reply_to_id.filter(|id| !id.is_empty()) {
            Some(id) => format!("{}/{}", base, id),
            None => base,
        }
    }

    /// 获取访问令牌；未配置凭据时为 None
    async fn bearer_token(&self) -> Result<Option<String>, BotError> {
        if !self.section.has_credentials() {
            return Ok(None);
        }

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(Some(token.value.clone()));
        }

        tracing::info!("Requesting connector access token");
        let resp = self
            .client
            .post(&self.section.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.section.app_id.as_str()),
                ("client_secret", self.section.app_password.as_str()),
                ("scope", self.section.scope.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BotError::Connector {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| BotError::Decode(e.to_string()))?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(Some(token.access_token))
    }

    /// 发送一条活动到连接器
    pub async fn send_activity<T>(&self, url: &str, activity: &T) -> Result<(), BotError>
    where
        T: Serialize + ?Sized,
    {
        let mut request = self.client.post(url).json(activity);
        if let Some(token) = self.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BotError::Connector {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
