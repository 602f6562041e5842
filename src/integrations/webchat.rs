//! Web Chat 通道（Bot Framework 活动格式）
//!
//! POST /api/messages 接收活动，交给 ConversationRouter 处理后：
//! - `deliveryMode` 为 expectReplies，或活动不带 serviceUrl / 会话 ID 时，
//!   在同一响应体里返回 `{"activities": [...]}`；
//! - 否则立即应答 200，后台任务按顺序把回复 POST 到连接器（见 [`ConnectorClient`]）。
//!
//! 文本 -> message 活动；卡片 -> 带 HeroCard 附件的 message 活动（按钮为 imBack）。

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::bot::{ConversationRouter, InboundEvent, MenuCard, OutboundMessage};
use crate::integrations::connector::ConnectorClient;

/// 已处理活动 ID 缓存（去重，吸收通道的至少一次投递）
pub type ProcessedActivities = Arc<RwLock<HashSet<String>>>;

const PROCESSED_CAPACITY: usize = 10_000;

pub const HERO_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.hero";

pub const EXPECT_REPLIES: &str = "expectReplies";

/// Web Chat 服务状态
pub struct WebchatState {
    pub router: ConversationRouter,
    pub connector: Arc<ConnectorClient>,
    pub processed: ProcessedActivities,
}

impl WebchatState {
    pub fn new(router: ConversationRouter, connector: ConnectorClient) -> Self {
        Self {
            router,
            connector: Arc::new(connector),
            processed: Arc::new(RwLock::new(HashSet::new())),
        }
    }
}

/// 通道账号（用户或机器人）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationAccount {
    pub id: String,
}

/// 入站活动（只解析用到的字段）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: Option<String>,
    pub text: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub members_added: Vec<ChannelAccount>,
    pub from: Option<ChannelAccount>,
    pub recipient: Option<ChannelAccount>,
    pub conversation: Option<ConversationAccount>,
    pub service_url: Option<String>,
    pub delivery_mode: Option<String>,
}

impl Activity {
    pub fn expects_replies(&self) -> bool {
        self.delivery_mode.as_deref() == Some(EXPECT_REPLIES)
    }

    /// 连接器回复地址；expectReplies 或缺少 serviceUrl / 会话 ID 时为 None
    pub fn reply_url(&self) -> Option<String> {
        if self.expects_replies() {
            return None;
        }
        let service_url = self.service_url.as_deref().filter(|u| !u.is_empty())?;
        let conversation_id = self
            .conversation
            .as_ref()
            .map(|c| c.id.as_str())
            .filter(|id| !id.is_empty())?;
        Some(ConnectorClient::activities_url(
            service_url,
            conversation_id,
            self.id.as_deref(),
        ))
    }

    /// 翻译为通道无关的入站事件；无需处理的活动返回 None
    pub fn to_event(&self) -> Option<InboundEvent> {
        match self.type_.as_str() {
            "message" => {
                let text = self.text.as_deref().map(str::trim).unwrap_or_default();
                (!text.is_empty()).then(|| InboundEvent::message(text))
            }
            "conversationUpdate" => {
                let bot_id = self.recipient.as_ref().map(|r| r.id.as_str());
                self.members_added
                    .iter()
                    .any(|m| Some(m.id.as_str()) != bot_id)
                    .then_some(InboundEvent::MembersAdded)
            }
            "event" => self.name.as_deref().map(InboundEvent::named),
            _ => None,
        }
    }
}

/// 出站活动
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyActivity {
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub id: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: &'static str,
    pub content: HeroCard,
}

#[derive(Debug, Serialize)]
pub struct HeroCard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
    pub buttons: Vec<CardAction>,
}

#[derive(Debug, Serialize)]
pub struct CardAction {
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub title: String,
    pub value: String,
}

impl From<&MenuCard> for HeroCard {
    fn from(card: &MenuCard) -> Self {
        Self {
            title: card.title.clone(),
            text: card.text.clone(),
            buttons: card
                .buttons
                .iter()
                .map(|b| CardAction {
                    type_: "imBack",
                    title: b.label.clone(),
                    value: b.value.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RepliesResponse {
    pub activities: Vec<ReplyActivity>,
}

/// 把 Router 输出翻译为回复活动（from/recipient 与入站对调）
pub fn to_reply(message: &OutboundMessage, inbound: &Activity) -> ReplyActivity {
    let (text, attachments) = match message {
        OutboundMessage::Text { text } => (Some(text.clone()), Vec::new()),
        OutboundMessage::Card { card } => (
            None,
            vec![Attachment {
                content_type: HERO_CARD_CONTENT_TYPE,
                content: HeroCard::from(card),
            }],
        ),
    };
    ReplyActivity {
        type_: "message",
        id: uuid::Uuid::new_v4().to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        text,
        attachments,
        from: inbound.recipient.clone(),
        recipient: inbound.from.clone(),
        conversation: inbound.conversation.clone(),
        reply_to_id: inbound.id.clone(),
    }
}

/// 创建 Web Chat 路由
pub fn create_router(state: Arc<WebchatState>) -> Router {
    Router::new()
        .route("/api/messages", post(messages_handler))
        .route("/health", axum::routing::get(|| async { "OK" }))
        .with_state(state)
}

/// POST /api/messages - 处理一条活动，回复放在响应体或交给连接器
async fn messages_handler(
    State(state): State<Arc<WebchatState>>,
    Json(activity): Json<Activity>,
) -> Response {
    tracing::info!("Webchat activity received: type={}", activity.type_);

    let activities: Vec<ReplyActivity> = if is_duplicate(&state, &activity).await {
        Vec::new()
    } else if let Some(event) = activity.to_event() {
        let replies = state.router.handle(&event).await;
        replies.iter().map(|m| to_reply(m, &activity)).collect()
    } else {
        tracing::info!("Webchat activity type {:?} needs no reply", activity.type_);
        Vec::new()
    };

    let Some(url) = activity.reply_url() else {
        return Json(RepliesResponse { activities }).into_response();
    };

    if !activities.is_empty() {
        let connector = state.connector.clone();
        tokio::spawn(async move {
            for reply in &activities {
                if let Err(e) = connector.send_activity(&url, reply).await {
                    tracing::error!("Webchat reply delivery to {} failed: {}", url, e);
                    return;
                }
            }
            tracing::info!("Webchat: {} reply activities sent to {}", activities.len(), url);
        });
    }

    StatusCode::OK.into_response()
}

/// 记录活动 ID；已处理过的返回 true（集合超过上限时整体清空）
async fn is_duplicate(state: &WebchatState, activity: &Activity) -> bool {
    let Some(id) = activity.id.as_deref().filter(|id| !id.is_empty()) else {
        return false;
    };
    let mut processed = state.processed.write().await;
    if processed.contains(id) {
        tracing::debug!("Duplicate activity ignored: {}", id);
        return true;
    }
    if processed.len() >= PROCESSED_CAPACITY {
        processed.clear();
    }
    processed.insert(id.to_string());
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(json: serde_json::Value) -> Activity {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_message_activity_is_trimmed() {
        let a = activity(serde_json::json!({ "type": "message", "text": "  FAQ \n" }));
        assert_eq!(a.to_event(), Some(InboundEvent::message("FAQ")));

        let blank = activity(serde_json::json!({ "type": "message", "text": "   " }));
        assert_eq!(blank.to_event(), None);
    }

    #[test]
    fn test_conversation_update_ignores_bot_join() {
        let bot_only = activity(serde_json::json!({
            "type": "conversationUpdate",
            "membersAdded": [{ "id": "bot" }],
            "recipient": { "id": "bot" }
        }));
        assert_eq!(bot_only.to_event(), None);

        let user_join = activity(serde_json::json!({
            "type": "conversationUpdate",
            "membersAdded": [{ "id": "bot" }, { "id": "user-1", "name": "Dr. Lee" }],
            "recipient": { "id": "bot" }
        }));
        assert_eq!(user_join.to_event(), Some(InboundEvent::MembersAdded));
    }

    #[test]
    fn test_event_and_unknown_types() {
        let join = activity(serde_json::json!({ "type": "event", "name": "webchat/join" }));
        assert_eq!(join.to_event(), Some(InboundEvent::named("webchat/join")));

        let typing = activity(serde_json::json!({ "type": "typing" }));
        assert_eq!(typing.to_event(), None);
    }

    #[test]
    fn test_reply_url_follows_delivery_mode() {
        let normal = activity(serde_json::json!({
            "type": "message",
            "id": "act-1",
            "serviceUrl": "https://smba.example.net/amer/",
            "conversation": { "id": "c1" }
        }));
        assert_eq!(
            normal.reply_url().as_deref(),
            Some("https://smba.example.net/amer/v3/conversations/c1/activities/act-1")
        );

        let expect_replies = activity(serde_json::json!({
            "type": "message",
            "serviceUrl": "https://smba.example.net/amer/",
            "deliveryMode": "expectReplies",
            "conversation": { "id": "c1" }
        }));
        assert!(expect_replies.expects_replies());
        assert_eq!(expect_replies.reply_url(), None);

        let no_conversation = activity(serde_json::json!({
            "type": "message",
            "serviceUrl": "https://smba.example.net/amer/"
        }));
        assert_eq!(no_conversation.reply_url(), None);
    }

    #[test]
    fn test_card_reply_shape() {
        let inbound = activity(serde_json::json!({
            "type": "message",
            "id": "act-1",
            "text": "FAQ",
            "from": { "id": "user-1" },
            "recipient": { "id": "bot" },
            "conversation": { "id": "conv-1" }
        }));
        let card = MenuCard::new("Pick one")
            .with_title("Menu")
            .with_button(crate::bot::CardButton::new("Yes", "Yes, thanks."));
        let reply = to_reply(&OutboundMessage::card(card), &inbound);
        let json = serde_json::to_value(&reply).unwrap();

        assert_eq!(json["type"], "message");
        assert_eq!(json["replyToId"], "act-1");
        assert_eq!(json["from"]["id"], "bot");
        assert_eq!(json["recipient"]["id"], "user-1");
        assert_eq!(json["conversation"]["id"], "conv-1");
        assert!(json.get("text").is_none());
        let attachment = &json["attachments"][0];
        assert_eq!(attachment["contentType"], HERO_CARD_CONTENT_TYPE);
        assert_eq!(attachment["content"]["title"], "Menu");
        assert_eq!(attachment["content"]["buttons"][0]["type"], "imBack");
        assert_eq!(attachment["content"]["buttons"][0]["title"], "Yes");
        assert_eq!(attachment["content"]["buttons"][0]["value"], "Yes, thanks.");
    }
}
