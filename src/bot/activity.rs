//! 单轮对话的输入与输出形状
//!
//! 与具体通道无关：通道适配器把平台消息翻译成 InboundEvent，
//! 再把 Router 产出的 OutboundMessage 翻译回平台格式。

use serde::{Deserialize, Serialize};

/// 入站事件（每轮由通道创建，只消费一次）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    /// 有成员加入会话
    MembersAdded,
    /// 具名事件，如 `webchat/join`
    NamedEvent { name: String },
    /// 用户文本（含按钮回放的文本）
    Message { text: String },
}

impl InboundEvent {
    pub fn message(text: impl Into<String>) -> Self {
        InboundEvent::Message { text: text.into() }
    }

    pub fn named(name: impl Into<String>) -> Self {
        InboundEvent::NamedEvent { name: name.into() }
    }
}

/// 卡片按钮：显示文本与点击后回放为下一条用户消息的文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardButton {
    pub label: String,
    pub value: String,
}

impl CardButton {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// 点击后回放自身文本的按钮
    pub fn echo(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            value: label.clone(),
            label,
        }
    }
}

/// 菜单卡片（HeroCard）：构造后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuCard {
    pub title: Option<String>,
    pub text: String,
    pub buttons: Vec<CardButton>,
}

impl MenuCard {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            title: None,
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_button(mut self, button: CardButton) -> Self {
        self.buttons.push(button);
        self
    }

    pub fn with_buttons<I>(mut self, buttons: I) -> Self
    where
        I: IntoIterator<Item = CardButton>,
    {
        self.buttons.extend(buttons);
        self
    }

    pub fn labels(&self) -> Vec<&str> {
        self.buttons.iter().map(|b| b.label.as_str()).collect()
    }
}

/// 出站消息：纯文本或卡片
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text { text: String },
    Card { card: MenuCard },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text { text: text.into() }
    }

    pub fn card(card: MenuCard) -> Self {
        OutboundMessage::Card { card }
    }

    pub fn as_card(&self) -> Option<&MenuCard> {
        match self {
            OutboundMessage::Card { card } => Some(card),
            OutboundMessage::Text { .. } => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutboundMessage::Text { text } => Some(text),
            OutboundMessage::Card { .. } => None,
        }
    }
}
