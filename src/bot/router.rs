//! 对话路由
//!
//! 一轮只处理一个 InboundEvent，产出零到多条 OutboundMessage，不跨轮保存状态。
//! 消息先交给问答服务；无答案（含调用失败）时直接给「不确定」卡片，
//! 否则按 RULES 顺序匹配，首个命中的规则决定回复形状。

use std::sync::{Arc, PoisonError};

use crate::bot::activity::{InboundEvent, OutboundMessage};
use crate::bot::menu::{self, FAQ, GO_BACK, MENU, MORE_HELP, WEBCHAT_JOIN_EVENT};
use crate::bot::systems::{SharedSystems, SystemDirectory};
use crate::config::QnaSection;
use crate::qna::{AnswerCandidate, AnswerClient, QnaEndpoint};

/// 一条消息最终落入的分支
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// 文本命中已知 EHR：答案 + 追问卡片
    KnownSystem { system: String },
    /// MENU / Go back：主菜单
    MainMenu,
    Faq,
    /// 文本含 "more help"：转人工支持
    MoreHelp,
    /// 默认：仅答案文本
    Answer,
}

/// 路由规则：名称 + 判定函数
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&str, &SystemDirectory) -> Option<Route>,
}

fn known_system(text: &str, systems: &SystemDirectory) -> Option<Route> {
    systems.lookup(text).map(|system| Route::KnownSystem {
        system: system.to_string(),
    })
}

fn main_menu(text: &str, _: &SystemDirectory) -> Option<Route> {
    (text == MENU || text == GO_BACK).then_some(Route::MainMenu)
}

fn faq(text: &str, _: &SystemDirectory) -> Option<Route> {
    (text == FAQ).then_some(Route::Faq)
}

fn more_help(text: &str, _: &SystemDirectory) -> Option<Route> {
    text.contains(MORE_HELP).then_some(Route::MoreHelp)
}

fn answer(_: &str, _: &SystemDirectory) -> Option<Route> {
    Some(Route::Answer)
}

/// 有序决策表；最后一条恒命中
pub const RULES: &[Rule] = &[
    Rule {
        name: "known_system",
        matches: known_system,
    },
    Rule {
        name: "main_menu",
        matches: main_menu,
    },
    Rule {
        name: "faq",
        matches: faq,
    },
    Rule {
        name: "more_help",
        matches: more_help,
    },
    Rule {
        name: "answer",
        matches: answer,
    },
];

/// 按顺序求值，返回首个命中的分支
pub fn classify(text: &str, systems: &SystemDirectory) -> Route {
    RULES
        .iter()
        .find_map(|rule| (rule.matches)(text, systems))
        .unwrap_or(Route::Answer)
}

/// 给定分支与最高分答案生成回复
pub fn render(route: &Route, text: &str, top: &AnswerCandidate) -> Vec<OutboundMessage> {
    match route {
        Route::KnownSystem { .. } => vec![
            OutboundMessage::text(top.text.clone()),
            OutboundMessage::card(menu::ehr_follow_up(text)),
        ],
        Route::MainMenu => vec![OutboundMessage::card(menu::main_menu())],
        Route::Faq => vec![OutboundMessage::card(menu::faq_menu())],
        Route::MoreHelp => vec![OutboundMessage::card(menu::more_help_card())],
        Route::Answer => vec![OutboundMessage::text(top.text.clone())],
    }
}

/// 对话路由器：持有问答客户端、问答配置与已知系统表，可多轮共享
pub struct ConversationRouter {
    answers: Arc<dyn AnswerClient>,
    qna: QnaSection,
    systems: SharedSystems,
}

impl ConversationRouter {
    pub fn new(answers: Arc<dyn AnswerClient>, qna: QnaSection, systems: SharedSystems) -> Self {
        Self {
            answers,
            qna,
            systems,
        }
    }

    /// 处理一个入站事件
    pub async fn handle(&self, event: &InboundEvent) -> Vec<OutboundMessage> {
        match event {
            InboundEvent::MembersAdded => vec![OutboundMessage::card(menu::main_menu())],
            InboundEvent::NamedEvent { name } if name == WEBCHAT_JOIN_EVENT => {
                vec![OutboundMessage::text(menu::WELCOME_TEXT)]
            }
            InboundEvent::NamedEvent { name } => {
                tracing::debug!("Ignoring named event {:?}", name);
                Vec::new()
            }
            InboundEvent::Message { text } => self.handle_message(text).await,
        }
    }

    async fn handle_message(&self, text: &str) -> Vec<OutboundMessage> {
        let answers = self.fetch_answers(text).await;
        let Some(top) = answers.first() else {
            return vec![OutboundMessage::card(menu::not_sure_card())];
        };

        let route = {
            let systems = self.systems.read().unwrap_or_else(PoisonError::into_inner);
            classify(text, &systems)
        };
        match &route {
            Route::KnownSystem { system } => {
                tracing::debug!("Routed message to known system {} (text {:?})", system, text)
            }
            other => tracing::debug!("Routed message to {:?}", other),
        }

        render(&route, text, top)
    }

    /// 调用问答服务；任何错误都按空结果处理
    async fn fetch_answers(&self, text: &str) -> Vec<AnswerCandidate> {
        let endpoint = QnaEndpoint::from_section(&self.qna);
        tracing::info!("Calling QnA Maker");
        match self.answers.get_answers(text, &endpoint).await {
            Ok(answers) => answers,
            Err(e) => {
                tracing::warn!("QnA call failed, treating as no answer: {}", e);
                Vec::new()
            }
        }
    }
}
