//! 固定菜单卡片与文案
//!
//! 每个函数每轮新建一张卡片；按钮默认回放自身文本。

use crate::bot::activity::{CardButton, MenuCard};

pub const GO_BACK: &str = "Go back";
pub const MENU: &str = "MENU";
pub const FAQ: &str = "FAQ";
/// 「需要更多帮助」判定用的子串
pub const MORE_HELP: &str = "more help";

/// 通道 join 事件名（Web Chat 打开时发送）
pub const WEBCHAT_JOIN_EVENT: &str = "webchat/join";

pub const MAIN_MENU_TITLE: &str = "Welcome to the e-Measure Survey Chatbot!";
pub const MAIN_MENU_TEXT: &str =
    "Hello, how can I help you today? Type in any question below, or choose from one of the following prompts:";
pub const MAIN_MENU_OPTIONS: [&str; 3] = ["Steps for e-measures", FAQ, "Troubleshoot"];

pub const WELCOME_TEXT: &str =
    "Welcome to the e-Measure Survey Chatbot! Ask me anything about the e-Measure Survey, or type MENU to see your options.";

pub const NOT_SURE_TEXT: &str =
    "I'm not sure how to answer that question. Call your Practice Support Advisor (PSA) for access to Hill inSite or for any issues with the automated questionnaire.";

pub const MORE_HELP_TEXT: &str =
    "Please contact your Practice Support Advisor (PSA). They can walk you through pulling e-measures from your EHR and help with any issues with the automated questionnaire.";

pub const EHR_FOLLOW_UP_TEXT: &str = "Were you able to obtain your e-measures?";
pub const EHR_YES_LABEL: &str = "Yes";
pub const EHR_YES_VALUE: &str = "Yes, I was able to obtain my e-measures.";
pub const EHR_MORE_HELP_LABEL: &str = "No, I need more help from my EHR";
pub const EHR_DIFFERENT_LABEL: &str = "No, I need steps for a different EHR";
pub const EHR_DIFFERENT_VALUE: &str = "I need steps for a different EHR.";

pub const FAQ_TEXT: &str = "Frequently asked questions:";
pub const FAQ_QUESTIONS: [&str; 10] = [
    "Why do I have to do this?",
    "What are e-measures?",
    "Where do I find the e-Measure Survey?",
    "When is the survey due?",
    "Who should complete the survey?",
    "How do I log in to Hill inSite?",
    "What reporting period should I use?",
    "What if my EHR is not listed?",
    "Can I save my progress and finish later?",
    "Who do I contact with questions?",
];

/// 「需要 EHR 帮助」按钮回放的文本，内嵌用户原文
pub fn more_help_from(text: &str) -> String {
    format!("I need more help from {}.", text)
}

/// 主菜单：成员加入、MENU、Go back 共用
pub fn main_menu() -> MenuCard {
    MenuCard::new(MAIN_MENU_TEXT)
        .with_title(MAIN_MENU_TITLE)
        .with_buttons(MAIN_MENU_OPTIONS.into_iter().map(CardButton::echo))
}

pub fn faq_menu() -> MenuCard {
    MenuCard::new(FAQ_TEXT)
        .with_buttons(FAQ_QUESTIONS.into_iter().map(CardButton::echo))
        .with_button(CardButton::echo(GO_BACK))
}

pub fn not_sure_card() -> MenuCard {
    MenuCard::new(NOT_SURE_TEXT).with_button(CardButton::echo(GO_BACK))
}

pub fn more_help_card() -> MenuCard {
    MenuCard::new(MORE_HELP_TEXT).with_button(CardButton::echo(GO_BACK))
}

/// 识别到 EHR 名称后的追问卡片（无标题）
pub fn ehr_follow_up(text: &str) -> MenuCard {
    MenuCard::new(EHR_FOLLOW_UP_TEXT).with_buttons([
        CardButton::new(EHR_YES_LABEL, EHR_YES_VALUE),
        CardButton::new(EHR_MORE_HELP_LABEL, more_help_from(text)),
        CardButton::new(EHR_DIFFERENT_LABEL, EHR_DIFFERENT_VALUE),
        CardButton::echo(GO_BACK),
    ])
}
