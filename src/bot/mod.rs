//! 对话层：入站/出站形状、固定菜单、已知 EHR 系统表与路由决策表

pub mod activity;
pub mod menu;
pub mod router;
pub mod systems;

pub use activity::{CardButton, InboundEvent, MenuCard, OutboundMessage};
pub use router::{classify, render, ConversationRouter, Route, Rule, RULES};
pub use systems::{SharedSystems, SystemDirectory};
