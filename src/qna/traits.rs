//! 问答服务客户端抽象
//!
//! 所有后端（QnA Maker HTTP / Mock）实现 AnswerClient：按降序返回候选答案，可能为空。

use async_trait::async_trait;

use crate::core::BotError;
use crate::qna::QnaEndpoint;

/// 一条候选答案；score 范围 0..1
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerCandidate {
    pub text: String,
    pub score: f64,
}

impl AnswerCandidate {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// 问答服务客户端 trait：一次调用、一次等待，不重试
#[async_trait]
pub trait AnswerClient: Send + Sync {
    async fn get_answers(
        &self,
        question: &str,
        endpoint: &QnaEndpoint,
    ) -> Result<Vec<AnswerCandidate>, BotError>;
}
