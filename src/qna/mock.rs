//! Mock 问答客户端（用于测试与离线终端，无需知识库）
//!
//! 固定返回一组候选答案、空结果或传输错误，并记录收到的问题。

use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::BotError;
use crate::qna::{AnswerCandidate, AnswerClient, QnaEndpoint};

#[derive(Debug, Clone)]
enum MockReply {
    Answers(Vec<AnswerCandidate>),
    Fail(String),
}

/// Mock 客户端：每次调用返回相同结果
#[derive(Debug)]
pub struct MockAnswerClient {
    reply: MockReply,
    questions: Mutex<Vec<String>>,
}

impl MockAnswerClient {
    pub fn with_answers(answers: Vec<AnswerCandidate>) -> Self {
        Self {
            reply: MockReply::Answers(answers),
            questions: Mutex::new(Vec::new()),
        }
    }

    /// 单条答案的快捷构造
    pub fn answering(text: &str, score: f64) -> Self {
        Self::with_answers(vec![AnswerCandidate::new(text, score)])
    }

    pub fn empty() -> Self {
        Self::with_answers(Vec::new())
    }

    /// 每次调用都返回传输错误
    pub fn failing(reason: &str) -> Self {
        Self {
            reply: MockReply::Fail(reason.to_string()),
            questions: Mutex::new(Vec::new()),
        }
    }

    /// 迄今收到的问题（按调用顺序）
    pub fn questions(&self) -> Vec<String> {
        self.questions
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

impl Default for MockAnswerClient {
    fn default() -> Self {
        Self::empty()
    }
}

#[async_trait]
impl AnswerClient for MockAnswerClient {
    async fn get_answers(
        &self,
        question: &str,
        _endpoint: &QnaEndpoint,
    ) -> Result<Vec<AnswerCandidate>, BotError> {
        if let Ok(mut q) = self.questions.lock() {
            q.push(question.to_string());
        }
        match &self.reply {
            MockReply::Answers(answers) => Ok(answers.clone()),
            MockReply::Fail(reason) => Err(BotError::Transport(reason.clone())),
        }
    }
}
