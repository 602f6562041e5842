//! QnA Maker generateAnswer 客户端
//!
//! POST `{host}/knowledgebases/{kb}/generateAnswer`，鉴权头 `Authorization: EndpointKey {key}`。
//! 服务返回的 score 为 0..100，这里换算为 0..1；不高于阈值的候选（含服务的
//! "No good match found in KB." 占位答案，score 为 0）被丢弃，按降序截断到 top。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::QnaSection;
use crate::core::BotError;
use crate::qna::{AnswerCandidate, AnswerClient, QnaEndpoint};

/// generateAnswer 请求体
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAnswerRequest<'a> {
    question: &'a str,
    top: usize,
    /// 服务端阈值，百分制
    score_threshold: f64,
}

/// generateAnswer 响应体
#[derive(Debug, Deserialize)]
struct GenerateAnswerResponse {
    #[serde(default)]
    answers: Vec<QnaAnswer>,
}

/// 只取答案文本与分数，其余字段（id、questions、source 等）忽略
#[derive(Debug, Deserialize)]
struct QnaAnswer {
    answer: String,
    score: f64,
}

/// QnA Maker 客户端：持有 reqwest Client 与检索参数
pub struct QnaMakerClient {
    client: Client,
    top: usize,
    score_threshold: f64,
}

impl QnaMakerClient {
    pub fn new(top: usize, score_threshold: f64, timeout: Duration) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("qnabot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            top: top.max(1),
            score_threshold,
        })
    }

    pub fn from_section(section: &QnaSection) -> Result<Self, BotError> {
        Self::new(
            section.top,
            section.score_threshold,
            Duration::from_secs(section.timeout_secs),
        )
    }

    /// 换算分数、过滤阈值、降序并截断
    fn rank(&self, answers: Vec<QnaAnswer>) -> Vec<AnswerCandidate> {
        let mut ranked: Vec<AnswerCandidate> = answers
            .into_iter()
            .map(|a| AnswerCandidate::new(a.answer, a.score / 100.0))
            .filter(|c| c.score > self.score_threshold)
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(self.top);
        ranked
    }
}

#[async_trait]
impl AnswerClient for QnaMakerClient {
    async fn get_answers(
        &self,
        question: &str,
        endpoint: &QnaEndpoint,
    ) -> Result<Vec<AnswerCandidate>, BotError> {
        let url = format!(
            "{}/knowledgebases/{}/generateAnswer",
            endpoint.host, endpoint.knowledge_base_id
        );
        let body = GenerateAnswerRequest {
            question,
            top: self.top,
            score_threshold: self.score_threshold * 100.0,
        };

        let resp = self
            .client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("EndpointKey {}", endpoint.endpoint_key),
            )
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BotError::ServiceStatus {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        let parsed: GenerateAnswerResponse =
            serde_json::from_str(&text).map_err(|e| BotError::Decode(e.to_string()))?;

        let ranked = self.rank(parsed.answers);
        tracing::debug!("QnA returned {} candidate(s) above threshold", ranked.len());
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint_for(server: &mockito::Server) -> QnaEndpoint {
        QnaEndpoint {
            knowledge_base_id: "kb-1".to_string(),
            endpoint_key: "secret".to_string(),
            host: format!("{}/qnamaker", server.url()),
        }
    }

    fn client(top: usize) -> QnaMakerClient {
        QnaMakerClient::new(top, 0.3, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_answers_ranks_and_filters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/qnamaker/knowledgebases/kb-1/generateAnswer")
            .match_header("authorization", "EndpointKey secret")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "question": "How do I start?",
                "top": 2
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "answers": [
                        { "answer": "Second", "score": 55.0, "id": 2, "questions": ["q2"] },
                        { "answer": "Low", "score": 10.0, "id": 3 },
                        { "answer": "First", "score": 91.5, "id": 1, "source": "faq.tsv" }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let answers = client(2)
            .get_answers("How do I start?", &endpoint_for(&server))
            .await
            .unwrap();

        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].text, "First");
        assert!((answers[0].score - 0.915).abs() < 1e-9);
        assert_eq!(answers[1].text, "Second");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_good_match_placeholder_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/qnamaker/knowledgebases/kb-1/generateAnswer")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "answers": [
                        { "answer": "No good match found in KB.", "score": 0.0, "id": -1 }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let answers = client(1)
            .get_answers("asdkfj", &endpoint_for(&server))
            .await
            .unwrap();
        assert!(answers.is_empty());
    }

    #[tokio::test]
    async fn test_service_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/qnamaker/knowledgebases/kb-1/generateAnswer")
            .with_status(401)
            .with_body("Access denied")
            .create_async()
            .await;

        let err = client(1)
            .get_answers("anything", &endpoint_for(&server))
            .await
            .unwrap_err();
        match err {
            BotError::ServiceStatus { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("denied"));
            }
            other => panic!("Expected ServiceStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/qnamaker/knowledgebases/kb-1/generateAnswer")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let err = client(1)
            .get_answers("anything", &endpoint_for(&server))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Decode(_)));
    }
}
