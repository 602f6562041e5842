//! 问答服务层：主机名规范化、客户端抽象与实现（QnA Maker / Mock）

pub mod host;
pub mod maker;
pub mod mock;
pub mod traits;

pub use host::{normalize_host, QnaEndpoint, ENDPOINT_SUFFIX};
pub use maker::QnaMakerClient;
pub use mock::MockAnswerClient;
pub use traits::{AnswerCandidate, AnswerClient};
