//! 终端通道
//!
//! 启动时发送 MembersAdded，之后逐行读取 stdin 作为用户消息。
//! 卡片按钮编号显示，输入编号即回放该按钮的文本；`/quit` 退出。

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::bot::{CardButton, ConversationRouter, InboundEvent, OutboundMessage};

pub const QUIT_COMMAND: &str = "/quit";

/// 把一组出站消息排版为终端文本
pub fn format_replies(replies: &[OutboundMessage]) -> String {
    let mut out = String::new();
    for reply in replies {
        match reply {
            OutboundMessage::Text { text } => {
                out.push_str("bot> ");
                out.push_str(text);
                out.push('\n');
            }
            OutboundMessage::Card { card } => {
                if let Some(title) = &card.title {
                    out.push_str(&format!("== {} ==\n", title));
                }
                out.push_str(&card.text);
                out.push('\n');
                for (i, button) in card.buttons.iter().enumerate() {
                    out.push_str(&format!("  [{}] {}\n", i + 1, button.label));
                }
            }
        }
    }
    out
}

/// 最后一张卡片的按钮（编号输入据此解析）
fn last_buttons(replies: &[OutboundMessage]) -> Option<Vec<CardButton>> {
    replies
        .iter()
        .rev()
        .find_map(|r| r.as_card())
        .map(|card| card.buttons.clone())
}

/// 编号输入映射为按钮文本，其余原样返回
fn resolve_input(line: &str, buttons: &[CardButton]) -> String {
    line.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| buttons.get(i))
        .map(|b| b.value.clone())
        .unwrap_or_else(|| line.to_string())
}

/// 运行终端对话直到 EOF 或 `/quit`
pub async fn run_console<R, W>(
    router: &ConversationRouter,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let replies = router.handle(&InboundEvent::MembersAdded).await;
    output.write_all(format_replies(&replies).as_bytes()).await?;
    let mut buttons = last_buttons(&replies).unwrap_or_default();

    let mut lines = input.lines();
    loop {
        output.write_all(b"you> ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == QUIT_COMMAND {
            break;
        }

        let text = resolve_input(line, &buttons);
        let replies = router.handle(&InboundEvent::message(text)).await;
        output.write_all(format_replies(&replies).as_bytes()).await?;
        if let Some(next) = last_buttons(&replies) {
            buttons = next;
        }
    }

    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bot::SystemDirectory;
    use crate::config::QnaSection;
    use crate::qna::MockAnswerClient;

    #[test]
    fn test_resolve_input() {
        let buttons = vec![
            CardButton::echo("FAQ"),
            CardButton::new("No", "I need more help from Epic."),
        ];
        assert_eq!(resolve_input("1", &buttons), "FAQ");
        assert_eq!(resolve_input("2", &buttons), "I need more help from Epic.");
        assert_eq!(resolve_input("0", &buttons), "0");
        assert_eq!(resolve_input("3", &buttons), "3");
        assert_eq!(resolve_input("Epic", &buttons), "Epic");
    }

    #[tokio::test]
    async fn test_console_session() {
        let client = Arc::new(MockAnswerClient::answering("Open the reports tab.", 0.9));
        let router = ConversationRouter::new(
            client.clone(),
            QnaSection::default(),
            SystemDirectory::with_defaults().shared(),
        );

        // 2 -> 主菜单第二个按钮 FAQ；随后输入系统名
        let input: &[u8] = b"2\nEpic\n/quit\nnever read\n";
        let mut output = Vec::new();
        run_console(&router, input, &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("== Welcome to the e-Measure Survey Chatbot! =="));
        assert!(text.contains("  [10] Who do I contact with questions?"));
        assert!(text.contains("bot> Open the reports tab."));
        assert!(text.contains("Were you able to obtain your e-measures?"));
        assert_eq!(client.questions(), vec!["FAQ".to_string(), "Epic".to_string()]);
    }
}
