//! Interactive question loop on stdin/stdout.

use anyhow::Result;
use ragbridge_core::Dispatcher;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const PROMPT: &[u8] = b"You: ";

/// Read one question per line until EOF or `exit`, printing each answer.
pub async fn interactive<R, W>(input: R, mut output: W, dispatcher: &Dispatcher) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut answered = 0;
    loop {
        output.write_all(PROMPT).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.eq_ignore_ascii_case("exit") {
            break;
        }
        if question.is_empty() {
            continue;
        }

        let reply = dispatcher.dispatch(question).await;
        output
            .write_all(format!("Assistant: {reply}\n").as_bytes())
            .await?;
        answered += 1;
    }
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(answered)
}
