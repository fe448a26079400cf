//! Messaging front-end boundary.
//!
//! The relay only needs two operations from whatever delivers chats:
//! receive one text command for one identity, and send a text reply back.
//! The front-end is expected to serialize delivery per chat; distinct
//! chats are independent.
//!
//! `StdioFrontEnd` is the bundled implementation for local operation:
//! one inbound command per line as `<chat_id> <text>`, replies written to
//! stdout prefixed with the chat id.

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub chat_id: i64,
    pub text: String,
}

#[async_trait]
pub trait FrontEnd: Send {
    /// Next inbound command, or None once the front-end is closed.
    async fn next(&mut self) -> Result<Option<Inbound>>;

    async fn reply(&mut self, chat_id: i64, text: &str) -> Result<()>;
}

pub struct StdioFrontEnd {
    lines: Lines<BufReader<Stdin>>,
    stdout: Stdout,
}

impl StdioFrontEnd {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            stdout: tokio::io::stdout(),
        }
    }
}

impl Default for StdioFrontEnd {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a raw line into `<chat_id> <text>`; None for blank or malformed
/// input.
pub fn parse_line(line: &str) -> Option<Inbound> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (id_part, text) = trimmed.split_once(char::is_whitespace)?;
    let chat_id = id_part.parse::<i64>().ok()?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(Inbound {
        chat_id,
        text: text.to_string(),
    })
}

#[async_trait]
impl FrontEnd for StdioFrontEnd {
    async fn next(&mut self) -> Result<Option<Inbound>> {
        while let Some(line) = self.lines.next_line().await? {
            match parse_line(&line) {
                Some(inbound) => return Ok(Some(inbound)),
                None => warn!("ignoring malformed input line"),
            }
        }
        Ok(None)
    }

    async fn reply(&mut self, chat_id: i64, text: &str) -> Result<()> {
        let framed = format!("{chat_id} {text}\n");
        self.stdout.write_all(framed.as_bytes()).await?;
        self.stdout.flush().await?;
        Ok(())
    }
}
