//! Terminal confirmation prompt.

use async_trait::async_trait;
use tabgrid::bulk::ConfirmPrompt;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Asks on stdout and reads a y/N answer from stdin.
pub struct StdinPrompt;

#[async_trait]
impl ConfirmPrompt for StdinPrompt {
    async fn confirm(&self, message: &str) -> bool {
        let mut stdout = tokio::io::stdout();
        let question = format!("{message} [y/N] ");
        if stdout.write_all(question.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            return false;
        }

        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        match stdin.read_line(&mut line).await {
            Ok(_) => matches!(line.trim(), "y" | "Y" | "yes"),
            Err(e) => {
                log::warn!("failed to read confirmation: {}", e);
                false
            }
        }
    }
}
