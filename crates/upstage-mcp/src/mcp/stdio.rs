//! Stdio transport: newline-delimited JSON-RPC over stdin/stdout.
//!
//! One request per line in, one response per line out, flushed after every
//! write. Stdout carries nothing but protocol messages, so logging must go
//! to stderr. EOF on stdin ends the loop cleanly.

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::error::Result;

use super::dispatcher::Dispatcher;
use super::protocol::{JsonRpcError, JsonRpcResponse};

/// Serve MCP over stdin/stdout until stdin closes.
pub async fn run(dispatcher: &Dispatcher) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    info!("stdio transport ready");

    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(trimmed) {
            Ok(raw) => dispatcher.dispatch_value(raw).await,
            Err(err) => {
                debug!(error = %err, "unparseable request line");
                Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("invalid JSON: {}", err)),
                ))
            }
        };

        if let Some(response) = response {
            let mut payload = serde_json::to_string(&response)?;
            payload.push('\n');
            stdout.write_all(payload.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}
