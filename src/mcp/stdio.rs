use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::server::McpServer;

/// Serve newline-delimited frames until EOF, strictly one at a time.
pub async fn serve_lines<R, W>(server: &McpServer, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read frame")? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(response) = server.handle_message(&line).await else {
            continue;
        };
        let mut encoded =
            serde_json::to_string(&response).context("Failed to encode response")?;
        encoded.push('\n');
        writer
            .write_all(encoded.as_bytes())
            .await
            .context("Failed to write response")?;
        writer.flush().await.context("Failed to flush response")?;
    }
    tracing::debug!("stdin closed; stopping stdio server");
    Ok(())
}

/// Run the stdio transport on the process's stdin/stdout.
pub async fn run_stdio(server: &McpServer) -> Result<()> {
    tracing::info!("Toggl MCP server listening on stdio");
    serve_lines(server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}
