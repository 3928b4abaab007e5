//! Host side of the extension: reads events line by line and writes replies.

use crate::app::Extension;
use crate::host::HostEvent;
use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, warn};

/// Serves events until the input closes. Each event is handled to completion
/// before the next line is read.
pub async fn serve<R, W>(ext: &mut Extension, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match HostEvent::parse(line) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "skipping malformed event");
                continue;
            }
        };
        debug!(kind = ?event.kind(), "event received");

        match ext.dispatch(&event).await {
            Ok(Some(action)) => {
                let mut frame = action.to_line()?;
                frame.push('\n');
                output.write_all(frame.as_bytes()).await?;
                output.flush().await?;
            }
            Ok(None) => {}
            Err(err) => error!(kind = ?event.kind(), "event handler failed: {err:#}"),
        }
    }

    debug!(keyword = ext.keyword(), "host closed the event stream");
    Ok(())
}
