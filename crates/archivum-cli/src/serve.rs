//! JSON-lines host bridge.
//!
//! Reads one [`Command`] per line from stdin and writes one [`Event`] per
//! line to stdout. Lines are submitted to the index worker as they arrive,
//! so a long reindex never stops the reader; events come back in command
//! order. Logging goes to stderr and never mixes with the protocol stream.

use anyhow::{Context, Result};
use archivum_core::config::IndexConfig;
use archivum_core::error::IndexError;
use archivum_core::worker::{decode_command, encode_event, Command, Event, IndexWorker};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Serves the protocol on stdin/stdout until EOF or a shutdown command.
pub async fn run_server(defaults: IndexConfig) -> Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    serve_lines(input, tokio::io::stdout(), defaults).await?;
    Ok(())
}

/// Fills in whatever an Initialize command leaves unset (store location,
/// embedding provider) from the CLI's resolved configuration, so a bare
/// `{"type":"initialize"}` opens the same index the other commands use.
fn resolve_initialize(command: Command, line: &str, defaults: &IndexConfig) -> Command {
    let Command::Initialize { mut config } = command else {
        return command;
    };

    let sent = serde_json::from_str::<Value>(line).unwrap_or(Value::Null);
    let provider_sent = !sent["config"]["provider"].is_null();

    if config.store_path.is_none() {
        config.store_path = defaults.store_path.clone();
    }
    if !provider_sent {
        config.provider = defaults.provider.clone();
    }
    Command::Initialize { config }
}

/// Runs the protocol over arbitrary streams. Returns the output stream once
/// every event has been written.
pub async fn serve_lines<R, W>(input: R, output: W, defaults: IndexConfig) -> Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (handle, join) = IndexWorker::spawn();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<Event>();

    let writer = tokio::spawn(async move {
        let mut output = output;
        while let Some(event) = events_rx.recv().await {
            match encode_event(&event) {
                Ok(line) => {
                    output.write_all(line.as_bytes()).await?;
                    output.write_all(b"\n").await?;
                    output.flush().await?;
                }
                Err(e) => warn!("Dropping event: {}", e),
            }
        }
        Ok::<W, std::io::Error>(output)
    });

    info!("Serving JSON-lines protocol");
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read command")? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match decode_command(&line) {
            Ok(command) => resolve_initialize(command, &line, &defaults),
            Err(e) => {
                debug!("Rejected line: {}", e);
                let _ = events_tx.send(Event::error(&IndexError::from(e), None));
                continue;
            }
        };

        let is_shutdown = matches!(command, Command::Shutdown);
        handle.submit(command, events_tx.clone()).await?;
        if is_shutdown {
            break;
        }
    }

    // EOF: let queued commands finish, then stop. Fails harmlessly if a
    // shutdown command already stopped the worker.
    let _ = handle.shutdown().await;
    drop(events_tx);
    drop(handle);

    join.await.context("Index worker panicked")?;
    let output = writer
        .await
        .context("Event writer panicked")?
        .context("Failed to write event")?;
    info!("Protocol stream closed");
    Ok(output)
}
