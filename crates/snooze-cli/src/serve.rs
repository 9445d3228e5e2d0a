//! `snooze serve`: JSON lines in on stdin, one response line out on stdout.

use std::sync::Arc;

use snooze_core::app::{EventLoop, SchedulingService};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

pub async fn run(
    service: SchedulingService,
    fired: mpsc::UnboundedReceiver<String>,
) -> anyhow::Result<()> {
    let event_loop = EventLoop::spawn(Arc::new(service), fired);
    let client = event_loop.client();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tracing::info!("serving requests on stdin");

    loop {
        let line = tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("interrupt received");
                break;
            }
            line = lines.next_line() => line?,
        };

        // EOF
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = client.call_line(&line).await;
        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    event_loop.shutdown_and_join().await;
    Ok(())
}
