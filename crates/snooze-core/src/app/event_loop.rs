//! EventLoop - 単一コンシューマのイベントループ
//!
//! 起動時に回収スイープを 1 回走らせ、その後はアラームの発火とリクエストを
//! 1 つずつ処理する。ハンドラは途中で割り込まれない。
//!
//! # 設計原則
//! - shutdown は watch チャネルで伝える（処理中のハンドラは最後まで走る）
//! - 発火とリクエストが同時に来たら発火を先に処理する
//! - リクエストの応答は oneshot で返す

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::protocol::{self, Request, Response};
use super::service::{SchedulingService, WakeOutcome};

const REQUEST_BUFFER: usize = 64;

struct Call {
    request: Request,
    reply: oneshot::Sender<Response>,
}

/// Event loop handle.
/// - `request_shutdown()` で新しいイベントの受付を止める
/// - `shutdown_and_join()` で終了を待てる
pub struct EventLoop {
    shutdown_tx: watch::Sender<bool>,
    requests: mpsc::Sender<Call>,
    join: JoinHandle<()>,
}

impl EventLoop {
    /// Spawn the loop. `alarms` receives the names of fired alarms.
    pub fn spawn(
        service: Arc<SchedulingService>,
        alarms: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (requests, requests_rx) = mpsc::channel(REQUEST_BUFFER);

        let join = tokio::spawn(async move {
            run(service, alarms, requests_rx, shutdown_rx).await;
        });

        Self {
            shutdown_tx,
            requests,
            join,
        }
    }

    pub fn client(&self) -> LoopClient {
        LoopClient {
            requests: self.requests.clone(),
        }
    }

    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        if let Err(err) = self.join.await {
            tracing::error!(error = %err, "event loop task failed");
        }
    }
}

/// Cheap, cloneable sender of requests into the loop.
#[derive(Clone)]
pub struct LoopClient {
    requests: mpsc::Sender<Call>,
}

impl LoopClient {
    pub async fn call(&self, request: Request) -> Response {
        let (reply, response) = oneshot::channel();
        if self.requests.send(Call { request, reply }).await.is_err() {
            return Response::failure("event loop stopped");
        }
        response
            .await
            .unwrap_or_else(|_| Response::failure("event loop stopped"))
    }

    /// Parse one JSON line and run it through the loop.
    pub async fn call_line(&self, line: &str) -> Response {
        match Request::parse(line) {
            Ok(request) => self.call(request).await,
            Err(response) => response,
        }
    }
}

async fn run(
    service: Arc<SchedulingService>,
    mut alarms: mpsc::UnboundedReceiver<String>,
    mut requests: mpsc::Receiver<Call>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    match service.recover().await {
        Ok(report) => tracing::info!(
            restored = report.restored.len(),
            rearmed = report.rearmed.len(),
            failed = report.failures.len(),
            "recovery sweep finished"
        ),
        // alarms still fire for anything armed later; the next start retries
        Err(err) => tracing::error!(error = %err, "recovery sweep could not read the store"),
    }

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            Some(name) = alarms.recv() => on_alarm(&service, &name).await,
            Some(call) = requests.recv() => {
                let response = protocol::dispatch(&service, call.request).await;
                // ignore send error: the caller stopped waiting
                let _ = call.reply.send(response);
            }
            else => break,
        }
    }

    tracing::info!("event loop stopped");
}

async fn on_alarm(service: &SchedulingService, name: &str) {
    match service.on_alarm(name).await {
        Ok(WakeOutcome::Restored(tab)) => tracing::debug!(alarm = name, %tab, "alarm handled"),
        Ok(WakeOutcome::AlreadyHandled | WakeOutcome::Stale) => {}
        Ok(WakeOutcome::RestoreFailed(err)) => {
            tracing::warn!(alarm = name, error = %err, "restore failed")
        }
        Err(err) => tracing::error!(alarm = name, error = %err, "wake failed"),
    }
}
