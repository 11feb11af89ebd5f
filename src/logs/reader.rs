// src/logs/reader.rs

//! Cancellable streamed reader for task logs.
//!
//! A reader owns at most one transfer at a time. Opening a new one cancels
//! the previous transfer first, so a surface never shows two interleaved
//! logs. Cancellation is silent; every other failure produces exactly one
//! diagnostic line on the sink.

use std::sync::Arc;

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::logs::decoder::Utf8StreamDecoder;
use crate::logs::sink::LogSink;
use crate::types::{BoxFuture, ByteStream};

/// Answer to a log request.
pub enum LogResponse {
    Stream(ByteStream),
    /// The server answered with a non-success status.
    Rejected { status: u16, body: String },
}

impl std::fmt::Debug for LogResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogResponse::Stream(_) => f.write_str("Stream(..)"),
            LogResponse::Rejected { status, body } => f
                .debug_struct("Rejected")
                .field("status", status)
                .field("body", body)
                .finish(),
        }
    }
}

pub trait LogSource: Send + Sync {
    fn open_logs<'a>(
        &'a self,
        job_id: &'a str,
        run_id: &'a str,
        task_id: &'a str,
    ) -> BoxFuture<'a, Result<LogResponse>>;
}

/// How a transfer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogStreamEnd {
    Completed,
    Cancelled,
    Rejected { status: u16 },
    Failed(String),
}

#[derive(Debug, Clone, Default)]
struct CancelSlot(Arc<Mutex<Option<oneshot::Sender<()>>>>);

impl CancelSlot {
    fn arm() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self(Arc::new(Mutex::new(Some(tx)))), rx)
    }

    /// Returns `false` when already cancelled.
    fn cancel(&self) -> bool {
        match self.0.lock().take() {
            Some(tx) => {
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }
}

/// Handle to one transfer. Dropping it cancels the transfer.
#[derive(Debug)]
pub struct LogStreamHandle {
    slot: CancelSlot,
    handle: Option<JoinHandle<LogStreamEnd>>,
}

impl LogStreamHandle {
    /// Abort the transfer. Idempotent; nothing is written to the sink.
    pub fn cancel(&self) {
        if self.slot.cancel() {
            debug!("log stream cancelled");
        }
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the transfer to end.
    pub async fn wait(mut self) -> LogStreamEnd {
        match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(end) => end,
                Err(err) if err.is_cancelled() => LogStreamEnd::Cancelled,
                Err(err) => LogStreamEnd::Failed(err.to_string()),
            },
            None => LogStreamEnd::Cancelled,
        }
    }
}

impl Drop for LogStreamHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct LogStreamReader {
    source: Arc<dyn LogSource>,
    current: Option<(CancelSlot, AbortHandle)>,
}

impl LogStreamReader {
    pub fn new(source: Arc<dyn LogSource>) -> Self {
        Self {
            source,
            current: None,
        }
    }

    /// Start streaming one task's logs into `sink`, cancelling any transfer
    /// this reader started before.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open<S>(&mut self, job_id: &str, run_id: &str, task_id: &str, sink: S) -> LogStreamHandle
    where
        S: LogSink + 'static,
    {
        self.cancel();

        let (slot, cancel_rx) = CancelSlot::arm();
        let transfer = Transfer {
            source: Arc::clone(&self.source),
            job_id: job_id.to_string(),
            run_id: run_id.to_string(),
            task_id: task_id.to_string(),
        };
        let handle = tokio::spawn(transfer.run(Box::new(sink), cancel_rx));
        self.current = Some((slot.clone(), handle.abort_handle()));

        LogStreamHandle {
            slot,
            handle: Some(handle),
        }
    }

    /// Cancel the current transfer, if any.
    pub fn cancel(&mut self) {
        if let Some((slot, abort)) = self.current.take() {
            slot.cancel();
            // The task may be parked inside the source; abort it as well.
            abort.abort();
        }
    }
}

impl Drop for LogStreamReader {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct Transfer {
    source: Arc<dyn LogSource>,
    job_id: String,
    run_id: String,
    task_id: String,
}

impl Transfer {
    async fn run(self, mut sink: Box<dyn LogSink>, mut cancel_rx: oneshot::Receiver<()>) -> LogStreamEnd {
        let opened = tokio::select! {
            biased;
            _ = &mut cancel_rx => return LogStreamEnd::Cancelled,
            opened = self.source.open_logs(&self.job_id, &self.run_id, &self.task_id) => opened,
        };
        if is_cancelled(&mut cancel_rx) {
            return LogStreamEnd::Cancelled;
        }

        let stream = match opened {
            Ok(LogResponse::Stream(stream)) => stream,
            Ok(LogResponse::Rejected { status, body }) => {
                warn!(task_id = %self.task_id, status, "log request rejected");
                let body = if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.trim_end().to_string()
                };
                if is_cancelled(&mut cancel_rx) {
                    return LogStreamEnd::Cancelled;
                }
                sink.diagnostic(&format!("Error: {body}"));
                return LogStreamEnd::Rejected { status };
            }
            Err(err) => {
                warn!(task_id = %self.task_id, error = %err, "log request failed");
                if is_cancelled(&mut cancel_rx) {
                    return LogStreamEnd::Cancelled;
                }
                sink.diagnostic(&format!("Connection error: {}", err.detail()));
                return LogStreamEnd::Failed(err.detail());
            }
        };

        info!(
            job_id = %self.job_id,
            run_id = %self.run_id,
            task_id = %self.task_id,
            "streaming task logs"
        );
        self.pump(stream, sink.as_mut(), &mut cancel_rx).await
    }

    async fn pump(
        &self,
        mut stream: ByteStream,
        sink: &mut dyn LogSink,
        cancel_rx: &mut oneshot::Receiver<()>,
    ) -> LogStreamEnd {
        let mut decoder = Utf8StreamDecoder::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = &mut *cancel_rx => return LogStreamEnd::Cancelled,
                next = stream.next() => next,
            };

            if is_cancelled(cancel_rx) {
                return LogStreamEnd::Cancelled;
            }
            match next {
                Some(Ok(chunk)) => {
                    let text = decoder.decode(&chunk);
                    if !text.is_empty() {
                        sink.write(&text);
                    }
                }
                Some(Err(err)) => {
                    let tail = decoder.finish();
                    if !tail.is_empty() {
                        sink.write(&tail);
                    }
                    warn!(task_id = %self.task_id, error = %err, "log stream interrupted");
                    sink.diagnostic(&format!("Connection error: {}", err.detail()));
                    return LogStreamEnd::Failed(err.detail());
                }
                None => {
                    let tail = decoder.finish();
                    if !tail.is_empty() {
                        sink.write(&tail);
                    }
                    debug!(task_id = %self.task_id, "log stream complete");
                    return LogStreamEnd::Completed;
                }
            }
        }
    }
}

/// A dropped sender counts as cancellation too.
fn is_cancelled(cancel_rx: &mut oneshot::Receiver<()>) -> bool {
    !matches!(cancel_rx.try_recv(), Err(TryRecvError::Empty))
}
