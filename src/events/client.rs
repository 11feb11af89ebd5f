// src/events/client.rs

//! Owned, reconnecting feed connection with typed dispatch.
//!
//! The client holds at most one live connection. All socket reads, frame
//! decoding, handler dispatch and the reconnect timer live in a single
//! background task, so there can never be two timers (or two connections)
//! racing each other. Tearing the client down cancels that task.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::ConsoleError;
use crate::events::bus::{EventBus, SubscriptionId};
use crate::events::frame::{DecodeReport, SseFrameDecoder};
use crate::events::kind::{CaesiumEvent, EventFilter, EventKind};
use crate::events::transport::EventTransport;
use crate::types::ByteStream;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// Connection state published to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Never connected.
    Idle,
    Connecting,
    Open,
    /// Connection dropped; waiting for the reconnect delay.
    Reconnecting,
    /// Explicitly disconnected.
    Closed,
}

struct FeedConnection {
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

pub struct EventStreamClient {
    transport: Arc<dyn EventTransport>,
    bus: EventBus,
    reconnect_delay: Duration,
    status_tx: watch::Sender<FeedStatus>,
    connection: Option<FeedConnection>,
}

impl std::fmt::Debug for EventStreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStreamClient")
            .field("reconnect_delay", &self.reconnect_delay)
            .field("status", &*self.status_tx.borrow())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl EventStreamClient {
    pub fn new(transport: Arc<dyn EventTransport>) -> Self {
        Self::with_reconnect_delay(transport, DEFAULT_RECONNECT_DELAY)
    }

    pub fn with_reconnect_delay(transport: Arc<dyn EventTransport>, reconnect_delay: Duration) -> Self {
        let (status_tx, _) = watch::channel(FeedStatus::Idle);
        Self {
            transport,
            bus: EventBus::new(),
            reconnect_delay,
            status_tx,
            connection: None,
        }
    }

    /// Open the feed with `filter`, replacing any existing connection.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&mut self, filter: EventFilter) {
        self.disconnect();

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let feed = FeedLoop {
            transport: Arc::clone(&self.transport),
            bus: self.bus.clone(),
            filter,
            reconnect_delay: self.reconnect_delay,
            status_tx: self.status_tx.clone(),
        };
        let handle = tokio::spawn(feed.run(cancel_rx));

        self.connection = Some(FeedConnection {
            cancel: Some(cancel_tx),
            handle,
        });
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&CaesiumEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(kind, handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Close the connection and cancel any pending reconnect.
    ///
    /// Safe to call repeatedly, and when never connected.
    pub fn disconnect(&mut self) {
        let Some(mut conn) = self.connection.take() else {
            return;
        };
        if let Some(cancel) = conn.cancel.take() {
            let _ = cancel.send(());
        }
        // The loop may be parked inside the transport; abort so teardown
        // does not wait on the network.
        conn.handle.abort();
        self.status_tx.send_replace(FeedStatus::Closed);
        debug!("event feed disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|c| !c.handle.is_finished())
    }

    pub fn status(&self) -> watch::Receiver<FeedStatus> {
        self.status_tx.subscribe()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

impl Drop for EventStreamClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

enum StreamEnd {
    Cancelled,
    Ended,
    Failed(ConsoleError),
}

struct FeedLoop {
    transport: Arc<dyn EventTransport>,
    bus: EventBus,
    filter: EventFilter,
    reconnect_delay: Duration,
    status_tx: watch::Sender<FeedStatus>,
}

impl FeedLoop {
    async fn run(self, mut cancel_rx: oneshot::Receiver<()>) {
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            self.status_tx.send_replace(FeedStatus::Connecting);

            let opened = tokio::select! {
                _ = &mut cancel_rx => break,
                opened = self.transport.open(&self.filter) => opened,
            };

            match opened {
                Ok(stream) => {
                    info!(attempt, "event feed open");
                    self.status_tx.send_replace(FeedStatus::Open);
                    match self.pump(stream, &mut cancel_rx).await {
                        StreamEnd::Cancelled => break,
                        StreamEnd::Ended => info!("event feed closed by server"),
                        StreamEnd::Failed(err) => warn!(error = %err, "event feed dropped"),
                    }
                }
                Err(err) => {
                    warn!(attempt, error = %err, "failed to open event feed");
                }
            }

            self.status_tx.send_replace(FeedStatus::Reconnecting);
            debug!(delay_ms = self.reconnect_delay.as_millis() as u64, "scheduling feed reconnect");
            tokio::select! {
                _ = &mut cancel_rx => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        self.status_tx.send_replace(FeedStatus::Closed);
    }

    async fn pump(&self, mut stream: ByteStream, cancel_rx: &mut oneshot::Receiver<()>) -> StreamEnd {
        let mut decoder = SseFrameDecoder::default();

        loop {
            let next = tokio::select! {
                _ = &mut *cancel_rx => return StreamEnd::Cancelled,
                next = stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => self.deliver(decoder.push_chunk(&chunk)),
                Some(Err(err)) => {
                    self.deliver(decoder.finish());
                    return StreamEnd::Failed(err);
                }
                None => {
                    self.deliver(decoder.finish());
                    return StreamEnd::Ended;
                }
            }
        }
    }

    fn deliver(&self, report: DecodeReport) {
        for err in report.errors {
            warn!(error = %err, "dropping undecodable feed frame");
        }
        for event in report.frames {
            let handled = self.bus.dispatch(&event);
            debug!(
                kind = %event.event_type,
                run_id = event.run_id.as_deref().unwrap_or(""),
                task_id = event.task_id.as_deref().unwrap_or(""),
                handled,
                "feed event"
            );
        }
    }
}
