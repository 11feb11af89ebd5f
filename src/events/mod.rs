// src/events/mod.rs

//! Live event feed.
//!
//! - [`kind`]: event vocabulary, the decoded event and the server-side filter.
//! - [`frame`]: incremental `text/event-stream` decoder.
//! - [`bus`]: handler registry keyed by event kind.
//! - [`transport`]: trait for opening the raw byte stream.
//! - [`client`]: the owned, reconnecting connection.

pub mod bus;
pub mod client;
pub mod frame;
pub mod kind;
pub mod transport;

pub use bus::{EventBus, EventHandler, SubscriptionId};
pub use client::{DEFAULT_RECONNECT_DELAY, EventStreamClient, FeedStatus};
pub use frame::{DecodeReport, FrameError, SseFrameDecoder};
pub use kind::{CaesiumEvent, EventFilter, EventKind};
pub use transport::EventTransport;
