// src/events/transport.rs

//! Pluggable source of raw feed bytes.
//!
//! Production code uses [`crate::api::ApiClient`], which opens
//! `GET /v1/events`. Tests provide scripted transports that hand back canned
//! chunks or errors per connection attempt.

use std::sync::Arc;

use crate::errors::Result;
use crate::events::kind::EventFilter;
use crate::types::{BoxFuture, ByteStream};

pub trait EventTransport: Send + Sync {
    /// Open one feed connection for the given filter.
    ///
    /// An `Err` means the connection could not be established (including a
    /// non-2xx answer). Once open, the stream ends or yields an `Err` when
    /// the connection drops.
    fn open<'a>(&'a self, filter: &'a EventFilter) -> BoxFuture<'a, Result<ByteStream>>;
}

impl<T: EventTransport + ?Sized> EventTransport for Arc<T> {
    fn open<'a>(&'a self, filter: &'a EventFilter) -> BoxFuture<'a, Result<ByteStream>> {
        (**self).open(filter)
    }
}
