// src/types.rs

//! Small shared aliases used at the IO seams.

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;

use crate::errors::Result;

/// Boxed future returned by the trait seams (`EventTransport`, `LogSource`,
/// `SnapshotSource`) so they stay object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Response body delivered chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;
