// src/logs/mod.rs

//! Streaming task logs.

pub mod decoder;
pub mod reader;
pub mod sink;

pub use decoder::Utf8StreamDecoder;
pub use reader::{LogResponse, LogSource, LogStreamEnd, LogStreamHandle, LogStreamReader};
pub use sink::{LogSink, TerminalSink};
