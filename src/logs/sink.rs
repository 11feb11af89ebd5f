// src/logs/sink.rs

use std::io::{self, Write};

const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Destination of streamed log text.
pub trait LogSink: Send {
    /// Log text exactly as received (already UTF-8 decoded).
    fn write(&mut self, text: &str);

    /// One diagnostic line (`Error: ...`, `Connection error: ...`).
    fn diagnostic(&mut self, line: &str);
}

/// Writes log text to stdout and diagnostics in red.
#[derive(Debug, Default)]
pub struct TerminalSink {
    color: bool,
}

impl TerminalSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl LogSink for TerminalSink {
    fn write(&mut self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn diagnostic(&mut self, line: &str) {
        let mut out = io::stdout().lock();
        let _ = if self.color {
            writeln!(out, "{RED}{line}{RESET}")
        } else {
            writeln!(out, "{line}")
        };
        let _ = out.flush();
    }
}
