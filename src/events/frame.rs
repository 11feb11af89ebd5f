// src/events/frame.rs

//! Incremental decoder for the `text/event-stream` wire format.
//!
//! ```text
//! : ping
//!
//! event: task_started
//! data: {"type":"task_started","run_id":"...","task_id":"..."}
//!
//! ```
//!
//! Bytes arrive in arbitrary chunks; the decoder buffers partial lines and
//! emits one [`CaesiumEvent`] per blank-line-terminated frame.

use thiserror::Error;

use crate::events::kind::CaesiumEvent;

pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame exceeds max size: {size} > {max}")]
    OversizedFrame { size: usize, max: usize },
    #[error("buffer exceeds max size without delimiter: {size} > {max}")]
    OversizedBuffer { size: usize, max: usize },
    #[error("frame decode failed: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Default)]
pub struct DecodeReport {
    pub frames: Vec<CaesiumEvent>,
    pub errors: Vec<FrameError>,
}

impl DecodeReport {
    fn push_frame(&mut self, frame: CaesiumEvent) {
        self.frames.push(frame);
    }

    fn push_error(&mut self, error: FrameError) {
        self.errors.push(error);
    }

    fn extend(&mut self, other: DecodeReport) {
        self.frames.extend(other.frames);
        self.errors.extend(other.errors);
    }
}

#[derive(Debug)]
pub struct SseFrameDecoder {
    max_frame_bytes: usize,
    pending: Vec<u8>,
    label: Option<String>,
    data: Vec<String>,
    data_bytes: usize,
    /// Set after an oversized frame; lines are dropped until the next blank line.
    skipping: bool,
}

impl SseFrameDecoder {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes,
            pending: Vec::new(),
            label: None,
            data: Vec::new(),
            data_bytes: 0,
            skipping: false,
        }
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) -> DecodeReport {
        let mut report = DecodeReport::default();
        if !chunk.is_empty() {
            self.pending.extend_from_slice(chunk);
        }

        while let Some(newline_idx) = self.pending.iter().position(|byte| *byte == b'\n') {
            let mut line = self.pending.drain(..=newline_idx).collect::<Vec<u8>>();
            line.pop();
            if line.ends_with(b"\r") {
                line.pop();
            }
            self.handle_line(&line, &mut report);
        }

        if self.pending.len() > self.max_frame_bytes {
            report.push_error(FrameError::OversizedBuffer {
                size: self.pending.len(),
                max: self.max_frame_bytes,
            });
            self.pending.clear();
            self.reset_frame();
            self.skipping = true;
        }

        report
    }

    /// Flush at end of stream.
    ///
    /// A trailing line without newline is processed, and a frame that was
    /// never terminated by a blank line is still dispatched.
    pub fn finish(&mut self) -> DecodeReport {
        let mut report = DecodeReport::default();
        if !self.pending.is_empty() {
            let mut line = std::mem::take(&mut self.pending);
            if line.ends_with(b"\r") {
                line.pop();
            }
            self.handle_line(&line, &mut report);
        }
        let mut tail = DecodeReport::default();
        self.dispatch(&mut tail);
        report.extend(tail);
        self.skipping = false;
        report
    }

    fn handle_line(&mut self, line: &[u8], report: &mut DecodeReport) {
        if line.is_empty() {
            if self.skipping {
                self.skipping = false;
                self.reset_frame();
            } else {
                self.dispatch(report);
            }
            return;
        }
        if self.skipping || line.starts_with(b":") {
            return;
        }

        let text = String::from_utf8_lossy(line);
        let (field, value) = match text.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (text.as_ref(), ""),
        };

        match field {
            "event" => self.label = Some(value.trim().to_string()),
            "data" => {
                // Joined size, counting one newline per line already held.
                let size = self.data_bytes + value.len() + self.data.len();
                if size > self.max_frame_bytes {
                    report.push_error(FrameError::OversizedFrame {
                        size,
                        max: self.max_frame_bytes,
                    });
                    self.reset_frame();
                    self.skipping = true;
                    return;
                }
                self.data_bytes += value.len();
                self.data.push(value.to_string());
            }
            // `id` and `retry` are not used by this feed.
            _ => {}
        }
    }

    fn dispatch(&mut self, report: &mut DecodeReport) {
        if self.data.is_empty() {
            self.reset_frame();
            return;
        }

        let body = self.data.join("\n");
        let label = self.label.take();
        match serde_json::from_str::<CaesiumEvent>(&body) {
            Ok(mut event) => {
                if event.event_type.trim().is_empty() {
                    if let Some(label) = label.filter(|l| !l.is_empty()) {
                        event.event_type = label;
                    }
                }
                report.push_frame(event);
            }
            Err(err) => report.push_error(FrameError::Decode(err.to_string())),
        }
        self.reset_frame();
    }

    fn reset_frame(&mut self) {
        self.label = None;
        self.data.clear();
        self.data_bytes = 0;
    }
}

impl Default for SseFrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}
