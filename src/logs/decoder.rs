// src/logs/decoder.rs

/// Incremental UTF-8 decoder for chunked byte streams.
///
/// A multi-byte sequence split across two chunks is held back until the
/// rest arrives. Bytes that can never form valid UTF-8 become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut input: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    out.push_str(text);
                    input = &[];
                    break;
                }
                Err(err) => {
                    let (valid, rest) = input.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                        // Truncated sequence at the end: wait for more bytes.
                        None => {
                            input = rest;
                            break;
                        }
                    }
                }
            }
        }

        let rest = input.to_vec();
        self.pending = rest;
        out
    }

    /// Flush whatever is still buffered at end of stream.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
