//! Byte stream to text line framing
//!
//! Bytes accumulate until `\n` or `\r`; the buffer is then decoded, trimmed
//! and emitted if anything is left. CRLF therefore yields one line, and blank
//! lines yield nothing. Bytes that are not valid UTF-8 are dropped; they never
//! split or merge lines because framing happens on raw bytes.
//!
//! A line longer than [`MAX_LINE_BYTES`] is discarded up to its terminator.

/// Longest line kept, in bytes
pub const MAX_LINE_BYTES: usize = 4096;

/// Incremental line framer
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
    discarding: bool,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(256),
            discarding: false,
        }
    }

    /// Feed bytes, returning every line completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in bytes {
            if b == b'\n' || b == b'\r' {
                if self.discarding {
                    self.discarding = false;
                } else if let Some(line) = self.flush() {
                    lines.push(line);
                }
            } else if !self.discarding {
                if self.buffer.len() >= MAX_LINE_BYTES {
                    tracing::warn!(
                        "Dropping inbound line longer than {} bytes",
                        MAX_LINE_BYTES
                    );
                    self.buffer.clear();
                    self.discarding = true;
                } else {
                    self.buffer.push(b);
                }
            }
        }
        lines
    }

    fn flush(&mut self) -> Option<String> {
        let line = decode_lossy(&self.buffer);
        self.buffer.clear();
        let trimmed = line.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Decode UTF-8, dropping undecodable bytes instead of substituting them
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}
