//! Inbound line framing
//!
//! Bytes arrive in arbitrary chunks; [`LineFramer`] reassembles them into
//! `\n`-terminated lines and enforces the line length limit.

use crate::constants::protocol::MAX_LINE;

use super::ProtocolError;

/// Reassembles newline-terminated lines from a byte stream
///
/// After an overlong line the framer discards input up to and including the
/// next `\n`, so the tail of a rejected line is never parsed as a command.
#[derive(Debug)]
pub struct LineFramer {
    buf: Vec<u8>,
    max_line: usize,
    discarding: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(MAX_LINE)
    }
}

impl LineFramer {
    #[must_use]
    pub fn new(max_line: usize) -> Self {
        Self {
            buf: Vec::with_capacity(max_line),
            max_line,
            discarding: false,
        }
    }

    /// Append a chunk read from the transport
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes buffered towards an unfinished line
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Next complete line, without its `\n` and any trailing `\r`
    ///
    /// Returns `None` when more input is needed.
    pub fn next_line(&mut self) -> Option<Result<Vec<u8>, ProtocolError>> {
        loop {
            match memchr::memchr(b'\n', &self.buf) {
                Some(pos) => {
                    let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
                    line.pop();
                    if std::mem::take(&mut self.discarding) {
                        continue;
                    }
                    if line.len() > self.max_line {
                        return Some(Err(ProtocolError::LineTooLong {
                            limit: self.max_line,
                        }));
                    }
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    return Some(Ok(line));
                }
                None if self.buf.len() > self.max_line => {
                    self.buf.clear();
                    if self.discarding {
                        return None;
                    }
                    self.discarding = true;
                    return Some(Err(ProtocolError::LineTooLong {
                        limit: self.max_line,
                    }));
                }
                None => {
                    if self.discarding {
                        self.buf.clear();
                    }
                    return None;
                }
            }
        }
    }
}
