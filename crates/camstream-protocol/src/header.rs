//! Header scanner for motion-JPEG part headers.
//!
//! Each JPEG part on the wire is preceded by a block of CR-terminated lines.
//! The scanner walks those lines byte by byte looking for the first
//! `Content-Length:` line. It is resumable: when the buffer runs out in the
//! middle of a header, the scanner remembers its position and partial line so
//! the next call continues exactly where the previous one stopped, provided
//! the caller only ever appends to the buffer between calls.
//!
//! # Line Rules
//!
//! - CR (`0x0D`) ends a line.
//! - LF (`0x0A`) is ignored wherever it appears.
//! - A CR that directly follows another CR (LFs in between are ignored) is a
//!   blank line: the header block ended without a `Content-Length` line.
//! - The first line starting with `Content-Length:` (case-sensitive) wins.
//!   Lines before it are discarded.
//!
//! # Example
//!
//! ```
//! use camstream_protocol::{HeaderScan, HeaderScanner};
//!
//! let mut scanner = HeaderScanner::new();
//! let buf = b"--frame\r\nContent-Length: 3\r\n\r\nabc";
//!
//! assert_eq!(
//!     scanner.scan(buf),
//!     HeaderScan::Found { content_length: 3, payload_start: 30 }
//! );
//! assert_eq!(&buf[30..], b"abc");
//! ```

use camstream_core::constants::{CONTENT_LENGTH_PREFIX, CR, HEADER_BODY_SEPARATOR_LEN, LF};

/// Initial capacity of the reusable line buffer.
///
/// Large enough for every header line a camera sends in practice.
const INITIAL_LINE_CAPACITY: usize = 128;

/// Outcome of a header scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderScan {
    /// A usable `Content-Length` line was found.
    Found {
        /// Number of payload bytes announced by the header.
        content_length: usize,
        /// Offset of the first payload byte in the scanned buffer.
        payload_start: usize,
    },

    /// A blank line ended the header block before any `Content-Length` line.
    Terminated,

    /// A `Content-Length` line was found but its value is unparsable, zero or
    /// negative.
    Rejected,

    /// The buffer ran out before the header could be decided.
    Incomplete,
}

/// Resumable, allocation-reusing scanner for a single part header.
#[derive(Debug)]
pub struct HeaderScanner {
    /// Bytes of the line currently being read (without its terminator).
    line: Vec<u8>,

    /// Next buffer offset to examine.
    position: usize,

    /// Whether the last non-LF byte was a CR.
    last_was_cr: bool,
}

impl HeaderScanner {
    pub fn new() -> Self {
        Self {
            line: Vec::with_capacity(INITIAL_LINE_CAPACITY),
            position: 0,
            last_was_cr: false,
        }
    }

    /// Scan `buf` for a part header, resuming from the previous call.
    ///
    /// `buf` must start at the same byte it started at during the previous
    /// call since the last [`reset()`](HeaderScanner::reset); only bytes
    /// appended since then are examined.
    pub fn scan(&mut self, buf: &[u8]) -> HeaderScan {
        while self.position < buf.len() {
            let byte = buf[self.position];
            self.position += 1;

            match byte {
                LF => {}
                CR => {
                    if self.last_was_cr {
                        return HeaderScan::Terminated;
                    }
                    self.last_was_cr = true;

                    if self.line.starts_with(CONTENT_LENGTH_PREFIX) {
                        let value = &self.line[CONTENT_LENGTH_PREFIX.len()..];
                        return match parse_content_length(value) {
                            // position already points one past the CR
                            Some(content_length) => HeaderScan::Found {
                                content_length,
                                payload_start: self.position - 1 + HEADER_BODY_SEPARATOR_LEN,
                            },
                            None => HeaderScan::Rejected,
                        };
                    }

                    self.line.clear();
                }
                other => {
                    self.last_was_cr = false;
                    self.line.push(other);
                }
            }
        }

        HeaderScan::Incomplete
    }

    /// Number of buffer bytes examined so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Forget all progress, keeping the line buffer's allocation.
    pub fn reset(&mut self) {
        self.line.clear();
        self.position = 0;
        self.last_was_cr = false;
    }
}

impl Default for HeaderScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the value of a `Content-Length` line.
///
/// Surrounding whitespace is trimmed. Returns `None` for anything that is not
/// a strictly positive decimal integer.
pub fn parse_content_length(value: &[u8]) -> Option<usize> {
    let text = std::str::from_utf8(value).ok()?.trim();
    let length: i64 = text.parse().ok()?;
    if length <= 0 {
        return None;
    }
    usize::try_from(length).ok()
}
