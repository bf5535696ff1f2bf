//! Incremental demuxer for motion-JPEG camera streams.
//!
//! IP cameras serve video as an endless HTTP body in which every JPEG image is
//! preceded by a small header block announcing its size:
//!
//! ```text
//! --boundary\r\n
//! Content-Type: image/jpeg\r\n
//! Content-Length: 5\r\n
//! \r\n
//! <5 bytes of JPEG><next header...>
//! ```
//!
//! The network delivers this body in chunks whose boundaries have nothing to
//! do with frame boundaries. [`FrameDemuxer`] buffers those chunks, finds each
//! header, waits until the announced number of payload bytes has arrived, and
//! hands every complete frame to its [`FrameSink`] exactly once. Bytes that
//! follow a frame are kept as the start of the next one.
//!
//! # Usage
//!
//! ```
//! use camstream_protocol::{FrameDemuxer, JpegFrame};
//!
//! let mut demuxer = FrameDemuxer::new(Vec::<JpegFrame>::new());
//!
//! // Header split mid-line, payload split mid-body
//! assert!(demuxer.feed(b"Content-Len", 11));
//! assert!(demuxer.feed(b"gth: 5\r\n\r\nhe", 12));
//! assert!(demuxer.sink().is_empty());
//!
//! assert!(demuxer.feed(b"llo", 3));
//! assert_eq!(demuxer.sink()[0].as_bytes(), b"hello");
//! ```
//!
//! # Corruption
//!
//! A header block that ends without a usable `Content-Length` line poisons
//! the whole buffer: everything buffered is dropped and parsing restarts with
//! the next chunk. This is never reported as an error, only logged, since the
//! camera's continued output is the only way to recover.

use bytes::BytesMut;
use camstream_core::constants::{DEFAULT_MAX_FRAME_SIZE, DEFAULT_MAX_HEADER_SIZE};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::frame::JpegFrame;
use crate::header::{HeaderScan, HeaderScanner};
use crate::sink::FrameSink;

/// Initial buffer capacity for incoming stream data.
///
/// Sized for a typical small JPEG so most frames assemble without
/// reallocating.
const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;

/// Limits applied by a [`FrameDemuxer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemuxerConfig {
    /// Largest `Content-Length` accepted. Larger values trigger a resync.
    pub max_frame_size: usize,

    /// Largest header block waited for. Longer headers trigger a resync.
    pub max_header_size: usize,
}

impl Default for DemuxerConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
        }
    }
}

/// Observable state of the demuxer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxerState {
    /// Looking for the `Content-Length` line of the next frame.
    AwaitingHeader,

    /// Header parsed, collecting payload bytes.
    AwaitingPayload,
}

/// Running counters for one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DemuxStats {
    /// Non-empty chunks accepted by `feed`.
    pub chunks_received: u64,

    /// Valid bytes accepted by `feed`.
    pub bytes_received: u64,

    /// Frames handed to the sink.
    pub frames_emitted: u64,

    /// Times the buffer was discarded because of a bad header.
    pub resyncs: u64,

    /// Bytes thrown away by resyncs.
    pub bytes_discarded: u64,
}

/// Why a buffer was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResyncReason {
    MissingContentLength,
    InvalidContentLength,
    FrameTooLarge,
    HeaderTooLarge,
}

/// Header of the frame currently being assembled.
#[derive(Debug, Clone, Copy)]
struct PendingFrame {
    content_length: usize,
    payload_start: usize,
}

impl PendingFrame {
    /// Buffer length needed before the frame can be extracted.
    fn end(&self) -> usize {
        self.payload_start + self.content_length
    }
}

/// Stateful demuxer turning arbitrary chunks into complete JPEG frames.
///
/// One instance serves exactly one stream. All parsing state lives in the
/// value itself, so independent streams simply use independent demuxers.
///
/// # State Machine
///
/// ```text
///                  header found,                 payload
/// ┌──────────────┐ payload short  ┌───────────────┐ complete ┌─────────────┐
/// │AwaitingHeader│───────────────>│AwaitingPayload│─────────>│Frame emitted│
/// └──────────────┘                └───────────────┘          └─────────────┘
///    ^  │ ^                                                         │
///    │  │ └─────────────────────────────────────────────────────────┘
///    │  │ no usable Content-Length (buffer dropped)
///    └──┘
/// ```
///
/// # Concurrency
///
/// `feed` is not reentrant. Callers with several transport threads must
/// serialize deliveries themselves. The sink is invoked synchronously inside
/// `feed` and must not block.
#[derive(Debug)]
pub struct FrameDemuxer<S> {
    /// Leftover bytes plus everything appended since (the stream buffer).
    buffer: BytesMut,

    /// Resumable scanner for the current header.
    scanner: HeaderScanner,

    /// Parsed header while waiting for its payload.
    pending: Option<PendingFrame>,

    /// Sequence number of the next emitted frame.
    next_sequence: u64,

    stats: DemuxStats,

    config: DemuxerConfig,

    /// Consumer of completed frames.
    sink: S,
}

impl<S: FrameSink> FrameDemuxer<S> {
    /// Create a demuxer with default limits.
    ///
    /// # Example
    ///
    /// ```
    /// use camstream_protocol::{DemuxerState, FrameDemuxer, JpegFrame};
    ///
    /// let demuxer = FrameDemuxer::new(|frame: JpegFrame| println!("{frame}"));
    /// assert_eq!(demuxer.state(), DemuxerState::AwaitingHeader);
    /// ```
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, DemuxerConfig::default())
    }

    /// Create a demuxer with custom limits.
    pub fn with_config(sink: S, config: DemuxerConfig) -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            scanner: HeaderScanner::new(),
            pending: None,
            next_sequence: 0,
            stats: DemuxStats::default(),
            config,
            sink,
        }
    }

    /// Deliver the next chunk of the stream.
    ///
    /// Only the first `valid_length` bytes of `chunk` are used, so a reusable
    /// read buffer can be passed as-is together with the byte count of the
    /// last read. Every frame completed by this chunk is handed to the sink
    /// before `feed` returns.
    ///
    /// Returns `false` only for an empty chunk, leaving the demuxer untouched.
    /// Everything else returns `true`, including a discarded corrupt header
    /// and a non-empty chunk with `valid_length == 0` (which changes nothing).
    ///
    /// # Example
    ///
    /// ```
    /// use camstream_protocol::{FrameDemuxer, JpegFrame};
    ///
    /// let mut demuxer = FrameDemuxer::new(Vec::<JpegFrame>::new());
    /// let mut read_buf = [0u8; 64];
    ///
    /// let data = b"Content-Length: 5\r\n\r\nhello";
    /// read_buf[..data.len()].copy_from_slice(data);
    ///
    /// assert!(demuxer.feed(&read_buf, data.len()));
    /// assert_eq!(demuxer.sink().len(), 1);
    ///
    /// assert!(demuxer.feed(&read_buf, 0));
    /// assert!(!demuxer.feed(&[], 0));
    /// ```
    pub fn feed(&mut self, chunk: &[u8], valid_length: usize) -> bool {
        if chunk.is_empty() {
            return false;
        }

        if valid_length > chunk.len() {
            warn!(
                valid_length,
                chunk_len = chunk.len(),
                "Valid length exceeds chunk size, clamping"
            );
        }
        let valid_length = valid_length.min(chunk.len());
        if valid_length == 0 {
            return true;
        }

        self.buffer.extend_from_slice(&chunk[..valid_length]);
        self.stats.chunks_received += 1;
        self.stats.bytes_received += valid_length as u64;

        trace!(
            chunk_len = valid_length,
            buffered = self.buffer.len(),
            state = ?self.state(),
            "Chunk received"
        );

        while self.try_extract_frame() {
            // Keep going while the leftover still holds complete frames
        }

        true
    }

    /// Current state of the parser state machine.
    pub fn state(&self) -> DemuxerState {
        if self.pending.is_some() {
            DemuxerState::AwaitingPayload
        } else {
            DemuxerState::AwaitingHeader
        }
    }

    /// Number of bytes buffered toward the next frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Counters accumulated since creation.
    pub fn stats(&self) -> DemuxStats {
        self.stats
    }

    /// Limits this demuxer was built with.
    pub fn config(&self) -> &DemuxerConfig {
        &self.config
    }

    /// Consumer receiving completed frames.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the consumer, e.g. to drain queued frames.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the demuxer, returning its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Drop all buffered data and wait for a fresh header.
    ///
    /// Counters and frame numbering continue from where they were.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.scanner.reset();
        self.pending = None;
    }

    /// Try to complete one frame from the buffer.
    ///
    /// Returns `true` if a frame was emitted.
    fn try_extract_frame(&mut self) -> bool {
        let pending = match self.pending {
            Some(pending) => pending,
            None => match self.parse_header() {
                Some(pending) => pending,
                None => return false,
            },
        };

        if self.buffer.len() < pending.end() {
            trace!(
                have = self.buffer.len(),
                need = pending.end(),
                "Waiting for payload"
            );
            return false;
        }

        self.emit_frame(pending);
        true
    }

    /// Run the header scanner over the buffer.
    ///
    /// Records and returns the header once found. Resyncs on a bad header and
    /// returns `None` while the header is still incomplete.
    fn parse_header(&mut self) -> Option<PendingFrame> {
        match self.scanner.scan(&self.buffer) {
            HeaderScan::Found {
                content_length,
                payload_start,
            } => {
                if content_length > self.config.max_frame_size {
                    warn!(
                        content_length,
                        max_frame_size = self.config.max_frame_size,
                        "Announced frame exceeds size limit"
                    );
                    self.resync(ResyncReason::FrameTooLarge);
                    return None;
                }

                trace!(content_length, payload_start, "Header parsed");
                let pending = PendingFrame {
                    content_length,
                    payload_start,
                };
                self.pending = Some(pending);
                Some(pending)
            }
            HeaderScan::Terminated => {
                self.resync(ResyncReason::MissingContentLength);
                None
            }
            HeaderScan::Rejected => {
                self.resync(ResyncReason::InvalidContentLength);
                None
            }
            HeaderScan::Incomplete => {
                if self.buffer.len() > self.config.max_header_size {
                    self.resync(ResyncReason::HeaderTooLarge);
                }
                None
            }
        }
    }

    /// Split the finished frame off the buffer and hand it to the sink.
    ///
    /// Bytes after the payload stay in the buffer as the next frame's start.
    fn emit_frame(&mut self, pending: PendingFrame) {
        let mut head = self.buffer.split_to(pending.end());
        let payload = head.split_off(pending.payload_start).freeze();

        self.pending = None;
        self.scanner.reset();

        let frame = JpegFrame::new(self.next_sequence, payload);
        self.next_sequence += 1;
        self.stats.frames_emitted += 1;

        debug!(
            sequence = frame.sequence(),
            size = frame.len(),
            leftover = self.buffer.len(),
            "Frame ready"
        );

        self.sink.frame_ready(frame);
    }

    /// Discard everything buffered after a bad header.
    fn resync(&mut self, reason: ResyncReason) {
        let discarded = self.buffer.len();

        warn!(?reason, discarded, "Discarding stream buffer to resynchronize");

        self.stats.resyncs += 1;
        self.stats.bytes_discarded += discarded as u64;
        self.reset();
    }
}

impl<S: FrameSink + Default> Default for FrameDemuxer<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
