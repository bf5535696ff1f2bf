use bytes::Bytes;
use camstream_core::constants::{JPEG_EOI, JPEG_SOI};
use std::fmt;

/// One complete JPEG payload extracted from a camera stream.
///
/// The payload is exactly the `Content-Length` bytes announced by the part
/// header; nothing about its content is validated. Frames are numbered in
/// emission order per demuxer, starting at zero.
///
/// # Example
/// ```
/// use camstream_protocol::JpegFrame;
///
/// let frame = JpegFrame::from_bytes(&[0xFF, 0xD8, 0x00, 0xFF, 0xD9]);
/// assert_eq!(frame.len(), 5);
/// assert!(frame.has_jpeg_markers());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegFrame {
    /// Position of this frame in the stream it came from
    sequence: u64,

    /// Raw JPEG bytes
    data: Bytes,
}

impl JpegFrame {
    /// Create a frame from its sequence number and payload.
    pub fn new(sequence: u64, data: Bytes) -> Self {
        JpegFrame { sequence, data }
    }

    /// Create a frame from a byte slice with sequence number zero.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(0, Bytes::copy_from_slice(bytes))
    }

    /// Get the payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get the payload size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the sequence number assigned by the demuxer
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Consume the frame, returning the payload
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Whether the payload starts with SOI and ends with EOI.
    ///
    /// Informational only. The demuxer never drops a frame because of it.
    pub fn has_jpeg_markers(&self) -> bool {
        self.data.starts_with(&JPEG_SOI) && self.data.ends_with(&JPEG_EOI)
    }
}

impl AsRef<[u8]> for JpegFrame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Bytes> for JpegFrame {
    fn from(data: Bytes) -> Self {
        Self::new(0, data)
    }
}

impl From<Vec<u8>> for JpegFrame {
    fn from(data: Vec<u8>) -> Self {
        Self::new(0, Bytes::from(data))
    }
}

impl fmt::Display for JpegFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame #{} ({} bytes)", self.sequence, self.data.len())
    }
}
