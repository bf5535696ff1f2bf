//! Tokio codec for motion-JPEG camera streams.
//!
//! This module provides a Tokio-compatible codec that plugs the
//! [`FrameDemuxer`] into `Framed`/`FramedRead` streams.
//!
//! # Overview
//!
//! `MjpegCodec` implements:
//! - [`Decoder`]: turns the body of a camera's MJPEG response into [`JpegFrame`]s
//! - [`Encoder<JpegFrame>`]: writes frames as multipart parts, the way a
//!   camera does (useful for relays and for emulating a camera in tests)
//!
//! ```text
//! TCP body -> Decoder (FrameDemuxer) -> JpegFrame
//! JpegFrame -> Encoder -> --boundary / Content-Type / Content-Length / JPEG
//! ```
//!
//! # Usage with Tokio FramedRead
//!
//! ```rust,no_run
//! use camstream_protocol::MjpegCodec;
//! use futures::StreamExt;
//! use tokio::net::TcpStream;
//! use tokio_util::codec::FramedRead;
//!
//! # async fn example() -> camstream_core::Result<()> {
//! // Body of an MJPEG response, after the HTTP response head
//! let stream = TcpStream::connect("192.168.0.90:80").await?;
//! let mut frames = FramedRead::new(stream, MjpegCodec::new());
//!
//! while let Some(frame) = frames.next().await {
//!     let frame = frame?;
//!     println!("{frame}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Decoding never fails because of stream corruption: bad headers are
//! absorbed by the demuxer's resync. Errors only come from the underlying I/O
//! or from encoding a frame that is empty or above `max_frame_size`.

use bytes::{BufMut, BytesMut};
use camstream_core::constants::{DEFAULT_BOUNDARY, JPEG_CONTENT_TYPE};
use camstream_core::{Error, Result};
use std::collections::VecDeque;
use tokio_util::codec::{Decoder, Encoder};

use crate::demuxer::{DemuxStats, DemuxerConfig, FrameDemuxer};
use crate::frame::JpegFrame;

/// Room reserved for the part header when encoding.
const PART_HEADER_RESERVE: usize = 128;

/// Tokio codec for motion-JPEG streams.
///
/// # Example
///
/// ```
/// use bytes::BytesMut;
/// use camstream_protocol::MjpegCodec;
/// use tokio_util::codec::Decoder;
///
/// let mut codec = MjpegCodec::new();
/// let mut buffer = BytesMut::from(&b"Content-Length: 3\r\n\r\nabc"[..]);
///
/// let frame = codec.decode(&mut buffer).unwrap().unwrap();
/// assert_eq!(frame.as_bytes(), b"abc");
/// ```
#[derive(Debug)]
pub struct MjpegCodec {
    /// Demuxer queueing decoded frames until `decode` hands them out.
    demuxer: FrameDemuxer<VecDeque<JpegFrame>>,

    /// Multipart boundary written before each encoded frame.
    boundary: String,
}

impl MjpegCodec {
    /// Create a codec with default limits and boundary.
    pub fn new() -> Self {
        Self::with_config(DemuxerConfig::default())
    }

    /// Create a codec with custom demuxer limits.
    ///
    /// `max_frame_size` bounds both decoded and encoded frames.
    ///
    /// # Example
    ///
    /// ```
    /// use camstream_protocol::{DemuxerConfig, MjpegCodec};
    ///
    /// let codec = MjpegCodec::with_config(DemuxerConfig {
    ///     max_frame_size: 512 * 1024,
    ///     ..DemuxerConfig::default()
    /// });
    /// assert_eq!(codec.max_frame_size(), 512 * 1024);
    /// ```
    pub fn with_config(config: DemuxerConfig) -> Self {
        Self {
            demuxer: FrameDemuxer::with_config(VecDeque::new(), config),
            boundary: DEFAULT_BOUNDARY.to_string(),
        }
    }

    /// Use `boundary` (without the leading `--`) when encoding.
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Get the current maximum frame size.
    pub fn max_frame_size(&self) -> usize {
        self.demuxer.config().max_frame_size
    }

    /// Counters of the underlying demuxer.
    pub fn stats(&self) -> DemuxStats {
        self.demuxer.stats()
    }
}

impl Default for MjpegCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MjpegCodec {
    type Item = JpegFrame;
    type Error = Error;

    /// Decode the next frame from the byte stream.
    ///
    /// All of `src` is moved into the demuxer; frames completed by it are
    /// queued and returned one per call.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(JpegFrame))` - A complete frame was decoded
    /// - `Ok(None)` - Need more data to complete the frame
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if !src.is_empty() {
            // The demuxer keeps its own copy of incomplete data
            self.demuxer.feed(src, src.len());
            src.clear();
        }

        Ok(self.demuxer.sink_mut().pop_front())
    }
}

impl Encoder<JpegFrame> for MjpegCodec {
    type Error = Error;

    /// Encode a frame as one multipart part.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyFrame`] - the frame has no payload (it could never be
    ///   decoded, since zero lengths are rejected)
    /// - [`Error::FrameTooLarge`] - the frame exceeds `max_frame_size`
    ///
    /// # Example
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use camstream_protocol::{JpegFrame, MjpegCodec};
    /// use tokio_util::codec::Encoder;
    ///
    /// # fn example() -> camstream_core::Result<()> {
    /// let mut codec = MjpegCodec::new().with_boundary("frame");
    /// let mut buffer = BytesMut::new();
    ///
    /// codec.encode(JpegFrame::from_bytes(b"abc"), &mut buffer)?;
    ///
    /// assert_eq!(
    ///     &buffer[..],
    ///     b"--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 3\r\n\r\nabc"
    /// );
    /// # Ok(())
    /// # }
    /// ```
    fn encode(&mut self, item: JpegFrame, dst: &mut BytesMut) -> Result<()> {
        if item.is_empty() {
            return Err(Error::EmptyFrame);
        }

        let max_size = self.max_frame_size();
        if item.len() > max_size {
            return Err(Error::FrameTooLarge {
                size: item.len(),
                max_size,
            });
        }

        let header = format!(
            "--{}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
            self.boundary,
            JPEG_CONTENT_TYPE,
            item.len()
        );

        dst.reserve(PART_HEADER_RESERVE + item.len());
        dst.put_slice(header.as_bytes());
        dst.put_slice(item.as_bytes());

        Ok(())
    }
}
