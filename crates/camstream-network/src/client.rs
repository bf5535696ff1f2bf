//! HTTP client for motion-JPEG camera streams.
//!
//! This module connects to an IP camera, performs the HTTP handshake and then
//! pumps the endless response body into a [`FrameDemuxer`]. The client owns
//! every timeout; the demuxer itself never waits.
//!
//! # Architecture
//!
//! ```text
//! Camera ───(TCP)───> CameraClient ──feed(buf, n)──> FrameDemuxer ──> FrameSink
//!                          │
//!                          └─> ResponseHead (status, boundary)
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use camstream_network::{CameraClient, CameraClientConfig, CameraUrl};
//! use camstream_protocol::JpegFrame;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CameraClientConfig::new(CameraUrl::parse("http://192.168.0.20/video.mjpg")?);
//!
//! let mut client = CameraClient::new(config);
//! client.connect().await?;
//!
//! let stats = client
//!     .stream(|frame: JpegFrame| println!("{frame}"))
//!     .await?;
//! println!("{} frames", stats.frames_emitted);
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! - **No automatic reconnect**: the caller decides what to do after EOF or an error
//! - **No chunked bodies**: cameras stream with neither length nor chunking
//! - **One connection per client**: `stream` consumes the connection

use bytes::{Buf, BytesMut};
use camstream_core::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_IO_TIMEOUT_MS, MAX_RESPONSE_HEAD_SIZE,
};
use camstream_core::{Error, Result};
use camstream_protocol::{DemuxStats, DemuxerConfig, FrameDemuxer, FrameSink, MjpegCodec};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, trace, warn};

use crate::response::ResponseHead;
use crate::url::CameraUrl;

/// Configuration for a camera connection.
///
/// # Example
///
/// ```
/// use camstream_network::{CameraClientConfig, CameraUrl};
/// use std::time::Duration;
///
/// let config = CameraClientConfig {
///     timeout: Duration::from_millis(2000),
///     ..CameraClientConfig::new(CameraUrl::parse("http://cam.local/stream").unwrap())
/// };
/// assert_eq!(config.chunk_size, 4096);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraClientConfig {
    /// Stream location
    pub url: CameraUrl,

    /// Timeout for connecting and for each individual read
    #[serde(with = "duration_ms")]
    pub timeout: Duration,

    /// Size of the read buffer handed to the demuxer
    pub chunk_size: usize,

    /// Limits for the demuxer built by `stream`
    #[serde(default)]
    pub demuxer: DemuxerConfig,
}

impl CameraClientConfig {
    /// Default timeouts and buffer sizes for `url`.
    pub fn new(url: CameraUrl) -> Self {
        Self {
            url,
            timeout: Duration::from_millis(DEFAULT_IO_TIMEOUT_MS),
            chunk_size: DEFAULT_CHUNK_SIZE,
            demuxer: DemuxerConfig::default(),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Client for a single camera stream.
///
/// # Connection Lifecycle
///
/// 1. Create client with `new()`
/// 2. Perform the HTTP handshake with `connect()`
/// 3. Pump the body with `stream()` (or take it as a frame stream with
///    `into_frames()`)
pub struct CameraClient {
    config: CameraClientConfig,

    /// Open connection (None before `connect` and after `stream`)
    connection: Option<TcpStream>,

    /// Response head of the current connection
    head: Option<ResponseHead>,

    /// Body bytes that arrived together with the response head
    early_body: BytesMut,
}

impl CameraClient {
    /// Create an unconnected client.
    pub fn new(config: CameraClientConfig) -> Self {
        debug!("Creating camera client for {}", config.url);

        Self {
            config,
            connection: None,
            head: None,
            early_body: BytesMut::new(),
        }
    }

    pub fn config(&self) -> &CameraClientConfig {
        &self.config
    }

    /// Response head of the current connection, once connected.
    pub fn response_head(&self) -> Option<&ResponseHead> {
        self.head.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Connect to the camera and request the stream.
    ///
    /// Opens TCP with timeout and TCP_NODELAY, sends the `GET`, and reads the
    /// response head. Any body bytes read along with the head are kept and
    /// delivered first by `stream`.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] - TCP connect did not finish in time
    /// - [`Error::ReadTimeout`] - the camera did not answer in time
    /// - [`Error::ConnectionClosed`] - the camera hung up before the head ended
    /// - [`Error::MalformedResponse`] - the head is unparsable or exceeds 8 KB
    /// - [`Error::HttpStatus`] - the status is not 2xx
    /// - [`Error::UnsupportedTransferEncoding`] - the body is chunked
    pub async fn connect(&mut self) -> Result<&ResponseHead> {
        let url = &self.config.url;
        let timeout_ms = self.timeout_ms();
        info!("Connecting to camera at {}", url);

        let mut stream =
            match tokio::time::timeout(self.config.timeout, TcpStream::connect(url.socket_addr()))
                .await
            {
                Ok(Ok(stream)) => {
                    info!("Connected to {}", url.socket_addr());
                    stream
                }
                Ok(Err(e)) => {
                    error!("Connection failed: {}", e);
                    return Err(e.into());
                }
                Err(_) => {
                    warn!("Connection timeout after {}ms", timeout_ms);
                    return Err(Error::ConnectionTimeout(timeout_ms));
                }
            };

        // Frames are latency sensitive and the request is a single write
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let request = format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: keep-alive\r\n\r\n",
            url.path(),
            url.host_header()
        );
        trace!(request = %request.trim_end(), "Sending stream request");

        match tokio::time::timeout(self.config.timeout, stream.write_all(request.as_bytes())).await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!("Request write timeout after {}ms", timeout_ms);
                return Err(Error::ConnectionTimeout(timeout_ms));
            }
        }

        let (head, early_body) = self.read_head(&mut stream).await?;
        head.ensure_streamable()?;

        info!(
            status = head.status,
            content_type = head.header("Content-Type").unwrap_or("-"),
            boundary = head.boundary().unwrap_or("-"),
            early_body = early_body.len(),
            "Camera accepted stream request"
        );

        self.early_body = early_body;
        self.connection = Some(stream);
        Ok(self.head.insert(head))
    }

    /// Read until the blank line ending the response head.
    async fn read_head(&self, stream: &mut TcpStream) -> Result<(ResponseHead, BytesMut)> {
        let mut buf = BytesMut::with_capacity(1024);

        loop {
            if let Some((head, len)) = ResponseHead::try_parse(&buf)? {
                // Everything after the head is stream body
                buf.advance(len);
                debug!(status = head.status, headers = head.headers.len(), "Response head parsed");
                return Ok((head, buf));
            }

            if buf.len() >= MAX_RESPONSE_HEAD_SIZE {
                warn!(size = buf.len(), "Response head too large");
                return Err(Error::MalformedResponse(format!(
                    "response head exceeds {MAX_RESPONSE_HEAD_SIZE} bytes"
                )));
            }

            let n = self.read_with_timeout(stream, &mut buf).await?;
            if n == 0 {
                warn!("Camera closed connection during response head");
                return Err(Error::ConnectionClosed);
            }
        }
    }

    async fn read_with_timeout(&self, stream: &mut TcpStream, buf: &mut BytesMut) -> Result<usize> {
        match tokio::time::timeout(self.config.timeout, stream.read_buf(buf)).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!("Read timeout after {}ms", self.timeout_ms());
                Err(Error::ReadTimeout(self.timeout_ms()))
            }
        }
    }

    /// Pump the stream body into a new demuxer until the camera hangs up.
    ///
    /// Each read fills a fixed `chunk_size` buffer which is handed to
    /// [`FrameDemuxer::feed`] together with the number of bytes read. The
    /// connection is consumed whether this returns `Ok` or `Err`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] - `connect` was not called
    /// - [`Error::ReadTimeout`] - a read did not complete in time
    /// - [`Error::Io`] - the connection failed
    pub async fn stream<S: FrameSink>(&mut self, sink: S) -> Result<DemuxStats> {
        let mut stream = self.connection.take().ok_or(Error::NotConnected)?;
        let mut demuxer = FrameDemuxer::with_config(sink, self.config.demuxer);

        if !self.early_body.is_empty() {
            let early = self.early_body.split();
            demuxer.feed(&early, early.len());
        }

        let mut buf = vec![0u8; self.config.chunk_size.max(1)];
        loop {
            let n = match tokio::time::timeout(self.config.timeout, stream.read(&mut buf)).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(
                        frames = demuxer.stats().frames_emitted,
                        "Read timeout after {}ms",
                        self.timeout_ms()
                    );
                    return Err(Error::ReadTimeout(self.timeout_ms()));
                }
            };

            if n == 0 {
                break;
            }

            // The whole buffer goes in; only the first n bytes are valid
            demuxer.feed(&buf, n);
        }

        let stats = demuxer.stats();
        info!(
            frames = stats.frames_emitted,
            bytes = stats.bytes_received,
            resyncs = stats.resyncs,
            "Camera closed the stream"
        );
        Ok(stats)
    }

    /// Hand the connection over as a stream of frames.
    ///
    /// Early body bytes are pre-loaded into the reader, so no data is lost.
    /// Unlike `stream`, no per-read timeout is applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if `connect` was not called.
    pub fn into_frames(mut self) -> Result<FramedRead<TcpStream, MjpegCodec>> {
        let stream = self.connection.take().ok_or(Error::NotConnected)?;
        let mut framed = FramedRead::new(stream, MjpegCodec::with_config(self.config.demuxer));
        framed.read_buffer_mut().unsplit(self.early_body.split());
        Ok(framed)
    }

    fn timeout_ms(&self) -> u64 {
        self.config.timeout.as_millis() as u64
    }
}

impl Drop for CameraClient {
    fn drop(&mut self) {
        if self.connection.is_some() {
            debug!("CameraClient dropped while connected - connection will be closed");
        }
    }
}
