//! Network transport for camstream
//!
//! This crate connects to IP cameras over HTTP and feeds the motion-JPEG
//! response body into the demuxer from `camstream-protocol`. It owns the
//! connection, the HTTP handshake, and every I/O timeout.
//!
//! # Components
//!
//! - **CameraUrl**: `http://host[:port]/path` stream locations
//! - **ResponseHead**: the camera's HTTP status line and headers
//! - **CameraClient**: connects, validates the response, and pumps frames
//!
//! # Example
//!
//! ```no_run
//! use camstream_network::{CameraClient, CameraClientConfig, CameraUrl};
//! use camstream_protocol::JpegFrame;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CameraClientConfig {
//!     timeout: Duration::from_millis(3000),
//!     ..CameraClientConfig::new(CameraUrl::parse("http://192.168.0.20:8080/video")?)
//! };
//!
//! let mut client = CameraClient::new(config);
//! client.connect().await?;
//! let stats = client.stream(Vec::<JpegFrame>::new()).await?;
//! println!("{} frames, {} resyncs", stats.frames_emitted, stats.resyncs);
//! # Ok(())
//! # }
//! ```

mod client;
mod response;
mod url;

pub use client::{CameraClient, CameraClientConfig};
pub use response::ResponseHead;
pub use url::CameraUrl;
