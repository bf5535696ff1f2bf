//! Core constants for the motion-JPEG stream implementation.
//!
//! This module defines the wire-level constants of a camera's multipart JPEG
//! stream together with the default resource limits applied by the demuxer
//! and the camera client.
//!
//! # Stream Structure
//!
//! Every frame on the wire is a small header block followed by the JPEG bytes:
//!
//! ```text
//! --boundary\r\n
//! Content-Type: image/jpeg\r\n
//! Content-Length: 18352\r\n
//! \r\n
//! <18352 bytes of JPEG data><next frame's header>
//! ```
//!
//! Only CR (`0x0D`) separates header lines. LF (`0x0A`) is ignored wherever it
//! appears, so cameras that emit bare `\r` line endings are handled the same
//! way as cameras that emit `\r\n`.
//!
//! # Usage
//!
//! ```
//! use camstream_core::constants::*;
//!
//! assert_eq!(CONTENT_LENGTH_PREFIX, b"Content-Length:");
//! assert_eq!(HEADER_BODY_SEPARATOR_LEN, 4);
//! ```

// ============================================================================
// Header Line Markers
// ============================================================================

/// Carriage return. The only byte that terminates a header line.
pub const CR: u8 = 0x0D;

/// Line feed. Ignored by the header scanner.
pub const LF: u8 = 0x0A;

/// Case-sensitive prefix of the header line carrying the payload length.
///
/// # Examples
///
/// ```
/// use camstream_core::constants::CONTENT_LENGTH_PREFIX;
///
/// let line = b"Content-Length: 5120";
/// assert!(line.starts_with(CONTENT_LENGTH_PREFIX));
/// ```
pub const CONTENT_LENGTH_PREFIX: &[u8] = b"Content-Length:";

/// Offset from the CR ending the `Content-Length` line to the first payload
/// byte, covering the `\r\n\r\n` that closes the header block.
///
/// The separator bytes are skipped by offset and never inspected.
pub const HEADER_BODY_SEPARATOR_LEN: usize = 4;

// ============================================================================
// JPEG Markers
// ============================================================================

/// JPEG start-of-image marker.
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// JPEG end-of-image marker.
pub const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// MIME type written by the encoder for each part.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Multipart boundary written by the encoder when none is configured.
pub const DEFAULT_BOUNDARY: &str = "camstreamboundary";

// ============================================================================
// Resource Limits
// ============================================================================

/// Largest `Content-Length` the demuxer accepts (4 MB).
///
/// A larger value is treated the same as an unparsable header.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Largest header block the demuxer waits for before resynchronizing (16 KB).
pub const DEFAULT_MAX_HEADER_SIZE: usize = 16 * 1024;

/// Largest HTTP response head the camera client reads (8 KB).
pub const MAX_RESPONSE_HEAD_SIZE: usize = 8 * 1024;

// ============================================================================
// Transport Defaults
// ============================================================================

/// Size of the read buffer handed to the demuxer on each delivery.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Timeout for connect and each read, in milliseconds.
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 5000;

/// Port used when the camera URL does not name one.
pub const DEFAULT_HTTP_PORT: u16 = 80;
