//! Common test utilities for integration tests.
//!
//! Helpers here build camera-style MJPEG byte streams and run them through a
//! demuxer in arbitrary chunkings.
//!
//! # Helpers
//!
//! 1. **Stream builders** (`camera_part`, `camera_stream`, `fake_jpeg`) - produce
//!    wire bytes the way an IP camera sends them
//! 2. **Feeders** (`demux_in_chunks`, `demux_at_splits`) - push those bytes into
//!    a fresh demuxer and collect the emitted payloads
//!
//! ```ignore
//! use crate::common;
//!
//! let stream = common::camera_stream(&[b"one", b"two"]);
//! let frames = common::demux_in_chunks(&stream, 3);
//! assert_eq!(frames, vec![b"one".to_vec(), b"two".to_vec()]);
//! ```

#![allow(dead_code)]

use camstream_protocol::{FrameDemuxer, JpegFrame};

/// Boundary used by the test camera.
pub const TEST_BOUNDARY: &str = "myboundary";

/// Build a payload that looks like a JPEG (SOI, filler, EOI).
pub fn fake_jpeg(filler: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    out.extend_from_slice(filler);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// Build one multipart part carrying `payload`.
pub fn camera_part(payload: &[u8]) -> Vec<u8> {
    let mut part = format!(
        "--{TEST_BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        payload.len()
    )
    .into_bytes();
    part.extend_from_slice(payload);
    part
}

/// Concatenate one part per payload.
pub fn camera_stream(payloads: &[&[u8]]) -> Vec<u8> {
    payloads.iter().flat_map(|p| camera_part(p)).collect()
}

/// Feed `data` in chunks of at most `chunk_size` bytes, collecting payloads.
pub fn demux_in_chunks(data: &[u8], chunk_size: usize) -> Vec<Vec<u8>> {
    let mut demuxer = FrameDemuxer::new(Vec::<JpegFrame>::new());
    for chunk in data.chunks(chunk_size.max(1)) {
        assert!(demuxer.feed(chunk, chunk.len()));
    }
    collect_payloads(demuxer)
}

/// Feed `data` cut at the given (sorted, in-range) offsets, collecting payloads.
pub fn demux_at_splits(data: &[u8], splits: &[usize]) -> Vec<Vec<u8>> {
    let mut demuxer = FrameDemuxer::new(Vec::<JpegFrame>::new());
    let mut start = 0;
    for end in splits.iter().copied().chain(std::iter::once(data.len())) {
        if end > start {
            assert!(demuxer.feed(&data[start..end], end - start));
            start = end;
        }
    }
    collect_payloads(demuxer)
}

fn collect_payloads(demuxer: FrameDemuxer<Vec<JpegFrame>>) -> Vec<Vec<u8>> {
    demuxer
        .into_sink()
        .into_iter()
        .map(|frame| frame.into_bytes().to_vec())
        .collect()
}
