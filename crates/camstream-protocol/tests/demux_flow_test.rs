//! Integration tests for end-to-end demuxing of camera streams.
//!
//! This module drives the demuxer through the situations a real camera
//! connection produces:
//! 1. Whole frames, split frames, and several frames per read
//! 2. Corrupt header blocks followed by recovery
//! 3. Zero, negative and unparsable lengths

mod common;

use camstream_protocol::{DemuxerState, FrameDemuxer, JpegFrame};

// ============================================================================
// Test Data Constants
// ============================================================================

mod test_data {
    /// Minimal header announcing five bytes.
    pub const HEADER_5: &[u8] = b"Content-Length: 5\r\n\r\n";

    /// Five-byte payload.
    pub const PAYLOAD_5: &[u8] = b"hello";

    /// Header block that ends without a Content-Length line.
    pub const GARBAGE_HEADER: &[u8] = b"HTTP/1.1 ???\r\nX-Noise: yes\r\n\r\n";
}

use test_data::*;

fn exact_fit() -> Vec<u8> {
    let mut data = HEADER_5.to_vec();
    data.extend_from_slice(PAYLOAD_5);
    data
}

fn new_demuxer() -> FrameDemuxer<Vec<JpegFrame>> {
    FrameDemuxer::new(Vec::new())
}

// ============================================================================
// Frame Assembly
// ============================================================================

#[test]
fn test_single_chunk_exact_fit() {
    let mut demuxer = new_demuxer();
    let data = exact_fit();

    assert!(demuxer.feed(&data, data.len()));

    assert_eq!(demuxer.sink().len(), 1);
    assert_eq!(demuxer.sink()[0].as_bytes(), PAYLOAD_5);
    assert_eq!(demuxer.buffered_len(), 0);
}

#[test]
fn test_every_two_way_split_emits_once_on_final_call() {
    let data = exact_fit();

    for split in 1..data.len() {
        let mut demuxer = new_demuxer();

        assert!(demuxer.feed(&data[..split], split));
        assert!(
            demuxer.sink().is_empty(),
            "frame emitted early at split {split}"
        );

        assert!(demuxer.feed(&data[split..], data.len() - split));
        assert_eq!(demuxer.sink().len(), 1, "split {split}");
        assert_eq!(demuxer.sink()[0].as_bytes(), PAYLOAD_5);
    }
}

#[test]
fn test_three_way_split() {
    let data = exact_fit();

    let frames = common::demux_at_splits(&data, &[4, 20]);

    assert_eq!(frames, vec![PAYLOAD_5.to_vec()]);
}

#[test]
fn test_back_to_back_frames() {
    let mut data = exact_fit();
    data.extend_from_slice(b"Content-Length: 3\r\n\r\nabc");
    let mut demuxer = new_demuxer();

    assert!(demuxer.feed(&data, data.len()));

    let payloads: Vec<&[u8]> = demuxer.sink().iter().map(JpegFrame::as_bytes).collect();
    assert_eq!(payloads, vec![PAYLOAD_5, b"abc".as_slice()]);
    assert_eq!(demuxer.buffered_len(), 0);
}

#[test]
fn test_camera_stream_with_real_jpeg_shape() {
    let jpegs = [
        common::fake_jpeg(&[0x11; 300]),
        common::fake_jpeg(&[0x22; 10]),
        common::fake_jpeg(&[0x0D, 0x0A, 0x0D, 0x0A]),
    ];
    let refs: Vec<&[u8]> = jpegs.iter().map(Vec::as_slice).collect();
    let stream = common::camera_stream(&refs);

    let frames = common::demux_in_chunks(&stream, 7);

    assert_eq!(frames, jpegs.to_vec());
    assert!(
        frames
            .iter()
            .all(|f| JpegFrame::from_bytes(f).has_jpeg_markers())
    );
}

// ============================================================================
// Resynchronization
// ============================================================================

#[test]
fn test_malformed_header_resync() {
    let mut demuxer = new_demuxer();

    assert!(demuxer.feed(GARBAGE_HEADER, GARBAGE_HEADER.len()));
    assert!(demuxer.sink().is_empty());
    assert_eq!(demuxer.state(), DemuxerState::AwaitingHeader);

    let data = exact_fit();
    assert!(demuxer.feed(&data, data.len()));

    assert_eq!(demuxer.sink().len(), 1);
    assert_eq!(demuxer.sink()[0].as_bytes(), PAYLOAD_5);
}

#[test]
fn test_garbage_then_valid_stream_in_later_chunks() {
    let mut demuxer = new_demuxer();
    let stream = common::camera_stream(&[b"one", b"two"]);

    demuxer.feed(GARBAGE_HEADER, GARBAGE_HEADER.len());
    for chunk in stream.chunks(5) {
        demuxer.feed(chunk, chunk.len());
    }

    let payloads: Vec<&[u8]> = demuxer.sink().iter().map(JpegFrame::as_bytes).collect();
    assert_eq!(payloads, vec![b"one".as_slice(), b"two".as_slice()]);
    assert_eq!(demuxer.stats().resyncs, 1);
}

#[test]
fn test_zero_length_is_discarded() {
    let mut demuxer = new_demuxer();
    let data = b"Content-Length: 0\r\n\r\n";

    assert!(demuxer.feed(data, data.len()));

    assert!(demuxer.sink().is_empty());
    assert_eq!(demuxer.buffered_len(), 0);
    assert_eq!(demuxer.stats().resyncs, 1);
}

#[test]
fn test_negative_length_is_discarded() {
    let mut demuxer = new_demuxer();
    let data = b"Content-Length: -3\r\n\r\nabc";

    assert!(demuxer.feed(data, data.len()));

    assert!(demuxer.sink().is_empty());
    assert_eq!(demuxer.buffered_len(), 0);
    assert_eq!(demuxer.stats().resyncs, 1);
}

#[test]
fn test_unparsable_length_is_absorbed() {
    let mut demuxer = new_demuxer();
    let data = b"Content-Length: 99999999999999999999999\r\n\r\n";

    assert!(demuxer.feed(data, data.len()));

    assert!(demuxer.sink().is_empty());
    assert_eq!(demuxer.stats().resyncs, 1);
}

#[test]
fn test_empty_chunk_changes_nothing() {
    let mut demuxer = new_demuxer();
    let data = exact_fit();
    demuxer.feed(&data[..10], 10);
    let before = demuxer.stats();

    assert!(!demuxer.feed(&[], 0));
    // A non-empty chunk with no valid bytes is accepted but consumes nothing
    assert!(demuxer.feed(&data, 0));

    assert_eq!(demuxer.stats(), before);
    assert_eq!(demuxer.buffered_len(), 10);
}

#[test]
fn test_independent_demuxers_do_not_share_state() {
    let data = exact_fit();
    let mut first = new_demuxer();
    let mut second = new_demuxer();

    first.feed(&data[..12], 12);
    second.feed(GARBAGE_HEADER, GARBAGE_HEADER.len());
    first.feed(&data[12..], data.len() - 12);

    assert_eq!(first.sink().len(), 1);
    assert!(second.sink().is_empty());
    assert_eq!(first.stats().resyncs, 0);
    assert_eq!(second.stats().resyncs, 1);
}
