//! Consumers of demuxed frames.
//!
//! A [`FrameSink`] receives every frame the demuxer completes, synchronously,
//! from inside [`FrameDemuxer::feed()`](crate::FrameDemuxer::feed). The sink
//! runs on the same task as the transport that delivered the chunk, so it must
//! not block: slow consumers hand the frame off (for example through the
//! channel implementation below) and return.

use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::warn;

use crate::frame::JpegFrame;

/// Receiver of the demuxer's frame-ready notification.
pub trait FrameSink {
    /// Called exactly once per complete frame, in stream order.
    fn frame_ready(&mut self, frame: JpegFrame);
}

impl<F> FrameSink for F
where
    F: FnMut(JpegFrame),
{
    fn frame_ready(&mut self, frame: JpegFrame) {
        self(frame)
    }
}

impl FrameSink for Vec<JpegFrame> {
    fn frame_ready(&mut self, frame: JpegFrame) {
        self.push(frame);
    }
}

impl FrameSink for VecDeque<JpegFrame> {
    fn frame_ready(&mut self, frame: JpegFrame) {
        self.push_back(frame);
    }
}

/// Non-blocking hand-off to an async consumer.
///
/// Frames that do not fit in the channel, or that arrive after the receiver
/// was dropped, are discarded with a warning.
impl FrameSink for mpsc::Sender<JpegFrame> {
    fn frame_ready(&mut self, frame: JpegFrame) {
        match self.try_send(frame) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(frame)) => {
                warn!(
                    sequence = frame.sequence(),
                    size = frame.len(),
                    "Frame consumer is lagging, dropping frame"
                );
            }
            Err(mpsc::error::TrySendError::Closed(frame)) => {
                warn!(
                    sequence = frame.sequence(),
                    "Frame consumer has gone away, dropping frame"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deliver<S: FrameSink>(sink: &mut S, payloads: &[&[u8]]) {
        for payload in payloads {
            sink.frame_ready(JpegFrame::from_bytes(payload));
        }
    }

    #[test]
    fn test_closure_sink() {
        let mut sizes = Vec::new();
        let mut sink = |frame: JpegFrame| sizes.push(frame.len());

        deliver(&mut sink, &[b"ab", b"cde"]);

        assert_eq!(sizes, vec![2, 3]);
    }

    #[test]
    fn test_vec_sink_keeps_order() {
        let mut sink: Vec<JpegFrame> = Vec::new();

        deliver(&mut sink, &[b"one", b"two"]);

        assert_eq!(sink[0].as_bytes(), b"one");
        assert_eq!(sink[1].as_bytes(), b"two");
    }

    #[test]
    fn test_vec_deque_sink() {
        let mut sink: VecDeque<JpegFrame> = VecDeque::new();

        deliver(&mut sink, &[b"one", b"two"]);

        assert_eq!(sink.pop_front().unwrap().as_bytes(), b"one");
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_channel_sink_delivers() {
        let (mut tx, mut rx) = mpsc::channel(4);

        deliver(&mut tx, &[b"one"]);

        assert_eq!(rx.recv().await.unwrap().as_bytes(), b"one");
    }

    #[tokio::test]
    async fn test_channel_sink_drops_when_full() {
        let (mut tx, mut rx) = mpsc::channel(1);

        deliver(&mut tx, &[b"one", b"two"]);
        drop(tx);

        assert_eq!(rx.recv().await.unwrap().as_bytes(), b"one");
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (mut tx, rx) = mpsc::channel(1);
        drop(rx);

        deliver(&mut tx, &[b"one"]);
    }
}
