//! Saves a camera stream to disk, one JPEG file per frame.
//!
//! The demuxer runs on the connection task and hands frames to a bounded
//! channel; a separate writer task drains it. Frames that arrive while the
//! channel is full are dropped, so slow disks never stall the socket.

use std::path::{Path, PathBuf};

use anyhow::Context;
use camstream_network::CameraClient;
use camstream_protocol::{DemuxStats, JpegFrame};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::RecorderConfig;

/// Frames buffered between the connection and the writer.
const FRAME_QUEUE_DEPTH: usize = 32;

/// Outcome of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSummary {
    pub frames_written: u64,

    /// Demuxer counters, when the camera ended the stream.
    /// `None` when the frame limit stopped the recording first.
    pub stream_stats: Option<DemuxStats>,
}

/// `frame_000042.jpg` inside `dir`.
pub fn frame_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("frame_{sequence:06}.jpg"))
}

/// Connect to the camera and record until it hangs up or `max_frames` are saved.
pub async fn record(config: &RecorderConfig) -> anyhow::Result<RecordSummary> {
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    let mut client = CameraClient::new(config.client_config());
    client
        .connect()
        .await
        .with_context(|| format!("connecting to {}", config.url))?;

    let (tx, rx) = mpsc::channel(FRAME_QUEUE_DEPTH);
    let mut writer = tokio::spawn(write_frames(
        rx,
        config.output_dir.clone(),
        config.max_frames,
    ));

    let stream = client.stream(tx);
    tokio::pin!(stream);

    tokio::select! {
        result = &mut stream => {
            // The sender is gone with the finished stream, so the writer drains and exits
            let frames_written = writer.await??;
            let stats = result.context("streaming from camera")?;
            Ok(RecordSummary {
                frames_written,
                stream_stats: Some(stats),
            })
        }
        written = &mut writer => {
            let frames_written = written??;
            info!(frames = frames_written, "Frame limit reached, closing stream");
            Ok(RecordSummary {
                frames_written,
                stream_stats: None,
            })
        }
    }
}

/// Write every received frame until the channel closes or the limit is hit.
pub async fn write_frames(
    mut rx: mpsc::Receiver<JpegFrame>,
    dir: PathBuf,
    max_frames: Option<u64>,
) -> anyhow::Result<u64> {
    let mut written = 0u64;

    while let Some(frame) = rx.recv().await {
        let path = frame_path(&dir, frame.sequence());
        tokio::fs::write(&path, frame.as_bytes())
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        written += 1;
        debug!(path = %path.display(), size = frame.len(), "Frame saved");

        if max_frames.is_some_and(|max| written >= max) {
            break;
        }
    }

    Ok(written)
}
