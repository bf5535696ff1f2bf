//! `camstream` - record an IP camera's MJPEG stream as numbered JPEG files.
//!
//! Configuration comes from `CAMSTREAM_*` environment variables (see
//! `config.rs`), optionally loaded from a `.env` file. Log verbosity follows
//! `RUST_LOG` and defaults to `info`.

mod config;
mod recorder;

use config::RecorderConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = RecorderConfig::from_env()?;
    info!(
        url = %config.url,
        output_dir = %config.output_dir.display(),
        max_frames = ?config.max_frames,
        "Starting camstream {}",
        camstream_core::VERSION
    );

    tokio::select! {
        summary = recorder::record(&config) => {
            let summary = summary?;
            match summary.stream_stats {
                Some(stats) => info!(
                    frames_written = summary.frames_written,
                    frames_emitted = stats.frames_emitted,
                    resyncs = stats.resyncs,
                    bytes_discarded = stats.bytes_discarded,
                    "Camera ended the stream"
                ),
                None => info!(frames_written = summary.frames_written, "Recording complete"),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping");
        }
    }

    Ok(())
}
