pub mod codec;
pub mod demuxer;
pub mod frame;
pub mod header;
pub mod sink;

pub use codec::MjpegCodec;
pub use demuxer::{DemuxStats, DemuxerConfig, DemuxerState, FrameDemuxer};
pub use frame::JpegFrame;
pub use header::{HeaderScan, HeaderScanner, parse_content_length};
pub use sink::FrameSink;
