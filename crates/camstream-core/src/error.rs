use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Framing errors
    #[error("Frame too large: {size} bytes (max {max_size})")]
    FrameTooLarge { size: usize, max_size: usize },

    #[error("Cannot encode an empty frame")]
    EmptyFrame,

    // Transport errors
    #[error("Not connected to camera")]
    NotConnected,

    #[error("Invalid camera URL: {0}")]
    InvalidUrl(String),

    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    #[error("Read timeout after {0}ms")]
    ReadTimeout(u64),

    #[error("Connection closed by camera")]
    ConnectionClosed,

    #[error("Malformed HTTP response: {0}")]
    MalformedResponse(String),

    #[error("Camera answered with HTTP {code} {reason}")]
    HttpStatus { code: u16, reason: String },

    #[error("Unsupported transfer encoding: {0}")]
    UnsupportedTransferEncoding(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
