//! # Error Types
//!
//! Custom error types for Zigbee Link using `thiserror`.

use thiserror::Error;

/// Main error type for Zigbee Link
#[derive(Debug, Error)]
pub enum ZigbeeLinkError {
    /// Frame too short for the field being read
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Payload does not fit the transmit buffer
    #[error("Frame of {len} bytes exceeds capacity of {capacity} bytes")]
    CapacityExceeded { len: usize, capacity: usize },

    /// Hard failure reading the sample stream
    #[error("Sample stream read failed: {0}")]
    StreamRead(String),

    /// Downstream receiver went away
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Zigbee Link
pub type Result<T> = std::result::Result<T, ZigbeeLinkError>;
