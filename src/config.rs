//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, ZigbeeLinkError};
use crate::zigbee::codec::CrcMode;
use crate::zigbee::protocol::{PanIdentity, BROADCAST_PAN_ID, FCS_LEN, MAX_PHY_PACKET_SIZE};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    #[serde(default)]
    pub crc: CrcConfig,

    #[serde(default)]
    pub deframer: DeframerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// PAN coordinator identity
#[derive(Debug, Deserialize, Clone)]
pub struct CoordinatorConfig {
    #[serde(default = "default_pan_id")]
    pub pan_id: u16,

    #[serde(default = "default_source_address")]
    pub source_address: u64,

    #[serde(default = "default_short_addressing")]
    pub short_addressing: bool,

    #[serde(default = "default_extended_pan_id")]
    pub extended_pan_id: u64,
}

/// FCS codec configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CrcConfig {
    #[serde(default = "default_rx_mode")]
    pub rx_mode: bool,

    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,
}

/// Sample stream reader configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DeframerConfig {
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    #[serde(default = "default_flush_on_stop")]
    pub flush_on_stop: bool,

    #[serde(default = "default_recv_timeout_ms")]
    pub recv_timeout_ms: u64,

    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    #[serde(default = "default_capture_path")]
    pub capture_path: String,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Directory for rolling log files; empty logs to the console only
    #[serde(default)]
    pub log_dir: String,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

// Default value functions
fn default_pan_id() -> u16 { 0xabcd }
fn default_source_address() -> u64 { 0x1 }
fn default_short_addressing() -> bool { true }
fn default_extended_pan_id() -> u64 { 0xa }

fn default_rx_mode() -> bool { true }
fn default_max_frame_len() -> usize { MAX_PHY_PACKET_SIZE }

fn default_buffer_size() -> usize { 2048 }
fn default_flush_on_stop() -> bool { true }
fn default_recv_timeout_ms() -> u64 { 100 }
fn default_retry_interval_ms() -> u64 { 1000 }
fn default_capture_path() -> String { "capture.bin".to_string() }

fn default_file_prefix() -> String { "zigbee-link.log".to_string() }

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            pan_id: default_pan_id(),
            source_address: default_source_address(),
            short_addressing: default_short_addressing(),
            extended_pan_id: default_extended_pan_id(),
        }
    }
}

impl Default for CrcConfig {
    fn default() -> Self {
        Self {
            rx_mode: default_rx_mode(),
            max_frame_len: default_max_frame_len(),
        }
    }
}

impl Default for DeframerConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            flush_on_stop: default_flush_on_stop(),
            recv_timeout_ms: default_recv_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            capture_path: default_capture_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: String::new(),
            file_prefix: default_file_prefix(),
        }
    }
}

impl CoordinatorConfig {
    /// PAN identity described by this section
    pub fn identity(&self) -> PanIdentity {
        PanIdentity::new(
            self.pan_id,
            self.source_address,
            self.short_addressing,
            self.extended_pan_id,
        )
    }
}

fn invalid(msg: impl std::fmt::Display) -> ZigbeeLinkError {
    ZigbeeLinkError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use zigbee_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Validate coordinator identity
        if self.coordinator.pan_id == BROADCAST_PAN_ID {
            return Err(invalid("pan_id 0xffff is the broadcast PAN and cannot be announced"));
        }

        if self.coordinator.short_addressing && self.coordinator.source_address > u16::MAX as u64 {
            return Err(invalid(format!(
                "source_address 0x{:x} does not fit a 16-bit short address",
                self.coordinator.source_address
            )));
        }

        // Validate codec limits
        if self.crc.max_frame_len < FCS_LEN {
            return Err(invalid(format!("max_frame_len must be at least {}", FCS_LEN)));
        }

        // Validate deframer
        if self.deframer.buffer_size == 0 || self.deframer.buffer_size > 65536 {
            return Err(invalid("buffer_size must be between 1 and 65536"));
        }

        if self.deframer.recv_timeout_ms == 0 || self.deframer.recv_timeout_ms > 10000 {
            return Err(invalid("recv_timeout_ms must be between 1 and 10000"));
        }

        if self.deframer.retry_interval_ms == 0 || self.deframer.retry_interval_ms > 60000 {
            return Err(invalid("retry_interval_ms must be between 1 and 60000"));
        }

        if self.deframer.capture_path.is_empty() {
            return Err(invalid("capture_path cannot be empty"));
        }

        // Validate logging
        if !self.logging.log_dir.is_empty() && self.logging.file_prefix.is_empty() {
            return Err(invalid("file_prefix cannot be empty when log_dir is set"));
        }

        Ok(())
    }

    /// Codec mode for the FCS stage between the deframer and the coordinator
    ///
    /// That stage must verify: a transmit-mode codec there would append a
    /// second FCS and hand unchecked frames to the coordinator.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if `crc.rx_mode` is false
    pub fn ingress_crc_mode(&self) -> Result<CrcMode> {
        match CrcMode::from_rx_mode(self.crc.rx_mode) {
            CrcMode::Receive => Ok(CrcMode::Receive),
            CrcMode::Transmit => Err(invalid("crc.rx_mode must be true for the receive pipeline")),
        }
    }
}
