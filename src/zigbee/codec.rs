//! # FCS Codec
//!
//! Validates and strips the trailing checksum on receive, computes and
//! appends it on transmit.

use tracing::{debug, warn};

use super::crc::checksum16;
use super::protocol::{FCS_LEN, MAX_PHY_PACKET_SIZE};
use crate::bus::{Pdu, PduHandler};
use crate::error::{Result, ZigbeeLinkError};

/// Check a received frame and strip its FCS
///
/// The checksum is computed over the whole frame, FCS included; a valid
/// frame checks to zero.
///
/// # Arguments
///
/// * `frame` - Received frame bytes, FCS last
///
/// # Returns
///
/// * `Option<&[u8]>` - Frame without its FCS, or `None` on mismatch
///
/// # Examples
///
/// ```
/// use zigbee_link::zigbee::codec::{seal, verify};
///
/// let frame = seal(&[0x03, 0x08, 0x00]);
/// assert_eq!(verify(&frame), Some(&[0x03, 0x08, 0x00][..]));
/// ```
pub fn verify(frame: &[u8]) -> Option<&[u8]> {
    if frame.len() < FCS_LEN || checksum16(frame) != 0 {
        return None;
    }

    Some(&frame[..frame.len() - FCS_LEN])
}

/// Append the FCS to a payload
///
/// # Arguments
///
/// * `payload` - Frame bytes without FCS
///
/// # Returns
///
/// * `Vec<u8>` - `payload` followed by the checksum, low byte first
pub fn seal(payload: &[u8]) -> Vec<u8> {
    let crc = checksum16(payload);

    let mut frame = Vec::with_capacity(payload.len() + FCS_LEN);
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&crc.to_le_bytes());

    frame
}

/// Append the FCS, refusing frames over `capacity` bytes
///
/// # Errors
///
/// Returns `CapacityExceeded` if `payload.len() + 2` is larger than
/// `capacity`. Nothing is truncated.
pub fn seal_bounded(payload: &[u8], capacity: usize) -> Result<Vec<u8>> {
    let len = payload.len() + FCS_LEN;
    if len > capacity {
        return Err(ZigbeeLinkError::CapacityExceeded { len, capacity });
    }

    Ok(seal(payload))
}

/// Codec direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcMode {
    /// Validate and strip
    Receive,
    /// Compute and append
    Transmit,
}

impl CrcMode {
    pub fn from_rx_mode(rx_mode: bool) -> Self {
        if rx_mode {
            CrcMode::Receive
        } else {
            CrcMode::Transmit
        }
    }
}

/// FCS codec block
#[derive(Debug, Clone)]
pub struct CrcCodec {
    mode: CrcMode,
    max_frame_len: usize,
    dropped: u64,
}

impl CrcCodec {
    /// Create a codec
    ///
    /// # Arguments
    ///
    /// * `mode` - Receive or transmit
    /// * `max_frame_len` - Largest sealed frame accepted in transmit mode
    pub fn new(mode: CrcMode, max_frame_len: usize) -> Self {
        Self {
            mode,
            max_frame_len,
            dropped: 0,
        }
    }

    /// Codec with the 802.15.4 PHY frame limit
    pub fn with_mode(mode: CrcMode) -> Self {
        Self::new(mode, MAX_PHY_PACKET_SIZE)
    }

    pub fn mode(&self) -> CrcMode {
        self.mode
    }

    /// Frames dropped so far (checksum mismatch, too short or too long)
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Process one frame in the configured direction
    ///
    /// # Returns
    ///
    /// * `Result<Option<Vec<u8>>>` - Output frame; `None` when a received
    ///   frame fails its checksum
    ///
    /// # Errors
    ///
    /// - `MalformedFrame` if a received frame is shorter than the FCS
    /// - `CapacityExceeded` if a sealed frame would exceed `max_frame_len`
    pub fn process(&self, frame: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.mode {
            CrcMode::Receive => {
                if frame.len() < FCS_LEN {
                    return Err(ZigbeeLinkError::MalformedFrame(format!(
                        "{} bytes cannot carry a {}-byte FCS",
                        frame.len(),
                        FCS_LEN
                    )));
                }
                Ok(verify(frame).map(<[u8]>::to_vec))
            }
            CrcMode::Transmit => seal_bounded(frame, self.max_frame_len).map(Some),
        }
    }
}

impl PduHandler for CrcCodec {
    fn name(&self) -> &'static str {
        match self.mode {
            CrcMode::Receive => "crc-rx",
            CrcMode::Transmit => "crc-tx",
        }
    }

    fn handle_pdu(&mut self, pdu: Pdu) -> Option<Pdu> {
        match self.process(&pdu.blob) {
            Ok(Some(frame)) => Some(Pdu::new(frame)),
            Ok(None) => {
                self.dropped += 1;
                debug!("Checksum mismatch, dropping {}-byte frame", pdu.blob.len());
                None
            }
            Err(e) => {
                self.dropped += 1;
                warn!("{}: {}", self.name(), e);
                None
            }
        }
    }
}
