//! # PAN Coordinator
//!
//! Dispatches inbound frames by type and answers beacon requests.
//!
//! Beacon, data and acknowledgment frames are only logged. A MAC command
//! frame carrying a beacon request is answered with a sealed beacon; every
//! other command is logged and ignored.

use tracing::{debug, info, warn};

use super::beacon::encode_beacon_frame;
use super::protocol::*;
use crate::bus::{Pdu, PduHandler};
use crate::error::{Result, ZigbeeLinkError};

/// Frame counters kept by a coordinator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub beacon_frames: u64,
    pub data_frames: u64,
    pub ack_frames: u64,
    pub command_frames: u64,
    pub unknown_frames: u64,
    pub malformed_frames: u64,
    pub beacons_sent: u64,
}

/// Minimal PAN coordinator
///
/// Owns its identity and beacon sequence number. `handle` takes
/// `&mut self`, so callers serialize delivery by construction.
#[derive(Debug, Clone)]
pub struct Coordinator {
    identity: PanIdentity,
    sequence: u8,
    stats: CoordinatorStats,
}

impl Coordinator {
    /// Create a coordinator with the beacon sequence number at 1
    pub fn new(identity: PanIdentity) -> Self {
        Self::with_sequence(identity, INITIAL_BEACON_SEQUENCE)
    }

    /// Create a coordinator with an explicit starting sequence number
    pub fn with_sequence(identity: PanIdentity, sequence: u8) -> Self {
        Self {
            identity,
            sequence,
            stats: CoordinatorStats::default(),
        }
    }

    pub fn identity(&self) -> &PanIdentity {
        &self.identity
    }

    /// Sequence number the next beacon will carry
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    /// Handle one inbound frame
    ///
    /// # Arguments
    ///
    /// * `frame` - Frame bytes without FCS
    ///
    /// # Returns
    ///
    /// * `Result<Option<Vec<u8>>>` - Sealed beacon if the frame was a beacon
    ///   request, `None` otherwise
    ///
    /// # Errors
    ///
    /// Returns `MalformedFrame` if the frame is empty, or is a command frame
    /// too short to carry a command identifier.
    pub fn handle(&mut self, frame: &[u8]) -> Result<Option<Vec<u8>>> {
        let Some(&frame_control) = frame.first() else {
            self.stats.malformed_frames += 1;
            return Err(ZigbeeLinkError::MalformedFrame("empty frame".to_string()));
        };

        match FrameType::from(frame_control) {
            FrameType::Beacon => {
                self.stats.beacon_frames += 1;
                info!("Beacon frame received, no handler implemented");
                Ok(None)
            }
            FrameType::Data => {
                self.stats.data_frames += 1;
                info!("Data frame received, no handler implemented");
                Ok(None)
            }
            FrameType::Ack => {
                self.stats.ack_frames += 1;
                info!("ACK frame received, no handler implemented");
                Ok(None)
            }
            FrameType::Command => {
                self.stats.command_frames += 1;
                self.handle_command_frame(frame)
            }
            FrameType::Unknown(value) => {
                self.stats.unknown_frames += 1;
                info!("Unrecognized frame type {}, dropping frame", value);
                Ok(None)
            }
        }
    }

    fn handle_command_frame(&mut self, frame: &[u8]) -> Result<Option<Vec<u8>>> {
        let Some(&command_id) = frame.get(COMMAND_ID_OFFSET) else {
            self.stats.malformed_frames += 1;
            return Err(ZigbeeLinkError::MalformedFrame(format!(
                "command frame of {} bytes, need at least {}",
                frame.len(),
                COMMAND_FRAME_MIN_LEN
            )));
        };

        match CommandType::from(command_id) {
            CommandType::BeaconRequest => {
                let sequence = self.next_sequence();
                let beacon = encode_beacon_frame(&self.identity, sequence);
                self.stats.beacons_sent += 1;
                info!("Beacon request received, sending beacon #{}", sequence);
                Ok(Some(beacon))
            }
            other => {
                debug!("Ignoring {:?} command", other);
                Ok(None)
            }
        }
    }

    /// Read the sequence number and advance it (mod 256)
    fn next_sequence(&mut self) -> u8 {
        let sequence = self.sequence;
        self.sequence = sequence.wrapping_add(1);
        sequence
    }
}

impl PduHandler for Coordinator {
    fn name(&self) -> &'static str {
        "coordinator"
    }

    fn handle_pdu(&mut self, pdu: Pdu) -> Option<Pdu> {
        match self.handle(&pdu.blob) {
            Ok(reply) => reply.map(Pdu::new),
            Err(e) => {
                warn!("Coordinator rejected frame: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BEACON_REQUEST: [u8; 8] = [0x03, 0, 0, 0, 0, 0, 0, 0x07];

    fn default_coordinator() -> Coordinator {
        Coordinator::new(PanIdentity::new(0xabcd, 0x1, true, 0xa))
    }

    #[test]
    fn test_initial_sequence_is_one() {
        assert_eq!(default_coordinator().sequence(), 1);
    }

    #[test]
    fn test_beacon_request_produces_beacon() {
        let mut coordinator = default_coordinator();
        let beacon = coordinator.handle(&BEACON_REQUEST).unwrap().unwrap();

        assert_eq!(
            &beacon[..11],
            &[0x00, 0x80, 0x01, 0xcd, 0xab, 0x01, 0x00, 0xFF, 0xCF, 0x00, 0x00]
        );
        assert_eq!(
            &beacon[11..26],
            &[0x00, 0x20, 0x84, 0x0a, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0x00]
        );
        assert_eq!(beacon.len(), 28);
        assert_eq!(coordinator.stats().beacons_sent, 1);
    }

    #[test]
    fn test_second_request_increments_sequence() {
        let mut coordinator = default_coordinator();
        let first = coordinator.handle(&BEACON_REQUEST).unwrap().unwrap();
        let second = coordinator.handle(&BEACON_REQUEST).unwrap().unwrap();

        assert_eq!(first[2], 0x01);
        assert_eq!(second[2], 0x02);
        assert_eq!(coordinator.sequence(), 3);
    }

    #[test]
    fn test_sequence_wraps_at_256() {
        let mut coordinator = Coordinator::with_sequence(PanIdentity::new(0xabcd, 0x1, true, 0xa), 0xFE);
        let sequences: Vec<u8> = (0..4)
            .map(|_| coordinator.handle(&BEACON_REQUEST).unwrap().unwrap()[2])
            .collect();

        assert_eq!(sequences, vec![0xFE, 0xFF, 0x00, 0x01]);
    }

    #[test]
    fn test_sequence_not_consumed_without_beacon() {
        let mut coordinator = default_coordinator();
        coordinator.handle(&[0x01, 0x00]).unwrap();
        coordinator.handle(&[0x03, 0, 0, 0, 0, 0, 0, 0x04]).unwrap();
        let _ = coordinator.handle(&[0x03, 0x00]);

        assert_eq!(coordinator.sequence(), 1, "Only emitted beacons advance the counter");
    }

    #[test]
    fn test_other_command_ignored() {
        // A non-beacon-request command must not trigger a beacon
        let mut coordinator = default_coordinator();
        for command_id in [0x00u8, 0x01, 0x04, 0x06, 0x08, 0x42] {
            let frame = [0x03, 0, 0, 0, 0, 0, 0, command_id];
            assert_eq!(coordinator.handle(&frame).unwrap(), None, "Command 0x{:02X}", command_id);
        }
        assert_eq!(coordinator.stats().beacons_sent, 0);
    }

    #[test]
    fn test_unhandled_frame_types_dropped() {
        let mut coordinator = default_coordinator();

        assert_eq!(coordinator.handle(&[0x00]).unwrap(), None);
        assert_eq!(coordinator.handle(&[0x01]).unwrap(), None);
        assert_eq!(coordinator.handle(&[0x02]).unwrap(), None);
        assert_eq!(coordinator.handle(&[0x05]).unwrap(), None);

        let stats = coordinator.stats();
        assert_eq!(stats.beacon_frames, 1);
        assert_eq!(stats.data_frames, 1);
        assert_eq!(stats.ack_frames, 1);
        assert_eq!(stats.unknown_frames, 1);
    }

    #[test]
    fn test_empty_frame_rejected() {
        let mut coordinator = default_coordinator();
        assert!(matches!(coordinator.handle(&[]), Err(ZigbeeLinkError::MalformedFrame(_))));
        assert_eq!(coordinator.stats().malformed_frames, 1);
    }

    #[test]
    fn test_short_command_frame_rejected() {
        let mut coordinator = default_coordinator();
        for len in 1..COMMAND_FRAME_MIN_LEN {
            let frame = vec![0x03; len];
            assert!(
                matches!(coordinator.handle(&frame), Err(ZigbeeLinkError::MalformedFrame(_))),
                "Command frame of {} bytes should be rejected",
                len
            );
        }
    }

    #[test]
    fn test_extended_addressing_beacon() {
        let mut coordinator = Coordinator::new(PanIdentity::new(0xabcd, 0x1, false, 0xa));
        let beacon = coordinator.handle(&BEACON_REQUEST).unwrap().unwrap();

        assert_eq!(beacon[1], 0xC0);
        assert_eq!(&beacon[5..13], &[0x01, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(beacon.len(), 34);
    }

    #[test]
    fn test_handle_pdu_swallows_malformed() {
        let mut coordinator = default_coordinator();
        assert!(coordinator.handle_pdu(Pdu::new(Vec::<u8>::new())).is_none());
        assert!(coordinator.handle_pdu(Pdu::new(vec![0x03, 0x00])).is_none());

        let reply = coordinator.handle_pdu(Pdu::new(BEACON_REQUEST.to_vec())).unwrap();
        assert_eq!(reply.blob()[2], 0x01);
        assert!(reply.metadata.is_empty());
    }
}
