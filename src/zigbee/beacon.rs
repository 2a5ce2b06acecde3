//! # Beacon Encoder
//!
//! Builds the beacon a PAN coordinator sends in answer to a beacon request.
//!
//! ```text
//! | FC (2) | Seq (1) | PAN (2) | Src (2|8) | Superframe (2) | GTS (1) | Pending (1) | Zigbee payload (15) | FCS (2) |
//! ```

use super::codec::seal;
use super::protocol::*;

/// Length of the MHR and MAC beacon fields ahead of the source address
const BEACON_FIXED_LEN: usize = 2 + 1 + 2 + SUPERFRAME_SPEC.len() + 1 + 1;

/// Total length of a sealed beacon for a given identity
pub fn beacon_frame_len(identity: &PanIdentity) -> usize {
    BEACON_FIXED_LEN + identity.source.width() + ZIGBEE_BEACON_PAYLOAD_LEN + FCS_LEN
}

/// Encode a beacon without its FCS
///
/// # Arguments
///
/// * `identity` - PAN identity to announce
/// * `sequence` - Beacon sequence number
///
/// # Returns
///
/// * `Vec<u8>` - MHR, superframe/GTS/pending fields and Zigbee payload
pub fn encode_beacon_payload(identity: &PanIdentity, sequence: u8) -> Vec<u8> {
    let mut beacon = Vec::with_capacity(beacon_frame_len(identity));

    // MHR: frame control, sequence number, source PAN and address
    beacon.push(BEACON_FRAME_CONTROL_LOW);
    beacon.push(identity.source.frame_control_high());
    beacon.push(sequence);
    beacon.extend_from_slice(&identity.pan_id.to_le_bytes());
    identity.source.write_le(&mut beacon);

    beacon.extend_from_slice(&SUPERFRAME_SPEC);
    beacon.push(GTS_SPEC);
    beacon.push(PENDING_ADDRESS_SPEC);

    encode_zigbee_beacon_payload(identity.extended_pan_id, &mut beacon);

    beacon
}

/// Encode a complete beacon frame, FCS included
///
/// # Examples
///
/// ```
/// use zigbee_link::zigbee::beacon::encode_beacon_frame;
/// use zigbee_link::zigbee::protocol::PanIdentity;
///
/// let identity = PanIdentity::new(0xabcd, 0x1, true, 0xa);
/// let frame = encode_beacon_frame(&identity, 1);
/// assert_eq!(&frame[..5], &[0x00, 0x80, 0x01, 0xcd, 0xab]);
/// ```
pub fn encode_beacon_frame(identity: &PanIdentity, sequence: u8) -> Vec<u8> {
    seal(&encode_beacon_payload(identity, sequence))
}

/// Append the Zigbee beacon payload
fn encode_zigbee_beacon_payload(extended_pan_id: u64, buf: &mut Vec<u8>) {
    buf.push(ZIGBEE_PROTOCOL_ID);
    buf.extend_from_slice(&ZIGBEE_STACK_PROFILE);
    buf.extend_from_slice(&extended_pan_id.to_le_bytes());
    buf.extend_from_slice(&ZIGBEE_TX_OFFSET);
    buf.push(ZIGBEE_UPDATE_ID);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zigbee::codec::verify;

    fn default_identity() -> PanIdentity {
        PanIdentity::new(0xabcd, 0x1, true, 0xa)
    }

    #[test]
    fn test_beacon_header_short_addressing() {
        let beacon = encode_beacon_payload(&default_identity(), 1);

        assert_eq!(
            &beacon[..11],
            &[0x00, 0x80, 0x01, 0xcd, 0xab, 0x01, 0x00, 0xFF, 0xCF, 0x00, 0x00]
        );
    }

    #[test]
    fn test_beacon_zigbee_payload() {
        let beacon = encode_beacon_payload(&default_identity(), 1);

        assert_eq!(
            &beacon[11..],
            &[0x00, 0x20, 0x84, 0x0a, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0x00]
        );
    }

    #[test]
    fn test_beacon_header_extended_addressing() {
        let identity = PanIdentity::new(0x1234, 0x0102_0304_0506_0708, false, 0xa);
        let beacon = encode_beacon_payload(&identity, 0x42);

        assert_eq!(beacon[0], 0x00);
        assert_eq!(beacon[1], 0xC0, "Extended source addressing mode");
        assert_eq!(beacon[2], 0x42);
        assert_eq!(&beacon[3..5], &[0x34, 0x12]);
        assert_eq!(&beacon[5..13], &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&beacon[13..17], &[0xFF, 0xCF, 0x00, 0x00]);
    }

    #[test]
    fn test_beacon_frame_lengths() {
        let short = default_identity();
        let extended = PanIdentity::new(0xabcd, 0x1, false, 0xa);

        let short_frame = encode_beacon_frame(&short, 1);
        let extended_frame = encode_beacon_frame(&extended, 1);

        assert_eq!(short_frame.len(), 28);
        assert_eq!(extended_frame.len(), 34);
        assert_eq!(short_frame.len(), beacon_frame_len(&short));
        assert_eq!(extended_frame.len(), beacon_frame_len(&extended));
        assert_eq!(extended_frame.len() - short_frame.len(), 6);
    }

    #[test]
    fn test_beacon_length_independent_of_values() {
        for (pan, src, epid) in [(0u16, 0u64, 0u64), (0xFFFE, u64::MAX, u64::MAX), (0x1A2B, 0xBEEF, 0xDEAD_BEEF)] {
            assert_eq!(encode_beacon_frame(&PanIdentity::new(pan, src, true, epid), 0).len(), 28);
            assert_eq!(encode_beacon_frame(&PanIdentity::new(pan, src, false, epid), 0).len(), 34);
        }
    }

    #[test]
    fn test_beacon_frame_checks_out() {
        let payload = encode_beacon_payload(&default_identity(), 7);
        let frame = encode_beacon_frame(&default_identity(), 7);

        assert_eq!(verify(&frame), Some(payload.as_slice()));
    }

    #[test]
    fn test_extended_pan_id_little_endian() {
        let identity = PanIdentity::new(0xabcd, 0x1, true, 0x1122_3344_5566_7788);
        let beacon = encode_beacon_payload(&identity, 1);

        assert_eq!(&beacon[14..22], &[0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11]);
    }
}
