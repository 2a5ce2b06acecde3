//! # CRC-16 (802.15.4 FCS) Implementation
//!
//! 16-bit frame check sequence used by IEEE 802.15.4 (CRC-16/KERMIT).
//!
//! **Polynomial**: 0x1021 (x^16 + x^12 + x^5 + 1), processed LSB first (0x8408 reflected)
//! **Initial Value**: 0x0000
//!
//! Appending the result little-endian makes the checksum of the whole frame zero.

/// Reflected CRC-16 polynomial (register bits 15, 10 and 3)
const CRC16_POLY_REFLECTED: u16 = (1 << 15) | (1 << 10) | (1 << 3);

/// Precomputed CRC16 lookup table for fast calculation
const CRC16_TABLE: [u16; 256] = generate_crc16_table();

/// Generate CRC16 lookup table at compile time
const fn generate_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u16;
        let mut j = 0;

        while j < 8 {
            if (crc & 1) != 0 {
                crc = (crc >> 1) ^ CRC16_POLY_REFLECTED;
            } else {
                crc >>= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate the 802.15.4 checksum using lookup table (fast)
///
/// The register starts at zero on every call; nothing is carried between
/// frames.
///
/// # Arguments
///
/// * `data` - Byte slice to calculate CRC for
///
/// # Returns
///
/// * `u16` - Calculated checksum
///
/// # Examples
///
/// ```
/// use zigbee_link::zigbee::crc::checksum16;
///
/// assert_eq!(checksum16(b"123456789"), 0x2189);
/// ```
pub fn checksum16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        crc = (crc >> 8) ^ CRC16_TABLE[((crc ^ byte as u16) & 0xFF) as usize];
    }

    crc
}

/// Calculate the checksum one bit at a time (slow, for verification)
///
/// Each byte is consumed least-significant bit first. The incoming bit is
/// XORed with register bit 0, the register shifts right, and when that bit
/// was set, bits 15, 10 and 3 are flipped.
pub fn checksum16_bitwise(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        for k in 0..8 {
            let input_bit = ((byte >> k) & 1) as u16 ^ (crc & 1);
            crc >>= 1;
            if input_bit != 0 {
                crc ^= 1 << 15;
                crc ^= 1 << 10;
                crc ^= 1 << 3;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_empty() {
        let data = [];
        assert_eq!(checksum16(&data), 0x0000);
        assert_eq!(checksum16_bitwise(&data), 0x0000);
    }

    #[test]
    fn test_crc16_check_value() {
        // CRC-16/KERMIT catalogue check value
        assert_eq!(checksum16(b"123456789"), 0x2189);
        assert_eq!(checksum16_bitwise(b"123456789"), 0x2189);
    }

    #[test]
    fn test_crc16_single_byte() {
        assert_eq!(checksum16(&[0x00]), 0x0000);

        let crc = checksum16(&[0xFF]);
        assert_eq!(crc, checksum16_bitwise(&[0xFF]));
        assert_ne!(crc, 0x0000);
    }

    #[test]
    fn test_crc16_poly_bits() {
        assert_eq!(CRC16_POLY_REFLECTED, 0x8408);
        // A single set LSB feeds exactly one polynomial XOR
        assert_eq!(checksum16_bitwise(&[0x01]), CRC16_TABLE[1]);
    }

    #[test]
    fn test_crc16_lookup_table_matches_bitwise() {
        let test_data = [
            vec![0x01, 0x02, 0x03],
            vec![0xFF, 0xFE, 0xFD],
            vec![0x03, 0x08, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x07],
            vec![0x00; 24],
            vec![0xFF; 127],
        ];

        for data in test_data.iter() {
            assert_eq!(
                checksum16(data),
                checksum16_bitwise(data),
                "CRC mismatch for data: {:02X?}",
                data
            );
        }
    }

    #[test]
    fn test_crc16_residue_is_zero() {
        let mut frame = vec![0x41, 0x88, 0x2A, 0xCD, 0xAB, 0xFF, 0xFF];
        let crc = checksum16(&frame);
        frame.extend_from_slice(&crc.to_le_bytes());

        assert_eq!(checksum16(&frame), 0, "Frame with appended FCS must check to zero");
    }

    #[test]
    fn test_crc16_changes_with_data() {
        let crc1 = checksum16(&[0x03, 0x08, 0x00, 0x07]);
        let crc2 = checksum16(&[0x03, 0x08, 0x00, 0x06]);

        assert_ne!(crc1, crc2, "CRC should change when data changes");
    }
}
