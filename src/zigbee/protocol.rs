//! # IEEE 802.15.4 Protocol Constants and Types
//!
//! Frame-type and command identifiers, beacon field values and the PAN
//! identity a coordinator announces.

/// Frame control mask selecting the frame type bits (b0..b2)
pub const FRAME_TYPE_MASK: u8 = 0x07;

/// Offset of the command identifier in a MAC command frame
///
/// Frame control(2) + sequence(1) + destination PAN(2) + short destination(2).
pub const COMMAND_ID_OFFSET: usize = 7;

/// Minimum length of a command frame carrying a command identifier
pub const COMMAND_FRAME_MIN_LEN: usize = COMMAND_ID_OFFSET + 1;

/// Length of the frame check sequence in bytes
pub const FCS_LEN: usize = 2;

/// aMaxPhyPacketSize: largest PSDU the 2.4 GHz O-QPSK PHY carries
pub const MAX_PHY_PACKET_SIZE: usize = 127;

/// Beacon frame control, first byte (frame type = beacon, no flags)
pub const BEACON_FRAME_CONTROL_LOW: u8 = 0x00;

/// Beacon frame control, second byte with short source addressing
pub const BEACON_FRAME_CONTROL_SHORT: u8 = 0x80;

/// Beacon frame control, second byte with extended source addressing
pub const BEACON_FRAME_CONTROL_EXTENDED: u8 = 0xC0;

/// Superframe specification: BO = SO = 15, final CAP slot 15, PAN coordinator, association permit
pub const SUPERFRAME_SPEC: [u8; 2] = [0xFF, 0xCF];

/// GTS specification: no guaranteed time slots
pub const GTS_SPEC: u8 = 0x00;

/// Pending address specification: no pending addresses
pub const PENDING_ADDRESS_SPEC: u8 = 0x00;

/// Zigbee beacon payload protocol id
pub const ZIGBEE_PROTOCOL_ID: u8 = 0x00;

/// Zigbee stack profile / protocol version / router & end-device capacity
pub const ZIGBEE_STACK_PROFILE: [u8; 2] = [0x20, 0x84];

/// Zigbee TX offset (none)
pub const ZIGBEE_TX_OFFSET: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// Zigbee network update id
pub const ZIGBEE_UPDATE_ID: u8 = 0x00;

/// Length of the Zigbee beacon payload
pub const ZIGBEE_BEACON_PAYLOAD_LEN: usize = 15;

/// Initial value of the beacon sequence number (macBSN)
pub const INITIAL_BEACON_SEQUENCE: u8 = 1;

/// Broadcast PAN identifier
pub const BROADCAST_PAN_ID: u16 = 0xFFFF;

/// IEEE 802.15.4 frame type, from the low three frame control bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Beacon,
    Data,
    Ack,
    Command,
    /// Reserved or unsupported frame type (4..=7)
    Unknown(u8),
}

impl From<u8> for FrameType {
    /// Decode the frame type from the first frame control byte
    fn from(frame_control: u8) -> Self {
        match frame_control & FRAME_TYPE_MASK {
            0b000 => FrameType::Beacon,
            0b001 => FrameType::Data,
            0b010 => FrameType::Ack,
            0b011 => FrameType::Command,
            other => FrameType::Unknown(other),
        }
    }
}

/// MAC command identifier (802.15.4-2006, table 82)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    AssociationRequest,
    AssociationResponse,
    DisassociationNotification,
    DataRequest,
    PanIdConflictNotification,
    OrphanNotification,
    BeaconRequest,
    CoordinatorRealignment,
    GtsRequest,
    Unknown(u8),
}

impl From<u8> for CommandType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => CommandType::AssociationRequest,
            0x02 => CommandType::AssociationResponse,
            0x03 => CommandType::DisassociationNotification,
            0x04 => CommandType::DataRequest,
            0x05 => CommandType::PanIdConflictNotification,
            0x06 => CommandType::OrphanNotification,
            0x07 => CommandType::BeaconRequest,
            0x08 => CommandType::CoordinatorRealignment,
            0x09 => CommandType::GtsRequest,
            other => CommandType::Unknown(other),
        }
    }
}

/// Coordinator source address, short or extended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceAddress {
    Short(u16),
    Extended(u64),
}

impl SourceAddress {
    /// Second frame control byte announcing this addressing mode
    pub fn frame_control_high(&self) -> u8 {
        match self {
            SourceAddress::Short(_) => BEACON_FRAME_CONTROL_SHORT,
            SourceAddress::Extended(_) => BEACON_FRAME_CONTROL_EXTENDED,
        }
    }

    /// Serialized width of the address field in bytes
    pub fn width(&self) -> usize {
        match self {
            SourceAddress::Short(_) => 2,
            SourceAddress::Extended(_) => 8,
        }
    }

    /// Append the address, little-endian, to `buf`
    pub fn write_le(&self, buf: &mut Vec<u8>) {
        match self {
            SourceAddress::Short(addr) => buf.extend_from_slice(&addr.to_le_bytes()),
            SourceAddress::Extended(addr) => buf.extend_from_slice(&addr.to_le_bytes()),
        }
    }
}

/// Identity a coordinator announces in its beacons
///
/// Fixed at construction; the addressing mode and address width both come
/// from [`SourceAddress`], so they cannot disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanIdentity {
    /// 16-bit PAN identifier
    pub pan_id: u16,

    /// Coordinator source address
    pub source: SourceAddress,

    /// 64-bit extended PAN identifier (EPID)
    pub extended_pan_id: u64,
}

impl PanIdentity {
    /// Build an identity from the flat configuration options
    ///
    /// With `short_addressing` only the low 16 bits of `source_address`
    /// are kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use zigbee_link::zigbee::protocol::{PanIdentity, SourceAddress};
    ///
    /// let identity = PanIdentity::new(0xabcd, 0x1, true, 0xa);
    /// assert_eq!(identity.source, SourceAddress::Short(0x0001));
    /// ```
    pub fn new(pan_id: u16, source_address: u64, short_addressing: bool, extended_pan_id: u64) -> Self {
        let source = if short_addressing {
            SourceAddress::Short(source_address as u16)
        } else {
            SourceAddress::Extended(source_address)
        };

        Self {
            pan_id,
            source,
            extended_pan_id,
        }
    }

    /// Whether beacons carry a 2-byte short source address
    pub fn short_addressing(&self) -> bool {
        matches!(self.source, SourceAddress::Short(_))
    }
}
