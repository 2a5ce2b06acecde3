//! # IEEE 802.15.4 / Zigbee Module
//!
//! Link-layer protocol logic for the receive and reply path.
//!
//! This module handles:
//! - Frame type and command decoding
//! - 16-bit FCS calculation, validation and sealing
//! - Beacon construction
//! - Minimal PAN coordinator behavior

pub mod protocol;
pub mod crc;
pub mod codec;
pub mod beacon;
pub mod coordinator;
