//! # Zigbee Link Library
//!
//! IEEE 802.15.4 link-layer blocks for a message-passing radio front end.
//!
//! This library provides the sample deframer, the 16-bit FCS codec and a
//! minimal PAN coordinator that answers beacon requests.

pub mod bus;
pub mod config;
pub mod error;
pub mod stream;
pub mod zigbee;
