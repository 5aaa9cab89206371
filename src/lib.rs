//! Wake-on-LAN magic packet sender.
//!
//! [`send_wake_on_lan`] validates a MAC address, builds the 102 byte magic
//! packet and fires it as a single UDP datagram, typically at a broadcast
//! address. Everything around it (named hosts, remembered values, interface
//! broadcast lookup) lives in the supporting modules and is used by the
//! `wol-send` binary.

pub mod common;
pub mod config;
pub mod error;
pub mod iface;
pub mod mac;
pub mod packet;
pub mod sender;
pub mod store;

pub use error::{TransmitStage, WolError};
pub use mac::{is_valid_mac, MacAddress};
pub use packet::MagicPacket;
pub use sender::{
    parse_port, send_magic_packet, send_magic_packet_async, send_wake_on_lan,
    send_wake_on_lan_async, Destination,
};
