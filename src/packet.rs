use crate::common::{wol_payload_target, MAGIC_PACKET_LEN, SYNC_STREAM};
use crate::mac::MacAddress;

/// The 102 byte WoL payload: six 0xff followed by the target MAC sixteen times.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MagicPacket {
    target: MacAddress,
    bytes: [u8; MAGIC_PACKET_LEN],
}

impl MagicPacket {
    pub fn new(mac: &MacAddress) -> Self {
        let mut bytes = [0u8; MAGIC_PACKET_LEN];
        bytes[..SYNC_STREAM.len()].copy_from_slice(&SYNC_STREAM);

        for window in bytes[SYNC_STREAM.len()..].chunks_exact_mut(MacAddress::LEN) {
            window.copy_from_slice(mac.as_bytes());
        }

        debug_assert_eq!(wol_payload_target(&bytes), Some(*mac));
        Self { target: *mac, bytes }
    }

    pub fn target(&self) -> MacAddress {
        self.target
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl AsRef<[u8]> for MagicPacket {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for MagicPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagicPacket")
            .field("target", &self.target())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MAC_REPETITIONS;

    #[test]
    fn layout_for_known_mac() {
        let mac = MacAddress::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        let packet = MagicPacket::new(&mac);
        let bytes = packet.as_bytes();

        assert_eq!(bytes.len(), 102);
        assert_eq!(&bytes[..6], &[0xFF; 6]);
        for rep in bytes[6..].chunks(6) {
            assert_eq!(rep, &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        }
        assert_eq!(bytes[6..].chunks(6).count(), MAC_REPETITIONS);
    }

    #[test]
    fn length_independent_of_mac() {
        for mac in [[0u8; 6], [0xff; 6], [0x01, 0x23, 0x45, 0x67, 0x89, 0xab]] {
            assert_eq!(MagicPacket::new(&MacAddress::new(mac)).len(), 102);
        }
    }

    #[test]
    fn all_ff_mac_is_still_well_formed() {
        let packet = MagicPacket::new(&MacAddress::new([0xff; 6]));
        assert!(packet.as_bytes().iter().all(|b| *b == 0xff));
        assert_eq!(packet.target(), MacAddress::new([0xff; 6]));
    }

    #[test]
    fn inspector_recovers_target() {
        let mac = MacAddress::new([0x10, 0x20, 0x30, 0x40, 0x50, 0x60]);
        let packet = MagicPacket::new(&mac);
        assert_eq!(wol_payload_target(packet.as_bytes()), Some(mac));
        assert_eq!(packet.target(), mac);
    }
}
