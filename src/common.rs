use crate::mac::MacAddress;

/// Leading synchronization stream of every magic packet.
pub const SYNC_STREAM: [u8; 6] = [ 0xff, 0xff, 0xff, 0xff, 0xff, 0xff ];

/// How often the target MAC is repeated after the sync stream.
pub const MAC_REPETITIONS: usize = 16;

pub const MAGIC_PACKET_LEN: usize = SYNC_STREAM.len() + MAC_REPETITIONS * MacAddress::LEN;

/// Conventional WoL port (discard).
pub const DEFAULT_PORT: u16 = 9;

pub const DEFAULT_DESTINATION: &str = "192.168.1.255";


/// Returns the target MAC if `payload` starts with a well-formed magic packet.
pub fn wol_payload_target(payload: &[u8]) -> Option<MacAddress> {
    if payload.len() < MAGIC_PACKET_LEN { return None; }

    let (sync, reps) = payload[..MAGIC_PACKET_LEN].split_at(SYNC_STREAM.len());
    if sync != SYNC_STREAM {
        return None;
    }

    let target = &reps[..MacAddress::LEN];
    if !reps.chunks_exact(MacAddress::LEN).all(|block| block == target) {
        return None;
    }

    MacAddress::from_slice(target)
}
