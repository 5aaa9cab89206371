use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WolError;

/// Hardware address of the NIC to wake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[derive(Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const LEN: usize = 6;

    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Slice must be exactly six bytes long.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let octets: [u8; 6] = slice.try_into().ok()?;
        Some(Self(octets))
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

/// Checks for six two-digit hex groups joined by one separator, either all
/// `:` or all `-`. No surrounding whitespace, no other notation.
pub fn is_valid_mac(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 17 { return false; }

    let sep = bytes[2];
    if sep != b':' && sep != b'-' { return false; }

    bytes.chunks(3).all(|group| {
        group[0].is_ascii_hexdigit()
            && group[1].is_ascii_hexdigit()
            && (group.len() == 2 || group[2] == sep)
    })
}

impl FromStr for MacAddress {
    type Err = WolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WolError::InvalidMacFormat(s.to_string());

        let sep = s.chars().find(|c| *c == ':' || *c == '-').ok_or_else(invalid)?;
        let groups: Vec<&str> = s.split(sep).collect();
        if groups.len() != Self::LEN {
            return Err(invalid());
        }

        let mut octets = [0u8; 6];
        for (octet, group) in octets.iter_mut().zip(groups) {
            // from_str_radix tolerates a leading '+', so check digits ourselves
            if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(group, 16).map_err(|_| invalid())?;
        }

        Ok(Self(octets))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = WolError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}
