//! MAC address parsing and normalization. This is the single validation
//! gate: no unparsed MAC text reaches packet construction or the socket.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid MAC address '{0}'")]
pub struct InvalidMacAddress(pub String);

/// A validated 6-octet hardware address.
///
/// Accepts six two-hex-digit groups separated uniformly by `:` or `-`
/// (any hex case). Displays in the canonical stored form: uppercase,
/// colon-separated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = InvalidMacAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The separator after the first group decides the format; a mixed
        // separator string fails the per-group checks below.
        let separator = match s.chars().nth(2) {
            Some(c @ (':' | '-')) => c,
            _ => return Err(InvalidMacAddress(s.to_string())),
        };

        let groups: Vec<&str> = s.split(separator).collect();
        if groups.len() != 6 {
            return Err(InvalidMacAddress(s.to_string()));
        }

        let mut octets = [0u8; 6];
        for (i, group) in groups.iter().enumerate() {
            if group.len() != 2 || !group.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(InvalidMacAddress(s.to_string()));
            }
            octets[i] =
                u8::from_str_radix(group, 16).map_err(|_| InvalidMacAddress(s.to_string()))?;
        }

        Ok(MacAddress(octets))
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
