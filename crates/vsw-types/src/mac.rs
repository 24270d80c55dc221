//! MAC address type and learning-table fingerprint.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 48-bit Ethernet MAC address, written `02:00:00:00:00:01` (hyphens are
/// accepted on input).
///
/// ```
/// use vsw_types::MacAddress;
///
/// let station: MacAddress = "02-00-00-00-00-0a".parse().unwrap();
/// assert_eq!(station.to_string(), "02:00:00:00:00:0a");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        MacAddress(octets)
    }

    /// Takes the leading six octets of `bytes`, or `None` when the slice is
    /// shorter.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let octets: [u8; 6] = bytes.get(..6)?.try_into().ok()?;
        Some(MacAddress(octets))
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn fingerprint(&self) -> MacFingerprint {
        MacFingerprint::of(self)
    }

    /// Group bit of the first octet.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, octet) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{octet:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidMacAddress(text.to_string());
        let mut octets = [0u8; 6];
        let mut fields = text.split([':', '-']);

        for slot in octets.iter_mut() {
            let field = fields.next().ok_or_else(invalid)?;
            if field.is_empty() || field.len() > 2 || !field.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *slot = u8::from_str_radix(field, 16).map_err(|_| invalid())?;
        }
        if fields.next().is_some() {
            return Err(invalid());
        }
        Ok(MacAddress(octets))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

/// Reduced 32-bit key of a MAC address used by the learning table.
///
/// The first four octets are laid out as a native-endian `u32` and the last
/// two octets are added to it. Distinct addresses can fold to the same
/// fingerprint; such addresses share one table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacFingerprint(u32);

impl MacFingerprint {
    /// Folds `mac` into its fingerprint.
    pub fn of(mac: &MacAddress) -> Self {
        let b = mac.as_bytes();
        let head = u32::from_ne_bytes([b[0], b[1], b[2], b[3]]);
        MacFingerprint(
            head.wrapping_add(u32::from(b[4]))
                .wrapping_add(u32::from(b[5])),
        )
    }

    /// Wraps a raw fingerprint value.
    pub const fn from_raw(raw: u32) -> Self {
        MacFingerprint(raw)
    }

    /// Returns the raw 32-bit value.
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for MacFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<&MacAddress> for MacFingerprint {
    fn from(mac: &MacAddress) -> Self {
        MacFingerprint::of(mac)
    }
}
