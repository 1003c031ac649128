//! Player and Contract Addresses
//!
//! 20-byte account addresses. Input is accepted in any letter case; the
//! canonical text form is the EIP-55 mixed-case checksum encoding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::bytes::{decode_fixed, ParseBytesError};
use super::hash::keccak256;

/// A 20-byte account address.
///
/// Ordering is by raw bytes, which matches ascending lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (used for "no winner").
    pub const ZERO: Address = Address([0; 20]);

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 20]
    }

    /// EIP-55 checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let byte = hash.0[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// First four bytes as hex, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = ParseBytesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<20>(s).map(Self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EIP55_VECTORS: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn test_checksum_vectors() {
        for vector in EIP55_VECTORS {
            let parsed: Address = vector.to_lowercase().parse().unwrap();
            assert_eq!(parsed.to_checksum(), vector);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let mixed: Address = EIP55_VECTORS[0].parse().unwrap();
        let lower: Address = EIP55_VECTORS[0].to_lowercase().parse().unwrap();
        let upper: Address = EIP55_VECTORS[0].to_uppercase().replace("0X", "0x").parse().unwrap();

        assert_eq!(mixed, lower);
        assert_eq!(mixed, upper);
    }

    #[test]
    fn test_ordering_matches_lowercase_hex() {
        let a: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
        let b: Address = "0x00000000000000000000000000000000000000AB".parse().unwrap();
        assert!(a < b);
        assert!(a.to_string().to_lowercase() < b.to_string().to_lowercase());
    }

    #[test]
    fn test_serde_roundtrip_uses_checksum() {
        let address: Address = EIP55_VECTORS[1].to_lowercase().parse().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", EIP55_VECTORS[1]));
    }
}
