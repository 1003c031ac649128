//! Fixed-Size Byte Strings
//!
//! 32-byte digests (ruleset ids, match ids, tx hashes, salts) travel between
//! match clients, indexers and auditors as `0x`-prefixed hex. Parsing is
//! case-insensitive; output is always lowercase.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors from parsing a hex byte string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseBytesError {
    /// Wrong number of hex digits.
    #[error("expected {expected} hex digits, got {got}")]
    Length {
        /// Expected digit count.
        expected: usize,
        /// Actual digit count.
        got: usize,
    },
    /// Non-hex character.
    #[error("invalid hex: {0}")]
    Hex(String),
}

/// Decode an optionally `0x`-prefixed hex string into exactly `N` bytes.
pub fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseBytesError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    if digits.len() != N * 2 {
        return Err(ParseBytesError::Length {
            expected: N * 2,
            got: digits.len(),
        });
    }

    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out).map_err(|e| ParseBytesError::Hex(e.to_string()))?;
    Ok(out)
}

/// A 32-byte value (digest, identifier, salt).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Bytes32(pub [u8; 32]);

impl Bytes32 {
    /// All-zero value.
    pub const ZERO: Bytes32 = Bytes32([0; 32]);

    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// First four bytes as hex, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl From<[u8; 32]> for Bytes32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes32({})", self.to_hex())
    }
}

impl FromStr for Bytes32 {
    type Err = ParseBytesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<32>(s).map(Self)
    }
}

impl Serialize for Bytes32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Bytes32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_mixed_case_and_prefix() {
        let lower = format!("0x{}", "ab".repeat(32));
        let upper = format!("0X{}", "AB".repeat(32));
        let bare = "Ab".repeat(32);

        let a: Bytes32 = lower.parse().unwrap();
        let b: Bytes32 = upper.parse().unwrap();
        let c: Bytes32 = bare.parse().unwrap();

        assert_eq!(a, Bytes32([0xab; 32]));
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.to_string(), lower);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let err = "0x1234".parse::<Bytes32>().unwrap_err();
        assert_eq!(err, ParseBytesError::Length { expected: 64, got: 4 });
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let s = format!("0x{}", "zz".repeat(32));
        assert!(matches!(s.parse::<Bytes32>(), Err(ParseBytesError::Hex(_))));
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let value = Bytes32([7; 32]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "07".repeat(32)));

        let back: Bytes32 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
