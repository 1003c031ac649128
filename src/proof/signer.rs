//! Attestation Signatures
//!
//! 65-byte recoverable secp256k1 signatures (`r ‖ s ‖ v`) over a raw
//! 32-byte digest, and recovery of the signing address from them.
//!
//! Signing and recovery sit behind two narrow traits so the verifier and the
//! ladder never touch curve types directly:
//!
//! - [`DigestSigner`]: who am I, sign this digest
//! - [`SignerRecovery`]: who signed this digest
//!
//! Recovery rules:
//! - `v` may be written as 0/1 or 27/28
//! - `s` must be in the lower half of the curve order (high-s is refused,
//!   so each attestation has exactly one valid encoding)
//! - the address is the last 20 bytes of keccak256 of the uncompressed
//!   public key without its `0x04` tag

use std::fmt;
use std::str::FromStr;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::core::bytes::{decode_fixed, ParseBytesError};
use crate::core::{keccak256, Address, Bytes32};
use crate::proof::attestation::{build_digest, SettledMatch, SigningDomain};

/// Signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 65;

/// Offset added to the recovery id in the emitted `v` byte.
const V_OFFSET: u8 = 27;

/// Signature errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// `v` is not one of 0, 1, 27, 28.
    #[error("invalid recovery id v={0}")]
    InvalidRecoveryId(u8),
    /// `r` or `s` is zero or not a valid scalar.
    #[error("malformed signature")]
    MalformedSignature,
    /// `s` is in the upper half of the curve order.
    #[error("non-canonical signature (high s)")]
    HighS,
    /// No public key recovers from this signature and digest.
    #[error("public key recovery failed")]
    RecoveryFailed,
    /// The signing backend refused the digest.
    #[error("signing failed: {0}")]
    SigningFailed(String),
    /// Private key bytes are not a valid scalar.
    #[error("invalid private key")]
    InvalidKey,
}

/// Recoverable signature `r ‖ s ‖ v`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature65(pub [u8; SIGNATURE_LENGTH]);

impl Signature65 {
    /// The `r ‖ s` half.
    pub fn rs(&self) -> &[u8] {
        &self.0[..64]
    }

    /// The `v` byte as written.
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Signature65 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Signature65 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature65({})", self)
    }
}

impl FromStr for Signature65 {
    type Err = ParseBytesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<SIGNATURE_LENGTH>(s).map(Self)
    }
}

impl Serialize for Signature65 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Signature65 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Something that can sign a 32-byte digest.
pub trait DigestSigner {
    /// Address whose key produces the signatures.
    fn address(&self) -> Address;

    /// Sign a raw digest (no message prefixing).
    fn sign_digest(&self, digest: &Bytes32) -> Result<Signature65, SignerError>;
}

/// Something that can tell who signed a digest.
pub trait SignerRecovery: Send + Sync {
    /// Recover the signing address.
    fn recover(&self, digest: &Bytes32, signature: &Signature65) -> Result<Address, SignerError>;
}

/// Address of a secp256k1 public key.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.as_affine().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash.as_bytes()[12..]);
    Address(address)
}

/// In-process signer holding a secp256k1 private key.
#[derive(Clone)]
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    /// Create a signer from a 32-byte private key.
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self, SignerError> {
        let key = SigningKey::from_slice(secret).map_err(|_| SignerError::InvalidKey)?;
        let address = address_of(key.verifying_key());
        Ok(Self { key, address })
    }

    /// Sign the attestation digest of a settlement.
    pub fn sign_settlement(
        &self,
        domain: &SigningDomain,
        settled: &SettledMatch,
    ) -> Result<Signature65, SignerError> {
        self.sign_digest(&build_digest(domain, settled))
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl DigestSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_digest(&self, digest: &Bytes32) -> Result<Signature65, SignerError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| SignerError::SigningFailed(e.to_string()))?;

        // Flipping s to the low half flips the parity of R.
        let (signature, recovery_id) = match signature.normalize_s() {
            Some(low) => (
                low,
                RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
            ),
            None => (signature, recovery_id),
        };

        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = V_OFFSET + recovery_id.to_byte();
        Ok(Signature65(out))
    }
}

/// Default recovery backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct Secp256k1Recovery;

impl SignerRecovery for Secp256k1Recovery {
    fn recover(&self, digest: &Bytes32, signature: &Signature65) -> Result<Address, SignerError> {
        let v = match signature.v() {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - V_OFFSET,
            other => return Err(SignerError::InvalidRecoveryId(other)),
        };
        let recovery_id = RecoveryId::from_byte(v).ok_or(SignerError::InvalidRecoveryId(signature.v()))?;

        let parsed = Signature::from_slice(signature.rs()).map_err(|_| SignerError::MalformedSignature)?;
        if parsed.normalize_s().is_some() {
            return Err(SignerError::HighS);
        }

        let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &parsed, recovery_id)
            .map_err(|_| SignerError::RecoveryFailed)?;
        Ok(address_of(&key))
    }
}
