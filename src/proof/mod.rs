//! Match Integrity
//!
//! Proves that a published settlement belongs to a real, agreed match.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    MATCH INTEGRITY                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  transcript.rs   - Transcript model and MatchId hashing     │
//! │  attestation.rs  - EIP-712 typed data and digest            │
//! │  signer.rs       - secp256k1 signing and address recovery   │
//! │  verify.rs       - MatchRecord verification                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod attestation;
pub mod signer;
pub mod transcript;
pub mod verify;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export key types
pub use attestation::{
    build_digest, build_typed_data, AttestationMessage, EventSource, SettledMatch,
    SigningDomain, TypedData,
};
pub use signer::{
    address_of, DigestSigner, LocalSigner, Secp256k1Recovery, Signature65, SignerError,
    SignerRecovery,
};
pub use transcript::{match_id, MatchId, Transcript, TranscriptError, TranscriptHeader, Turn};
pub use verify::{
    verify_match_record, verify_match_record_with, MatchRecord, PlayerSide, SignatureFault,
    VerificationError, VerifiedSettledMatch,
};
