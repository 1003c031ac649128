//! Core deterministic primitives.
//!
//! Fixed-width encodings shared by ruleset hashing, transcript hashing and
//! attestation digests. Nothing here depends on platform, locale or time.

pub mod address;
pub mod bytes;
pub mod hash;

// Re-export core types
pub use address::Address;
pub use bytes::{Bytes32, ParseBytesError};
pub use hash::{keccak256, WordHasher};
