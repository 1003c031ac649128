//! Fixed-Width Word Hashing
//!
//! Deterministic hashing for ruleset ids, match ids and attestation digests:
//! - every value is written as one 32-byte big-endian word
//! - unsigned values are zero-extended, signed values sign-extended
//! - the digest is Keccak-256
//!
//! The hashed byte stream is exactly Solidity's `abi.encode(...)` over the
//! same list of static types, so a contract (or any other implementation)
//! recomputes the identical digest without access to this crate.

use sha3::{Digest, Keccak256};

use super::address::Address;
use super::bytes::Bytes32;

/// Size of one encoded word.
pub const WORD_SIZE: usize = 32;

/// Streaming hasher over fixed-width words.
///
/// Order of updates is the encoding; callers document their field order.
pub struct WordHasher {
    hasher: Keccak256,
    words: usize,
}

impl Default for WordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl WordHasher {
    /// Create an empty hasher.
    pub fn new() -> Self {
        Self {
            hasher: Keccak256::new(),
            words: 0,
        }
    }

    /// Update with a raw word.
    #[inline]
    pub fn update_word(&mut self, word: &[u8; WORD_SIZE]) {
        self.hasher.update(word);
        self.words += 1;
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.update_u64(value as u64);
    }

    /// Update with a u16 value.
    #[inline]
    pub fn update_u16(&mut self, value: u16) {
        self.update_u64(value as u64);
    }

    /// Update with a u32 value.
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.update_u64(value as u64);
    }

    /// Update with a u64 value.
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.update_word(&u64_word(value));
    }

    /// Update with an i8 value.
    #[inline]
    pub fn update_i8(&mut self, value: i8) {
        self.update_i64(value as i64);
    }

    /// Update with an i32 value.
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.update_i64(value as i64);
    }

    /// Update with an i64 value.
    #[inline]
    pub fn update_i64(&mut self, value: i64) {
        self.update_word(&i64_word(value));
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a 32-byte value.
    #[inline]
    pub fn update_bytes32(&mut self, value: &Bytes32) {
        self.update_word(value.as_bytes());
    }

    /// Update with an address (left-padded to a word).
    #[inline]
    pub fn update_address(&mut self, address: &Address) {
        let mut word = [0u8; WORD_SIZE];
        word[12..].copy_from_slice(address.as_bytes());
        self.update_word(&word);
    }

    /// Number of words written so far.
    pub fn word_count(&self) -> usize {
        self.words
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> Bytes32 {
        Bytes32(self.hasher.finalize().into())
    }
}

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> Bytes32 {
    Bytes32(Keccak256::digest(data).into())
}

/// Zero-extended big-endian word.
pub fn u64_word(value: u64) -> [u8; WORD_SIZE] {
    let mut word = [0u8; WORD_SIZE];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Sign-extended big-endian word.
pub fn i64_word(value: i64) -> [u8; WORD_SIZE] {
    let fill = if value < 0 { 0xff } else { 0x00 };
    let mut word = [fill; WORD_SIZE];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

// =============================================================================
// TESTS
// =============================================================================
