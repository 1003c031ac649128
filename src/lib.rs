//! # Triad Ledger
//!
//! Match integrity and ladder aggregation for Triad League card battles.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       TRIAD LEDGER                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── bytes.rs    - 32-byte ids, hex codec                    │
//! │  ├── address.rs  - 20-byte addresses, EIP-55 checksums       │
//! │  └── hash.rs     - Fixed-width word hashing (Keccak-256)     │
//! │                                                              │
//! │  ruleset/        - Ruleset identity                          │
//! │  ├── config.rs   - Partial author-supplied config            │
//! │  ├── codes.rs    - Closed enum code tables                   │
//! │  ├── canonical.rs- Defaults, neutralization, validation      │
//! │  └── hash.rs     - RulesetId encoding                        │
//! │                                                              │
//! │  proof/          - Match integrity                           │
//! │  ├── transcript.rs - Transcript model, MatchId               │
//! │  ├── attestation.rs- EIP-712 typed data and digest           │
//! │  ├── signer.rs   - secp256k1 signing and recovery            │
//! │  └── verify.rs   - MatchRecord verification                  │
//! │                                                              │
//! │  ladder/         - Season standings                          │
//! │  └── standings.rs- Dedup, tally, zero-sum check, ranking     │
//! │                                                              │
//! │  config.rs       - Environment configuration                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Every id and every ladder is a pure function of its inputs:
//! - All hashed values are fixed-width 32-byte words, never text
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - No randomness (signatures use RFC 6979 nonces)
//!
//! The same ruleset, transcript or batch of match records produces
//! **identical bytes** on any platform, and can be recomputed by a
//! contract or an auditor from the documented encodings alone.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod ladder;
pub mod proof;
pub mod ruleset;

// Re-export commonly used types
pub use crate::config::{ConfigError, LadderConfig};
pub use crate::core::{Address, Bytes32};
pub use ladder::{build_standings, Standing, StandingsOptions, StandingsReport};
pub use proof::{
    build_digest, build_typed_data, verify_match_record, LocalSigner, MatchRecord, SettledMatch,
    SigningDomain, Transcript,
};
pub use ruleset::{canonicalize, hash_config, CanonicalizationError, RulesetConfigInput, RulesetId};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
