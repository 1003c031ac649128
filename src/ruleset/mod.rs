//! Ruleset Identity
//!
//! Turns an author-supplied, possibly partial ruleset config into a stable
//! 32-byte [`RulesetId`]:
//!
//! ```text
//! RulesetConfigInput ──canonicalize──▶ CanonicalRuleset ──ruleset_id──▶ RulesetId
//!   (partial, JSON)      defaults,        (every field         fixed-width
//!                        neutralize,       concrete)           words + keccak
//!                        validate
//! ```
//!
//! Two configs that behave identically hash identically: omitted fields take
//! the documented default, disabled groups collapse to neutral values and the
//! harmony element set is order-free. Any invalid value in an enabled group
//! is a hard [`CanonicalizationError`]; nothing is clamped or guessed.

use std::fmt;

use thiserror::Error;

pub mod canonical;
pub mod codes;
pub mod config;
pub mod hash;

pub use canonical::{canonicalize, CanonicalRuleset, CLASSIC_RULESET, DEFAULT_RULESET};
pub use codes::{DiagonalStrength, TraitKind, TraitSource};
pub use config::RulesetConfigInput;
pub use hash::{hash_config, ruleset_id, RulesetId};

/// Integer domain of a ruleset field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntDomain {
    /// 0..=255
    U8,
    /// -128..=127
    I8,
}

impl IntDomain {
    /// Smallest allowed value.
    pub fn min(self) -> i64 {
        match self {
            Self::U8 => u8::MIN as i64,
            Self::I8 => i8::MIN as i64,
        }
    }

    /// Largest allowed value.
    pub fn max(self) -> i64 {
        match self {
            Self::U8 => u8::MAX as i64,
            Self::I8 => i8::MAX as i64,
        }
    }
}

impl fmt::Display for IntDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => write!(f, "u8 (0..=255)"),
            Self::I8 => write!(f, "i8 (-128..=127)"),
        }
    }
}

/// A ruleset config that cannot be canonicalized.
///
/// Always fatal: a ruleset that fails here must never be hashed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonicalizationError {
    /// Integer outside the field's domain.
    #[error("{field}: value {value} is outside the {domain} domain")]
    OutOfRange {
        /// Dotted field path.
        field: &'static str,
        /// Offending value as written.
        value: String,
        /// Declared domain.
        domain: IntDomain,
    },

    /// Number with a fractional part.
    #[error("{field}: value {value} is not an integer")]
    NotAnInteger {
        /// Dotted field path.
        field: &'static str,
        /// Offending value as written.
        value: String,
    },

    /// Name missing from the field's closed table.
    #[error("{field}: unrecognized value {value:?}")]
    UnknownVariant {
        /// Dotted field path.
        field: &'static str,
        /// Offending name.
        value: String,
    },

    /// Element set of the wrong size.
    #[error("{field}: expected exactly {expected} elements, got {got}")]
    ElementCount {
        /// Dotted field path.
        field: &'static str,
        /// Required size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// Element listed twice in a set.
    #[error("{field}: element {value:?} listed more than once")]
    DuplicateElement {
        /// Dotted field path.
        field: &'static str,
        /// Repeated name.
        value: String,
    },

    /// Input is not a ruleset config at all.
    #[error("malformed ruleset config: {0}")]
    Malformed(String),
}
