//! Season Ladder
//!
//! Folds dual-signed match records into a ranked season table.
//!
//! Per-record problems (bad signature, wrong season, conflicting replay of a
//! chain event) reject that record and are reported; the batch always
//! completes. A non-zero points total is surfaced next to the standings,
//! not instead of them.

use serde::Serialize;
use thiserror::Error;

use crate::proof::{EventSource, VerificationError};
use crate::ruleset::RulesetId;

pub mod standings;

pub use standings::{
    build_standings, build_standings_with, Rejection, Standing, StandingsOptions, StandingsReport,
};

/// Why a single record was left out of the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The record failed verification.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// The record belongs to another season.
    #[error("seasonId mismatch: expected {expected}, got {got}")]
    SeasonMismatch {
        /// Season the batch is for.
        expected: u32,
        /// Season on the record.
        got: u32,
    },

    /// The record was played under another ruleset.
    #[error("rulesetId mismatch: expected {expected}, got {got}")]
    RulesetMismatch {
        /// Ruleset the batch is for.
        expected: RulesetId,
        /// Ruleset on the record.
        got: RulesetId,
    },

    /// Same chain event, different settlement.
    #[error("conflicting duplicate event source (block {}, log {})", .event.block_number, .event.log_index)]
    ConflictingDuplicate {
        /// The contested event.
        event: EventSource,
    },
}

impl RecordError {
    /// Whether this is a season or ruleset filter rejection.
    pub fn is_filter_mismatch(&self) -> bool {
        matches!(self, Self::SeasonMismatch { .. } | Self::RulesetMismatch { .. })
    }
}

/// Accepted records whose points do not net to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("points are not zero-sum: accepted records net {net_points}")]
pub struct InvariantViolation {
    /// Sum of every pointsDelta across accepted records.
    pub net_points: i64,
}
