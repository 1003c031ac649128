//! Match Transcript
//!
//! The ordered record of a match: a header fixing players, decks and
//! ruleset, plus the list of turns. Its content hash is the [`MatchId`].
//!
//! ## Encoding
//!
//! Same word discipline as the ruleset id (one 32-byte word per value):
//!
//! ```text
//! version            uint16
//! rulesetId          bytes32
//! seasonId           uint32
//! playerA            address
//! playerB            address
//! deckA[0..5]        uint64 x5
//! deckB[0..5]        uint64 x5
//! firstPlayer        uint8
//! deadline           uint64
//! salt               bytes32
//! turnCount          uint8
//! per turn:
//!   cell             uint8
//!   cardIndex        uint8
//!   hasWarningMark   bool
//!   warningMarkCell  uint8   (0 when absent)
//!   hasEarthBoost    bool
//!   earthBoostEdge   uint8   (0 when absent)
//!   reserved         uint8
//! ```
//!
//! Optional fields carry their own presence word, so no in-range value can
//! collide with "absent".
//!
//! `MatchId = keccak256(<words>)`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Address, Bytes32, WordHasher};
use crate::ruleset::RulesetId;

/// 32-byte match identifier.
pub type MatchId = Bytes32;

/// Current transcript version.
pub const TRANSCRIPT_VERSION: u16 = 1;

/// Cards per deck.
pub const DECK_SIZE: usize = 5;

/// Cells on the 3x3 board.
pub const BOARD_CELLS: u8 = 9;

/// A full match places one card per cell.
pub const MAX_TURNS: usize = BOARD_CELLS as usize;

/// Edges per card (up, right, down, left).
pub const CARD_EDGES: u8 = 4;

/// Words in a header encoding.
pub const HEADER_WORD_COUNT: usize = 8 + 2 * DECK_SIZE;

/// Words per encoded turn.
pub const TURN_WORD_COUNT: usize = 7;

/// Transcript header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptHeader {
    /// Transcript format version.
    pub version: u16,
    /// Ruleset the match is played under.
    pub ruleset_id: RulesetId,
    /// Ladder season.
    pub season_id: u32,
    /// First participant.
    pub player_a: Address,
    /// Second participant.
    pub player_b: Address,
    /// Player A's card token ids.
    pub deck_a: [u64; DECK_SIZE],
    /// Player B's card token ids.
    pub deck_b: [u64; DECK_SIZE],
    /// 0 = A moves first, 1 = B moves first.
    pub first_player: u8,
    /// Unix deadline for the match.
    pub deadline: u64,
    /// Per-match salt making otherwise identical matches distinct.
    pub salt: Bytes32,
}

/// One placed card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// Board cell 0..=8, row-major.
    pub cell: u8,
    /// Index into the mover's deck.
    pub card_index: u8,
    /// Cell marked with a warning mark this turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_mark_cell: Option<u8>,
    /// Edge boosted by an earth card this turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earth_boost_edge: Option<u8>,
    /// Reserved for future turn flags; hashed as-is.
    #[serde(default)]
    pub reserved: u8,
}

impl Turn {
    /// A plain placement.
    pub fn place(cell: u8, card_index: u8) -> Self {
        Self {
            cell,
            card_index,
            warning_mark_cell: None,
            earth_boost_edge: None,
            reserved: 0,
        }
    }
}

/// Complete match transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    /// Match header.
    pub header: TranscriptHeader,
    /// Turns in play order.
    pub turns: Vec<Turn>,
}

/// Structural problems in a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    /// Unsupported transcript version.
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version.
        expected: u16,
        /// Version in the header.
        got: u16,
    },
    /// Both seats hold the same address.
    #[error("playerA and playerB are the same address")]
    SamePlayers,
    /// `firstPlayer` is neither 0 nor 1.
    #[error("invalid firstPlayer {0}")]
    InvalidFirstPlayer(u8),
    /// More turns than board cells.
    #[error("too many turns: {0}")]
    TooManyTurns(usize),
    /// Cell outside the board.
    #[error("turn {turn}: cell {cell} is off the board")]
    InvalidCell {
        /// Turn index.
        turn: usize,
        /// Offending cell.
        cell: u8,
    },
    /// Cell played twice.
    #[error("turn {turn}: cell {cell} is already occupied")]
    CellOccupied {
        /// Turn index.
        turn: usize,
        /// Offending cell.
        cell: u8,
    },
    /// Card index outside the deck, or reused.
    #[error("turn {turn}: card index {card_index} is invalid or already used")]
    InvalidCard {
        /// Turn index.
        turn: usize,
        /// Offending index.
        card_index: u8,
    },
    /// Warning mark outside the board.
    #[error("turn {turn}: warning mark cell {cell} is off the board")]
    InvalidWarningMark {
        /// Turn index.
        turn: usize,
        /// Offending cell.
        cell: u8,
    },
    /// Earth boost edge outside 0..=3.
    #[error("turn {turn}: earth boost edge {edge} is invalid")]
    InvalidEarthEdge {
        /// Turn index.
        turn: usize,
        /// Offending edge.
        edge: u8,
    },
}

impl Transcript {
    /// Create a transcript with no turns yet.
    pub fn new(header: TranscriptHeader) -> Self {
        Self { header, turns: Vec::new() }
    }

    /// Append a turn.
    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Whether every cell has been played.
    pub fn is_complete(&self) -> bool {
        self.turns.len() == MAX_TURNS
    }

    /// Seat (0 = A, 1 = B) that plays turn `index`.
    pub fn mover(&self, index: usize) -> u8 {
        ((self.header.first_player as usize + index) % 2) as u8
    }

    /// Content hash of this transcript.
    pub fn match_id(&self) -> MatchId {
        match_id(self)
    }

    /// Check structural validity.
    ///
    /// Hashing never requires this; it is for importers that want to refuse
    /// obviously corrupt transcripts early.
    pub fn validate(&self) -> Result<(), TranscriptError> {
        let header = &self.header;
        if header.version != TRANSCRIPT_VERSION {
            return Err(TranscriptError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: header.version,
            });
        }
        if header.player_a == header.player_b {
            return Err(TranscriptError::SamePlayers);
        }
        if header.first_player > 1 {
            return Err(TranscriptError::InvalidFirstPlayer(header.first_player));
        }
        if self.turns.len() > MAX_TURNS {
            return Err(TranscriptError::TooManyTurns(self.turns.len()));
        }

        let mut cells = BTreeSet::new();
        let mut cards: [BTreeSet<u8>; 2] = [BTreeSet::new(), BTreeSet::new()];

        for (index, turn) in self.turns.iter().enumerate() {
            if turn.cell >= BOARD_CELLS {
                return Err(TranscriptError::InvalidCell { turn: index, cell: turn.cell });
            }
            if !cells.insert(turn.cell) {
                return Err(TranscriptError::CellOccupied { turn: index, cell: turn.cell });
            }

            let seat = self.mover(index) as usize;
            if turn.card_index as usize >= DECK_SIZE || !cards[seat].insert(turn.card_index) {
                return Err(TranscriptError::InvalidCard {
                    turn: index,
                    card_index: turn.card_index,
                });
            }

            if let Some(cell) = turn.warning_mark_cell {
                if cell >= BOARD_CELLS {
                    return Err(TranscriptError::InvalidWarningMark { turn: index, cell });
                }
            }
            if let Some(edge) = turn.earth_boost_edge {
                if edge >= CARD_EDGES {
                    return Err(TranscriptError::InvalidEarthEdge { turn: index, edge });
                }
            }
        }

        Ok(())
    }
}

/// Write the header words into `hasher`.
fn encode_header(header: &TranscriptHeader, hasher: &mut WordHasher) {
    hasher.update_u16(header.version);
    hasher.update_bytes32(&header.ruleset_id);
    hasher.update_u32(header.season_id);
    hasher.update_address(&header.player_a);
    hasher.update_address(&header.player_b);
    for token_id in header.deck_a {
        hasher.update_u64(token_id);
    }
    for token_id in header.deck_b {
        hasher.update_u64(token_id);
    }
    hasher.update_u8(header.first_player);
    hasher.update_u64(header.deadline);
    hasher.update_bytes32(&header.salt);
}

/// Write one turn's words into `hasher`.
fn encode_turn(turn: &Turn, hasher: &mut WordHasher) {
    hasher.update_u8(turn.cell);
    hasher.update_u8(turn.card_index);
    encode_optional(turn.warning_mark_cell, hasher);
    encode_optional(turn.earth_boost_edge, hasher);
    hasher.update_u8(turn.reserved);
}

/// Presence word, then the value (0 when absent).
fn encode_optional(value: Option<u8>, hasher: &mut WordHasher) {
    hasher.update_bool(value.is_some());
    hasher.update_u8(value.unwrap_or(0));
}

/// Content hash of a transcript.
///
/// The turn count is bounded by the `u8` word it is written as; transcripts
/// longer than 255 turns are structurally invalid and saturate.
pub fn match_id(transcript: &Transcript) -> MatchId {
    let mut hasher = WordHasher::new();
    encode_header(&transcript.header, &mut hasher);

    debug_assert_eq!(hasher.word_count(), HEADER_WORD_COUNT);

    let turn_count = u8::try_from(transcript.turns.len()).unwrap_or(u8::MAX);
    hasher.update_u8(turn_count);
    for turn in &transcript.turns {
        encode_turn(turn, &mut hasher);
    }
    debug_assert_eq!(hasher.word_count(), HEADER_WORD_COUNT + 1 + transcript.turns.len() * TURN_WORD_COUNT);

    hasher.finalize()
}
