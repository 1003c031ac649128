//! Shared test builders: deterministic signers, complete transcripts and
//! dual-signed match records.

use crate::core::{Address, Bytes32};
use crate::proof::attestation::{EventSource, SettledMatch, SigningDomain};
use crate::proof::signer::{DigestSigner, LocalSigner};
use crate::proof::transcript::{Transcript, TranscriptHeader, Turn, MAX_TURNS, TRANSCRIPT_VERSION};
use crate::proof::verify::{MatchRecord, PlayerSide};
use crate::ruleset::{RulesetId, DEFAULT_RULESET};

pub const SEASON: u32 = 1;
pub const CHAIN_ID: u64 = 8453;

pub fn signer(seed: u8) -> LocalSigner {
    let mut secret = [0u8; 32];
    secret[31] = seed;
    LocalSigner::from_bytes(&secret).unwrap()
}

pub fn alice() -> LocalSigner {
    signer(1)
}

pub fn bob() -> LocalSigner {
    signer(2)
}

pub fn carol() -> LocalSigner {
    signer(3)
}

pub fn domain() -> SigningDomain {
    SigningDomain::new(CHAIN_ID, Address([0x5e; 20]))
}

pub fn ruleset() -> RulesetId {
    DEFAULT_RULESET.id()
}

/// A complete nine-turn game; `salt` keeps match ids distinct.
pub fn transcript(player_a: Address, player_b: Address, salt: u8) -> Transcript {
    let header = TranscriptHeader {
        version: TRANSCRIPT_VERSION,
        ruleset_id: ruleset(),
        season_id: SEASON,
        player_a,
        player_b,
        deck_a: [11, 12, 13, 14, 15],
        deck_b: [21, 22, 23, 24, 25],
        first_player: 0,
        deadline: 1_700_003_600,
        salt: Bytes32([salt; 32]),
    };

    let mut transcript = Transcript::new(header);
    for turn in 0..MAX_TURNS {
        transcript.push_turn(Turn::place(turn as u8, (turn / 2) as u8));
    }
    transcript
}

/// Settlement for `transcript`, emitted as log `log_index` of block 100.
pub fn settle(transcript: &Transcript, winner: Option<PlayerSide>, log_index: u32) -> SettledMatch {
    let header = &transcript.header;
    let (winner, tiles, deltas) = match winner {
        Some(PlayerSide::A) => (Some(header.player_a), (6, 3), (10, -10)),
        Some(PlayerSide::B) => (Some(header.player_b), (3, 6), (-10, 10)),
        None => (None, (4, 4), (0, 0)),
    };

    SettledMatch {
        match_id: transcript.match_id(),
        ruleset_id: header.ruleset_id,
        season_id: header.season_id,
        player_a: header.player_a,
        player_b: header.player_b,
        winner,
        tiles_a: tiles.0,
        tiles_b: tiles.1,
        points_delta_a: deltas.0,
        points_delta_b: deltas.1,
        replay_hash: Bytes32([0xee; 32]),
        settled_at: 1_700_000_000 + log_index as u64,
        source: EventSource {
            chain_id: CHAIN_ID,
            block_number: 100,
            tx_hash: Bytes32([log_index as u8; 32]),
            log_index,
        },
    }
}

/// Attach fresh signatures from `a` and `b` to a (possibly edited) record.
pub fn resign(record: MatchRecord, a: &LocalSigner, b: &LocalSigner) -> MatchRecord {
    sign(record.transcript, record.settled, a, b)
}

pub fn sign(transcript: Transcript, settled: SettledMatch, a: &LocalSigner, b: &LocalSigner) -> MatchRecord {
    let signature_a = a.sign_settlement(&domain(), &settled).unwrap();
    let signature_b = b.sign_settlement(&domain(), &settled).unwrap();
    MatchRecord { transcript, settled, signature_a, signature_b }
}

/// Fully valid record of `a` vs `b`.
pub fn record(a: &LocalSigner, b: &LocalSigner, winner: Option<PlayerSide>, log_index: u32) -> MatchRecord {
    let transcript = transcript(a.address(), b.address(), log_index as u8);
    let settled = settle(&transcript, winner, log_index);
    sign(transcript, settled, a, b)
}
