//! Match Record Verification
//!
//! A [`MatchRecord`] is trusted only if all of the following hold:
//!
//! 1. the transcript hashes to the settlement's `matchId`, and the settlement
//!    repeats the transcript header's ruleset, season and players
//! 2. `signatureA` recovers to `playerA` and `signatureB` to `playerB`,
//!    both over the attestation digest for the given [`SigningDomain`]
//! 3. the settlement is internally sane: the winner is a participant or
//!    nobody, and at most nine cells are claimed
//!
//! Checks run in that order and stop at the first failure.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::{Address, Bytes32};
use crate::proof::attestation::{build_digest, SettledMatch, SigningDomain};
use crate::proof::signer::{Secp256k1Recovery, Signature65, SignerError, SignerRecovery};
use crate::proof::transcript::{Transcript, BOARD_CELLS};

/// A settled match with its transcript and both players' attestations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// Full match transcript.
    pub transcript: Transcript,
    /// Published outcome.
    pub settled: SettledMatch,
    /// Player A's attestation signature.
    pub signature_a: Signature65,
    /// Player B's attestation signature.
    pub signature_b: Signature65,
}

/// Which seat a signature belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerSide {
    /// Player A.
    A,
    /// Player B.
    B,
}

impl fmt::Display for PlayerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Why a signature failed to match its player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureFault {
    /// Valid signature, wrong key.
    WrongSigner {
        /// Address that actually signed.
        recovered: Address,
    },
    /// No signer could be recovered.
    Unrecoverable(SignerError),
}

impl fmt::Display for SignatureFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongSigner { recovered } => write!(f, "recovered {}", recovered),
            Self::Unrecoverable(e) => write!(f, "{}", e),
        }
    }
}

/// Reasons a match record is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Transcript and settlement disagree.
    #[error("integrity mismatch: {0}")]
    IntegrityMismatch(String),

    /// An attestation was not produced by the player it claims.
    #[error("signature{side} does not match player{side}: {fault}")]
    SignatureMismatch {
        /// Seat whose signature failed.
        side: PlayerSide,
        /// What went wrong.
        fault: SignatureFault,
    },

    /// Settlement values that cannot describe a real match.
    #[error("malformed settlement: {0}")]
    MalformedSettlement(String),
}

/// A settlement that passed [`verify_match_record`].
///
/// Only this module constructs it, so holding one is proof the checks ran.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VerifiedSettledMatch(SettledMatch);

impl VerifiedSettledMatch {
    /// Unwrap the settlement.
    pub fn into_inner(self) -> SettledMatch {
        self.0
    }
}

impl Deref for VerifiedSettledMatch {
    type Target = SettledMatch;

    fn deref(&self) -> &SettledMatch {
        &self.0
    }
}

/// Verify a record with the default secp256k1 recovery.
pub fn verify_match_record(
    record: &MatchRecord,
    domain: &SigningDomain,
) -> Result<VerifiedSettledMatch, VerificationError> {
    verify_match_record_with(record, domain, &Secp256k1Recovery)
}

/// Verify a record with a caller-supplied recovery backend.
pub fn verify_match_record_with(
    record: &MatchRecord,
    domain: &SigningDomain,
    recovery: &dyn SignerRecovery,
) -> Result<VerifiedSettledMatch, VerificationError> {
    let result = check_integrity(record)
        .and_then(|()| check_signatures(record, domain, recovery))
        .and_then(|()| check_settlement(&record.settled));

    match result {
        Ok(()) => Ok(VerifiedSettledMatch(normalize(&record.settled))),
        Err(e) => {
            debug!("Match {} rejected: {}", record.settled.match_id.short(), e);
            Err(e)
        }
    }
}

fn check_integrity(record: &MatchRecord) -> Result<(), VerificationError> {
    let settled = &record.settled;
    let computed = record.transcript.match_id();
    if computed != settled.match_id {
        return Err(VerificationError::IntegrityMismatch(format!(
            "transcript matchId mismatch: computed {}, settled {}",
            computed.short(),
            settled.match_id.short()
        )));
    }

    let header = &record.transcript.header;
    let field = if header.ruleset_id != settled.ruleset_id {
        Some("rulesetId")
    } else if header.season_id != settled.season_id {
        Some("seasonId")
    } else if header.player_a != settled.player_a {
        Some("playerA")
    } else if header.player_b != settled.player_b {
        Some("playerB")
    } else {
        None
    };

    match field {
        Some(field) => Err(VerificationError::IntegrityMismatch(format!(
            "transcript header mismatch: {}",
            field
        ))),
        None => Ok(()),
    }
}

fn check_signatures(
    record: &MatchRecord,
    domain: &SigningDomain,
    recovery: &dyn SignerRecovery,
) -> Result<(), VerificationError> {
    let digest = build_digest(domain, &record.settled);
    check_signer(&digest, &record.signature_a, record.settled.player_a, PlayerSide::A, recovery)?;
    check_signer(&digest, &record.signature_b, record.settled.player_b, PlayerSide::B, recovery)
}

fn check_signer(
    digest: &Bytes32,
    signature: &Signature65,
    expected: Address,
    side: PlayerSide,
    recovery: &dyn SignerRecovery,
) -> Result<(), VerificationError> {
    let fault = match recovery.recover(digest, signature) {
        Ok(recovered) if recovered == expected => return Ok(()),
        Ok(recovered) => SignatureFault::WrongSigner { recovered },
        Err(e) => SignatureFault::Unrecoverable(e),
    };
    Err(VerificationError::SignatureMismatch { side, fault })
}

fn check_settlement(settled: &SettledMatch) -> Result<(), VerificationError> {
    if settled.player_a == settled.player_b {
        return Err(VerificationError::MalformedSettlement(
            "playerA and playerB are the same address".to_string(),
        ));
    }

    if let Some(winner) = settled.winner {
        if !winner.is_zero() && winner != settled.player_a && winner != settled.player_b {
            return Err(VerificationError::MalformedSettlement(format!(
                "winner {} is not a participant",
                winner
            )));
        }
    }

    let tiles = settled.tiles_a as u16 + settled.tiles_b as u16;
    if tiles > BOARD_CELLS as u16 {
        return Err(VerificationError::MalformedSettlement(format!(
            "tilesA + tilesB = {} exceeds {} cells",
            tiles, BOARD_CELLS
        )));
    }

    Ok(())
}

/// Canonical view of an accepted settlement.
///
/// Addresses already print in checksum form; the only rewrite is a zero
/// winner, which means a draw.
fn normalize(settled: &SettledMatch) -> SettledMatch {
    let mut normalized = settled.clone();
    normalized.winner = settled.winner.filter(|w| !w.is_zero());
    normalized
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::fixtures::{self, alice, bob, carol};
    use crate::proof::signer::DigestSigner;

    #[test]
    fn test_valid_record_verifies() {
        let record = fixtures::record(&alice(), &bob(), Some(PlayerSide::A), 0);
        let verified = verify_match_record(&record, &fixtures::domain()).unwrap();

        assert_eq!(verified.winner, Some(alice().address()));
        assert_eq!(verified.into_inner(), record.settled);
    }

    #[test]
    fn test_draw_verifies() {
        let record = fixtures::record(&alice(), &bob(), None, 0);
        let verified = verify_match_record(&record, &fixtures::domain()).unwrap();
        assert!(verified.is_draw());
    }

    #[test]
    fn test_tampered_transcript_is_integrity_mismatch() {
        let mut record = fixtures::record(&alice(), &bob(), Some(PlayerSide::A), 0);
        record.transcript.turns[0].card_index = 4;

        let err = verify_match_record(&record, &fixtures::domain()).unwrap_err();
        assert!(matches!(err, VerificationError::IntegrityMismatch(_)));
        assert!(err.to_string().contains("transcript matchId mismatch"));
    }

    #[test]
    fn test_header_fields_bound_to_settlement() {
        let record = fixtures::record(&alice(), &bob(), Some(PlayerSide::A), 0);

        let mut season = record.clone();
        season.settled.season_id += 1;
        let season = fixtures::resign(season, &alice(), &bob());

        let err = verify_match_record(&season, &fixtures::domain()).unwrap_err();
        assert_eq!(
            err,
            VerificationError::IntegrityMismatch("transcript header mismatch: seasonId".to_string())
        );
    }

    #[test]
    fn test_wrong_signer_is_signature_mismatch() {
        let mut record = fixtures::record(&alice(), &bob(), Some(PlayerSide::A), 0);
        record.signature_a = carol()
            .sign_settlement(&fixtures::domain(), &record.settled)
            .unwrap();

        let err = verify_match_record(&record, &fixtures::domain()).unwrap_err();
        assert_eq!(
            err,
            VerificationError::SignatureMismatch {
                side: PlayerSide::A,
                fault: SignatureFault::WrongSigner { recovered: carol().address() },
            }
        );
        assert!(err.to_string().contains("signatureA does not match playerA"));
    }

    #[test]
    fn test_swapped_signatures_fail_on_a() {
        let mut record = fixtures::record(&alice(), &bob(), Some(PlayerSide::B), 0);
        std::mem::swap(&mut record.signature_a, &mut record.signature_b);

        let err = verify_match_record(&record, &fixtures::domain()).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureMismatch { side: PlayerSide::A, .. }));
    }

    #[test]
    fn test_malformed_signature_b() {
        let mut record = fixtures::record(&alice(), &bob(), Some(PlayerSide::A), 0);
        record.signature_b.0[64] = 5;

        let err = verify_match_record(&record, &fixtures::domain()).unwrap_err();
        assert_eq!(
            err,
            VerificationError::SignatureMismatch {
                side: PlayerSide::B,
                fault: SignatureFault::Unrecoverable(SignerError::InvalidRecoveryId(5)),
            }
        );
        assert!(err.to_string().contains("signatureB does not match playerB"));
    }

    #[test]
    fn test_other_domain_rejected() {
        let record = fixtures::record(&alice(), &bob(), Some(PlayerSide::A), 0);
        let other = SigningDomain::new(1, fixtures::domain().verifying_contract);

        let err = verify_match_record(&record, &other).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureMismatch { side: PlayerSide::A, .. }));
    }

    #[test]
    fn test_outsider_winner_is_malformed() {
        let mut record = fixtures::record(&alice(), &bob(), Some(PlayerSide::A), 0);
        record.settled.winner = Some(carol().address());
        let record = fixtures::resign(record, &alice(), &bob());

        let err = verify_match_record(&record, &fixtures::domain()).unwrap_err();
        assert!(matches!(err, VerificationError::MalformedSettlement(_)));
    }

    #[test]
    fn test_too_many_tiles_is_malformed() {
        let mut record = fixtures::record(&alice(), &bob(), Some(PlayerSide::A), 0);
        record.settled.tiles_a = 7;
        record.settled.tiles_b = 3;
        let record = fixtures::resign(record, &alice(), &bob());

        let err = verify_match_record(&record, &fixtures::domain()).unwrap_err();
        assert!(err.to_string().contains("exceeds 9 cells"));
    }

    #[test]
    fn test_zero_winner_normalizes_to_draw() {
        let mut record = fixtures::record(&alice(), &bob(), None, 0);
        record.settled.winner = Some(Address::ZERO);

        let verified = verify_match_record(&record, &fixtures::domain()).unwrap();
        assert_eq!(verified.winner, None);
    }

    struct AlwaysRecovers(Address);

    impl SignerRecovery for AlwaysRecovers {
        fn recover(&self, _: &Bytes32, _: &Signature65) -> Result<Address, SignerError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_custom_recovery_backend() {
        let record = fixtures::record(&alice(), &bob(), Some(PlayerSide::A), 0);
        let backend = AlwaysRecovers(bob().address());

        let err = verify_match_record_with(&record, &fixtures::domain(), &backend).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureMismatch { side: PlayerSide::A, .. }));
    }
}
