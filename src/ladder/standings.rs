//! Standings Aggregation
//!
//! ```text
//! records ──verify──▶ filter ──dedup by event──▶ tally ──zero-sum?──▶ sort + rank
//!    │        │          │          │
//!    └────────┴──────────┴──────────┴──▶ rejections (index, matchId, reason)
//! ```
//!
//! Every keyed collection is a `BTreeMap`, so the output depends only on the
//! multiset of accepted settlements, never on input order or hashing.

use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{InvariantViolation, RecordError};
use crate::core::Address;
use crate::proof::{
    verify_match_record_with, EventSource, MatchId, MatchRecord, Secp256k1Recovery,
    SignerRecovery, SigningDomain, VerifiedSettledMatch,
};
use crate::ruleset::RulesetId;

/// Batch filters and checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandingsOptions {
    /// Only accept this season.
    pub expected_season_id: Option<u32>,
    /// Only accept this ruleset.
    pub expected_ruleset_id: Option<RulesetId>,
    /// Report an [`InvariantViolation`] when accepted points don't net to zero.
    pub require_zero_sum_points: bool,
}

/// One ladder row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    /// 1-based position.
    pub rank: u32,
    /// Player address.
    pub player: Address,
    /// Net ladder points.
    pub points: i64,
    /// Matches won.
    pub wins: u32,
    /// Matches lost.
    pub losses: u32,
    /// Matches drawn.
    pub draws: u32,
    /// Matches counted.
    pub matches_played: u32,
    /// Own tiles minus opponent tiles, summed over matches.
    pub tile_diff: i64,
}

/// A record left out of the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    /// Position in the input batch.
    pub index: usize,
    /// Match id claimed by the settlement.
    pub match_id: MatchId,
    /// Human-readable reason.
    pub reason: String,
    /// Structured reason.
    #[serde(skip)]
    pub error: RecordError,
}

impl Rejection {
    fn new(index: usize, match_id: MatchId, error: RecordError) -> Self {
        Self {
            index,
            match_id,
            reason: error.to_string(),
            error,
        }
    }
}

/// Result of one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsReport {
    /// Ranked ladder.
    pub standings: Vec<Standing>,
    /// Records submitted.
    pub records_input: usize,
    /// Distinct records counted.
    pub records_accepted: usize,
    /// Records refused.
    pub records_rejected: usize,
    /// Exact resubmissions of an accepted record.
    pub duplicates_ignored: usize,
    /// Refusals in input order.
    pub rejections: Vec<Rejection>,
    /// Set when zero-sum checking is on and fails.
    pub invariant_violation: Option<InvariantViolation>,
}

impl StandingsReport {
    /// Serialize as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Row for `player`, if they played.
    pub fn standing(&self, player: &Address) -> Option<&Standing> {
        self.standings.iter().find(|s| &s.player == player)
    }
}

#[derive(Debug, Default)]
struct Tally {
    points: i64,
    wins: u32,
    losses: u32,
    draws: u32,
    matches_played: u32,
    tile_diff: i64,
}

impl Tally {
    fn record(&mut self, points_delta: i32, own_tiles: u8, other_tiles: u8, won: Option<bool>) {
        self.points += points_delta as i64;
        self.tile_diff += own_tiles as i64 - other_tiles as i64;
        self.matches_played += 1;
        match won {
            Some(true) => self.wins += 1,
            Some(false) => self.losses += 1,
            None => self.draws += 1,
        }
    }
}

/// Aggregate a batch with the default secp256k1 recovery.
pub fn build_standings(
    records: &[MatchRecord],
    domain: &SigningDomain,
    options: &StandingsOptions,
) -> StandingsReport {
    build_standings_with(records, domain, options, &Secp256k1Recovery)
}

/// Aggregate a batch with a caller-supplied recovery backend.
pub fn build_standings_with(
    records: &[MatchRecord],
    domain: &SigningDomain,
    options: &StandingsOptions,
    recovery: &dyn SignerRecovery,
) -> StandingsReport {
    let mut accepted: BTreeMap<EventSource, VerifiedSettledMatch> = BTreeMap::new();
    let mut rejections = Vec::new();
    let mut duplicates_ignored = 0;

    for (index, record) in records.iter().enumerate() {
        let settled = match admit(record, domain, options, recovery) {
            Ok(settled) => settled,
            Err(error) => {
                rejections.push(Rejection::new(index, record.settled.match_id, error));
                continue;
            }
        };

        match accepted.entry(settled.source) {
            Entry::Vacant(slot) => {
                slot.insert(settled);
            }
            Entry::Occupied(existing) if *existing.get() == settled => {
                debug!("Record {} duplicates match {}", index, settled.match_id.short());
                duplicates_ignored += 1;
            }
            Entry::Occupied(existing) => {
                warn!(
                    "Record {} conflicts with match {} at block {} log {}",
                    index,
                    existing.get().match_id.short(),
                    settled.source.block_number,
                    settled.source.log_index
                );
                let error = RecordError::ConflictingDuplicate { event: settled.source };
                rejections.push(Rejection::new(index, record.settled.match_id, error));
            }
        }
    }

    let mut tallies: BTreeMap<Address, Tally> = BTreeMap::new();
    let mut net_points: i64 = 0;

    for settled in accepted.values() {
        let outcome_a = settled.winner.map(|w| w == settled.player_a);
        let outcome_b = settled.winner.map(|w| w == settled.player_b);

        tallies.entry(settled.player_a).or_default().record(
            settled.points_delta_a,
            settled.tiles_a,
            settled.tiles_b,
            outcome_a,
        );
        tallies.entry(settled.player_b).or_default().record(
            settled.points_delta_b,
            settled.tiles_b,
            settled.tiles_a,
            outcome_b,
        );

        net_points += settled.points_delta_a as i64 + settled.points_delta_b as i64;
    }

    let invariant_violation = if options.require_zero_sum_points && net_points != 0 {
        warn!("Accepted records net {} points, expected zero-sum", net_points);
        Some(InvariantViolation { net_points })
    } else {
        None
    };

    let standings = rank(tallies);

    let report = StandingsReport {
        records_input: records.len(),
        records_accepted: accepted.len(),
        records_rejected: rejections.len(),
        duplicates_ignored,
        standings,
        rejections,
        invariant_violation,
    };

    info!(
        "Aggregated {} records: {} accepted, {} rejected, {} duplicates, {} players",
        report.records_input,
        report.records_accepted,
        report.records_rejected,
        report.duplicates_ignored,
        report.standings.len()
    );

    report
}

/// Verify one record and apply the batch filters.
fn admit(
    record: &MatchRecord,
    domain: &SigningDomain,
    options: &StandingsOptions,
    recovery: &dyn SignerRecovery,
) -> Result<VerifiedSettledMatch, RecordError> {
    let settled = verify_match_record_with(record, domain, recovery)?;

    if let Some(expected) = options.expected_season_id {
        if settled.season_id != expected {
            return Err(RecordError::SeasonMismatch {
                expected,
                got: settled.season_id,
            });
        }
    }

    if let Some(expected) = options.expected_ruleset_id {
        if settled.ruleset_id != expected {
            return Err(RecordError::RulesetMismatch {
                expected,
                got: settled.ruleset_id,
            });
        }
    }

    Ok(settled)
}

/// Points desc, then tile difference desc, then address asc.
fn compare(a: &(Address, Tally), b: &(Address, Tally)) -> Ordering {
    b.1.points
        .cmp(&a.1.points)
        .then_with(|| b.1.tile_diff.cmp(&a.1.tile_diff))
        .then_with(|| a.0.cmp(&b.0))
}

fn rank(tallies: BTreeMap<Address, Tally>) -> Vec<Standing> {
    let mut rows: Vec<(Address, Tally)> = tallies.into_iter().collect();
    rows.sort_by(compare);

    rows.into_iter()
        .enumerate()
        .map(|(i, (player, tally))| Standing {
            rank: i as u32 + 1,
            player,
            points: tally.points,
            wins: tally.wins,
            losses: tally.losses,
            draws: tally.draws,
            matches_played: tally.matches_played,
            tile_diff: tally.tile_diff,
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::fixtures::{self, alice, bob, carol, signer};
    use crate::proof::{DigestSigner, LocalSigner, PlayerSide, VerificationError};
    use crate::ruleset::CLASSIC_RULESET;
    use proptest::prelude::*;

    /// A beats C 6-3; B beats C 5-4; both ±10.
    fn season_pair() -> (MatchRecord, MatchRecord) {
        let a_beats_c = fixtures::record(&alice(), &carol(), Some(PlayerSide::A), 0);

        let transcript = fixtures::transcript(bob().address(), carol().address(), 1);
        let mut settled = fixtures::settle(&transcript, Some(PlayerSide::A), 1);
        settled.tiles_a = 5;
        settled.tiles_b = 4;
        let b_beats_c = fixtures::sign(transcript, settled, &bob(), &carol());

        (a_beats_c, b_beats_c)
    }

    fn aggregate(records: &[MatchRecord]) -> StandingsReport {
        build_standings(records, &fixtures::domain(), &StandingsOptions::default())
    }

    #[test]
    fn test_ranked_ladder() {
        let (a, b) = season_pair();
        let report = aggregate(&[a, b]);

        assert_eq!(report.records_accepted, 2);
        assert_eq!(report.standings.len(), 3);

        let first = &report.standings[0];
        assert_eq!((first.rank, first.player, first.points, first.tile_diff), (1, alice().address(), 10, 3));
        let second = &report.standings[1];
        assert_eq!((second.rank, second.player, second.points, second.tile_diff), (2, bob().address(), 10, 1));
        let third = &report.standings[2];
        assert_eq!((third.rank, third.player, third.points, third.tile_diff), (3, carol().address(), -20, -4));

        assert_eq!(third.losses, 2);
        assert_eq!(third.matches_played, 2);
        assert_eq!(first.wins, 1);
    }

    #[test]
    fn test_exact_duplicate_is_ignored() {
        let (a, b) = season_pair();
        let baseline = aggregate(&[a.clone(), b.clone()]);
        let resubmitted = aggregate(&[b, a.clone(), a]);

        assert_eq!(resubmitted.records_input, 3);
        assert_eq!(resubmitted.records_accepted, 2);
        assert_eq!(resubmitted.duplicates_ignored, 1);
        assert_eq!(resubmitted.records_rejected, 0);
        assert_eq!(resubmitted.standings, baseline.standings);
    }

    #[test]
    fn test_conflicting_duplicate_is_rejected() {
        let first = fixtures::record(&alice(), &carol(), Some(PlayerSide::A), 0);
        let replayed = fixtures::record(&alice(), &bob(), Some(PlayerSide::B), 0);
        assert_eq!(first.settled.source, replayed.settled.source);

        let report = aggregate(&[first.clone(), replayed]);

        assert_eq!(report.records_accepted, 1);
        assert_eq!(report.records_rejected, 1);
        assert_eq!(report.duplicates_ignored, 0);
        assert_eq!(report.rejections[0].index, 1);
        assert!(report.rejections[0].reason.contains("conflicting duplicate event source"));
        assert_eq!(report.standing(&alice().address()).unwrap().points, 10);
        assert!(report.standing(&bob().address()).is_none());
    }

    #[test]
    fn test_bad_record_does_not_abort_batch() {
        let (a, mut b) = season_pair();
        b.signature_a = signer(9).sign_settlement(&fixtures::domain(), &b.settled).unwrap();

        let report = aggregate(&[b, a]);

        assert_eq!(report.records_accepted, 1);
        assert_eq!(report.records_rejected, 1);
        assert_eq!(report.rejections[0].index, 0);
        assert!(matches!(
            report.rejections[0].error,
            RecordError::Verification(VerificationError::SignatureMismatch { side: PlayerSide::A, .. })
        ));
        assert!(report.rejections[0].reason.contains("signatureA does not match playerA"));
        assert_eq!(report.standings.len(), 2);
    }

    #[test]
    fn test_season_filter() {
        let (a, b) = season_pair();
        let options = StandingsOptions {
            expected_season_id: Some(fixtures::SEASON + 1),
            ..Default::default()
        };

        let report = build_standings(&[a, b], &fixtures::domain(), &options);

        assert_eq!(report.records_rejected, 2);
        assert!(report.standings.is_empty());
        assert!(report.rejections.iter().all(|r| r.error.is_filter_mismatch()));
    }

    #[test]
    fn test_ruleset_filter() {
        let (a, b) = season_pair();
        let matching = StandingsOptions {
            expected_ruleset_id: Some(fixtures::ruleset()),
            ..Default::default()
        };
        let other = StandingsOptions {
            expected_ruleset_id: Some(CLASSIC_RULESET.id()),
            ..Default::default()
        };

        let records = [a, b];
        assert_eq!(build_standings(&records, &fixtures::domain(), &matching).records_accepted, 2);

        let report = build_standings(&records, &fixtures::domain(), &other);
        assert_eq!(report.records_accepted, 0);
        assert!(report.rejections[0].reason.starts_with("rulesetId mismatch"));
    }

    #[test]
    fn test_zero_sum_violation_keeps_standings() {
        let transcript = fixtures::transcript(alice().address(), bob().address(), 7);
        let mut settled = fixtures::settle(&transcript, Some(PlayerSide::A), 7);
        settled.points_delta_b = -5;
        let lopsided = fixtures::sign(transcript, settled, &alice(), &bob());

        let checked = StandingsOptions { require_zero_sum_points: true, ..Default::default() };
        let report = build_standings(&[lopsided.clone()], &fixtures::domain(), &checked);

        assert_eq!(report.invariant_violation, Some(InvariantViolation { net_points: 5 }));
        assert_eq!(report.records_accepted, 1);
        assert_eq!(report.standings[0].points, 10);

        let unchecked = aggregate(&[lopsided]);
        assert_eq!(unchecked.invariant_violation, None);
    }

    #[test]
    fn test_draws_and_ties() {
        let draw = fixtures::record(&alice(), &bob(), None, 0);
        let report = aggregate(&[draw]);

        assert_eq!(report.standings.len(), 2);
        for standing in &report.standings {
            assert_eq!((standing.points, standing.draws, standing.wins, standing.losses), (0, 1, 0, 0));
        }
        // Full tie falls back to address order.
        assert!(report.standings[0].player < report.standings[1].player);
        assert_eq!(report.standings[1].rank, 2);
    }

    #[test]
    fn test_empty_batch() {
        let report = aggregate(&[]);
        assert!(report.standings.is_empty());
        assert_eq!(report.records_input, 0);
        assert_eq!(report.invariant_violation, None);
    }

    #[test]
    fn test_report_json_shape() {
        let (a, b) = season_pair();
        let json: serde_json::Value = serde_json::from_str(&aggregate(&[a, b]).to_json().unwrap()).unwrap();

        assert_eq!(json["recordsAccepted"], 2);
        assert_eq!(json["standings"][0]["tileDiff"], 3);
        assert_eq!(json["standings"][0]["player"], alice().address().to_string());
        assert_eq!(json["standings"][2]["matchesPlayed"], 2);
        assert!(json["invariantViolation"].is_null());
    }

    fn season() -> Vec<MatchRecord> {
        let players: Vec<LocalSigner> = (1..=4).map(signer).collect();
        let mut records = Vec::new();
        let mut log_index = 0;
        for (i, a) in players.iter().enumerate() {
            for b in &players[i + 1..] {
                let winner = match log_index % 3 {
                    0 => Some(PlayerSide::A),
                    1 => Some(PlayerSide::B),
                    _ => None,
                };
                records.push(fixtures::record(a, b, winner, log_index));
                log_index += 1;
            }
        }
        records
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_standings_are_order_independent(
            shuffled in Just(season().into_iter().chain(season().into_iter().take(2)).collect::<Vec<_>>())
                .prop_shuffle()
        ) {
            let baseline = aggregate(&season());
            let report = aggregate(&shuffled);

            prop_assert_eq!(report.records_accepted, baseline.records_accepted);
            prop_assert_eq!(report.duplicates_ignored, 2);
            prop_assert_eq!(
                serde_json::to_string(&report.standings).unwrap(),
                serde_json::to_string(&baseline.standings).unwrap()
            );
        }
    }
}
