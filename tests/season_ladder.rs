//! End-to-end season: author a ruleset, play and attest matches, ship the
//! records as JSON the way an indexer would, and aggregate the ladder.

use triad_ledger::ladder::RecordError;
use triad_ledger::proof::signer::DigestSigner;
use triad_ledger::proof::transcript::{TranscriptHeader, Turn, MAX_TURNS, TRANSCRIPT_VERSION};
use triad_ledger::proof::{EventSource, Transcript};
use triad_ledger::{
    build_digest, build_standings, build_typed_data, hash_config, verify_match_record, Address,
    Bytes32, LadderConfig, LocalSigner, MatchRecord, RulesetConfigInput, RulesetId, SettledMatch,
    SigningDomain,
};

const SEASON: u32 = 7;

fn signer(seed: u8) -> LocalSigner {
    let mut secret = [0u8; 32];
    secret[31] = seed;
    LocalSigner::from_bytes(&secret).unwrap()
}

fn season_ruleset() -> RulesetId {
    let input = RulesetConfigInput::from_json_str(
        r#"{ "version": 2, "tactics": { "warningMark": { "maxUsesPerPlayer": 2 } } }"#,
    )
    .unwrap();
    hash_config(&input).unwrap()
}

fn domain() -> SigningDomain {
    SigningDomain::new(84532, "0x00000000000000000000000000000000000c0de5".parse().unwrap())
}

struct Outcome {
    a_wins: bool,
    tiles: (u8, u8),
    points: i32,
    block: u64,
}

fn attested(a: &LocalSigner, b: &LocalSigner, outcome: Outcome) -> MatchRecord {
    let ruleset_id = season_ruleset();
    let mut transcript = Transcript::new(TranscriptHeader {
        version: TRANSCRIPT_VERSION,
        ruleset_id,
        season_id: SEASON,
        player_a: a.address(),
        player_b: b.address(),
        deck_a: [1, 2, 3, 4, 5],
        deck_b: [6, 7, 8, 9, 10],
        first_player: 1,
        deadline: 1_800_000_000,
        salt: Bytes32([outcome.block as u8; 32]),
    });
    for turn in 0..MAX_TURNS {
        transcript.push_turn(Turn::place((8 - turn) as u8, (turn / 2) as u8));
    }
    transcript.validate().unwrap();

    let (winner, delta) = if outcome.a_wins {
        (a.address(), outcome.points)
    } else {
        (b.address(), -outcome.points)
    };

    let settled = SettledMatch {
        match_id: transcript.match_id(),
        ruleset_id,
        season_id: SEASON,
        player_a: a.address(),
        player_b: b.address(),
        winner: Some(winner),
        tiles_a: outcome.tiles.0,
        tiles_b: outcome.tiles.1,
        points_delta_a: delta,
        points_delta_b: -delta,
        replay_hash: Bytes32([0x42; 32]),
        settled_at: 1_799_000_000 + outcome.block,
        source: EventSource {
            chain_id: 84532,
            block_number: outcome.block,
            tx_hash: Bytes32([outcome.block as u8; 32]),
            log_index: 3,
        },
    };

    MatchRecord {
        signature_a: a.sign_settlement(&domain(), &settled).unwrap(),
        signature_b: b.sign_settlement(&domain(), &settled).unwrap(),
        transcript,
        settled,
    }
}

/// Records as delivered by the indexer.
fn over_the_wire(records: &[MatchRecord]) -> Vec<MatchRecord> {
    let json = serde_json::to_string(records).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[test]
fn test_season_ladder_end_to_end() {
    let (a, b, c) = (signer(11), signer(12), signer(13));

    let a_beats_c = attested(&a, &c, Outcome { a_wins: true, tiles: (6, 3), points: 10, block: 500 });
    let b_beats_c = attested(&b, &c, Outcome { a_wins: true, tiles: (5, 4), points: 10, block: 501 });

    let config = LadderConfig::from_lookup(|var| match var {
        "LADDER_CHAIN_ID" => Some("84532".to_string()),
        "LADDER_VERIFYING_CONTRACT" => Some("0x00000000000000000000000000000000000c0de5".to_string()),
        "LADDER_SEASON_ID" => Some(SEASON.to_string()),
        "LADDER_RULESET_ID" => Some(season_ruleset().to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.domain, domain());
    let options = config.standings_options();

    let clean = build_standings(
        &over_the_wire(&[a_beats_c.clone(), b_beats_c.clone()]),
        &config.domain,
        &options,
    );
    let resubmitted = build_standings(
        &over_the_wire(&[b_beats_c, a_beats_c.clone(), a_beats_c]),
        &config.domain,
        &options,
    );

    assert_eq!(resubmitted.records_accepted, 2);
    assert_eq!(resubmitted.duplicates_ignored, 1);
    assert_eq!(resubmitted.records_rejected, 0);
    assert_eq!(resubmitted.invariant_violation, None);
    assert_eq!(
        serde_json::to_string(&resubmitted.standings).unwrap(),
        serde_json::to_string(&clean.standings).unwrap()
    );

    let table: Vec<(u32, Address, i64, i64)> = clean
        .standings
        .iter()
        .map(|s| (s.rank, s.player, s.points, s.tile_diff))
        .collect();
    assert_eq!(
        table,
        vec![
            (1, a.address(), 10, 3),
            (2, b.address(), 10, 1),
            (3, c.address(), -20, -4),
        ]
    );
}

#[test]
fn test_wrong_season_and_conflict_are_reported() {
    let (a, b, c) = (signer(21), signer(22), signer(23));

    let counted = attested(&a, &b, Outcome { a_wins: false, tiles: (2, 7), points: 15, block: 900 });
    let replayed = attested(&a, &c, Outcome { a_wins: true, tiles: (5, 4), points: 15, block: 900 });

    let options = triad_ledger::StandingsOptions {
        expected_season_id: Some(SEASON + 1),
        ..Default::default()
    };
    let filtered = build_standings(&[counted.clone()], &domain(), &options);
    assert!(matches!(filtered.rejections[0].error, RecordError::SeasonMismatch { got: SEASON, .. }));

    let report = build_standings(&[counted, replayed], &domain(), &Default::default());
    assert_eq!(report.records_accepted, 1);
    assert_eq!(report.records_rejected, 1);
    assert!(report.rejections[0]
        .reason
        .contains("conflicting duplicate event source"));
    assert_eq!(report.standings[0].player, b.address());
}

#[test]
fn test_attestation_payload_and_checksum_view() {
    let (a, b) = (signer(31), signer(32));
    let record = attested(&a, &b, Outcome { a_wins: true, tiles: (7, 2), points: 20, block: 77 });

    let typed = build_typed_data(&domain(), &record.settled);
    assert_eq!(typed.digest(), build_digest(&domain(), &record.settled));

    let payload: serde_json::Value = serde_json::from_str(&typed.to_json().unwrap()).unwrap();
    assert_eq!(payload["primaryType"], "MatchAttestation");
    assert_eq!(payload["message"]["tilesA"], 7);

    let mut lowercase = serde_json::to_value(&record).unwrap();
    lowercase["settled"]["playerA"] = serde_json::Value::String(a.address().to_string().to_lowercase());
    let record: MatchRecord = serde_json::from_value(lowercase).unwrap();

    let verified = verify_match_record(&record, &domain()).unwrap();
    let view = serde_json::to_value(&*verified).unwrap();
    assert_eq!(view["playerA"], a.address().to_checksum());
}
