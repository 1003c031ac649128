//! Triad Ledger Demo
//!
//! Builds a ruleset id, plays out a small round-robin season with
//! deterministic player keys, has both players attest every result, and
//! aggregates the ladder. Then re-aggregates a shuffled batch with
//! resubmitted records to show the ladder does not move.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use triad_ledger::{
    build_standings, hash_config, Bytes32, LadderConfig, LocalSigner, MatchRecord,
    RulesetConfigInput, RulesetId, SettledMatch, SigningDomain, VERSION,
    proof::{
        signer::DigestSigner,
        transcript::{TranscriptHeader, Turn, MAX_TURNS, TRANSCRIPT_VERSION},
        EventSource, Transcript,
    },
};

const SEASON: u32 = 1;
const PLAYERS: u8 = 4;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Triad Ledger v{}", VERSION);

    let config = LadderConfig::from_env().context("invalid ladder configuration")?;
    info!(
        "Signing domain: chain {} contract {}",
        config.domain.chain_id, config.domain.verifying_contract
    );

    demo_season(&config)
}

/// Demo function to run one season end to end.
fn demo_season(config: &LadderConfig) -> Result<()> {
    info!("=== Ruleset ===");

    // Harmony elements deliberately out of order; the id does not care.
    let input = RulesetConfigInput::from_json_str(
        r#"{
            "tactics": { "comboBonus": { "feverAt": 6 } },
            "synergy": { "formationBonuses": { "fiveElementsHarmony": {
                "requiredElements": ["wind", "flame", "thunder", "aqua", "earth"]
            } } }
        }"#,
    )?;
    let ruleset_id = hash_config(&input)?;
    let classic_id = hash_config(&RulesetConfigInput::classic())?;
    info!("Season ruleset: {}", ruleset_id);
    info!("Classic ruleset: {}", classic_id);

    info!("=== Playing Season {} ===", SEASON);

    let players = (1..=PLAYERS)
        .map(|seed| {
            let mut secret = [0u8; 32];
            secret[31] = seed;
            LocalSigner::from_bytes(&secret)
        })
        .collect::<Result<Vec<_>, _>>()?;

    for player in &players {
        info!("Player {}", player.address());
    }

    let mut records = Vec::new();
    for (i, a) in players.iter().enumerate() {
        for (j, b) in players.iter().enumerate().skip(i + 1) {
            let record = play_match(&config.domain, ruleset_id, a, b, records.len() as u32, i + j)?;
            info!(
                "Match {}: {} vs {} -> {}",
                record.settled.match_id.short(),
                a.address().short(),
                b.address().short(),
                record
                    .settled
                    .winner
                    .map_or_else(|| "draw".to_string(), |w| w.short())
            );
            records.push(record);
        }
    }

    info!("=== Standings ===");
    let options = config.standings_options();
    let report = build_standings(&records, &config.domain, &options);

    for standing in &report.standings {
        info!(
            "#{}: {} - {} pts ({}W {}L {}D, tiles {:+})",
            standing.rank,
            standing.player.short(),
            standing.points,
            standing.wins,
            standing.losses,
            standing.draws,
            standing.tile_diff
        );
    }
    for rejection in &report.rejections {
        info!("Rejected record {}: {}", rejection.index, rejection.reason);
    }
    if let Some(violation) = &report.invariant_violation {
        info!("Invariant violation: {}", violation);
    }

    // Verify determinism by re-aggregating a shuffled, resubmitted batch
    info!("=== Verifying Determinism ===");
    let mut replayed: Vec<MatchRecord> = records.iter().rev().cloned().collect();
    replayed.extend(records.iter().take(2).cloned());

    let replay = build_standings(&replayed, &config.domain, &options);
    info!("Duplicates ignored: {}", replay.duplicates_ignored);

    let original = serde_json::to_string(&report.standings)?;
    let reaggregated = serde_json::to_string(&replay.standings)?;

    if original == reaggregated {
        info!("DETERMINISM VERIFIED: Standings match!");
    } else {
        info!("DETERMINISM FAILURE: Standings differ!");
    }

    Ok(())
}

/// Play a fixed nine-turn game and have both players attest the result.
fn play_match(
    domain: &SigningDomain,
    ruleset_id: RulesetId,
    a: &LocalSigner,
    b: &LocalSigner,
    log_index: u32,
    outcome: usize,
) -> Result<MatchRecord> {
    let header = TranscriptHeader {
        version: TRANSCRIPT_VERSION,
        ruleset_id,
        season_id: SEASON,
        player_a: a.address(),
        player_b: b.address(),
        deck_a: [101, 102, 103, 104, 105],
        deck_b: [201, 202, 203, 204, 205],
        first_player: (log_index % 2) as u8,
        deadline: 1_700_003_600,
        salt: Bytes32([log_index as u8; 32]),
    };

    let mut transcript = Transcript::new(header);
    for turn in 0..MAX_TURNS {
        transcript.push_turn(Turn::place(turn as u8, (turn / 2) as u8));
    }
    transcript.validate()?;

    let (winner, tiles_a, tiles_b, delta) = match outcome % 3 {
        0 => (Some(a.address()), 6, 3, 12),
        1 => (Some(b.address()), 4, 5, -8),
        _ => (None, 4, 4, 0),
    };

    let settled = SettledMatch {
        match_id: transcript.match_id(),
        ruleset_id,
        season_id: SEASON,
        player_a: a.address(),
        player_b: b.address(),
        winner,
        tiles_a,
        tiles_b,
        points_delta_a: delta,
        points_delta_b: -delta,
        replay_hash: Bytes32([0xee; 32]),
        settled_at: 1_700_000_000 + log_index as u64 * 60,
        source: EventSource {
            chain_id: domain.chain_id,
            block_number: 1_000 + log_index as u64,
            tx_hash: Bytes32([log_index as u8 + 1; 32]),
            log_index: 0,
        },
    };

    let signature_a = a.sign_settlement(domain, &settled)?;
    let signature_b = b.sign_settlement(domain, &settled)?;

    Ok(MatchRecord {
        transcript,
        settled,
        signature_a,
        signature_b,
    })
}
