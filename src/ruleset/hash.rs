//! Ruleset Id
//!
//! Hashes a [`CanonicalRuleset`] into its 32-byte [`RulesetId`].
//!
//! ## Encoding
//!
//! One 32-byte word per field (see [`crate::core::hash`]), in this order:
//!
//! ```text
//!  #  field                                                  type
//!  0  version                                                uint8
//!  1  tactics.warningMark.enabled                            bool
//!  2  tactics.warningMark.maxUsesPerPlayer                   uint8
//!  3  tactics.warningMark.secondPlayerExtraUses              uint8
//!  4  tactics.warningMark.penaltyAllTriad                    int8
//!  5  tactics.comboBonus.enabled                             bool
//!  6  tactics.comboBonus.momentumAt                          uint8
//!  7  tactics.comboBonus.dominationAt                        uint8
//!  8  tactics.comboBonus.feverAt                             uint8
//!  9  tactics.comboBonus.momentumTriadPlus                   uint8
//! 10  tactics.comboBonus.dominationTriadPlus                 uint8
//! 11  tactics.secondPlayerBalance.enabled                    bool
//! 12  tactics.secondPlayerBalance.firstMoveTriadPlus         uint8
//! 13  synergy.traitDerivation.enabled                        bool
//! 14  synergy.traitDerivation.source                         uint8
//! 15  synergy.traitEffects.enabled                           bool
//! 16  .cosmic.enabled                                        bool
//! 17  .cosmic.cornerTriadPlus                                uint8
//! 18  .light.enabled                                         bool
//! 19  .light.adjacencyTriadPlus                              uint8
//! 20  .light.stack                                           bool
//! 21  .shadow.enabled                                        bool
//! 22  .shadow.warningMarkImmune                              bool
//! 23  .forest.enabled                                        bool
//! 24  .forest.shieldHits                                     uint8
//! 25  .metal.enabled                                         bool
//! 26  .metal.chainImmune                                     bool
//! 27  .flame.enabled                                         bool
//! 28  .flame.ignoreForestShield                              bool
//! 29  .aqua.enabled                                          bool
//! 30  .aqua.diagonalStrengthMethod                           uint8
//! 31  .thunder.enabled                                       bool
//! 32  .thunder.adjacentEnemyAllTriadDelta                    int8
//! 33  .wind.enabled                                          bool
//! 34  .wind.firstPlayerChoice                                bool
//! 35  .earth.enabled                                         bool
//! 36  .earth.boost                                           uint8
//! 37  .earth.opposePenalty                                   int8
//! 38  .earth.requireChoice                                   bool
//! 39  synergy.formationBonuses.enabled                       bool
//! 40  .fiveElementsHarmony.enabled                           bool
//! 41  .fiveElementsHarmony.comboBonusTriadPlus               uint8
//! 42  .fiveElementsHarmony.requiredElements (sorted)         uint8[5]
//! 47  .eclipse.enabled                                       bool
//! 48  .eclipse.lightAlsoIgnoresWarningMark                   bool
//! 49  .eclipse.shadowCountsAsLightSource                     bool
//! ```
//!
//! `RulesetId = keccak256(abi.encode(<fields 0..49>))`.

use tracing::debug;

use crate::core::{Bytes32, WordHasher};

use super::canonical::{canonicalize, CanonicalRuleset};
use super::config::RulesetConfigInput;
use super::CanonicalizationError;

/// 32-byte ruleset identifier.
pub type RulesetId = Bytes32;

/// Number of words in the ruleset encoding.
pub const RULESET_WORD_COUNT: usize = 50;

/// Write every canonical field into `hasher` in the documented order.
pub fn encode_ruleset(ruleset: &CanonicalRuleset, hasher: &mut WordHasher) {
    hasher.update_u8(ruleset.version);

    let tactics = &ruleset.tactics;
    let mark = &tactics.warning_mark;
    hasher.update_bool(mark.enabled);
    hasher.update_u8(mark.max_uses_per_player);
    hasher.update_u8(mark.second_player_extra_uses);
    hasher.update_i8(mark.penalty_all_triad);

    let combo = &tactics.combo_bonus;
    hasher.update_bool(combo.enabled);
    hasher.update_u8(combo.momentum_at);
    hasher.update_u8(combo.domination_at);
    hasher.update_u8(combo.fever_at);
    hasher.update_u8(combo.momentum_triad_plus);
    hasher.update_u8(combo.domination_triad_plus);

    hasher.update_bool(tactics.second_player_balance.enabled);
    hasher.update_u8(tactics.second_player_balance.first_move_triad_plus);

    let synergy = &ruleset.synergy;
    hasher.update_bool(synergy.trait_derivation.enabled);
    hasher.update_u8(synergy.trait_derivation.source);

    let effects = &synergy.trait_effects;
    hasher.update_bool(effects.enabled);
    hasher.update_bool(effects.cosmic.enabled);
    hasher.update_u8(effects.cosmic.corner_triad_plus);
    hasher.update_bool(effects.light.enabled);
    hasher.update_u8(effects.light.adjacency_triad_plus);
    hasher.update_bool(effects.light.stack);
    hasher.update_bool(effects.shadow.enabled);
    hasher.update_bool(effects.shadow.warning_mark_immune);
    hasher.update_bool(effects.forest.enabled);
    hasher.update_u8(effects.forest.shield_hits);
    hasher.update_bool(effects.metal.enabled);
    hasher.update_bool(effects.metal.chain_immune);
    hasher.update_bool(effects.flame.enabled);
    hasher.update_bool(effects.flame.ignore_forest_shield);
    hasher.update_bool(effects.aqua.enabled);
    hasher.update_u8(effects.aqua.diagonal_strength_method);
    hasher.update_bool(effects.thunder.enabled);
    hasher.update_i8(effects.thunder.adjacent_enemy_all_triad_delta);
    hasher.update_bool(effects.wind.enabled);
    hasher.update_bool(effects.wind.first_player_choice);
    hasher.update_bool(effects.earth.enabled);
    hasher.update_u8(effects.earth.boost);
    hasher.update_i8(effects.earth.oppose_penalty);
    hasher.update_bool(effects.earth.require_choice);

    let formations = &synergy.formation_bonuses;
    hasher.update_bool(formations.enabled);
    let harmony = &formations.five_elements_harmony;
    hasher.update_bool(harmony.enabled);
    hasher.update_u8(harmony.combo_bonus_triad_plus);
    for code in harmony.required_elements {
        hasher.update_u8(code);
    }
    let eclipse = &formations.eclipse;
    hasher.update_bool(eclipse.enabled);
    hasher.update_bool(eclipse.light_also_ignores_warning_mark);
    hasher.update_bool(eclipse.shadow_counts_as_light_source);
}

/// Hash a canonical ruleset.
pub fn ruleset_id(ruleset: &CanonicalRuleset) -> RulesetId {
    let mut hasher = WordHasher::new();
    encode_ruleset(ruleset, &mut hasher);
    debug_assert_eq!(hasher.word_count(), RULESET_WORD_COUNT);
    hasher.finalize()
}

/// Canonicalize then hash a partial config.
pub fn hash_config(input: &RulesetConfigInput) -> Result<RulesetId, CanonicalizationError> {
    let canonical = canonicalize(input)?;
    let id = ruleset_id(&canonical);
    debug!("Ruleset v{} canonicalized to {}", canonical.version, id);
    Ok(id)
}

impl CanonicalRuleset {
    /// This ruleset's id.
    pub fn id(&self) -> RulesetId {
        ruleset_id(self)
    }
}

// =============================================================================
// TESTS
// =============================================================================
