//! Ruleset Config Input
//!
//! The partial, author-facing shape of a ruleset. Every field is optional;
//! anything left out resolves to [`DEFAULT_RULESET`](super::DEFAULT_RULESET)
//! during canonicalization. Numbers are kept as raw JSON numbers so that
//! non-integers and out-of-domain values reach the canonicalizer intact and
//! are rejected there instead of being coerced by deserialization.

use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::CanonicalizationError;

/// Partial ruleset config.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RulesetConfigInput {
    /// Ruleset schema version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Number>,
    /// Tactical rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tactics: Option<TacticsInput>,
    /// Trait synergy rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synergy: Option<SynergyInput>,
}

impl RulesetConfigInput {
    /// Parse from a JSON value.
    pub fn from_json(value: serde_json::Value) -> Result<Self, CanonicalizationError> {
        serde_json::from_value(value).map_err(|e| CanonicalizationError::Malformed(e.to_string()))
    }

    /// Parse from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, CanonicalizationError> {
        serde_json::from_str(text).map_err(|e| CanonicalizationError::Malformed(e.to_string()))
    }

    /// Classic triad: version 1, every optional mechanic switched off.
    pub fn classic() -> Self {
        let off = Some(false);
        Self {
            version: Some(Number::from(1)),
            tactics: Some(TacticsInput {
                warning_mark: Some(WarningMarkInput { enabled: off, ..Default::default() }),
                combo_bonus: Some(ComboBonusInput { enabled: off, ..Default::default() }),
                second_player_balance: Some(SecondPlayerBalanceInput {
                    enabled: off,
                    ..Default::default()
                }),
            }),
            synergy: Some(SynergyInput {
                trait_derivation: Some(TraitDerivationInput { enabled: off, ..Default::default() }),
                trait_effects: Some(TraitEffectsInput { enabled: off, ..Default::default() }),
                formation_bonuses: Some(FormationBonusesInput {
                    enabled: off,
                    ..Default::default()
                }),
            }),
        }
    }
}

/// `tactics` section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TacticsInput {
    /// Warning marks placed on empty cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_mark: Option<WarningMarkInput>,
    /// Bonus for multi-flip combos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combo_bonus: Option<ComboBonusInput>,
    /// Compensation for the player moving second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_player_balance: Option<SecondPlayerBalanceInput>,
}

/// `tactics.warningMark`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WarningMarkInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Marks each player may place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uses_per_player: Option<Number>,
    /// Extra marks for the second player.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_player_extra_uses: Option<Number>,
    /// Edge modifier applied to a card placed on a marked cell (signed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_all_triad: Option<Number>,
}

/// `tactics.comboBonus`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComboBonusInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Flips needed for "momentum".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub momentum_at: Option<Number>,
    /// Flips needed for "domination".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domination_at: Option<Number>,
    /// Flips needed for "fever".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fever_at: Option<Number>,
    /// Edge bonus granted by momentum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub momentum_triad_plus: Option<Number>,
    /// Edge bonus granted by domination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domination_triad_plus: Option<Number>,
}

/// `tactics.secondPlayerBalance`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SecondPlayerBalanceInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Edge bonus on the second player's first card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_move_triad_plus: Option<Number>,
}

/// `synergy` section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SynergyInput {
    /// How a card's trait is derived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trait_derivation: Option<TraitDerivationInput>,
    /// Per-trait effects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trait_effects: Option<TraitEffectsInput>,
    /// Board-wide formation bonuses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formation_bonuses: Option<FormationBonusesInput>,
}

/// `synergy.traitDerivation`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TraitDerivationInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Derivation source name (see `TraitSource`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// `synergy.traitEffects`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TraitEffectsInput {
    /// Master toggle for all trait effects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Corner placement bonus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cosmic: Option<CosmicInput>,
    /// Buffs adjacent allies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<LightInput>,
    /// Ignores warning marks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowInput>,
    /// Absorbs flips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forest: Option<ForestInput>,
    /// Immune to chain flips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metal: Option<MetalInput>,
    /// Burns through forest shields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flame: Option<FlameInput>,
    /// Diagonal attacks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aqua: Option<AquaInput>,
    /// Weakens adjacent enemies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thunder: Option<ThunderInput>,
    /// Lets its owner choose who moves first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind: Option<WindInput>,
    /// Boosts one chosen edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earth: Option<EarthInput>,
}

/// `traitEffects.cosmic`: corner placement bonus.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CosmicInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Edge bonus for a card placed in a corner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_triad_plus: Option<Number>,
}

/// `traitEffects.light`: buffs adjacent allies.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LightInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Edge bonus given to adjacent allies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjacency_triad_plus: Option<Number>,
    /// Bonuses from several light cards add up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<bool>,
}

/// `traitEffects.shadow`: ignores warning marks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ShadowInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Shadow cards ignore warning marks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_mark_immune: Option<bool>,
}

/// `traitEffects.forest`: absorbs flips.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ForestInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Flips absorbed before the card turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shield_hits: Option<Number>,
}

/// `traitEffects.metal`: immune to chain flips.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MetalInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Metal cards cannot be flipped by a chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_immune: Option<bool>,
}

/// `traitEffects.flame`: burns through forest shields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlameInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Flame cards flip through forest shields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_forest_shield: Option<bool>,
}

/// `traitEffects.aqua`: diagonal attacks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AquaInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Method name (see `DiagonalStrength`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagonal_strength_method: Option<String>,
}

/// `traitEffects.thunder`: weakens adjacent enemies.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ThunderInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Edge modifier on adjacent enemy cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjacent_enemy_all_triad_delta: Option<Number>,
}

/// `traitEffects.wind`: lets its owner choose who moves first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WindInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// The wind holder picks who moves first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_player_choice: Option<bool>,
}

/// `traitEffects.earth`: boosts one chosen edge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EarthInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Bonus on the chosen edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<Number>,
    /// Modifier on the edge opposite the boost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oppose_penalty: Option<Number>,
    /// A placement must name the boosted edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_choice: Option<bool>,
}

/// `synergy.formationBonuses`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FormationBonusesInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Five distinct elements on the board.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub five_elements_harmony: Option<HarmonyInput>,
    /// Light and shadow cross-trait rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eclipse: Option<EclipseInput>,
}

/// `formationBonuses.fiveElementsHarmony`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HarmonyInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Combo bonus granted while harmony holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combo_bonus_triad_plus: Option<Number>,
    /// Set of exactly five trait names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_elements: Option<Vec<String>>,
}

/// `formationBonuses.eclipse`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EclipseInput {
    /// Group toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Light cards also ignore warning marks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_also_ignores_warning_mark: Option<bool>,
    /// Shadow cards count as light sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_counts_as_light_source: Option<bool>,
}
