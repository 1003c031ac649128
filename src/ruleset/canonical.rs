//! Ruleset Canonicalization
//!
//! Resolves a partial [`RulesetConfigInput`] into a [`CanonicalRuleset`]
//! where every field holds a concrete, in-domain value.
//!
//! Resolution is explicit and field-by-field against [`DEFAULT_RULESET`]:
//! - a field the caller omitted takes the default
//! - a group whose `enabled` resolves to `false` becomes that group's
//!   `NEUTRAL` constant, whatever else the caller wrote inside it
//! - numbers must be integers inside their declared domain (u8 or i8)
//! - enum-like names go through the closed tables in [`super::codes`]
//!
//! Values inside a disabled group are never validated: they are don't-care
//! and cannot influence the ruleset id.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Number;

use super::codes::{DiagonalStrength, TraitKind, TraitSource};
use super::config::*;
use super::{CanonicalizationError, IntDomain};

/// Number of elements in the five-elements harmony set.
pub const HARMONY_ELEMENTS: usize = 5;

/// Fully resolved ruleset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRuleset {
    /// Ruleset schema version.
    pub version: u8,
    /// Tactical rules.
    pub tactics: Tactics,
    /// Trait synergy rules.
    pub synergy: Synergy,
}

/// Resolved `tactics` section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tactics {
    /// Warning marks placed on empty cells.
    pub warning_mark: WarningMarkRule,
    /// Bonus for multi-flip combos.
    pub combo_bonus: ComboBonusRule,
    /// Compensation for the player moving second.
    pub second_player_balance: SecondPlayerBalanceRule,
}

/// Resolved `tactics.warningMark`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningMarkRule {
    /// Group toggle.
    pub enabled: bool,
    /// Marks each player may place.
    pub max_uses_per_player: u8,
    /// Extra marks for the second player.
    pub second_player_extra_uses: u8,
    /// Edge modifier on a card placed on a marked cell.
    pub penalty_all_triad: i8,
}

impl WarningMarkRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self {
        enabled: false,
        max_uses_per_player: 0,
        second_player_extra_uses: 0,
        penalty_all_triad: 0,
    };
}

/// Resolved `tactics.comboBonus`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboBonusRule {
    /// Group toggle.
    pub enabled: bool,
    /// Flips needed for "momentum".
    pub momentum_at: u8,
    /// Flips needed for "domination".
    pub domination_at: u8,
    /// Flips needed for "fever".
    pub fever_at: u8,
    /// Edge bonus granted by momentum.
    pub momentum_triad_plus: u8,
    /// Edge bonus granted by domination.
    pub domination_triad_plus: u8,
}

impl ComboBonusRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self {
        enabled: false,
        momentum_at: 0,
        domination_at: 0,
        fever_at: 0,
        momentum_triad_plus: 0,
        domination_triad_plus: 0,
    };
}

/// Resolved `tactics.secondPlayerBalance`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondPlayerBalanceRule {
    /// Group toggle.
    pub enabled: bool,
    /// Edge bonus on the second player's first card.
    pub first_move_triad_plus: u8,
}

impl SecondPlayerBalanceRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self { enabled: false, first_move_triad_plus: 0 };
}

/// Resolved `synergy` section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Synergy {
    /// How a card's trait is derived.
    pub trait_derivation: TraitDerivationRule,
    /// Per-trait effects.
    pub trait_effects: TraitEffects,
    /// Board-wide formation bonuses.
    pub formation_bonuses: FormationBonuses,
}

/// Resolved `synergy.traitDerivation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitDerivationRule {
    /// Group toggle.
    pub enabled: bool,
    /// [`TraitSource`] code, 0 when disabled.
    pub source: u8,
}

impl TraitDerivationRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self { enabled: false, source: 0 };
}

/// Resolved `synergy.traitEffects`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitEffects {
    /// Group toggle.
    pub enabled: bool,
    /// Corner placement bonus.
    pub cosmic: CosmicRule,
    /// Buffs adjacent allies.
    pub light: LightRule,
    /// Ignores warning marks.
    pub shadow: ShadowRule,
    /// Absorbs flips.
    pub forest: ForestRule,
    /// Immune to chain flips.
    pub metal: MetalRule,
    /// Burns through forest shields.
    pub flame: FlameRule,
    /// Diagonal attacks.
    pub aqua: AquaRule,
    /// Weakens adjacent enemies.
    pub thunder: ThunderRule,
    /// Lets its owner choose who moves first.
    pub wind: WindRule,
    /// Boosts one chosen edge.
    pub earth: EarthRule,
}

impl TraitEffects {
    /// Disabled form; every trait is neutral too.
    pub const NEUTRAL: Self = Self {
        enabled: false,
        cosmic: CosmicRule::NEUTRAL,
        light: LightRule::NEUTRAL,
        shadow: ShadowRule::NEUTRAL,
        forest: ForestRule::NEUTRAL,
        metal: MetalRule::NEUTRAL,
        flame: FlameRule::NEUTRAL,
        aqua: AquaRule::NEUTRAL,
        thunder: ThunderRule::NEUTRAL,
        wind: WindRule::NEUTRAL,
        earth: EarthRule::NEUTRAL,
    };
}

/// Resolved `traitEffects.cosmic`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmicRule {
    /// Group toggle.
    pub enabled: bool,
    /// Edge bonus for a card placed in a corner.
    pub corner_triad_plus: u8,
}

impl CosmicRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self { enabled: false, corner_triad_plus: 0 };
}

/// Resolved `traitEffects.light`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightRule {
    /// Group toggle.
    pub enabled: bool,
    /// Edge bonus given to adjacent allies.
    pub adjacency_triad_plus: u8,
    /// Bonuses from several light cards add up.
    pub stack: bool,
}

impl LightRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self { enabled: false, adjacency_triad_plus: 0, stack: false };
}

/// Resolved `traitEffects.shadow`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowRule {
    /// Group toggle.
    pub enabled: bool,
    /// Shadow cards ignore warning marks.
    pub warning_mark_immune: bool,
}

impl ShadowRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self { enabled: false, warning_mark_immune: false };
}

/// Resolved `traitEffects.forest`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForestRule {
    /// Group toggle.
    pub enabled: bool,
    /// Flips absorbed before the card turns.
    pub shield_hits: u8,
}

impl ForestRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self { enabled: false, shield_hits: 0 };
}

/// Resolved `traitEffects.metal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetalRule {
    /// Group toggle.
    pub enabled: bool,
    /// Metal cards cannot be flipped by a chain.
    pub chain_immune: bool,
}

impl MetalRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self { enabled: false, chain_immune: false };
}

/// Resolved `traitEffects.flame`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlameRule {
    /// Group toggle.
    pub enabled: bool,
    /// Flame cards flip through forest shields.
    pub ignore_forest_shield: bool,
}

impl FlameRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self { enabled: false, ignore_forest_shield: false };
}

/// Resolved `traitEffects.aqua`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AquaRule {
    /// Group toggle.
    pub enabled: bool,
    /// [`DiagonalStrength`] code, 0 when disabled.
    pub diagonal_strength_method: u8,
}

impl AquaRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self { enabled: false, diagonal_strength_method: 0 };
}

/// Resolved `traitEffects.thunder`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThunderRule {
    /// Group toggle.
    pub enabled: bool,
    /// Edge modifier on adjacent enemy cards.
    pub adjacent_enemy_all_triad_delta: i8,
}

impl ThunderRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self { enabled: false, adjacent_enemy_all_triad_delta: 0 };
}

/// Resolved `traitEffects.wind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindRule {
    /// Group toggle.
    pub enabled: bool,
    /// The wind holder picks who moves first.
    pub first_player_choice: bool,
}

impl WindRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self { enabled: false, first_player_choice: false };
}

/// Resolved `traitEffects.earth`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarthRule {
    /// Group toggle.
    pub enabled: bool,
    /// Bonus on the chosen edge.
    pub boost: u8,
    /// Modifier on the edge opposite the boost.
    pub oppose_penalty: i8,
    /// A placement must name the boosted edge.
    pub require_choice: bool,
}

impl EarthRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self { enabled: false, boost: 0, oppose_penalty: 0, require_choice: false };
}

/// Resolved `synergy.formationBonuses`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormationBonuses {
    /// Group toggle.
    pub enabled: bool,
    /// Five distinct elements on the board.
    pub five_elements_harmony: HarmonyRule,
    /// Light and shadow cross-trait rule.
    pub eclipse: EclipseRule,
}

impl FormationBonuses {
    /// Disabled form; both formations are neutral too.
    pub const NEUTRAL: Self = Self {
        enabled: false,
        five_elements_harmony: HarmonyRule::NEUTRAL,
        eclipse: EclipseRule::NEUTRAL,
    };
}

/// Resolved `formationBonuses.fiveElementsHarmony`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarmonyRule {
    /// Group toggle.
    pub enabled: bool,
    /// Combo bonus while harmony holds.
    pub combo_bonus_triad_plus: u8,
    /// Sorted [`TraitKind`] codes.
    pub required_elements: [u8; HARMONY_ELEMENTS],
}

impl HarmonyRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self {
        enabled: false,
        combo_bonus_triad_plus: 0,
        required_elements: [0; HARMONY_ELEMENTS],
    };
}

/// Resolved `formationBonuses.eclipse`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EclipseRule {
    /// Group toggle.
    pub enabled: bool,
    /// Light cards also ignore warning marks.
    pub light_also_ignores_warning_mark: bool,
    /// Shadow cards count as light sources.
    pub shadow_counts_as_light_source: bool,
}

impl EclipseRule {
    /// Disabled form.
    pub const NEUTRAL: Self = Self {
        enabled: false,
        light_also_ignores_warning_mark: false,
        shadow_counts_as_light_source: false,
    };
}

/// The documented default ruleset: every mechanic on.
pub const DEFAULT_RULESET: CanonicalRuleset = CanonicalRuleset {
    version: 2,
    tactics: Tactics {
        warning_mark: WarningMarkRule {
            enabled: true,
            max_uses_per_player: 3,
            second_player_extra_uses: 1,
            penalty_all_triad: -1,
        },
        combo_bonus: ComboBonusRule {
            enabled: true,
            momentum_at: 3,
            domination_at: 4,
            fever_at: 5,
            momentum_triad_plus: 1,
            domination_triad_plus: 2,
        },
        second_player_balance: SecondPlayerBalanceRule {
            enabled: true,
            first_move_triad_plus: 1,
        },
    },
    synergy: Synergy {
        trait_derivation: TraitDerivationRule {
            enabled: true,
            source: TraitSource::ClassId as u8,
        },
        trait_effects: TraitEffects {
            enabled: true,
            cosmic: CosmicRule { enabled: true, corner_triad_plus: 1 },
            light: LightRule { enabled: true, adjacency_triad_plus: 1, stack: false },
            shadow: ShadowRule { enabled: true, warning_mark_immune: true },
            forest: ForestRule { enabled: true, shield_hits: 1 },
            metal: MetalRule { enabled: true, chain_immune: true },
            flame: FlameRule { enabled: true, ignore_forest_shield: true },
            aqua: AquaRule { enabled: true, diagonal_strength_method: DiagonalStrength::Min as u8 },
            thunder: ThunderRule { enabled: true, adjacent_enemy_all_triad_delta: -1 },
            wind: WindRule { enabled: true, first_player_choice: true },
            earth: EarthRule { enabled: true, boost: 2, oppose_penalty: -1, require_choice: true },
        },
        formation_bonuses: FormationBonuses {
            enabled: true,
            five_elements_harmony: HarmonyRule {
                enabled: true,
                combo_bonus_triad_plus: 2,
                required_elements: [
                    TraitKind::Flame as u8,
                    TraitKind::Aqua as u8,
                    TraitKind::Thunder as u8,
                    TraitKind::Wind as u8,
                    TraitKind::Earth as u8,
                ],
            },
            eclipse: EclipseRule {
                enabled: true,
                light_also_ignores_warning_mark: true,
                shadow_counts_as_light_source: true,
            },
        },
    },
};

/// Classic triad: version 1, every optional mechanic off.
pub const CLASSIC_RULESET: CanonicalRuleset = CanonicalRuleset {
    version: 1,
    tactics: Tactics {
        warning_mark: WarningMarkRule::NEUTRAL,
        combo_bonus: ComboBonusRule::NEUTRAL,
        second_player_balance: SecondPlayerBalanceRule::NEUTRAL,
    },
    synergy: Synergy {
        trait_derivation: TraitDerivationRule::NEUTRAL,
        trait_effects: TraitEffects::NEUTRAL,
        formation_bonuses: FormationBonuses::NEUTRAL,
    },
};

/// Resolve a partial config into its canonical form.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use triad_ledger::ruleset::{canonicalize, RulesetConfigInput};
///
/// let a = RulesetConfigInput::from_json(json!({
///     "tactics": { "warningMark": { "enabled": false, "maxUsesPerPlayer": 9 } }
/// })).unwrap();
/// let b = RulesetConfigInput::from_json(json!({
///     "tactics": { "warningMark": { "enabled": false } }
/// })).unwrap();
///
/// assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
/// ```
pub fn canonicalize(input: &RulesetConfigInput) -> Result<CanonicalRuleset, CanonicalizationError> {
    let d = &DEFAULT_RULESET;
    let tactics = input.tactics.as_ref();
    let synergy = input.synergy.as_ref();

    Ok(CanonicalRuleset {
        version: resolve_u8("version", input.version.as_ref(), d.version)?,
        tactics: Tactics {
            warning_mark: resolve_warning_mark(tactics.and_then(|t| t.warning_mark.as_ref()))?,
            combo_bonus: resolve_combo_bonus(tactics.and_then(|t| t.combo_bonus.as_ref()))?,
            second_player_balance: resolve_second_player_balance(
                tactics.and_then(|t| t.second_player_balance.as_ref()),
            )?,
        },
        synergy: Synergy {
            trait_derivation: resolve_trait_derivation(
                synergy.and_then(|s| s.trait_derivation.as_ref()),
            )?,
            trait_effects: resolve_trait_effects(synergy.and_then(|s| s.trait_effects.as_ref()))?,
            formation_bonuses: resolve_formation_bonuses(
                synergy.and_then(|s| s.formation_bonuses.as_ref()),
            )?,
        },
    })
}

// =============================================================================
// Per-group resolution
// =============================================================================

fn resolve_warning_mark(input: Option<&WarningMarkInput>) -> Result<WarningMarkRule, CanonicalizationError> {
    let d = DEFAULT_RULESET.tactics.warning_mark;
    let Some(input) = input else { return Ok(d) };
    if !input.enabled.unwrap_or(d.enabled) {
        return Ok(WarningMarkRule::NEUTRAL);
    }

    Ok(WarningMarkRule {
        enabled: true,
        max_uses_per_player: resolve_u8(
            "tactics.warningMark.maxUsesPerPlayer",
            input.max_uses_per_player.as_ref(),
            d.max_uses_per_player,
        )?,
        second_player_extra_uses: resolve_u8(
            "tactics.warningMark.secondPlayerExtraUses",
            input.second_player_extra_uses.as_ref(),
            d.second_player_extra_uses,
        )?,
        penalty_all_triad: resolve_i8(
            "tactics.warningMark.penaltyAllTriad",
            input.penalty_all_triad.as_ref(),
            d.penalty_all_triad,
        )?,
    })
}

fn resolve_combo_bonus(input: Option<&ComboBonusInput>) -> Result<ComboBonusRule, CanonicalizationError> {
    let d = DEFAULT_RULESET.tactics.combo_bonus;
    let Some(input) = input else { return Ok(d) };
    if !input.enabled.unwrap_or(d.enabled) {
        return Ok(ComboBonusRule::NEUTRAL);
    }

    Ok(ComboBonusRule {
        enabled: true,
        momentum_at: resolve_u8("tactics.comboBonus.momentumAt", input.momentum_at.as_ref(), d.momentum_at)?,
        domination_at: resolve_u8(
            "tactics.comboBonus.dominationAt",
            input.domination_at.as_ref(),
            d.domination_at,
        )?,
        fever_at: resolve_u8("tactics.comboBonus.feverAt", input.fever_at.as_ref(), d.fever_at)?,
        momentum_triad_plus: resolve_u8(
            "tactics.comboBonus.momentumTriadPlus",
            input.momentum_triad_plus.as_ref(),
            d.momentum_triad_plus,
        )?,
        domination_triad_plus: resolve_u8(
            "tactics.comboBonus.dominationTriadPlus",
            input.domination_triad_plus.as_ref(),
            d.domination_triad_plus,
        )?,
    })
}

fn resolve_second_player_balance(
    input: Option<&SecondPlayerBalanceInput>,
) -> Result<SecondPlayerBalanceRule, CanonicalizationError> {
    let d = DEFAULT_RULESET.tactics.second_player_balance;
    let Some(input) = input else { return Ok(d) };
    if !input.enabled.unwrap_or(d.enabled) {
        return Ok(SecondPlayerBalanceRule::NEUTRAL);
    }

    Ok(SecondPlayerBalanceRule {
        enabled: true,
        first_move_triad_plus: resolve_u8(
            "tactics.secondPlayerBalance.firstMoveTriadPlus",
            input.first_move_triad_plus.as_ref(),
            d.first_move_triad_plus,
        )?,
    })
}

fn resolve_trait_derivation(
    input: Option<&TraitDerivationInput>,
) -> Result<TraitDerivationRule, CanonicalizationError> {
    let d = DEFAULT_RULESET.synergy.trait_derivation;
    let Some(input) = input else { return Ok(d) };
    if !input.enabled.unwrap_or(d.enabled) {
        return Ok(TraitDerivationRule::NEUTRAL);
    }

    let source = match input.source.as_deref() {
        Some(name) => TraitSource::parse("synergy.traitDerivation.source", name)?.code(),
        None => d.source,
    };
    Ok(TraitDerivationRule { enabled: true, source })
}

fn resolve_trait_effects(input: Option<&TraitEffectsInput>) -> Result<TraitEffects, CanonicalizationError> {
    let d = DEFAULT_RULESET.synergy.trait_effects;
    let Some(input) = input else { return Ok(d) };
    if !input.enabled.unwrap_or(d.enabled) {
        return Ok(TraitEffects::NEUTRAL);
    }

    Ok(TraitEffects {
        enabled: true,
        cosmic: resolve_cosmic(input.cosmic.as_ref(), d.cosmic)?,
        light: resolve_light(input.light.as_ref(), d.light)?,
        shadow: resolve_shadow(input.shadow.as_ref(), d.shadow),
        forest: resolve_forest(input.forest.as_ref(), d.forest)?,
        metal: resolve_metal(input.metal.as_ref(), d.metal),
        flame: resolve_flame(input.flame.as_ref(), d.flame),
        aqua: resolve_aqua(input.aqua.as_ref(), d.aqua)?,
        thunder: resolve_thunder(input.thunder.as_ref(), d.thunder)?,
        wind: resolve_wind(input.wind.as_ref(), d.wind),
        earth: resolve_earth(input.earth.as_ref(), d.earth)?,
    })
}

fn resolve_cosmic(input: Option<&CosmicInput>, d: CosmicRule) -> Result<CosmicRule, CanonicalizationError> {
    let Some(input) = input else { return Ok(d) };
    if !input.enabled.unwrap_or(d.enabled) {
        return Ok(CosmicRule::NEUTRAL);
    }
    Ok(CosmicRule {
        enabled: true,
        corner_triad_plus: resolve_u8(
            "synergy.traitEffects.cosmic.cornerTriadPlus",
            input.corner_triad_plus.as_ref(),
            d.corner_triad_plus,
        )?,
    })
}

fn resolve_light(input: Option<&LightInput>, d: LightRule) -> Result<LightRule, CanonicalizationError> {
    let Some(input) = input else { return Ok(d) };
    if !input.enabled.unwrap_or(d.enabled) {
        return Ok(LightRule::NEUTRAL);
    }
    Ok(LightRule {
        enabled: true,
        adjacency_triad_plus: resolve_u8(
            "synergy.traitEffects.light.adjacencyTriadPlus",
            input.adjacency_triad_plus.as_ref(),
            d.adjacency_triad_plus,
        )?,
        stack: input.stack.unwrap_or(d.stack),
    })
}

fn resolve_shadow(input: Option<&ShadowInput>, d: ShadowRule) -> ShadowRule {
    let Some(input) = input else { return d };
    if !input.enabled.unwrap_or(d.enabled) {
        return ShadowRule::NEUTRAL;
    }
    ShadowRule {
        enabled: true,
        warning_mark_immune: input.warning_mark_immune.unwrap_or(d.warning_mark_immune),
    }
}

fn resolve_forest(input: Option<&ForestInput>, d: ForestRule) -> Result<ForestRule, CanonicalizationError> {
    let Some(input) = input else { return Ok(d) };
    if !input.enabled.unwrap_or(d.enabled) {
        return Ok(ForestRule::NEUTRAL);
    }
    Ok(ForestRule {
        enabled: true,
        shield_hits: resolve_u8(
            "synergy.traitEffects.forest.shieldHits",
            input.shield_hits.as_ref(),
            d.shield_hits,
        )?,
    })
}

fn resolve_metal(input: Option<&MetalInput>, d: MetalRule) -> MetalRule {
    let Some(input) = input else { return d };
    if !input.enabled.unwrap_or(d.enabled) {
        return MetalRule::NEUTRAL;
    }
    MetalRule {
        enabled: true,
        chain_immune: input.chain_immune.unwrap_or(d.chain_immune),
    }
}

fn resolve_flame(input: Option<&FlameInput>, d: FlameRule) -> FlameRule {
    let Some(input) = input else { return d };
    if !input.enabled.unwrap_or(d.enabled) {
        return FlameRule::NEUTRAL;
    }
    FlameRule {
        enabled: true,
        ignore_forest_shield: input.ignore_forest_shield.unwrap_or(d.ignore_forest_shield),
    }
}

fn resolve_aqua(input: Option<&AquaInput>, d: AquaRule) -> Result<AquaRule, CanonicalizationError> {
    let Some(input) = input else { return Ok(d) };
    if !input.enabled.unwrap_or(d.enabled) {
        return Ok(AquaRule::NEUTRAL);
    }
    let diagonal_strength_method = match input.diagonal_strength_method.as_deref() {
        Some(name) => {
            DiagonalStrength::parse("synergy.traitEffects.aqua.diagonalStrengthMethod", name)?.code()
        }
        None => d.diagonal_strength_method,
    };
    Ok(AquaRule { enabled: true, diagonal_strength_method })
}

fn resolve_thunder(input: Option<&ThunderInput>, d: ThunderRule) -> Result<ThunderRule, CanonicalizationError> {
    let Some(input) = input else { return Ok(d) };
    if !input.enabled.unwrap_or(d.enabled) {
        return Ok(ThunderRule::NEUTRAL);
    }
    Ok(ThunderRule {
        enabled: true,
        adjacent_enemy_all_triad_delta: resolve_i8(
            "synergy.traitEffects.thunder.adjacentEnemyAllTriadDelta",
            input.adjacent_enemy_all_triad_delta.as_ref(),
            d.adjacent_enemy_all_triad_delta,
        )?,
    })
}

fn resolve_wind(input: Option<&WindInput>, d: WindRule) -> WindRule {
    let Some(input) = input else { return d };
    if !input.enabled.unwrap_or(d.enabled) {
        return WindRule::NEUTRAL;
    }
    WindRule {
        enabled: true,
        first_player_choice: input.first_player_choice.unwrap_or(d.first_player_choice),
    }
}

fn resolve_earth(input: Option<&EarthInput>, d: EarthRule) -> Result<EarthRule, CanonicalizationError> {
    let Some(input) = input else { return Ok(d) };
    if !input.enabled.unwrap_or(d.enabled) {
        return Ok(EarthRule::NEUTRAL);
    }
    Ok(EarthRule {
        enabled: true,
        boost: resolve_u8("synergy.traitEffects.earth.boost", input.boost.as_ref(), d.boost)?,
        oppose_penalty: resolve_i8(
            "synergy.traitEffects.earth.opposePenalty",
            input.oppose_penalty.as_ref(),
            d.oppose_penalty,
        )?,
        require_choice: input.require_choice.unwrap_or(d.require_choice),
    })
}

fn resolve_formation_bonuses(
    input: Option<&FormationBonusesInput>,
) -> Result<FormationBonuses, CanonicalizationError> {
    let d = DEFAULT_RULESET.synergy.formation_bonuses;
    let Some(input) = input else { return Ok(d) };
    if !input.enabled.unwrap_or(d.enabled) {
        return Ok(FormationBonuses::NEUTRAL);
    }

    Ok(FormationBonuses {
        enabled: true,
        five_elements_harmony: resolve_harmony(input.five_elements_harmony.as_ref(), d.five_elements_harmony)?,
        eclipse: resolve_eclipse(input.eclipse.as_ref(), d.eclipse),
    })
}

fn resolve_harmony(input: Option<&HarmonyInput>, d: HarmonyRule) -> Result<HarmonyRule, CanonicalizationError> {
    let Some(input) = input else { return Ok(d) };
    if !input.enabled.unwrap_or(d.enabled) {
        return Ok(HarmonyRule::NEUTRAL);
    }
    Ok(HarmonyRule {
        enabled: true,
        combo_bonus_triad_plus: resolve_u8(
            "synergy.formationBonuses.fiveElementsHarmony.comboBonusTriadPlus",
            input.combo_bonus_triad_plus.as_ref(),
            d.combo_bonus_triad_plus,
        )?,
        required_elements: resolve_required_elements(input.required_elements.as_deref(), d.required_elements)?,
    })
}

fn resolve_eclipse(input: Option<&EclipseInput>, d: EclipseRule) -> EclipseRule {
    let Some(input) = input else { return d };
    if !input.enabled.unwrap_or(d.enabled) {
        return EclipseRule::NEUTRAL;
    }
    EclipseRule {
        enabled: true,
        light_also_ignores_warning_mark: input
            .light_also_ignores_warning_mark
            .unwrap_or(d.light_also_ignores_warning_mark),
        shadow_counts_as_light_source: input
            .shadow_counts_as_light_source
            .unwrap_or(d.shadow_counts_as_light_source),
    }
}

/// The harmony element list is a set: order is discarded by sorting codes.
fn resolve_required_elements(
    names: Option<&[String]>,
    default: [u8; HARMONY_ELEMENTS],
) -> Result<[u8; HARMONY_ELEMENTS], CanonicalizationError> {
    const FIELD: &str = "synergy.formationBonuses.fiveElementsHarmony.requiredElements";

    let Some(names) = names else { return Ok(default) };
    if names.len() != HARMONY_ELEMENTS {
        return Err(CanonicalizationError::ElementCount {
            field: FIELD,
            expected: HARMONY_ELEMENTS,
            got: names.len(),
        });
    }

    let mut seen = BTreeSet::new();
    let mut codes = [0u8; HARMONY_ELEMENTS];
    for (slot, name) in codes.iter_mut().zip(names) {
        let code = TraitKind::parse(FIELD, name)?.code();
        if !seen.insert(code) {
            return Err(CanonicalizationError::DuplicateElement {
                field: FIELD,
                value: name.clone(),
            });
        }
        *slot = code;
    }
    codes.sort_unstable();
    Ok(codes)
}

// =============================================================================
// Integer domains
// =============================================================================

fn resolve_u8(field: &'static str, value: Option<&Number>, default: u8) -> Result<u8, CanonicalizationError> {
    match value {
        Some(n) => checked_int(field, n, IntDomain::U8).map(|v| v as u8),
        None => Ok(default),
    }
}

fn resolve_i8(field: &'static str, value: Option<&Number>, default: i8) -> Result<i8, CanonicalizationError> {
    match value {
        Some(n) => checked_int(field, n, IntDomain::I8).map(|v| v as i8),
        None => Ok(default),
    }
}

/// Integral value of `n` inside `domain`. Integral floats (`3.0`) count as
/// integers; anything with a fractional part does not.
fn checked_int(field: &'static str, n: &Number, domain: IntDomain) -> Result<i64, CanonicalizationError> {
    let out_of_range = || CanonicalizationError::OutOfRange {
        field,
        value: n.to_string(),
        domain,
    };

    let value = if let Some(v) = n.as_i64() {
        v
    } else if n.is_u64() {
        return Err(out_of_range());
    } else {
        match n.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 => {
                if f < domain.min() as f64 || f > domain.max() as f64 {
                    return Err(out_of_range());
                }
                f as i64
            }
            _ => {
                return Err(CanonicalizationError::NotAnInteger {
                    field,
                    value: n.to_string(),
                })
            }
        }
    };

    if value < domain.min() || value > domain.max() {
        return Err(out_of_range());
    }
    Ok(value)
}
