//! Closed name-to-code tables for enum-like ruleset fields.
//!
//! Codes start at 1. Code 0 is reserved for the neutral value of a disabled
//! group and is never produced by parsing a name.

use super::CanonicalizationError;

/// Card traits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TraitKind {
    /// Cosmic.
    Cosmic = 1,
    /// Light.
    Light = 2,
    /// Shadow.
    Shadow = 3,
    /// Forest.
    Forest = 4,
    /// Metal.
    Metal = 5,
    /// Flame.
    Flame = 6,
    /// Aqua.
    Aqua = 7,
    /// Thunder.
    Thunder = 8,
    /// Wind.
    Wind = 9,
    /// Earth.
    Earth = 10,
}

impl TraitKind {
    /// Look up a trait by name.
    pub fn parse(field: &'static str, name: &str) -> Result<Self, CanonicalizationError> {
        match name {
            "cosmic" => Ok(Self::Cosmic),
            "light" => Ok(Self::Light),
            "shadow" => Ok(Self::Shadow),
            "forest" => Ok(Self::Forest),
            "metal" => Ok(Self::Metal),
            "flame" => Ok(Self::Flame),
            "aqua" => Ok(Self::Aqua),
            "thunder" => Ok(Self::Thunder),
            "wind" => Ok(Self::Wind),
            "earth" => Ok(Self::Earth),
            other => Err(CanonicalizationError::UnknownVariant {
                field,
                value: other.to_string(),
            }),
        }
    }

    /// Encoded value.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Where a card's trait comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TraitSource {
    /// On-chain class id of the card.
    ClassId = 1,
    /// On-chain season id of the card.
    SeasonId = 2,
    /// On-chain rarity rank of the card.
    Rank = 3,
}

impl TraitSource {
    /// Look up a source by name.
    pub fn parse(field: &'static str, name: &str) -> Result<Self, CanonicalizationError> {
        match name {
            "classId" => Ok(Self::ClassId),
            "seasonId" => Ok(Self::SeasonId),
            "rank" => Ok(Self::Rank),
            other => Err(CanonicalizationError::UnknownVariant {
                field,
                value: other.to_string(),
            }),
        }
    }

    /// Encoded value.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// How aqua combines the two edges facing a diagonal neighbour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DiagonalStrength {
    /// Weaker of the two edges.
    Min = 1,
    /// Stronger of the two edges.
    Max = 2,
    /// Sum of both edges.
    Sum = 3,
}

impl DiagonalStrength {
    /// Look up a method by name.
    pub fn parse(field: &'static str, name: &str) -> Result<Self, CanonicalizationError> {
        match name {
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "sum" => Ok(Self::Sum),
            other => Err(CanonicalizationError::UnknownVariant {
                field,
                value: other.to_string(),
            }),
        }
    }

    /// Encoded value.
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_codes_are_distinct_and_nonzero() {
        let names = [
            "cosmic", "light", "shadow", "forest", "metal",
            "flame", "aqua", "thunder", "wind", "earth",
        ];
        let mut codes: Vec<u8> = names
            .iter()
            .map(|n| TraitKind::parse("t", n).unwrap().code())
            .collect();
        codes.sort();
        codes.dedup();

        assert_eq!(codes.len(), names.len());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn test_unknown_names_are_fatal() {
        assert!(TraitKind::parse("t", "plasma").is_err());
        assert!(TraitKind::parse("t", "Cosmic").is_err());
        assert!(TraitSource::parse("s", "").is_err());
        assert!(DiagonalStrength::parse("d", "avg").is_err());
    }

    #[test]
    fn test_error_names_the_field() {
        let err = DiagonalStrength::parse("synergy.traitEffects.aqua.diagonalStrengthMethod", "avg")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "synergy.traitEffects.aqua.diagonalStrengthMethod: unrecognized value \"avg\""
        );
    }
}
