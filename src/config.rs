//! Ladder Configuration
//!
//! Signing domain and batch filters for an aggregation run, read from the
//! environment:
//!
//! | Variable                    | Meaning                          | Default |
//! |-----------------------------|----------------------------------|---------|
//! | `LADDER_CHAIN_ID`           | signing domain chain id          | 8453    |
//! | `LADDER_VERIFYING_CONTRACT` | signing domain contract address  | zero    |
//! | `LADDER_SEASON_ID`          | only accept this season          | any     |
//! | `LADDER_RULESET_ID`         | only accept this ruleset id      | any     |
//! | `LADDER_REQUIRE_ZERO_SUM`   | flag non-zero-sum batches        | true    |

use thiserror::Error;

use crate::core::{Address, ParseBytesError};
use crate::ladder::StandingsOptions;
use crate::proof::SigningDomain;
use crate::ruleset::RulesetId;

/// Default chain id.
pub const DEFAULT_CHAIN_ID: u64 = 8453;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Variable present but not a number.
    #[error("{var}: expected an unsigned integer, got {value:?}")]
    InvalidNumber {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
    /// Variable present but not valid hex of the right length.
    #[error("{var}: {source}")]
    InvalidHex {
        /// Variable name.
        var: &'static str,
        /// Parse failure.
        source: ParseBytesError,
    },
    /// Variable present but not a boolean.
    #[error("{var}: expected true/false/1/0, got {value:?}")]
    InvalidFlag {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Ladder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderConfig {
    /// Domain attestations are signed under.
    pub domain: SigningDomain,
    /// Season filter.
    pub expected_season_id: Option<u32>,
    /// Ruleset filter.
    pub expected_ruleset_id: Option<RulesetId>,
    /// Report batches whose points don't net to zero.
    pub require_zero_sum_points: bool,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            domain: SigningDomain::new(DEFAULT_CHAIN_ID, Address::ZERO),
            expected_season_id: None,
            expected_ruleset_id: None,
            require_zero_sum_points: true,
        }
    }
}

impl LadderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create config from any variable source. Unset variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let chain_id = match lookup("LADDER_CHAIN_ID") {
            Some(v) => parse_number::<u64>("LADDER_CHAIN_ID", &v)?,
            None => defaults.domain.chain_id,
        };
        let verifying_contract = match lookup("LADDER_VERIFYING_CONTRACT") {
            Some(v) => v
                .trim()
                .parse::<Address>()
                .map_err(|source| ConfigError::InvalidHex { var: "LADDER_VERIFYING_CONTRACT", source })?,
            None => defaults.domain.verifying_contract,
        };
        let expected_season_id = lookup("LADDER_SEASON_ID")
            .map(|v| parse_number::<u32>("LADDER_SEASON_ID", &v))
            .transpose()?;
        let expected_ruleset_id = lookup("LADDER_RULESET_ID")
            .map(|v| {
                v.trim()
                    .parse::<RulesetId>()
                    .map_err(|source| ConfigError::InvalidHex { var: "LADDER_RULESET_ID", source })
            })
            .transpose()?;
        let require_zero_sum_points = match lookup("LADDER_REQUIRE_ZERO_SUM") {
            Some(v) => parse_flag("LADDER_REQUIRE_ZERO_SUM", &v)?,
            None => defaults.require_zero_sum_points,
        };

        Ok(Self {
            domain: SigningDomain::new(chain_id, verifying_contract),
            expected_season_id,
            expected_ruleset_id,
            require_zero_sum_points,
        })
    }

    /// Aggregation options for this config.
    pub fn standings_options(&self) -> StandingsOptions {
        StandingsOptions {
            expected_season_id: self.expected_season_id,
            expected_ruleset_id: self.expected_ruleset_id,
            require_zero_sum_points: self.require_zero_sum_points,
        }
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: value.to_string(),
        }),
    }
}
