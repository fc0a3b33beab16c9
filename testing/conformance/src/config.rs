use crate::HarnessError;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the harness seed for reproduction.
pub const SEED_ENV: &str = "GLACIER_CONFORMANCE_SEED";

///
/// HarnessConfig
///
/// Run parameters. Every field has a default, so an empty TOML document is
/// a valid configuration.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub seed: u64,
    pub iterations: usize,
    pub max_types: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            iterations: 64,
            max_types: 5,
        }
    }
}

impl HarnessConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, HarnessError> {
        toml::from_str(text).map_err(|err| HarnessError::Config {
            message: err.to_string(),
        })
    }

    /// Defaults, with the seed taken from `GLACIER_CONFORMANCE_SEED` when set.
    pub fn from_env() -> Result<Self, HarnessError> {
        Self::default().with_seed_override(std::env::var(SEED_ENV).ok().as_deref())
    }

    /// Replace the seed with a decimal or `0x`-prefixed hex value.
    pub fn with_seed_override(mut self, seed: Option<&str>) -> Result<Self, HarnessError> {
        if let Some(raw) = seed {
            self.seed = parse_seed(raw).ok_or_else(|| HarnessError::Config {
                message: format!("{SEED_ENV}='{raw}' is not a u64"),
            })?;
        }

        Ok(self)
    }
}

fn parse_seed(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

///
/// TESTS
///
