//! Generator configuration loaded from JSON files and environment variables.

use crate::permutation::{ParamError, PermutationParams};
use crate::prng::{QuadraticResiduePrng, DEFAULT_INTERMEDIATE_OFFSET, DEFAULT_PRIME};
use serde::{Deserialize, Serialize};
use std::{env, fs, io, path::Path};
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding [`GeneratorConfig::prime`].
pub const ENV_PRIME: &str = "QRPRNG_PRIME";
/// Environment variable overriding [`GeneratorConfig::intermediate_offset`].
pub const ENV_INTERMEDIATE_OFFSET: &str = "QRPRNG_INTERMEDIATE_OFFSET";
/// Environment variable overriding [`GeneratorConfig::offset`].
pub const ENV_OFFSET: &str = "QRPRNG_OFFSET";

/// Errors raised while loading or applying a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    /// The configuration file could not be read.
    Io(#[from] io::Error),
    #[error("decode error: {0}")]
    /// The configuration file is not valid JSON for this schema.
    Decode(#[from] serde_json::Error),
    #[error("invalid value {value:?} for {var}: expected an unsigned 64-bit integer")]
    /// An environment override did not parse.
    Env {
        /// Variable name.
        var: &'static str,
        /// Raw value found.
        value: String,
    },
    #[error(transparent)]
    /// The resulting parameters were rejected.
    Param(#[from] ParamError),
}

/// Unvalidated generator parameters.
///
/// Missing fields fall back to the default generator's constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Prime congruent to 3 mod 4.
    pub prime: u64,
    /// Secondary seed, below `prime`.
    pub intermediate_offset: u64,
    /// Added to every output.
    pub offset: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            prime: DEFAULT_PRIME,
            intermediate_offset: DEFAULT_INTERMEDIATE_OFFSET,
            offset: 0,
        }
    }
}

impl GeneratorConfig {
    /// Parses a JSON document.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Reads and parses a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        debug!(path = %path.display(), ?config, "loaded generator config");
        Ok(config)
    }

    /// Applies `QRPRNG_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| env::var(var).ok())
    }

    /// Applies overrides produced by `lookup`, keyed by the `QRPRNG_*` names.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields: [(&'static str, &mut u64); 3] = [
            (ENV_PRIME, &mut self.prime),
            (ENV_INTERMEDIATE_OFFSET, &mut self.intermediate_offset),
            (ENV_OFFSET, &mut self.offset),
        ];
        for (var, slot) in fields {
            if let Some(raw) = lookup(var) {
                *slot = raw
                    .trim()
                    .replace('_', "")
                    .parse()
                    .map_err(|_| ConfigError::Env { var, value: raw })?;
                debug!(var, value = *slot, "applied config override");
            }
        }
        Ok(())
    }

    /// Validates the configuration into permutation parameters.
    pub fn params(&self) -> Result<PermutationParams, ConfigError> {
        Ok(PermutationParams::new(
            self.prime,
            self.intermediate_offset,
            self.offset,
        )?)
    }

    /// Validates the configuration into a generator at position zero.
    pub fn build(&self) -> Result<QuadraticResiduePrng, ConfigError> {
        self.params().map(QuadraticResiduePrng::from_params)
    }
}
