use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

// Constants
const DEFAULT_ATTACK_WEIGHT: f64 = 0.5;
const DEFAULT_DEFENSE_WEIGHT: f64 = 0.5;
const DEFAULT_COUNT_PAWNS_AS_DEFENDED: bool = false;
const DEFAULT_OFFENSIVE_NORMALIZER: f64 = 48.0;
const DEFAULT_PARALLEL: bool = true;

/// Tunables for the coordination and king-safety metrics.
///
/// Square control itself has no knobs. Missing fields in a config file fall
/// back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Weight of the total attacked-square count in the coordination score.
    pub attack_weight: f64,
    /// Weight of the summed defense scores in the coordination score.
    pub defense_weight: f64,
    /// Whether own pawns count as defended targets in a piece's defense score.
    pub count_pawns_as_defended: bool,
    /// Divisor applied to the offensive pressure tallies.
    pub offensive_normalizer: f64,
    /// Evaluate the positions of a game trace on the rayon pool.
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            attack_weight: DEFAULT_ATTACK_WEIGHT,
            defense_weight: DEFAULT_DEFENSE_WEIGHT,
            count_pawns_as_defended: DEFAULT_COUNT_PAWNS_AS_DEFENDED,
            offensive_normalizer: DEFAULT_OFFENSIVE_NORMALIZER,
            parallel: DEFAULT_PARALLEL,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
