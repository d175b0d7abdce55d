//! Run configuration.

use std::{fs, io};
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MatchError, MatchResult};
use crate::preferences::PreferenceMode;
use crate::world::CapacityPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub agents: usize,
    pub resources: usize,
    pub preference_len: usize,
    /// Per-resource capacity. Derived from `agents / resources` when unset.
    pub capacity: Option<usize>,
    pub mode: PreferenceMode,
    pub policy: CapacityPolicy,
    /// Fixes every random draw of the run when set.
    pub seed: Option<u64>,
    /// Resources with more overflow than this are reported as popular.
    pub popularity_threshold: usize,
    /// How many of the emptiest resources to report.
    pub unpopularity_threshold: usize,
    /// Log the unassigned count before every round.
    pub report_rounds: bool,
    /// Rematch the saved world instead of drawing a new one, as long as it
    /// still has the configured shape.
    pub reuse_world: bool,
    pub sweep: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            agents: 150,
            resources: 25,
            preference_len: 5,
            capacity: None,
            mode: PreferenceMode::Uniform,
            policy: CapacityPolicy::Strict,
            seed: None,
            popularity_threshold: 3,
            unpopularity_threshold: 4,
            report_rounds: true,
            reuse_world: false,
            sweep: false,
        }
    }
}

impl MatchConfig {
    /// Capacity given to every resource.
    pub fn resource_capacity(&self) -> usize {
        match self.capacity {
            Some(capacity) => capacity,
            None if self.resources == 0 => 0,
            None => self.agents / self.resources,
        }
    }

    pub fn validate(&self) -> MatchResult<()> {
        if self.agents == 0 {
            return Err(MatchError::EmptyPopulation);
        }
        if self.resources == 0 {
            return Err(MatchError::EmptyResources);
        }
        if self.preference_len == 0 {
            return Err(MatchError::ZeroPreferenceLength);
        }
        if self.resource_capacity() == 0 {
            return Err(MatchError::ZeroCapacity);
        }
        self.mode.validate()
    }

    /// Seeded generator when `seed` is set, otherwise seeded from entropy.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Reads the config at `path`, or writes the defaults there if it does not
    /// exist. Any other read failure is returned and the file is left alone.
    pub fn load_or_default(path: impl AsRef<Path>) -> MatchResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(s) => {
                let config: MatchConfig = serde_json::from_str(&s)?;
                debug!(path = %path.display(), "loaded match config");
                Ok(config)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let config = MatchConfig::default();
                fs::write(path, serde_json::to_string_pretty(&config)?)?;
                info!(path = %path.display(), "wrote default match config");
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }
}
