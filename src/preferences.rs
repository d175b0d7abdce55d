//! Preference list generation.

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::Poisson;
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, MatchResult};
use crate::world::ResourceId;

/// Mean of the skewed draw when nothing else is configured.
pub const DEFAULT_POISSON_MEAN: f64 = 14.0;

/// How each slot of a preference list is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreferenceMode {
    /// Every resource equally likely, with replacement.
    #[default]
    Uniform,
    /// Poisson-distributed resource index, clipped into range. Concentrates
    /// demand on the resources around `mean`.
    Skewed { mean: f64 },
}

impl PreferenceMode {
    pub fn skewed() -> Self {
        PreferenceMode::Skewed {
            mean: DEFAULT_POISSON_MEAN,
        }
    }

    pub fn validate(&self) -> MatchResult<()> {
        match *self {
            PreferenceMode::Uniform => Ok(()),
            PreferenceMode::Skewed { mean } if mean.is_finite() && mean > 0.0 => Ok(()),
            PreferenceMode::Skewed { mean } => Err(MatchError::InvalidPoissonMean(mean)),
        }
    }
}

/// Draws preference lists of a fixed length over `resource_count` resources.
pub struct PreferenceGenerator {
    resource_count: usize,
    len: usize,
    sampler: Sampler,
}

enum Sampler {
    Uniform(Uniform<usize>),
    Skewed(Poisson<f64>),
}

impl PreferenceGenerator {
    pub fn new(resource_count: usize, len: usize, mode: PreferenceMode) -> MatchResult<Self> {
        if resource_count == 0 {
            return Err(MatchError::EmptyResources);
        }
        if len == 0 {
            return Err(MatchError::ZeroPreferenceLength);
        }
        mode.validate()?;

        let sampler = match mode {
            PreferenceMode::Uniform => Sampler::Uniform(Uniform::new(0, resource_count)),
            PreferenceMode::Skewed { mean } => Sampler::Skewed(Poisson::new(mean)?),
        };

        Ok(Self {
            resource_count,
            len,
            sampler,
        })
    }

    pub fn preference_len(&self) -> usize {
        self.len
    }

    /// Draws a single slot.
    pub fn sample_slot<R: Rng + ?Sized>(&self, rng: &mut R) -> ResourceId {
        let index = match &self.sampler {
            Sampler::Uniform(dist) => dist.sample(rng),
            Sampler::Skewed(dist) => {
                let max = (self.resource_count - 1) as f64;
                dist.sample(rng).clamp(0.0, max) as usize
            }
        };
        ResourceId(index)
    }

    /// Draws one full preference list, most preferred first.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ResourceId> {
        (0..self.len).map(|_| self.sample_slot(rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generates_lists_of_requested_length_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let generator = PreferenceGenerator::new(25, 5, PreferenceMode::Uniform).unwrap();
        assert_eq!(generator.preference_len(), 5);

        for _ in 0..100 {
            let prefs = generator.generate(&mut rng);
            assert_eq!(prefs.len(), 5);
            assert!(prefs.iter().all(|r| r.0 < 25));
        }
    }

    #[test]
    fn skewed_draws_are_clipped_into_range() {
        let mut rng = StdRng::seed_from_u64(11);
        // Mean far past the last index: almost every draw needs clipping.
        let generator =
            PreferenceGenerator::new(4, 8, PreferenceMode::Skewed { mean: 50.0 }).unwrap();

        let prefs = generator.generate(&mut rng);
        assert!(prefs.iter().all(|r| r.0 < 4));
        assert!(prefs.iter().any(|r| r.0 == 3));
    }

    #[test]
    fn skewed_concentrates_on_indices_near_mean() {
        let mut rng = StdRng::seed_from_u64(3);
        let generator = PreferenceGenerator::new(25, 5, PreferenceMode::skewed()).unwrap();

        let mut counts = [0usize; 25];
        for _ in 0..2000 {
            for r in generator.generate(&mut rng) {
                counts[r.0] += 1;
            }
        }
        let near: usize = counts[10..=18].iter().sum();
        let far: usize = counts[0..5].iter().sum();
        assert!(near > far * 10);
    }

    #[test]
    fn same_seed_gives_same_lists() {
        let generator = PreferenceGenerator::new(10, 6, PreferenceMode::Uniform).unwrap();
        let a = generator.generate(&mut StdRng::seed_from_u64(99));
        let b = generator.generate(&mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn empty_resource_set_is_rejected() {
        let err = PreferenceGenerator::new(0, 5, PreferenceMode::Uniform)
            .err()
            .unwrap();
        assert!(matches!(err, MatchError::EmptyResources));
    }

    #[test]
    fn bad_poisson_mean_is_rejected() {
        for mean in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = PreferenceGenerator::new(5, 5, PreferenceMode::Skewed { mean })
                .err()
                .unwrap();
            assert!(err.is_configuration());
        }
    }
}
