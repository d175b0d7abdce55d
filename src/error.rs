//! Error types for setting up and exporting a match.

use thiserror::Error;

/// Errors surfaced while configuring, running or exporting a match.
///
/// Admission overflow is not an error; it is counted on the resource.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("configuration error: population has no agents")]
    EmptyPopulation,

    #[error("configuration error: no resources to allocate into")]
    EmptyResources,

    #[error("configuration error: preference length must be positive")]
    ZeroPreferenceLength,

    #[error("configuration error: resource capacity must be positive")]
    ZeroCapacity,

    #[error("configuration error: agent {agent} prefers unknown resource #{index}")]
    UnknownResource { agent: String, index: usize },

    #[error("configuration error: poisson mean must be positive and finite, got {0}")]
    InvalidPoissonMean(f64),

    #[error("poisson distribution error: {0}")]
    Poisson(#[from] rand_distr::PoissonError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl MatchError {
    /// True for the fatal setup errors (as opposed to I/O failures).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MatchError::EmptyPopulation
                | MatchError::EmptyResources
                | MatchError::ZeroPreferenceLength
                | MatchError::ZeroCapacity
                | MatchError::UnknownResource { .. }
                | MatchError::InvalidPoissonMean(_)
                | MatchError::Poisson(_)
        )
    }
}

pub type MatchResult<T> = Result<T, MatchError>;
