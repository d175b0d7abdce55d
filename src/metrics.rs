//! Satisfaction and popularity reports over a finished match.

use serde::Serialize;

use crate::error::{MatchError, MatchResult};
use crate::world::{Agent, Resource, World};

pub fn unassigned_count(agents: &[Agent]) -> usize {
    agents.iter().filter(|a| !a.is_assigned()).count()
}

/// Raw score of an agent's assignment: position counted from the end of its
/// list plus one, so the first choice scores `L` and the last scores 1.
/// A resource listed twice uses the occurrence nearest the end.
///
/// `None` when the agent is unassigned or its assignment is not listed.
pub fn preference_rank(agent: &Agent) -> Option<usize> {
    let assigned = agent.assigned()?;
    agent
        .preferences()
        .iter()
        .rev()
        .position(|&r| r == assigned)
        .map(|i| i + 1)
}

// Never fails for f32 or f64.
fn float<F: num::Float>(n: usize) -> F {
    F::from(n).unwrap_or_else(F::zero)
}

/// Rank normalised by list length, in `[0, 1]`.
pub fn satisfaction<F: num::Float>(agent: &Agent) -> F {
    let len = agent.preferences().len();
    match preference_rank(agent) {
        Some(rank) if len > 0 => float::<F>(rank) / float::<F>(len),
        _ => F::zero(),
    }
}

pub fn mean_satisfaction<F: num::Float>(agents: &[Agent]) -> MatchResult<F> {
    if agents.is_empty() {
        return Err(MatchError::EmptyPopulation);
    }
    let total = agents
        .iter()
        .fold(F::zero(), |acc, a| acc + satisfaction::<F>(a));
    Ok(total / float::<F>(agents.len()))
}

/// Resources whose overflow exceeds `threshold`, busiest first.
pub fn popular(resources: &[Resource], threshold: usize) -> Vec<(&Resource, usize)> {
    let mut out: Vec<_> = resources
        .iter()
        .filter(|r| r.overflow_count() > threshold)
        .map(|r| (r, r.overflow_count()))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

/// The `limit` resources with the smallest rosters, emptiest first.
pub fn unpopular(resources: &[Resource], limit: usize) -> Vec<(&Resource, usize)> {
    let mut out: Vec<_> = resources.iter().map(|r| (r, r.roster_len())).collect();
    out.sort_by_key(|&(_, len)| len);
    out.truncate(limit);
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceStat {
    pub resource: String,
    pub value: usize,
}

impl ResourceStat {
    fn from_pairs(pairs: Vec<(&Resource, usize)>) -> Vec<Self> {
        pairs
            .into_iter()
            .map(|(r, value)| Self {
                resource: r.name().to_string(),
                value,
            })
            .collect()
    }
}

/// Everything the reporting layer prints after a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub agents: usize,
    pub unassigned: usize,
    pub mean_satisfaction: f64,
    /// Overflow counts above the popularity threshold.
    pub popular: Vec<ResourceStat>,
    /// Roster sizes of the least subscribed resources.
    pub unpopular: Vec<ResourceStat>,
}

impl MatchSummary {
    pub fn from_world(
        world: &World,
        popularity_threshold: usize,
        unpopularity_threshold: usize,
    ) -> MatchResult<Self> {
        Ok(Self {
            agents: world.agents.len(),
            unassigned: unassigned_count(&world.agents),
            mean_satisfaction: mean_satisfaction::<f64>(&world.agents)?,
            popular: ResourceStat::from_pairs(popular(&world.resources, popularity_threshold)),
            unpopular: ResourceStat::from_pairs(unpopular(
                &world.resources,
                unpopularity_threshold,
            )),
        })
    }
}
