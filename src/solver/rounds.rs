use serde::Serialize;
use tracing::{debug, info};

use super::{admit, Admission};
use crate::world::{AgentId, CapacityPolicy, World};

/// What happened during one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub round: usize,
    pub unassigned_before: usize,
    pub admitted: usize,
    pub overflowed: usize,
}

impl RoundReport {
    pub fn unassigned_after(&self) -> usize {
        self.unassigned_before - self.admitted
    }
}

/// Drives the round loop over a world.
///
/// Round `k` offers every still-unassigned agent its `k`-th preference, in
/// population order. The loop ends after the longest preference list is
/// exhausted; agents left over stay unassigned.
pub struct Matcher<'w> {
    world: &'w mut World,
    policy: CapacityPolicy,
    round: usize,
    rounds: usize,
    report_rounds: bool,
}

impl<'w> Matcher<'w> {
    pub fn new(world: &'w mut World, policy: CapacityPolicy) -> Self {
        let rounds = world.preference_len();
        Self {
            world,
            policy,
            round: 0,
            rounds,
            report_rounds: false,
        }
    }

    /// Log the unassigned count at `info` before each round.
    pub fn with_round_reports(mut self, report_rounds: bool) -> Self {
        self.report_rounds = report_rounds;
        self
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn is_finished(&self) -> bool {
        self.round >= self.rounds
    }

    pub fn world(&self) -> &World {
        &*self.world
    }

    /// Runs the current round and advances. Returns `None` once finished.
    pub fn step(&mut self) -> Option<RoundReport> {
        if self.is_finished() {
            return None;
        }
        let round = self.round;

        let unassigned: Vec<AgentId> = self
            .world
            .agents
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.is_assigned())
            .map(|(i, _)| AgentId(i))
            .collect();

        if self.report_rounds {
            info!(round, unassigned = unassigned.len(), "still unassigned");
        }

        let mut report = RoundReport {
            round,
            unassigned_before: unassigned.len(),
            admitted: 0,
            overflowed: 0,
        };

        for agent in unassigned {
            // Shorter lists than the longest one just sit out late rounds.
            let Some(resource) = self.world.agent(agent).preference(round) else {
                continue;
            };
            match admit(self.world, agent, resource, self.policy) {
                Admission::Admitted => report.admitted += 1,
                Admission::Overflow => report.overflowed += 1,
                Admission::AlreadyAssigned => {}
            }
        }

        debug!(
            round,
            admitted = report.admitted,
            overflowed = report.overflowed,
            "round complete"
        );

        self.round += 1;
        Some(report)
    }

    /// Runs every remaining round.
    pub fn run(&mut self) -> Vec<RoundReport> {
        let mut reports = Vec::with_capacity(self.rounds.saturating_sub(self.round));
        while let Some(report) = self.step() {
            reports.push(report);
        }

        let unassigned = self.world.agents.iter().filter(|a| !a.is_assigned()).count();
        info!(
            rounds = self.rounds,
            unassigned,
            policy = ?self.policy,
            "match finished"
        );

        reports
    }
}

/// Runs a full match over `world`.
pub fn solve(world: &mut World, policy: CapacityPolicy) -> Vec<RoundReport> {
    Matcher::new(world, policy).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Agent, Resource, ResourceId};

    /// R1 and R2 with capacity 1; A and B want R1 first, C wants R2 first.
    fn contested() -> World {
        let r1 = ResourceId(0);
        let r2 = ResourceId(1);
        World::new(
            vec![
                Agent::new("A", vec![r1, r2]),
                Agent::new("B", vec![r1, r2]),
                Agent::new("C", vec![r2, r1]),
            ],
            vec![Resource::new("R1", 1), Resource::new("R2", 1)],
        )
        .unwrap()
    }

    #[test]
    fn strict_pushes_second_claimant_to_next_round() {
        let mut world = contested();
        let mut matcher = Matcher::new(&mut world, CapacityPolicy::Strict);
        assert_eq!(matcher.rounds(), 2);
        assert_eq!(matcher.round(), 0);

        let first = matcher.step().unwrap();
        assert_eq!(
            first,
            RoundReport {
                round: 0,
                unassigned_before: 3,
                admitted: 2,
                overflowed: 1
            }
        );
        assert_eq!(matcher.round(), 1);

        let second = matcher.step().unwrap();
        assert_eq!(second.unassigned_before, 1);
        // B's second choice R2 already holds C.
        assert_eq!(second.overflowed, 1);
        assert!(!matcher.world().agents[1].is_assigned());
        assert!(matcher.is_finished());
        assert_eq!(matcher.step(), None);
    }

    #[test]
    fn inclusive_lets_second_claimant_in() {
        let mut world = contested();
        let reports = solve(&mut world, CapacityPolicy::Inclusive);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].admitted, 3);
        assert_eq!(reports[1].unassigned_before, 0);
        assert_eq!(world.resources[0].roster(), &[AgentId(0), AgentId(1)]);
        assert_eq!(world.resources[1].roster(), &[AgentId(2)]);
    }

    #[test]
    fn uneven_lists_skip_missing_slots() {
        let mut world = World::new(
            vec![
                Agent::new("short", vec![ResourceId(0)]),
                Agent::new("long", vec![ResourceId(0), ResourceId(0), ResourceId(1)]),
            ],
            vec![Resource::new("R1", 1), Resource::new("R2", 1)],
        )
        .unwrap();

        let reports = solve(&mut world, CapacityPolicy::Strict);

        assert_eq!(reports.len(), 3);
        assert_eq!(world.agents[0].assigned(), Some(ResourceId(0)));
        assert_eq!(world.agents[1].assigned(), Some(ResourceId(1)));
        assert_eq!(world.resources[0].overflow_count(), 2);
    }
}
