//! Round-based greedy placement of agents into resources.

use thiserror::Error;
use tracing::{trace, warn};

use crate::world::{AgentId, CapacityPolicy, ResourceId, World};

pub mod rounds;

pub use rounds::{solve, Matcher, RoundReport};

/// Outcome of a single admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// The resource was at its boundary; its overflow counter was bumped.
    Overflow,
    /// The agent already holds an assignment; nothing changed.
    AlreadyAssigned,
}

/// Tries to add `agent` to `resource`'s roster under `policy`.
///
/// On success the agent is appended to the roster and assigned. On overflow
/// the resource's counter is incremented and the agent stays unassigned.
pub fn admit(
    world: &mut World,
    agent: AgentId,
    resource: ResourceId,
    policy: CapacityPolicy,
) -> Admission {
    let World { agents, resources } = world;
    let a = &mut agents[agent.0];
    let r = &mut resources[resource.0];

    if a.is_assigned() {
        return Admission::AlreadyAssigned;
    }

    if r.has_room(policy) {
        r.push(agent);
        a.assign(resource);
        trace!(agent = %a, resource = %r, roster = r.roster_len(), "admitted");
        Admission::Admitted
    } else {
        r.record_overflow();
        trace!(agent = %a, resource = %r, overflow = r.overflow_count(), "overflow");
        Admission::Overflow
    }
}

/// A broken invariant in a finished (or partially run) match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("agent {agent} assigned to {resource}, which is not in its preferences")]
    NotPreferred { agent: String, resource: String },

    #[error("agent {agent} assigned to {resource} but missing from its roster")]
    MissingFromRoster { agent: String, resource: String },

    #[error("agent {agent} appears {count} times across rosters")]
    Rostered { agent: String, count: usize },

    #[error("agent {agent} rostered on {resource} without being assigned there")]
    StrayRosterEntry { agent: String, resource: String },

    #[error("resource {resource} holds {len} agents, above the bound of {bound}")]
    OverCapacity {
        resource: String,
        len: usize,
        bound: usize,
    },
}

/// Checks assignment validity, roster consistency and capacity bounds.
/// Returns every violation found; an empty vector means the state is sound.
pub fn verify_assignment(world: &World, policy: CapacityPolicy) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut roster_hits = vec![0usize; world.agents.len()];

    for (ri, resource) in world.resources.iter().enumerate() {
        let bound = policy.max_roster(resource.capacity());
        if resource.roster_len() > bound {
            violations.push(Violation::OverCapacity {
                resource: resource.name().to_string(),
                len: resource.roster_len(),
                bound,
            });
        }

        for &agent_id in resource.roster() {
            roster_hits[agent_id.0] += 1;
            let agent = world.agent(agent_id);
            if agent.assigned() != Some(ResourceId(ri)) {
                violations.push(Violation::StrayRosterEntry {
                    agent: agent.name().to_string(),
                    resource: resource.name().to_string(),
                });
            }
        }
    }

    for (ai, agent) in world.agents.iter().enumerate() {
        if let Some(resource_id) = agent.assigned() {
            let resource = world.resource(resource_id);
            if !agent.preferences().contains(&resource_id) {
                violations.push(Violation::NotPreferred {
                    agent: agent.name().to_string(),
                    resource: resource.name().to_string(),
                });
            }
            if !resource.roster().contains(&AgentId(ai)) {
                violations.push(Violation::MissingFromRoster {
                    agent: agent.name().to_string(),
                    resource: resource.name().to_string(),
                });
            }
        }
        if roster_hits[ai] > 1 {
            violations.push(Violation::Rostered {
                agent: agent.name().to_string(),
                count: roster_hits[ai],
            });
        }
    }

    for violation in violations.iter() {
        warn!(%violation, "match invariant violated");
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Agent, Resource};

    fn single(capacity: usize, agents: usize) -> World {
        let agents = (0..agents)
            .map(|i| Agent::new(format!("a{i}"), vec![ResourceId(0)]))
            .collect();
        World::new(agents, vec![Resource::new("R", capacity)]).unwrap()
    }

    #[test]
    fn strict_admits_up_to_capacity_then_overflows() {
        let mut world = single(1, 2);

        assert_eq!(
            admit(&mut world, AgentId(0), ResourceId(0), CapacityPolicy::Strict),
            Admission::Admitted
        );
        assert_eq!(
            admit(&mut world, AgentId(1), ResourceId(0), CapacityPolicy::Strict),
            Admission::Overflow
        );

        let r = world.resource(ResourceId(0));
        assert_eq!(r.roster(), &[AgentId(0)]);
        assert_eq!(r.overflow_count(), 1);
        assert!(!world.agent(AgentId(1)).is_assigned());
    }

    #[test]
    fn inclusive_admits_one_past_capacity() {
        let mut world = single(1, 3);
        let policy = CapacityPolicy::Inclusive;

        assert_eq!(admit(&mut world, AgentId(0), ResourceId(0), policy), Admission::Admitted);
        assert_eq!(admit(&mut world, AgentId(1), ResourceId(0), policy), Admission::Admitted);
        assert_eq!(admit(&mut world, AgentId(2), ResourceId(0), policy), Admission::Overflow);

        let r = world.resource(ResourceId(0));
        assert_eq!(r.roster_len(), 2);
        assert_eq!(r.overflow_count(), 1);
        assert!(verify_assignment(&world, policy).is_empty());
        // The same state breaks the strict bound.
        assert_eq!(verify_assignment(&world, CapacityPolicy::Strict).len(), 1);
    }

    #[test]
    fn admitted_agent_is_never_moved() {
        let agents = vec![Agent::new("a", vec![ResourceId(0), ResourceId(1)])];
        let resources = vec![Resource::new("R1", 1), Resource::new("R2", 1)];
        let mut world = World::new(agents, resources).unwrap();

        admit(&mut world, AgentId(0), ResourceId(0), CapacityPolicy::Strict);
        assert_eq!(
            admit(&mut world, AgentId(0), ResourceId(1), CapacityPolicy::Strict),
            Admission::AlreadyAssigned
        );

        assert_eq!(world.agent(AgentId(0)).assigned(), Some(ResourceId(0)));
        assert_eq!(world.resource(ResourceId(1)).roster_len(), 0);
        assert_eq!(world.resource(ResourceId(1)).overflow_count(), 0);
    }

    #[test]
    fn verify_flags_assignment_outside_preferences() {
        let agents = vec![Agent::new("a", vec![ResourceId(0)])];
        let resources = vec![Resource::new("R1", 1), Resource::new("R2", 1)];
        let mut world = World::new(agents, resources).unwrap();

        world.agents[0].assign(ResourceId(1));
        world.resources[1].push(AgentId(0));

        let violations = verify_assignment(&world, CapacityPolicy::Strict);
        assert_eq!(
            violations,
            vec![Violation::NotPreferred {
                agent: "a".into(),
                resource: "R2".into()
            }]
        );
    }

    #[test]
    fn verify_flags_roster_drift() {
        let mut world = single(2, 2);
        world.agents[0].assign(ResourceId(0));
        world.resources[0].push(AgentId(1));

        let violations = verify_assignment(&world, CapacityPolicy::Strict);
        assert!(violations.contains(&Violation::StrayRosterEntry {
            agent: "a1".into(),
            resource: "R".into()
        }));
        assert!(violations.contains(&Violation::MissingFromRoster {
            agent: "a0".into(),
            resource: "R".into()
        }));
    }
}
