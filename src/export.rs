use std::path::Path;

use serde::Serialize;

use crate::error::MatchResult;
use crate::metrics::{preference_rank, satisfaction};
use crate::world::World;

#[derive(Serialize)]
pub struct AssignmentRow<'a> {
    agent: &'a str,
    assigned: Option<&'a str>,
    rank: Option<usize>,
    satisfaction: f64,
}

#[derive(Serialize)]
pub struct ResourceRow<'a> {
    resource: &'a str,
    capacity: usize,
    roster: usize,
    overflow: usize,
}

pub fn serialize_assignments_to_csv(
    world: &World,
    file_path: impl AsRef<Path>,
) -> MatchResult<()> {
    let mut writer = csv::Writer::from_path(file_path)?;

    for agent in world.agents.iter() {
        writer.serialize(AssignmentRow {
            agent: agent.name(),
            assigned: agent.assigned().map(|r| world.resource(r).name()),
            rank: preference_rank(agent),
            satisfaction: satisfaction::<f64>(agent),
        })?;
    }

    writer.flush()?;
    Ok(())
}

pub fn serialize_resources_to_csv(
    world: &World,
    file_path: impl AsRef<Path>,
) -> MatchResult<()> {
    let mut writer = csv::Writer::from_path(file_path)?;

    for resource in world.resources.iter() {
        writer.serialize(ResourceRow {
            resource: resource.name(),
            capacity: resource.capacity(),
            roster: resource.roster_len(),
            overflow: resource.overflow_count(),
        })?;
    }

    writer.flush()?;
    Ok(())
}
