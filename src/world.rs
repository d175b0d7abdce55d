use std::path::Path;
use std::{fmt, fs, io};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::MatchConfig;
use crate::error::{MatchError, MatchResult};
use crate::preferences::PreferenceGenerator;

/// Index of an agent in `World::agents`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub usize);

/// Index of a resource in `World::resources`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub usize);

/// Where the admission check puts the capacity boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// Admit while `roster < capacity`. Rosters never exceed capacity.
    #[default]
    Strict,
    /// Admit while `roster <= capacity`. Rosters may hold `capacity + 1`.
    Inclusive,
}

impl CapacityPolicy {
    pub fn has_room(self, roster_len: usize, capacity: usize) -> bool {
        match self {
            CapacityPolicy::Strict => roster_len < capacity,
            CapacityPolicy::Inclusive => roster_len <= capacity,
        }
    }

    /// Largest roster this policy can produce.
    pub fn max_roster(self, capacity: usize) -> usize {
        match self {
            CapacityPolicy::Strict => capacity,
            CapacityPolicy::Inclusive => capacity + 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    name: String,
    preferences: Vec<ResourceId>,
    assigned: Option<ResourceId>,
}

impl Agent {
    pub fn new(name: impl Into<String>, preferences: Vec<ResourceId>) -> Self {
        Self {
            name: name.into(),
            preferences,
            assigned: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display(&self) -> &str {
        &self.name
    }

    /// Ranked choices, most preferred first.
    pub fn preferences(&self) -> &[ResourceId] {
        &self.preferences
    }

    pub fn preference(&self, round: usize) -> Option<ResourceId> {
        self.preferences.get(round).copied()
    }

    pub fn assigned(&self) -> Option<ResourceId> {
        self.assigned
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned.is_some()
    }

    /// Sets the assignment once. Returns false and leaves the agent untouched
    /// if it was already assigned.
    pub(crate) fn assign(&mut self, resource: ResourceId) -> bool {
        if self.assigned.is_some() {
            return false;
        }
        self.assigned = Some(resource);
        true
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    name: String,
    capacity: usize,
    /// Admitted agents in admission order.
    roster: Vec<AgentId>,
    /// Rejected admission attempts.
    overflow_count: usize,
}

impl Resource {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            roster: Vec::new(),
            overflow_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn roster(&self) -> &[AgentId] {
        &self.roster
    }

    pub fn roster_len(&self) -> usize {
        self.roster.len()
    }

    pub fn overflow_count(&self) -> usize {
        self.overflow_count
    }

    pub fn has_room(&self, policy: CapacityPolicy) -> bool {
        policy.has_room(self.roster.len(), self.capacity)
    }

    pub(crate) fn push(&mut self, agent: AgentId) {
        self.roster.push(agent);
    }

    pub(crate) fn record_overflow(&mut self) {
        self.overflow_count += 1;
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The full population and resource registry of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub(crate) agents: Vec<Agent>,
    pub(crate) resources: Vec<Resource>,
}

impl World {
    /// Builds a world from ready-made agents and resources, checking that every
    /// preference refers to a known resource.
    pub fn new(agents: Vec<Agent>, resources: Vec<Resource>) -> MatchResult<Self> {
        if agents.is_empty() {
            return Err(MatchError::EmptyPopulation);
        }
        if resources.is_empty() {
            return Err(MatchError::EmptyResources);
        }
        if resources.iter().any(|r| r.capacity == 0) {
            return Err(MatchError::ZeroCapacity);
        }
        if agents.iter().any(|a| a.preferences.is_empty()) {
            return Err(MatchError::ZeroPreferenceLength);
        }
        for agent in agents.iter() {
            if let Some(r) = agent.preferences.iter().find(|r| r.0 >= resources.len()) {
                return Err(MatchError::UnknownResource {
                    agent: agent.name.clone(),
                    index: r.0,
                });
            }
        }
        Ok(Self { agents, resources })
    }

    /// Agents in population order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn agent(&self, id: AgentId) -> &Agent {
        &self.agents[id.0]
    }

    pub fn resource(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0]
    }

    pub fn into_parts(self) -> (Vec<Agent>, Vec<Resource>) {
        (self.agents, self.resources)
    }

    /// True when the population shape agrees with `config`: agent and resource
    /// counts, every capacity and every list length. The draw mode is not
    /// recoverable from a world and is not compared.
    pub fn matches_config(&self, config: &MatchConfig) -> bool {
        let capacity = config.resource_capacity();
        self.agents.len() == config.agents
            && self.resources.len() == config.resources
            && self.resources.iter().all(|r| r.capacity == capacity)
            && self
                .agents
                .iter()
                .all(|a| a.preferences.len() == config.preference_len)
    }

    /// Longest preference list in the population.
    pub fn preference_len(&self) -> usize {
        self.agents
            .iter()
            .map(|a| a.preferences.len())
            .max()
            .unwrap_or(0)
    }

    /// Clears assignments, rosters and overflow counters so the same
    /// population can be matched again.
    pub fn reset(&mut self) {
        for agent in self.agents.iter_mut() {
            agent.assigned = None;
        }
        for resource in self.resources.iter_mut() {
            resource.roster.clear();
            resource.overflow_count = 0;
        }
    }
}

/// Returns the world to match under `config`.
///
/// With `reuse_world` set, the world saved at `path` is loaded, validated and
/// reset, unless its shape disagrees with `config`. Otherwise, or when nothing
/// is saved yet, a fresh world is drawn and written to `path`.
pub fn load_or_create_world(config: &MatchConfig, path: impl AsRef<Path>) -> MatchResult<World> {
    let path = path.as_ref();

    if config.reuse_world {
        match fs::read_to_string(path) {
            Ok(s) => {
                let saved: World = serde_json::from_str(&s)?;
                let (agents, resources) = saved.into_parts();
                let mut world = World::new(agents, resources)?;
                if world.matches_config(config) {
                    world.reset();
                    info!(path = %path.display(), "reusing saved world");
                    return Ok(world);
                }
                warn!(
                    path = %path.display(),
                    saved_agents = world.agents.len(),
                    saved_resources = world.resources.len(),
                    "saved world disagrees with config, regenerating"
                );
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no saved world yet");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let world = create_world(config, &mut config.rng())?;
    fs::write(path, serde_json::to_string_pretty(&world)?)?;
    Ok(world)
}

/// Base-26 letter label, `a` as zero, left-padded with `a` to `min_width`.
fn letter_label(mut index: usize, base: u8, min_width: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((base + (index % 26) as u8) as char);
        index /= 26;
        if index == 0 {
            break;
        }
    }
    while letters.len() < min_width {
        letters.push(base as char);
    }
    letters.iter().rev().collect()
}

/// `A`, `B`, ... `Z`, `BA`, `BB`, ...
pub fn resource_label(index: usize) -> String {
    letter_label(index, b'A', 1)
}

/// `aa`, `ab`, ... `zz`, `baa`, ...
pub fn agent_label(index: usize) -> String {
    letter_label(index, b'a', 2)
}

/// Builds a fresh world: labelled resources of equal capacity and agents with
/// one preference list each, drawn with the configured mode.
pub fn create_world<R: Rng + ?Sized>(config: &MatchConfig, rng: &mut R) -> MatchResult<World> {
    config.validate()?;

    let capacity = config.resource_capacity();
    let generator = PreferenceGenerator::new(config.resources, config.preference_len, config.mode)?;

    let resources = (0..config.resources)
        .map(|i| Resource::new(resource_label(i), capacity))
        .collect();
    let agents = (0..config.agents)
        .map(|i| Agent::new(agent_label(i), generator.generate(rng)))
        .collect();

    debug!(
        agents = config.agents,
        resources = config.resources,
        capacity,
        mode = ?config.mode,
        "created world"
    );

    World::new(agents, resources)
}
