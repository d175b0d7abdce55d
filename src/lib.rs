//! Round-based greedy allocation of agents to capacity-limited resources.
//!
//! Each agent carries a ranked preference list. Round `k` offers every
//! still-unassigned agent its `k`-th choice; a resource admits while it has
//! room under the run's [`CapacityPolicy`] and otherwise counts an overflow.
//! After the last round the [`metrics`] module scores how well the match
//! served everyone.
//!
//! ```text
//! preferences ──> world ──> solver (rounds) ──> metrics / export
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod metrics;
pub mod preferences;
pub mod solver;
pub mod sweep;
pub mod world;

pub use config::MatchConfig;
pub use error::{MatchError, MatchResult};
pub use metrics::MatchSummary;
pub use preferences::PreferenceMode;
pub use solver::{solve, verify_assignment, Matcher};
pub use world::{
    create_world, load_or_create_world, Agent, AgentId, CapacityPolicy, Resource, ResourceId,
    World,
};
