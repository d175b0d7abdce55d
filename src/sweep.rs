//! Parameter sweeps: rerun the match across a set of config variants and
//! export each result.

use std::path::Path;

use tracing::{info, warn};

use crate::config::MatchConfig;
use crate::error::MatchResult;
use crate::export;
use crate::metrics::MatchSummary;
use crate::preferences::PreferenceMode;
use crate::solver::{solve, verify_assignment};
use crate::world::create_world;

pub fn run_all_sweeps(base: &MatchConfig, out_dir: &Path) -> MatchResult<Vec<MatchSummary>> {
    let mut summaries = sweep_modes(base, out_dir)?;
    summaries.extend(sweep_capacity(base, out_dir)?);
    info!(runs = summaries.len(), "finished parameter sweeps");
    Ok(summaries)
}

/// Uniform against skewed preferences on otherwise identical setups.
pub fn sweep_modes(base: &MatchConfig, out_dir: &Path) -> MatchResult<Vec<MatchSummary>> {
    let params = [
        MatchConfig {
            mode: PreferenceMode::Uniform,
            ..base.clone()
        },
        MatchConfig {
            mode: PreferenceMode::skewed(),
            ..base.clone()
        },
    ];

    run_params(&params, "mode", out_dir)
}

/// Capacity at the fair share, then with one and two seats of slack.
pub fn sweep_capacity(base: &MatchConfig, out_dir: &Path) -> MatchResult<Vec<MatchSummary>> {
    let fair = base.resource_capacity();
    let params: Vec<MatchConfig> = (0..3)
        .map(|slack| MatchConfig {
            capacity: Some(fair + slack),
            ..base.clone()
        })
        .collect();

    run_params(&params, "capacity", out_dir)
}

/// Builds, solves and exports one world per config, writing
/// `<prefix>_<i>.csv` under `out_dir`.
pub fn run_params(
    param_sets: &[MatchConfig],
    prefix: &str,
    out_dir: &Path,
) -> MatchResult<Vec<MatchSummary>> {
    let mut summaries = Vec::with_capacity(param_sets.len());

    for (i, params) in param_sets.iter().enumerate() {
        let mut world = create_world(params, &mut params.rng())?;
        solve(&mut world, params.policy);

        let violations = verify_assignment(&world, params.policy);
        if !violations.is_empty() {
            warn!(prefix, run = i, violations = violations.len(), "verification failed");
        }

        let summary = MatchSummary::from_world(
            &world,
            params.popularity_threshold,
            params.unpopularity_threshold,
        )?;
        info!(
            prefix,
            run = i,
            unassigned = summary.unassigned,
            mean_satisfaction = summary.mean_satisfaction,
            "sweep run complete"
        );

        export::serialize_assignments_to_csv(&world, out_dir.join(format!("{prefix}_{i}.csv")))?;
        summaries.push(summary);
    }

    Ok(summaries)
}
