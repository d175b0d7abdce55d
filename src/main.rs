use std::path::Path;

use prefmatch::{export, load_or_create_world, metrics, solver, sweep, MatchConfig, MatchResult};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "config_matcher.json";
const WORLD_PATH: &str = "world_matcher.json";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        tracing::error!(error = %e, "match failed");
        std::process::exit(1);
    }
}

fn run() -> MatchResult<()> {
    let config = MatchConfig::load_or_default(CONFIG_PATH)?;
    config.validate()?;

    let mut world = load_or_create_world(&config, WORLD_PATH)?;

    solver::Matcher::new(&mut world, config.policy)
        .with_round_reports(config.report_rounds)
        .run();

    if solver::verify_assignment(&world, config.policy).is_empty() {
        info!("verification successful");
    } else {
        warn!("verification failed");
    }

    let summary = metrics::MatchSummary::from_world(
        &world,
        config.popularity_threshold,
        config.unpopularity_threshold,
    )?;

    info!(unassigned = summary.unassigned, "match finished, agents left unmatched");
    if summary.popular.is_empty() {
        info!(
            threshold = config.popularity_threshold,
            "no resources above the surplus popularity threshold"
        );
    }
    for stat in summary.popular.iter() {
        info!(resource = %stat.resource, surplus = stat.value, "popular resource");
    }
    for stat in summary.unpopular.iter() {
        info!(resource = %stat.resource, assigned = stat.value, "unpopular resource");
    }
    info!(mean_satisfaction = summary.mean_satisfaction, "match quality");

    export::serialize_assignments_to_csv(&world, "assignments.csv")?;
    export::serialize_resources_to_csv(&world, "resources.csv")?;
    info!("written assignments.csv and resources.csv");

    if config.sweep {
        sweep::run_all_sweeps(&config, Path::new("."))?;
    }

    Ok(())
}
