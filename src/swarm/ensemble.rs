//! Ensemble Runner
//!
//! Runs independent swarms, one per seed, in parallel with Rayon. Each swarm
//! owns its agents and monitor outright; nothing is shared between them.

use super::engine::SwarmEngine;
use crate::core::config::SwarmConfig;
use crate::core::error::SwarmResult;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

/// Final state of one ensemble member.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EnsembleOutcome {
    pub seed: u64,
    pub steps_run: u64,
    pub final_energy: f64,
    pub reached_equilibrium: bool,
}

/// Run one swarm per seed until it reaches equilibrium or `max_steps` elapse.
///
/// Outcomes are returned in the same order as `seeds`.
pub fn run_ensemble(
    config: &SwarmConfig,
    seeds: &[u64],
    max_steps: usize,
) -> SwarmResult<Vec<EnsembleOutcome>> {
    config.validate()?;

    let outcomes: Vec<EnsembleOutcome> = seeds
        .par_iter()
        .map(|&seed| {
            let member = SwarmConfig {
                seed: Some(seed),
                ..config.clone()
            };
            let mut engine = SwarmEngine::new(member)?;
            let last = engine.run_until_equilibrium(max_steps);
            Ok(EnsembleOutcome {
                seed,
                steps_run: engine.tick(),
                final_energy: last.map(|s| s.energy).unwrap_or(0.0),
                reached_equilibrium: engine.monitor().is_dead(),
            })
        })
        .collect::<SwarmResult<Vec<_>>>()?;

    let settled = outcomes.iter().filter(|o| o.reached_equilibrium).count();
    info!(
        "📊 [Ensemble] {} swarms x {} agents: {}/{} reached equilibrium",
        seeds.len(),
        config.population_size,
        settled,
        seeds.len()
    );
    Ok(outcomes)
}
