//! Swarmalator Core - coupled phase-oscillator swarms on a 2D torus
//!
//! Each agent moves in the plane and carries a phase. Agents with similar
//! phases attract (or repel, for negative `J`), and phases synchronize
//! (or desynchronize, for negative `K`) with nearby agents.
//!
//! ```no_run
//! use swarmalator_core::{SwarmConfig, SwarmEngine};
//!
//! let mut engine = SwarmEngine::new(SwarmConfig::default()).unwrap();
//! let sample = engine.advance(0.05);
//! println!("tick {} energy {:.3e} {:?}", sample.tick, sample.energy, sample.state);
//! ```

pub mod core;
pub mod swarm;

#[cfg(feature = "python")]
mod python;

pub use crate::core::config::{
    CouplingParams, FrequencyParams, IntegrationPolicy, InteractionProfile, MonitorConfig,
    SwarmConfig,
};
pub use crate::core::error::{SwarmError, SwarmResult};
pub use crate::swarm::{
    run_ensemble, AgentView, EnergyMonitor, EnergySample, EnsembleOutcome, MonitorState,
    SwarmEngine, SwarmSnapshot, Trace, TraceDivergence,
};

/// Initialize tracing for the library. `level` is an `EnvFilter` directive,
/// `"info"` when absent. Safe to call more than once.
pub fn setup_logging(level: Option<&str>) {
    let filter = level.unwrap_or("info");
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
