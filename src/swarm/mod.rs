//! Swarm Engine
//!
//! Swarmalator dynamics on a 2D torus: agents attract or repel by phase
//! similarity while their phases couple through spatial proximity.
//! Agent state is stored as Struct-of-Arrays (SoA).

pub mod agent;
pub mod convergence_test;
pub mod engine;
pub mod ensemble;
pub mod integrator;
pub mod interaction;
pub mod monitor;
pub mod snapshot;

pub use agent::{AgentPool, AgentView};
pub use engine::SwarmEngine;
pub use ensemble::{run_ensemble, EnsembleOutcome};
pub use integrator::{integrate, wrap_once, wrap_phase};
pub use interaction::{accumulate, InteractionParams};
pub use monitor::{EnergyMonitor, EnergySample, MonitorState};
pub use snapshot::{SwarmSnapshot, Trace, TraceDivergence};
