//! Configuration and error types shared by the swarm engine.

pub mod config;
pub mod error;

pub use config::{
    CouplingParams, FrequencyParams, IntegrationPolicy, InteractionProfile, MonitorConfig,
    SwarmConfig,
};
pub use error::{SwarmError, SwarmResult};
