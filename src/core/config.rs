use super::error::{SwarmError, SwarmResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Coupling constants of the pairwise interaction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouplingParams {
    /// Phase-based spatial coupling (J term).
    pub j: f64,
    /// Phase coupling (K term).
    pub k: f64,
    pub repulsion_strength: f64,
    /// Soft-core regularizer added to d² in the repulsion denominator.
    pub epsilon: f64,
}

impl Default for CouplingParams {
    fn default() -> Self {
        CouplingParams {
            j: 8.0,
            k: -4.0,
            repulsion_strength: 4000.0,
            epsilon: 4.0,
        }
    }
}

impl CouplingParams {
    pub fn validate(&self) -> SwarmResult<()> {
        if !(self.j.is_finite() && self.k.is_finite() && self.repulsion_strength.is_finite()) {
            return Err(SwarmError::InvalidConfig(
                "coupling constants J, K and repulsion_strength must be finite".into(),
            ));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(SwarmError::InvalidConfig(format!(
                "epsilon must be finite and non-negative, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Natural-frequency distribution: each agent draws `base_omega ± variation`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyParams {
    pub base_omega: f64,
    pub variation: f64,
}

impl Default for FrequencyParams {
    fn default() -> Self {
        FrequencyParams {
            base_omega: 0.1,
            variation: 0.0,
        }
    }
}

/// How the integrator turns accumulated force into motion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrationPolicy {
    /// Velocity equals the instantaneous force; no momentum is carried.
    Overdamped,
    /// Velocity persists and is scaled by `coefficient` every step (1.0 = frictionless).
    Damped { coefficient: f64 },
}

impl Default for IntegrationPolicy {
    fn default() -> Self {
        IntegrationPolicy::Overdamped
    }
}

/// Which set of interaction rules the accumulator applies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionProfile {
    /// All pairs interact, every term divided by N.
    Normalized,
    /// Pairs interact only inside `cutoff_radius`, terms are not divided by N,
    /// and a harmonic well of `well_strength` pulls agents to the domain center.
    Legacy {
        cutoff_radius: f64,
        well_strength: f64,
    },
}

impl Default for InteractionProfile {
    fn default() -> Self {
        InteractionProfile::Normalized
    }
}

/// Energy monitor tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Ring buffer length.
    pub capacity: usize,
    /// Average kinetic energy per agent below which a step counts as idle.
    pub threshold_per_agent: f64,
    /// Consecutive idle steps before the swarm is declared dead.
    pub kill_frame_count: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            capacity: 500,
            threshold_per_agent: 1e-4,
            kill_frame_count: 200,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> SwarmResult<()> {
        if self.capacity == 0 {
            return Err(SwarmError::InvalidConfig(
                "monitor capacity must be non-zero".into(),
            ));
        }
        if self.kill_frame_count == 0 {
            return Err(SwarmError::InvalidConfig(
                "kill_frame_count must be non-zero".into(),
            ));
        }
        if !self.threshold_per_agent.is_finite() || self.threshold_per_agent < 0.0 {
            return Err(SwarmError::InvalidConfig(format!(
                "threshold_per_agent must be finite and non-negative, got {}",
                self.threshold_per_agent
            )));
        }
        Ok(())
    }
}

/// Full configuration of one swarm.
///
/// Defaults reproduce the stage-1 interactive build: 100 agents on a
/// 1000×1000 torus, `J = 8`, `K = -4`, overdamped, `/N`-normalized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub population_size: usize,
    pub world_width: f64,
    pub world_height: f64,
    pub coupling: CouplingParams,
    pub frequency: FrequencyParams,
    pub integration: IntegrationPolicy,
    pub interaction: InteractionProfile,
    /// Multiplies every physical `dt` before integration.
    pub time_scale: f64,
    /// Default step used by `SwarmEngine::step`.
    pub dt: f64,
    /// RNG seed; `None` draws one from entropy.
    pub seed: Option<u64>,
    /// Translate the spawned cloud so its center of mass sits at the domain center.
    pub recenter_on_spawn: bool,
    pub monitor: MonitorConfig,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        SwarmConfig {
            population_size: 100,
            world_width: 1000.0,
            world_height: 1000.0,
            coupling: CouplingParams::default(),
            frequency: FrequencyParams::default(),
            integration: IntegrationPolicy::Overdamped,
            interaction: InteractionProfile::Normalized,
            time_scale: 50.0,
            dt: 0.05,
            seed: Some(12345),
            recenter_on_spawn: true,
            monitor: MonitorConfig::default(),
        }
    }
}

impl SwarmConfig {
    /// Default configuration with a different population size.
    pub fn with_population(population_size: usize) -> Self {
        SwarmConfig {
            population_size,
            ..Self::default()
        }
    }

    /// Reject configurations the engine cannot run.
    pub fn validate(&self) -> SwarmResult<()> {
        if self.population_size == 0 {
            return Err(SwarmError::InvalidConfig(
                "population_size must be at least 1".into(),
            ));
        }
        if !(self.world_width.is_finite() && self.world_width > 0.0)
            || !(self.world_height.is_finite() && self.world_height > 0.0)
        {
            return Err(SwarmError::InvalidConfig(format!(
                "domain must be positive and finite, got {}x{}",
                self.world_width, self.world_height
            )));
        }
        self.coupling.validate()?;
        if !self.frequency.base_omega.is_finite()
            || !self.frequency.variation.is_finite()
            || self.frequency.variation < 0.0
        {
            return Err(SwarmError::InvalidConfig(
                "base_omega must be finite and variation finite and non-negative".into(),
            ));
        }
        validate_policy(&self.integration)?;
        validate_profile(&self.interaction)?;
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(SwarmError::InvalidConfig(format!(
                "time_scale must be positive, got {}",
                self.time_scale
            )));
        }
        if !self.dt.is_finite() || self.dt < 0.0 {
            return Err(SwarmError::InvalidConfig(format!(
                "dt must be finite and non-negative, got {}",
                self.dt
            )));
        }
        self.monitor.validate()
    }

    pub fn from_json_str(json: &str) -> SwarmResult<Self> {
        let config: SwarmConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> SwarmResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json(&self) -> SwarmResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn domain_center(&self) -> (f64, f64) {
        (self.world_width / 2.0, self.world_height / 2.0)
    }
}

pub(crate) fn validate_policy(policy: &IntegrationPolicy) -> SwarmResult<()> {
    match *policy {
        IntegrationPolicy::Overdamped => Ok(()),
        IntegrationPolicy::Damped { coefficient } => {
            if coefficient > 0.0 && coefficient <= 1.0 {
                Ok(())
            } else {
                Err(SwarmError::InvalidConfig(format!(
                    "damping coefficient must lie in (0, 1], got {}",
                    coefficient
                )))
            }
        }
    }
}

pub(crate) fn validate_profile(profile: &InteractionProfile) -> SwarmResult<()> {
    match *profile {
        InteractionProfile::Normalized => Ok(()),
        InteractionProfile::Legacy {
            cutoff_radius,
            well_strength,
        } => {
            if !(cutoff_radius.is_finite() && cutoff_radius > 0.0) {
                return Err(SwarmError::InvalidConfig(format!(
                    "cutoff_radius must be positive, got {}",
                    cutoff_radius
                )));
            }
            if !well_strength.is_finite() || well_strength < 0.0 {
                return Err(SwarmError::InvalidConfig(format!(
                    "well_strength must be non-negative, got {}",
                    well_strength
                )));
            }
            Ok(())
        }
    }
}
