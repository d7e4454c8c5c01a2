//! Step Driver
//!
//! Owns the swarm and runs one full step at a time:
//! reset accumulators → pairwise pass → integrate → measure energy.
//! Nothing outside the engine observes a half-finished step.

use super::agent::{AgentPool, AgentView};
use super::integrator::{integrate, wrap_into, wrap_phase};
use super::interaction::{accumulate, InteractionParams};
use super::monitor::{EnergyMonitor, EnergySample, MonitorState};
use super::snapshot::SwarmSnapshot;
use crate::core::config::{
    validate_policy, validate_profile, CouplingParams, IntegrationPolicy, InteractionProfile,
    MonitorConfig, SwarmConfig,
};
use crate::core::error::{SwarmError, SwarmResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

pub struct SwarmEngine {
    config: SwarmConfig,
    pool: AgentPool,
    monitor: EnergyMonitor,
    rng: StdRng,
    tick: u64,
    wrap_overshoots: u64,
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl SwarmEngine {
    /// Validate `config` and spawn a fresh swarm.
    pub fn new(config: SwarmConfig) -> SwarmResult<Self> {
        config.validate()?;
        let mut rng = seeded_rng(config.seed);
        let pool = AgentPool::spawn(&config, &mut rng);

        info!(
            "🌐 [Swarm] Spawned {} agents on {}x{} torus (J={}, K={}, {:?})",
            config.population_size,
            config.world_width,
            config.world_height,
            config.coupling.j,
            config.coupling.k,
            config.integration
        );

        Ok(SwarmEngine {
            monitor: EnergyMonitor::new(config.monitor),
            config,
            pool,
            rng,
            tick: 0,
            wrap_overshoots: 0,
        })
    }

    /// Advance by `dt` of physical time (scaled by `time_scale`).
    ///
    /// # Panics
    /// If `dt` is negative or not finite.
    pub fn advance(&mut self, dt: f64) -> EnergySample {
        assert!(
            dt.is_finite() && dt >= 0.0,
            "advance called with invalid dt {}: must be finite and non-negative",
            dt
        );
        let scaled_dt = dt * self.config.time_scale;

        self.pool.reset_accumulators();
        let params = InteractionParams {
            coupling: self.config.coupling,
            profile: self.config.interaction,
            center: self.config.domain_center(),
        };
        accumulate(&mut self.pool, &params);

        let overshoots = integrate(
            &mut self.pool,
            self.config.integration,
            scaled_dt,
            self.config.world_width,
            self.config.world_height,
        );
        self.tick += 1;
        if overshoots > 0 {
            self.wrap_overshoots += overshoots as u64;
            warn!(
                "⚠️ [Swarm] tick {}: {} coordinate(s) moved more than one domain extent",
                self.tick, overshoots
            );
        }

        let energy = self.pool.average_kinetic_energy();
        let state = self.monitor.record(energy);
        debug!("[Swarm] tick {} energy={:.6e} state={:?}", self.tick, energy, state);

        EnergySample {
            tick: self.tick,
            energy,
            state,
        }
    }

    /// Advance by the configured `dt`.
    pub fn step(&mut self) -> EnergySample {
        self.advance(self.config.dt)
    }

    /// Step until the monitor reports dead or `max_steps` have run.
    /// Returns the last sample, or `None` if no step was taken.
    pub fn run_until_equilibrium(&mut self, max_steps: usize) -> Option<EnergySample> {
        let mut last = None;
        for _ in 0..max_steps {
            let sample = self.step();
            last = Some(sample);
            if sample.is_dead() {
                break;
            }
        }
        last
    }

    /// Re-spawn every agent, optionally with a new seed, and clear the monitor.
    pub fn reset(&mut self, seed: Option<u64>) {
        if seed.is_some() {
            self.config.seed = seed;
        }
        self.rng = seeded_rng(self.config.seed);
        self.pool = AgentPool::spawn(&self.config, &mut self.rng);
        self.monitor.reset();
        self.tick = 0;
        self.wrap_overshoots = 0;
        info!("🔄 [Swarm] Reset {} agents (seed={:?})", self.pool.n_agents, self.config.seed);
    }

    pub fn reset_monitor(&mut self) {
        self.monitor.reset();
    }

    // ── Read access ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn pool(&self) -> &AgentPool {
        &self.pool
    }

    pub fn monitor(&self) -> &EnergyMonitor {
        &self.monitor
    }

    pub fn len(&self) -> usize {
        self.pool.n_agents
    }

    pub fn is_empty(&self) -> bool {
        self.pool.n_agents == 0
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn state(&self) -> MonitorState {
        self.monitor.state()
    }

    /// Coordinates that overshot the torus by more than one extent since the last reset.
    pub fn wrap_overshoots(&self) -> u64 {
        self.wrap_overshoots
    }

    pub fn agent(&self, index: usize) -> Option<AgentView> {
        self.pool.view(index)
    }

    pub fn positions(&self) -> impl ExactSizeIterator<Item = (f64, f64)> + '_ {
        self.pool.positions()
    }

    pub fn phases(&self) -> &[f64] {
        &self.pool.phase
    }

    pub fn snapshot(&self) -> SwarmSnapshot {
        SwarmSnapshot::capture(self.tick, &self.pool)
    }

    // ── External mutation (between steps only) ──────────────────────────────

    fn check_index(&self, index: usize) -> SwarmResult<()> {
        if index < self.pool.n_agents {
            Ok(())
        } else {
            Err(SwarmError::AgentIndexOutOfRange {
                index,
                len: self.pool.n_agents,
            })
        }
    }

    /// Overwrite an agent's position. Coordinates are wrapped onto the torus.
    pub fn set_position(&mut self, index: usize, x: f64, y: f64) -> SwarmResult<()> {
        self.check_index(index)?;
        self.pool.x[index] = wrap_into(x, self.config.world_width);
        self.pool.y[index] = wrap_into(y, self.config.world_height);
        Ok(())
    }

    pub fn set_phase(&mut self, index: usize, phase: f64) -> SwarmResult<()> {
        self.check_index(index)?;
        self.pool.phase[index] = wrap_phase(phase);
        Ok(())
    }

    pub fn set_velocity(&mut self, index: usize, vx: f64, vy: f64) -> SwarmResult<()> {
        self.check_index(index)?;
        self.pool.vx[index] = vx;
        self.pool.vy[index] = vy;
        Ok(())
    }

    /// Give one agent a fresh random position and phase from the engine RNG.
    pub fn respawn_agent(&mut self, index: usize) -> SwarmResult<()> {
        self.check_index(index)?;
        let (width, height) = (self.config.world_width, self.config.world_height);
        self.pool.respawn(index, width, height, &mut self.rng);
        Ok(())
    }

    /// Load positions, phases and velocities from a snapshot.
    pub fn restore(&mut self, snapshot: &SwarmSnapshot) -> SwarmResult<()> {
        let (width, height) = (self.config.world_width, self.config.world_height);
        snapshot.apply_wrapped(&mut self.pool, width, height)?;
        self.tick = snapshot.tick;
        Ok(())
    }

    // ── Configuration (between steps only) ──────────────────────────────────

    pub fn set_coupling(&mut self, coupling: CouplingParams) -> SwarmResult<()> {
        coupling.validate()?;
        self.config.coupling = coupling;
        Ok(())
    }

    pub fn set_integration_policy(&mut self, policy: IntegrationPolicy) -> SwarmResult<()> {
        validate_policy(&policy)?;
        self.config.integration = policy;
        Ok(())
    }

    pub fn set_interaction_profile(&mut self, profile: InteractionProfile) -> SwarmResult<()> {
        validate_profile(&profile)?;
        self.config.interaction = profile;
        Ok(())
    }

    pub fn set_time_scale(&mut self, time_scale: f64) -> SwarmResult<()> {
        if !time_scale.is_finite() || time_scale <= 0.0 {
            return Err(SwarmError::InvalidConfig(format!(
                "time_scale must be positive, got {}",
                time_scale
            )));
        }
        self.config.time_scale = time_scale;
        Ok(())
    }

    pub fn set_monitor_config(&mut self, monitor: MonitorConfig) -> SwarmResult<()> {
        monitor.validate()?;
        self.config.monitor = monitor;
        self.monitor.reconfigure(monitor);
        Ok(())
    }

    /// Replace the whole configuration. The population size and domain are
    /// fixed for the lifetime of the swarm.
    pub fn set_config(&mut self, config: SwarmConfig) -> SwarmResult<()> {
        config.validate()?;
        if config.population_size != self.pool.n_agents {
            return Err(SwarmError::AgentCountMismatch {
                expected: self.pool.n_agents,
                actual: config.population_size,
            });
        }
        if config.world_width != self.config.world_width
            || config.world_height != self.config.world_height
        {
            return Err(SwarmError::InvalidConfig(
                "domain size cannot change on a live swarm".into(),
            ));
        }
        self.monitor.reconfigure(config.monitor);
        self.config = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn two_agent_config(repulsion_strength: f64, epsilon: f64) -> SwarmConfig {
        SwarmConfig {
            population_size: 2,
            world_width: 1000.0,
            world_height: 1000.0,
            coupling: CouplingParams {
                j: 0.0,
                k: 0.0,
                repulsion_strength,
                epsilon,
            },
            time_scale: 1.0,
            dt: 1.0,
            ..SwarmConfig::default()
        }
    }

    fn place_pair(engine: &mut SwarmEngine, a: (f64, f64), b: (f64, f64)) {
        engine.set_position(0, a.0, a.1).unwrap();
        engine.set_position(1, b.0, b.1).unwrap();
        engine.set_velocity(0, 0.0, 0.0).unwrap();
        engine.set_velocity(1, 0.0, 0.0).unwrap();
    }

    #[test]
    fn two_agent_scenario_moves_symmetrically_and_settles() {
        let mut engine = SwarmEngine::new(two_agent_config(1.0, 0.1)).unwrap();
        place_pair(&mut engine, (490.0, 500.0), (510.0, 500.0));

        engine.advance(1.0);
        let (a, b) = (engine.agent(0).unwrap(), engine.agent(1).unwrap());
        let (da, db) = (a.x - 490.0, b.x - 510.0);
        assert!(da != 0.0);
        assert!((da + db).abs() < 1e-12, "da={} db={}", da, db);
        assert_eq!(a.y, 500.0);
        assert_eq!(b.y, 500.0);

        // Weak repulsion: cohesion pulls them in to d* = sqrt(R - ε).
        for _ in 0..400 {
            engine.advance(1.0);
        }
        let (a, b) = (engine.agent(0).unwrap(), engine.agent(1).unwrap());
        let separation = b.x - a.x;
        assert!((separation - 0.9f64.sqrt()).abs() < 1e-3, "separation={}", separation);
        assert!(a.vx.abs() < 1e-3);
    }

    #[test]
    fn strong_repulsion_pushes_pair_apart_with_shrinking_steps() {
        let mut engine = SwarmEngine::new(two_agent_config(4000.0, 4.0)).unwrap();
        place_pair(&mut engine, (490.0, 500.0), (510.0, 500.0));

        let mut previous_x = engine.agent(0).unwrap().x;
        let mut previous_step = f64::INFINITY;
        for _ in 0..50 {
            engine.advance(1.0);
            let x = engine.agent(0).unwrap().x;
            let step = (x - previous_x).abs();
            assert!(x < previous_x, "agent 0 should move away from agent 1");
            assert!(step < previous_step);
            previous_step = step;
            previous_x = x;
        }
        let separation = engine.agent(1).unwrap().x - engine.agent(0).unwrap().x;
        assert!(separation > 20.0 && separation < 3996f64.sqrt() + 1e-6);
    }

    #[test]
    fn default_swarm_keeps_invariants_over_many_steps() {
        let mut engine = SwarmEngine::new(SwarmConfig::with_population(60)).unwrap();
        for _ in 0..100 {
            let sample = engine.step();
            assert!(sample.energy.is_finite());
        }
        for (x, y) in engine.positions() {
            assert!((0.0..1000.0).contains(&x) && (0.0..1000.0).contains(&y));
        }
        assert!(engine.phases().iter().all(|p| (0.0..TAU).contains(p)));
        assert_eq!(engine.tick(), 100);
        assert_eq!(engine.monitor().len(), 100);
    }

    #[test]
    fn accumulators_are_clean_between_steps() {
        let mut engine = SwarmEngine::new(SwarmConfig::with_population(10)).unwrap();
        engine.step();
        let pool = engine.pool();
        assert!(pool.fx.iter().chain(&pool.fy).chain(&pool.dtheta).all(|v| *v == 0.0));
    }

    #[test]
    fn same_seed_same_trajectory() {
        let cfg = SwarmConfig::with_population(20);
        let mut a = SwarmEngine::new(cfg.clone()).unwrap();
        let mut b = SwarmEngine::new(cfg).unwrap();
        for _ in 0..10 {
            a.step();
            b.step();
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn stationary_swarm_reaches_equilibrium() {
        let mut cfg = two_agent_config(4000.0, 4.0);
        cfg.monitor = MonitorConfig {
            capacity: 16,
            threshold_per_agent: 1e-6,
            kill_frame_count: 5,
        };
        let mut engine = SwarmEngine::new(cfg).unwrap();
        let d = 3996f64.sqrt() / 2.0;
        place_pair(&mut engine, (500.0 - d, 500.0), (500.0 + d, 500.0));

        let last = engine.run_until_equilibrium(100).unwrap();
        assert!(last.is_dead());
        assert_eq!(last.tick, 5);
        assert_eq!(engine.state(), MonitorState::Dead);

        engine.reset_monitor();
        assert_eq!(engine.state(), MonitorState::Running);
    }

    #[test]
    fn time_scale_multiplies_dt() {
        let mut slow = two_agent_config(1.0, 0.1);
        slow.time_scale = 1.0;
        let mut fast = slow.clone();
        fast.time_scale = 3.0;

        let mut a = SwarmEngine::new(slow).unwrap();
        let mut b = SwarmEngine::new(fast).unwrap();
        for engine in [&mut a, &mut b] {
            place_pair(engine, (490.0, 500.0), (510.0, 500.0));
        }
        a.advance(3.0);
        b.advance(1.0);
        assert!((a.agent(0).unwrap().x - b.agent(0).unwrap().x).abs() < 1e-12);
    }

    #[test]
    fn external_mutation_is_bounds_checked() {
        let mut engine = SwarmEngine::new(SwarmConfig::with_population(3)).unwrap();
        assert!(matches!(
            engine.set_position(3, 0.0, 0.0),
            Err(SwarmError::AgentIndexOutOfRange { index: 3, len: 3 })
        ));
        engine.set_phase(0, -0.5).unwrap();
        assert!((engine.agent(0).unwrap().phase - (TAU - 0.5)).abs() < 1e-12);
        engine.respawn_agent(2).unwrap();
        assert!(engine.respawn_agent(7).is_err());
    }

    #[test]
    fn setters_validate_between_steps() {
        let mut engine = SwarmEngine::new(SwarmConfig::with_population(4)).unwrap();
        assert!(engine
            .set_integration_policy(IntegrationPolicy::Damped { coefficient: 2.0 })
            .is_err());
        engine
            .set_integration_policy(IntegrationPolicy::Damped { coefficient: 0.95 })
            .unwrap();
        assert!(engine.set_time_scale(0.0).is_err());
        assert!(engine.set_config(SwarmConfig::with_population(5)).is_err());
        engine.set_config(SwarmConfig::with_population(4)).unwrap();
        assert_eq!(engine.config().integration, IntegrationPolicy::Overdamped);
    }

    #[test]
    fn reset_respawns_and_clears_tick() {
        let mut engine = SwarmEngine::new(SwarmConfig::with_population(8)).unwrap();
        let before = engine.snapshot();
        engine.step();
        engine.reset(None);
        assert_eq!(engine.tick(), 0);
        assert!(engine.monitor().is_empty());
        assert_eq!(engine.snapshot(), before);

        engine.reset(Some(1));
        assert_ne!(engine.snapshot().agents_pos, before.agents_pos);
    }

    #[test]
    #[should_panic(expected = "invalid dt")]
    fn negative_dt_panics() {
        let mut engine = SwarmEngine::new(SwarmConfig::with_population(2)).unwrap();
        engine.advance(-1.0);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        assert!(SwarmEngine::new(SwarmConfig::with_population(0)).is_err());
    }
}
