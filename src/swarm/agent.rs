//! Agent State Store
//!
//! Struct-of-Arrays layout: one column per field, indexed by agent id.
//! Index order is stable for the lifetime of the pool.

use super::integrator::wrap_into;
use crate::core::config::SwarmConfig;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use std::f64::consts::TAU;

/// Read-only view of one agent, for rendering and proximity logic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentView {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub phase: f64,
    pub natural_frequency: f64,
}

/// Per-agent columns of the swarm.
///
/// `fx`, `fy` and `dtheta` are per-step scratch: the engine resets them
/// before the interaction pass and the integrator zeroes them after
/// consuming them, so they are always clean between steps.
#[derive(Clone, Debug)]
pub struct AgentPool {
    pub n_agents: usize,

    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
    pub phase: Vec<f64>,
    pub omega: Vec<f64>,

    // Accumulators
    pub fx: Vec<f64>,
    pub fy: Vec<f64>,
    pub dtheta: Vec<f64>,
}

impl AgentPool {
    pub fn new(n_agents: usize) -> Self {
        AgentPool {
            n_agents,
            x: vec![0.0; n_agents],
            y: vec![0.0; n_agents],
            vx: vec![0.0; n_agents],
            vy: vec![0.0; n_agents],
            phase: vec![0.0; n_agents],
            omega: vec![0.0; n_agents],
            fx: vec![0.0; n_agents],
            fy: vec![0.0; n_agents],
            dtheta: vec![0.0; n_agents],
        }
    }

    /// Spawn a fresh population: uniform positions and phases, zero velocity,
    /// natural frequencies drawn from `base_omega ± variation`.
    pub fn spawn<R: Rng + ?Sized>(config: &SwarmConfig, rng: &mut R) -> Self {
        let n = config.population_size;
        let mut pool = AgentPool::new(n);

        let along_x = Uniform::new(0.0, config.world_width);
        let along_y = Uniform::new(0.0, config.world_height);
        let phases = Uniform::new(0.0, TAU);
        let spread = config.frequency.variation;
        let detune = Uniform::new_inclusive(-spread, spread);

        for i in 0..n {
            pool.x[i] = along_x.sample(rng);
            pool.y[i] = along_y.sample(rng);
        }
        for i in 0..n {
            pool.phase[i] = phases.sample(rng);
        }
        for i in 0..n {
            pool.omega[i] = config.frequency.base_omega + detune.sample(rng);
        }

        if config.recenter_on_spawn {
            pool.recenter(config.world_width, config.world_height);
        }
        pool
    }

    /// Move the center of mass to the domain center and remove the mean
    /// velocity, then wrap positions back onto the torus.
    pub fn recenter(&mut self, width: f64, height: f64) {
        if self.n_agents == 0 {
            return;
        }
        let n = self.n_agents as f64;
        let (cx, cy) = (self.x.iter().sum::<f64>() / n, self.y.iter().sum::<f64>() / n);
        let (mvx, mvy) = (self.vx.iter().sum::<f64>() / n, self.vy.iter().sum::<f64>() / n);
        let (shift_x, shift_y) = (width / 2.0 - cx, height / 2.0 - cy);

        for i in 0..self.n_agents {
            self.x[i] = wrap_into(self.x[i] + shift_x, width);
            self.y[i] = wrap_into(self.y[i] + shift_y, height);
            self.vx[i] -= mvx;
            self.vy[i] -= mvy;
        }
    }

    /// Re-randomize one agent's position and phase. Velocity and natural
    /// frequency are left alone.
    pub fn respawn<R: Rng + ?Sized>(&mut self, index: usize, width: f64, height: f64, rng: &mut R) {
        self.x[index] = rng.gen_range(0.0..width);
        self.y[index] = rng.gen_range(0.0..height);
        self.phase[index] = rng.gen_range(0.0..TAU);
    }

    /// Start-of-step state: zero force, phase derivative seeded with the
    /// natural frequency.
    pub fn reset_accumulators(&mut self) {
        self.fx.iter_mut().for_each(|f| *f = 0.0);
        self.fy.iter_mut().for_each(|f| *f = 0.0);
        self.dtheta.copy_from_slice(&self.omega);
    }

    pub fn clear_accumulators(&mut self) {
        self.fx.iter_mut().for_each(|f| *f = 0.0);
        self.fy.iter_mut().for_each(|f| *f = 0.0);
        self.dtheta.iter_mut().for_each(|d| *d = 0.0);
    }

    pub fn view(&self, index: usize) -> Option<AgentView> {
        if index >= self.n_agents {
            return None;
        }
        Some(AgentView {
            x: self.x[index],
            y: self.y[index],
            vx: self.vx[index],
            vy: self.vy[index],
            phase: self.phase[index],
            natural_frequency: self.omega[index],
        })
    }

    pub fn positions(&self) -> impl ExactSizeIterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Σ (vx² + vy²) / N
    pub fn average_kinetic_energy(&self) -> f64 {
        if self.n_agents == 0 {
            return 0.0;
        }
        let total: f64 = self
            .vx
            .iter()
            .zip(&self.vy)
            .map(|(vx, vy)| vx * vx + vy * vy)
            .sum();
        total / self.n_agents as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn spawn_respects_domain_and_phase_range() {
        let cfg = SwarmConfig::with_population(500);
        let mut rng = StdRng::seed_from_u64(7);
        let pool = AgentPool::spawn(&cfg, &mut rng);

        assert_eq!(pool.n_agents, 500);
        for i in 0..pool.n_agents {
            assert!(pool.x[i] >= 0.0 && pool.x[i] < cfg.world_width);
            assert!(pool.y[i] >= 0.0 && pool.y[i] < cfg.world_height);
            assert!(pool.phase[i] >= 0.0 && pool.phase[i] < TAU);
            assert_eq!(pool.vx[i], 0.0);
            assert_eq!(pool.omega[i], cfg.frequency.base_omega);
        }
    }

    #[test]
    fn spawn_is_deterministic_for_a_seed() {
        let cfg = SwarmConfig::with_population(32);
        let a = AgentPool::spawn(&cfg, &mut StdRng::seed_from_u64(12345));
        let b = AgentPool::spawn(&cfg, &mut StdRng::seed_from_u64(12345));
        assert_eq!(a.x, b.x);
        assert_eq!(a.phase, b.phase);
    }

    #[test]
    fn frequencies_stay_within_variation() {
        let mut cfg = SwarmConfig::with_population(200);
        cfg.frequency.base_omega = 1.0;
        cfg.frequency.variation = 0.25;
        let pool = AgentPool::spawn(&cfg, &mut StdRng::seed_from_u64(3));
        assert!(pool.omega.iter().all(|w| (0.75..=1.25).contains(w)));
        assert!(pool.omega.iter().any(|w| (*w - 1.0).abs() > 1e-6));
    }

    #[test]
    fn recenter_moves_center_of_mass_to_domain_center() {
        let mut pool = AgentPool::new(2);
        pool.x = vec![100.0, 200.0];
        pool.y = vec![300.0, 500.0];
        pool.vx = vec![1.0, 3.0];
        pool.recenter(1000.0, 1000.0);

        assert!((pool.x[0] - 450.0).abs() < 1e-9 && (pool.x[1] - 550.0).abs() < 1e-9);
        assert!((pool.y[0] - 400.0).abs() < 1e-9 && (pool.y[1] - 600.0).abs() < 1e-9);
        assert_eq!(pool.vx, vec![-1.0, 1.0]);
    }

    #[test]
    fn reset_seeds_phase_derivative_with_natural_frequency() {
        let mut pool = AgentPool::new(3);
        pool.omega = vec![0.1, 0.2, 0.3];
        pool.fx = vec![5.0; 3];
        pool.dtheta = vec![9.0; 3];
        pool.reset_accumulators();
        assert_eq!(pool.fx, vec![0.0; 3]);
        assert_eq!(pool.dtheta, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn kinetic_energy_is_per_agent_average() {
        let mut pool = AgentPool::new(2);
        pool.vx = vec![3.0, 0.0];
        pool.vy = vec![4.0, 0.0];
        assert!((pool.average_kinetic_energy() - 12.5).abs() < 1e-12);
        assert!(pool.view(2).is_none());
    }
}
