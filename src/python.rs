//! Python bindings (feature `python`).

use crate::core::config::{CouplingParams, SwarmConfig};
use crate::core::error::SwarmError;
use crate::swarm::engine::SwarmEngine;
use crate::swarm::snapshot::SwarmSnapshot;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

impl From<SwarmError> for PyErr {
    fn from(err: SwarmError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// A live swarm. State is only readable between steps.
#[pyclass(name = "Swarm")]
pub struct PySwarm {
    engine: SwarmEngine,
}

#[pymethods]
impl PySwarm {
    #[new]
    #[pyo3(signature = (n_agents=None, seed=None, config_json=None))]
    pub fn new(n_agents: Option<usize>, seed: Option<u64>, config_json: Option<String>) -> PyResult<Self> {
        let mut config = match config_json {
            Some(json) => SwarmConfig::from_json_str(&json)?,
            None => SwarmConfig::default(),
        };
        if let Some(n) = n_agents {
            config.population_size = n;
        }
        if seed.is_some() {
            config.seed = seed;
        }
        Ok(Self {
            engine: SwarmEngine::new(config)?,
        })
    }

    /// Advance by the configured dt. Returns `(tick, energy, dead)`.
    pub fn step(&mut self) -> (u64, f64, bool) {
        let sample = self.engine.step();
        (sample.tick, sample.energy, sample.is_dead())
    }

    /// Advance by `dt` (before time scaling). Returns `(tick, energy, dead)`.
    pub fn advance(&mut self, dt: f64) -> PyResult<(u64, f64, bool)> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(PyValueError::new_err(format!(
                "dt must be finite and non-negative, got {}",
                dt
            )));
        }
        let sample = self.engine.advance(dt);
        Ok((sample.tick, sample.energy, sample.is_dead()))
    }

    /// Step until equilibrium or `max_steps`. Returns `(tick, energy, dead)` of the last step.
    pub fn run_until_equilibrium(&mut self, max_steps: usize) -> Option<(u64, f64, bool)> {
        self.engine
            .run_until_equilibrium(max_steps)
            .map(|s| (s.tick, s.energy, s.is_dead()))
    }

    #[getter]
    pub fn tick(&self) -> u64 {
        self.engine.tick()
    }

    #[getter]
    pub fn n_agents(&self) -> usize {
        self.engine.len()
    }

    #[getter]
    pub fn is_dead(&self) -> bool {
        self.engine.monitor().is_dead()
    }

    pub fn positions(&self) -> Vec<(f64, f64)> {
        self.engine.positions().collect()
    }

    pub fn phases(&self) -> Vec<f64> {
        self.engine.phases().to_vec()
    }

    pub fn velocities(&self) -> Vec<(f64, f64)> {
        let pool = self.engine.pool();
        pool.vx.iter().copied().zip(pool.vy.iter().copied()).collect()
    }

    /// `(x, y, vx, vy, phase)` of one agent.
    pub fn agent(&self, index: usize) -> Option<(f64, f64, f64, f64, f64)> {
        self.engine
            .agent(index)
            .map(|a| (a.x, a.y, a.vx, a.vy, a.phase))
    }

    pub fn set_position(&mut self, index: usize, x: f64, y: f64) -> PyResult<()> {
        Ok(self.engine.set_position(index, x, y)?)
    }

    pub fn set_phase(&mut self, index: usize, phase: f64) -> PyResult<()> {
        Ok(self.engine.set_phase(index, phase)?)
    }

    pub fn set_velocity(&mut self, index: usize, vx: f64, vy: f64) -> PyResult<()> {
        Ok(self.engine.set_velocity(index, vx, vy)?)
    }

    pub fn respawn_agent(&mut self, index: usize) -> PyResult<()> {
        Ok(self.engine.respawn_agent(index)?)
    }

    pub fn set_coupling(&mut self, j: f64, k: f64, repulsion_strength: f64, epsilon: f64) -> PyResult<()> {
        Ok(self.engine.set_coupling(CouplingParams {
            j,
            k,
            repulsion_strength,
            epsilon,
        })?)
    }

    pub fn set_time_scale(&mut self, time_scale: f64) -> PyResult<()> {
        Ok(self.engine.set_time_scale(time_scale)?)
    }

    /// Buffered average kinetic energies, oldest first.
    pub fn energy_history(&self) -> Vec<f64> {
        self.engine.monitor().history()
    }

    #[pyo3(signature = (seed=None))]
    pub fn reset(&mut self, seed: Option<u64>) {
        self.engine.reset(seed);
    }

    pub fn reset_monitor(&mut self) {
        self.engine.reset_monitor();
    }

    pub fn config_json(&self) -> PyResult<String> {
        Ok(self.engine.config().to_json()?)
    }

    pub fn snapshot_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.engine.snapshot())
            .map_err(|e| PyErr::from(SwarmError::from(e)))
    }

    pub fn restore_json(&mut self, json: &str) -> PyResult<()> {
        let snapshot: SwarmSnapshot =
            serde_json::from_str(json).map_err(|e| PyErr::from(SwarmError::from(e)))?;
        Ok(self.engine.restore(&snapshot)?)
    }

    pub fn __repr__(&self) -> String {
        format!(
            "Swarm(n={}, tick={}, state={:?})",
            self.engine.len(),
            self.engine.tick(),
            self.engine.state()
        )
    }
}

/// Initialize tracing for the library.
#[pyfunction]
#[pyo3(name = "setup_logging", signature = (level=None))]
pub fn py_setup_logging(level: Option<String>) {
    crate::setup_logging(level.as_deref());
}

/// Python module initialization
#[pymodule]
fn swarmalator_core(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySwarm>()?;
    m.add_function(wrap_pyfunction!(py_setup_logging, m)?)?;
    Ok(())
}
