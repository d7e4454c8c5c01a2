//! Snapshots and Traces
//!
//! Frame layout matches the recorded trace files used for parity checks:
//! `{"tick": .., "agents_pos": [[x, y], ..], "agents_phase": [..], "agents_vel": [[vx, vy], ..]}`.

use super::agent::AgentPool;
use super::integrator::{wrap_into, wrap_phase};
use crate::core::error::{SwarmError, SwarmResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::io::{Read, Write};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwarmSnapshot {
    #[serde(default)]
    pub tick: u64,
    pub agents_pos: Vec<[f64; 2]>,
    pub agents_phase: Vec<f64>,
    /// Older traces carry no velocities; they restore as zero.
    #[serde(default)]
    pub agents_vel: Vec<[f64; 2]>,
}

impl SwarmSnapshot {
    pub fn capture(tick: u64, pool: &AgentPool) -> Self {
        SwarmSnapshot {
            tick,
            agents_pos: pool.x.iter().zip(&pool.y).map(|(x, y)| [*x, *y]).collect(),
            agents_phase: pool.phase.clone(),
            agents_vel: pool.vx.iter().zip(&pool.vy).map(|(vx, vy)| [*vx, *vy]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.agents_pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents_pos.is_empty()
    }

    /// Write this frame's state into `pool`. Accumulators are cleared.
    fn apply_to(&self, pool: &mut AgentPool) -> SwarmResult<()> {
        let n = pool.n_agents;
        for actual in [self.agents_pos.len(), self.agents_phase.len()] {
            if actual != n {
                return Err(SwarmError::AgentCountMismatch { expected: n, actual });
            }
        }
        if !self.agents_vel.is_empty() && self.agents_vel.len() != n {
            return Err(SwarmError::AgentCountMismatch {
                expected: n,
                actual: self.agents_vel.len(),
            });
        }

        for (i, [x, y]) in self.agents_pos.iter().enumerate() {
            pool.x[i] = *x;
            pool.y[i] = *y;
        }
        for (i, phase) in self.agents_phase.iter().enumerate() {
            pool.phase[i] = if (0.0..TAU).contains(phase) { *phase } else { wrap_phase(*phase) };
        }
        if self.agents_vel.is_empty() {
            pool.vx.iter_mut().for_each(|v| *v = 0.0);
            pool.vy.iter_mut().for_each(|v| *v = 0.0);
        } else {
            for (i, [vx, vy]) in self.agents_vel.iter().enumerate() {
                pool.vx[i] = *vx;
                pool.vy[i] = *vy;
            }
        }
        pool.clear_accumulators();
        Ok(())
    }

    /// Same as [`apply_to`](Self::apply_to) but also wraps positions onto a
    /// `width × height` torus.
    pub(crate) fn apply_wrapped(&self, pool: &mut AgentPool, width: f64, height: f64) -> SwarmResult<()> {
        self.apply_to(pool)?;
        for i in 0..pool.n_agents {
            pool.x[i] = wrap_into(pool.x[i], width);
            pool.y[i] = wrap_into(pool.y[i], height);
        }
        Ok(())
    }
}

/// Where two traces disagree the most.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TraceDivergence {
    /// Largest absolute coordinate difference over all frames and agents.
    pub max_position_error: f64,
    pub frame: usize,
    pub agent: usize,
    pub max_phase_error: f64,
    pub mean_position_error: f64,
}

/// Ordered list of frames.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    pub frames: Vec<SwarmSnapshot>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: SwarmSnapshot) {
        self.frames.push(frame);
    }

    pub fn record(&mut self, engine: &super::engine::SwarmEngine) {
        self.frames.push(engine.snapshot());
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn to_json(&self) -> SwarmResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> SwarmResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> SwarmResult<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: R) -> SwarmResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Compare frame-by-frame against `other` over their common prefix.
    ///
    /// Returns `None` when there is nothing to compare. Frames whose agent
    /// counts differ are an error.
    pub fn divergence(&self, other: &Trace) -> SwarmResult<Option<TraceDivergence>> {
        let frames = self.frames.len().min(other.frames.len());
        let mut worst: Option<TraceDivergence> = None;
        let mut error_sum = 0.0;
        let mut error_count = 0usize;

        for f in 0..frames {
            let (ours, theirs) = (&self.frames[f], &other.frames[f]);
            if ours.len() != theirs.len() || ours.agents_phase.len() != theirs.agents_phase.len() {
                return Err(SwarmError::AgentCountMismatch {
                    expected: ours.len(),
                    actual: theirs.len(),
                });
            }
            for (a, (p, q)) in ours.agents_pos.iter().zip(&theirs.agents_pos).enumerate() {
                let err = (p[0] - q[0]).abs().max((p[1] - q[1]).abs());
                error_sum += err;
                error_count += 1;
                let entry = worst.get_or_insert(TraceDivergence {
                    max_position_error: err,
                    frame: f,
                    agent: a,
                    max_phase_error: 0.0,
                    mean_position_error: 0.0,
                });
                if err > entry.max_position_error {
                    entry.max_position_error = err;
                    entry.frame = f;
                    entry.agent = a;
                }
            }
            if let Some(entry) = worst.as_mut() {
                for (p, q) in ours.agents_phase.iter().zip(&theirs.agents_phase) {
                    entry.max_phase_error = entry.max_phase_error.max((p - q).abs());
                }
            }
        }

        if let Some(entry) = worst.as_mut() {
            entry.mean_position_error = error_sum / error_count as f64;
        }
        Ok(worst)
    }
}
