//! Convergence / Energy Monitor
//!
//! Tracks average kinetic energy per agent in a ring buffer and declares the
//! swarm dead after `kill_frame_count` consecutive idle steps. Dead is
//! sticky: only [`EnergyMonitor::reset`] brings the monitor back.

use crate::core::config::MonitorConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Display max grows when a sample exceeds it by this factor.
const MAX_GROWTH_TRIGGER: f64 = 1.1;
/// Per-step decay of the display max.
const MAX_DECAY: f64 = 0.9995;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Running,
    /// Equilibrium reached.
    Dead,
}

/// Result of one engine step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnergySample {
    /// Engine tick this sample was measured on (1 for the first step).
    pub tick: u64,
    /// `Σ(vx² + vy²) / N`
    pub energy: f64,
    pub state: MonitorState,
}

impl EnergySample {
    pub fn is_dead(&self) -> bool {
        self.state == MonitorState::Dead
    }
}

#[derive(Clone, Debug)]
pub struct EnergyMonitor {
    config: MonitorConfig,
    buffer: Vec<f64>,
    write_index: usize,
    filled: usize,
    display_max: f64,
    idle_frames: u32,
    state: MonitorState,
}

impl EnergyMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        let capacity = config.capacity.max(1);
        EnergyMonitor {
            config,
            buffer: vec![0.0; capacity],
            write_index: 0,
            filled: 0,
            display_max: 0.0,
            idle_frames: 0,
            state: MonitorState::Running,
        }
    }

    /// Feed one average-kinetic-energy sample and return the resulting state.
    pub fn record(&mut self, energy: f64) -> MonitorState {
        let capacity = self.buffer.len();
        self.buffer[self.write_index] = energy;
        self.write_index = (self.write_index + 1) % capacity;
        self.filled = (self.filled + 1).min(capacity);

        if energy > MAX_GROWTH_TRIGGER * self.display_max {
            self.display_max = energy;
        } else {
            self.display_max *= MAX_DECAY;
        }

        if self.state == MonitorState::Dead {
            return self.state;
        }

        if energy < self.config.threshold_per_agent {
            self.idle_frames += 1;
        } else {
            self.idle_frames = 0;
        }

        if self.idle_frames >= self.config.kill_frame_count {
            self.state = MonitorState::Dead;
            info!(
                "💤 [Monitor] Equilibrium reached after {} idle frames (energy={:.3e})",
                self.idle_frames, energy
            );
        }
        self.state
    }

    /// Back to `Running` with an empty history.
    pub fn reset(&mut self) {
        self.buffer.iter_mut().for_each(|e| *e = 0.0);
        self.write_index = 0;
        self.filled = 0;
        self.display_max = 0.0;
        self.idle_frames = 0;
        self.state = MonitorState::Running;
    }

    /// Replace thresholds; history is kept unless the capacity changes.
    pub fn reconfigure(&mut self, config: MonitorConfig) {
        let resize = config.capacity.max(1) != self.buffer.len();
        self.config = config;
        if resize {
            self.buffer = vec![0.0; config.capacity.max(1)];
            self.write_index = 0;
            self.filled = 0;
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.state == MonitorState::Dead
    }

    pub fn idle_frames(&self) -> u32 {
        self.idle_frames
    }

    /// Running maximum for plot scaling. Not used for convergence.
    pub fn display_max(&self) -> f64 {
        self.display_max
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<f64> {
        if self.filled == 0 {
            return None;
        }
        let capacity = self.buffer.len();
        Some(self.buffer[(self.write_index + capacity - 1) % capacity])
    }

    /// Buffered samples, oldest first.
    pub fn history(&self) -> Vec<f64> {
        let capacity = self.buffer.len();
        let start = (self.write_index + capacity - self.filled) % capacity;
        (0..self.filled)
            .map(|k| self.buffer[(start + k) % capacity])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(kill_frame_count: u32) -> EnergyMonitor {
        EnergyMonitor::new(MonitorConfig {
            capacity: 8,
            threshold_per_agent: 0.01,
            kill_frame_count,
        })
    }

    #[test]
    fn dies_exactly_on_kill_frame_and_stays_dead() {
        let mut m = monitor(5);
        for step in 1..5 {
            assert_eq!(m.record(0.001), MonitorState::Running, "died early at {}", step);
        }
        assert_eq!(m.record(0.001), MonitorState::Dead);
        assert_eq!(m.record(10.0), MonitorState::Dead);
        assert!(m.is_dead());
    }

    #[test]
    fn active_sample_resets_idle_counter() {
        let mut m = monitor(3);
        m.record(0.0);
        m.record(0.0);
        assert_eq!(m.idle_frames(), 2);
        // At-threshold counts as active.
        m.record(0.01);
        assert_eq!(m.idle_frames(), 0);
        m.record(0.0);
        m.record(0.0);
        assert_eq!(m.state(), MonitorState::Running);
        assert_eq!(m.record(0.0), MonitorState::Dead);
    }

    #[test]
    fn reset_revives_the_monitor() {
        let mut m = monitor(1);
        assert_eq!(m.record(0.0), MonitorState::Dead);
        m.reset();
        assert_eq!(m.state(), MonitorState::Running);
        assert!(m.is_empty());
        assert_eq!(m.record(1.0), MonitorState::Running);
    }

    #[test]
    fn ring_buffer_overwrites_oldest() {
        let mut m = monitor(100);
        for k in 0..11 {
            m.record(k as f64);
        }
        assert_eq!(m.len(), 8);
        assert_eq!(m.history(), vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        assert_eq!(m.latest(), Some(10.0));
    }

    #[test]
    fn display_max_tracks_spikes_and_decays() {
        let mut m = monitor(100);
        m.record(10.0);
        assert_eq!(m.display_max(), 10.0);
        // Within 10%: decay instead of replace.
        m.record(10.5);
        assert!((m.display_max() - 10.0 * MAX_DECAY).abs() < 1e-12);
        m.record(20.0);
        assert_eq!(m.display_max(), 20.0);
    }

    #[test]
    fn nan_energy_does_not_panic() {
        let mut m = monitor(2);
        assert_eq!(m.record(f64::NAN), MonitorState::Running);
        assert_eq!(m.idle_frames(), 0);
        assert!(m.latest().unwrap().is_nan());
    }
}
