//! Pairwise Interaction Accumulator
//!
//! Visits every unordered pair `(i, j)`, `i < j`, once and adds equal and
//! opposite contributions to both agents. Per pair, with `Δ = pos_j - pos_i`,
//! `d = |Δ|` and `Δθ = θ_j - θ_i`:
//!
//! ```text
//! repulsion  = R / ((d² + ε) · N)        pushes i and j apart along Δ
//! spatial    = (1 + J·cos Δθ) / N        pulls i toward j along Δ
//! phase      = K·sin Δθ / (d · N)        dθ_i += phase, dθ_j -= phase
//! ```
//!
//! Distances are straight-line; the torus only affects where agents sit,
//! not how they see each other.

use super::agent::AgentPool;
use crate::core::config::{CouplingParams, InteractionProfile};

/// Pairs closer than this (squared) are skipped entirely.
pub const MIN_DISTANCE_SQ: f64 = 1e-6;
/// Phase coupling is skipped below this distance.
pub const MIN_PHASE_DISTANCE: f64 = 1e-3;

/// Everything the accumulation pass needs besides the agents themselves.
#[derive(Clone, Copy, Debug)]
pub struct InteractionParams {
    pub coupling: CouplingParams,
    pub profile: InteractionProfile,
    pub center: (f64, f64),
}

/// Accumulate forces and phase derivatives for one step.
///
/// Accumulators must already hold their start-of-step values
/// (see [`AgentPool::reset_accumulators`]).
pub fn accumulate(pool: &mut AgentPool, params: &InteractionParams) {
    match params.profile {
        InteractionProfile::Normalized => {
            let scale = 1.0 / pool.n_agents.max(1) as f64;
            accumulate_pairs(pool, &params.coupling, scale, f64::INFINITY);
        }
        InteractionProfile::Legacy {
            cutoff_radius,
            well_strength,
        } => {
            accumulate_pairs(pool, &params.coupling, 1.0, cutoff_radius);
            apply_center_well(pool, params.center, well_strength);
        }
    }
}

/// Core O(N²) loop. `scale` is `1/N` for the normalized profile and `1`
/// for the legacy one; pairs at `d >= cutoff` are ignored.
fn accumulate_pairs(pool: &mut AgentPool, coupling: &CouplingParams, scale: f64, cutoff: f64) {
    let n = pool.n_agents;
    let cutoff_sq = cutoff * cutoff;
    let AgentPool {
        x,
        y,
        phase,
        fx,
        fy,
        dtheta,
        ..
    } = pool;

    for i in 0..n {
        let (xi, yi, ti) = (x[i], y[i], phase[i]);
        let (mut fxi, mut fyi, mut dti) = (0.0, 0.0, 0.0);

        for j in (i + 1)..n {
            let dx = x[j] - xi;
            let dy = y[j] - yi;
            let dist_sq = dx * dx + dy * dy;
            if dist_sq < MIN_DISTANCE_SQ || dist_sq >= cutoff_sq {
                continue;
            }
            let dist = dist_sq.sqrt();
            let (ux, uy) = (dx / dist, dy / dist);
            let (sin_d, cos_d) = (phase[j] - ti).sin_cos();

            let repulsion = coupling.repulsion_strength / (dist_sq + coupling.epsilon) * scale;
            let attraction = (1.0 + coupling.j * cos_d) * scale;
            let pull = attraction - repulsion;

            fxi += pull * ux;
            fyi += pull * uy;
            fx[j] -= pull * ux;
            fy[j] -= pull * uy;

            if dist >= MIN_PHASE_DISTANCE {
                let coupling_term = coupling.k * sin_d / dist * scale;
                dti += coupling_term;
                dtheta[j] -= coupling_term;
            }
        }

        fx[i] += fxi;
        fy[i] += fyi;
        dtheta[i] += dti;
    }
}

/// Harmonic confinement toward the domain center (legacy profile only).
fn apply_center_well(pool: &mut AgentPool, center: (f64, f64), strength: f64) {
    if strength == 0.0 {
        return;
    }
    for i in 0..pool.n_agents {
        pool.fx[i] -= strength * (pool.x[i] - center.0);
        pool.fy[i] -= strength * (pool.y[i] - center.1);
    }
}
