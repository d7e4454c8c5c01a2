//! Integrator
//!
//! Consumes the accumulators filled by the interaction pass and advances
//! velocity, position and phase, then wraps onto the torus.

use super::agent::AgentPool;
use crate::core::config::IntegrationPolicy;
use std::f64::consts::TAU;

/// Wrap a phase into `[0, 2π)`.
///
/// Values one turn out of range are corrected by a single add/subtract;
/// anything further falls back to a Euclidean remainder so arbitrarily
/// large phase steps still land in range.
#[inline]
pub fn wrap_phase(phase: f64) -> f64 {
    wrap_into(phase, TAU)
}

/// Wrap `value` into `[0, extent)` regardless of how far out it is.
#[inline]
pub fn wrap_into(value: f64, extent: f64) -> f64 {
    let mut v = value;
    if v < 0.0 {
        v += extent;
    } else if v >= extent {
        v -= extent;
    }
    if !(0.0..extent).contains(&v) && v.is_finite() {
        v = v.rem_euclid(extent);
    }
    // rem_euclid and the single add can round up to exactly `extent`.
    if v >= extent {
        v = 0.0;
    }
    v
}

/// Toroidal wrap with a single conditional add/subtract.
///
/// Returns the wrapped coordinate and whether it is still outside
/// `[0, extent)`, which happens only when one step moved it by more
/// than a full extent.
#[inline]
pub fn wrap_once(value: f64, extent: f64) -> (f64, bool) {
    let mut v = value;
    if v < 0.0 {
        v += extent;
        if v >= extent {
            v = 0.0;
        }
    } else if v >= extent {
        v -= extent;
    }
    let overshoot = !(0.0..extent).contains(&v);
    (v, overshoot)
}

/// Integrate one step of length `dt` (already multiplied by the time scale).
///
/// Returns the number of coordinates that overshot the domain by more than
/// one extent; those are left where the single wrap put them.
pub fn integrate(
    pool: &mut AgentPool,
    policy: IntegrationPolicy,
    dt: f64,
    width: f64,
    height: f64,
) -> usize {
    match policy {
        IntegrationPolicy::Overdamped => {
            pool.vx.copy_from_slice(&pool.fx);
            pool.vy.copy_from_slice(&pool.fy);
        }
        IntegrationPolicy::Damped { coefficient } => {
            for i in 0..pool.n_agents {
                pool.vx[i] = pool.vx[i] * coefficient + pool.fx[i] * dt;
                pool.vy[i] = pool.vy[i] * coefficient + pool.fy[i] * dt;
            }
        }
    }

    let mut overshoots = 0;
    for i in 0..pool.n_agents {
        let (x, over_x) = wrap_once(pool.x[i] + pool.vx[i] * dt, width);
        let (y, over_y) = wrap_once(pool.y[i] + pool.vy[i] * dt, height);
        pool.x[i] = x;
        pool.y[i] = y;
        overshoots += over_x as usize + over_y as usize;

        pool.phase[i] = wrap_phase(pool.phase[i] + pool.dtheta[i] * dt);
    }

    pool.clear_accumulators();
    overshoots
}
