//! Fixed-step time integrator for a worker's partition
//!
//! Semi-implicit Euler on the unit torus:
//! - `x += v dt + a dt^2 / 2`, then wrap each coordinate into `[0, 1)`
//! - `v += a dt`

use super::params::Parameters;
use super::partition::Partition;
use super::states::NVec2;

/// Map a coordinate onto the canonical torus range `[0, 1)`.
///
/// Negative overshoot wraps from the top (`-0.02 -> 0.98`). Values that
/// round up to exactly `1.0` (tiny negatives) become `0.0`. NaN and
/// infinities are returned unchanged as NaN.
pub fn wrap_unit(x: f64) -> f64 {
    let w = x.rem_euclid(1.0);
    if w >= 1.0 { 0.0 } else { w }
}

pub fn wrap_position(p: NVec2) -> NVec2 {
    NVec2::new(wrap_unit(p.x), wrap_unit(p.y))
}

/// Advance the particles of `part` by one step of `params.h0`
///
/// - `positions` is the worker's owned slice of the global position array
///   (exactly `part.len()` long)
/// - `accels` and `velocities` are the worker-local buffers, indexed
///   relative to `part.start` and sized to the block capacity
pub fn symplectic_euler(part: &Partition, positions: &mut [NVec2], accels: &[NVec2], velocities: &mut [NVec2], params: &Parameters) {
    let n = part.len();
    if n == 0 { // idle worker, nothing to move
        return;
    }
    debug_assert_eq!(positions.len(), n);

    let dt = params.h0;
    let half_dt2 = 0.5 * dt * dt;

    for k in 0..n {
        let a = accels[k];
        let v = &mut velocities[k];

        // Drift with the current velocity plus the second-order kick
        positions[k] = wrap_position(positions[k] + dt * *v + half_dt2 * a);

        // Kick
        *v += dt * a;

        if params.debug {
            tracing::debug!(
                particle = part.start + k,
                "position {:.3} {:.3}",
                positions[k].x,
                positions[k].y
            );
        }
    }
}
