//! Acceleration contributors for the n-body engine
//!
//! Each worker evaluates accelerations only for the particles of its own
//! partition, but sums contributions from all `N` particles. Outputs are
//! accelerations, never forces: the receiving mass cancels out of Newton's
//! law and is not divided out later.

use crate::simulation::partition::Partition;
use crate::simulation::states::NVec2;

/// Collection of acceleration terms
/// Each term implements [`Acceleration`] and their contributions are summed
/// into a single acceleration vector per owned particle
pub struct AccelSet {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl Default for AccelSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelSet {
    /// Create an empty acceleration set
    pub fn new() -> Self {
        Self {
            terms: Vec::new()
        }
    }

    /// Add an acceleration term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: Acceleration + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    /// Compute total accelerations for the particles of `part`
    /// - `out[k]` is the acceleration of particle `part.start + k`
    /// - `out` may be longer than the partition (block capacity); only the
    ///   first `part.len()` slots are written
    pub fn accumulate_accels(&self, positions: &[NVec2], masses: &[f64], part: &Partition, out: &mut [NVec2]) {
        let out = &mut out[..part.len()];
        // Zero buffer
        for a in out.iter_mut() {
            *a = NVec2::zeros();
        }
        // Iterate over all acceleration contributors
        for term in &self.terms {
            term.acceleration(positions, masses, part, out);
        }
    }
}

/// Trait for acceleration sources over a partition of the global state
/// Implementations add their contribution into `out[k]` for each owned particle
pub trait Acceleration {
    fn acceleration(&self, positions: &[NVec2], masses: &[f64], part: &Partition, out: &mut [NVec2]);
}

/// Direct-sum Newtonian gravity
///
/// `a_i = sum_{j != i} G m_j (x_j - x_i) / (|x_j - x_i|^2 + eps2)^{3/2}`
///
/// With `eps2 == 0` two coincident particles yield a non-finite
/// acceleration, which is left to propagate.
pub struct NewtonianGravity {
    pub G: f64, // gravitational constant
    pub eps2: f64, // softening
}

impl Acceleration for NewtonianGravity {
    fn acceleration(&self, positions: &[NVec2], masses: &[f64], part: &Partition, out: &mut [NVec2]) {
        let n = positions.len();

        for (k, i) in part.range().enumerate() {
            let xi = positions[i];
            let mut a = NVec2::zeros();

            // j runs over the whole index space in the same order on every
            // worker, so the sum is independent of the partitioning
            for j in 0..n {
                if j == i {
                    continue;
                }
                // r points from i to j, i is pulled along +r
                let r = positions[j] - xi;
                let d2 = r.dot(&r) + self.eps2;

                // 1 / |r|^3
                let inv_r = d2.sqrt().recip();
                let inv_r3 = inv_r * inv_r * inv_r;

                a += (self.G * masses[j] * inv_r3) * r;
            }

            out[k] += a;
        }
    }
}

/// Index (relative to the partition start) of the first non-finite entry
pub fn first_non_finite(accels: &[NVec2]) -> Option<usize> {
    accels.iter().position(|a| !(a.x.is_finite() && a.y.is_finite()))
}
