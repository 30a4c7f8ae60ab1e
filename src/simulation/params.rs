//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds the runtime settings the workers share:
//! - particle and iteration counts,
//! - gravitational constant, time step and softening (`G`, `h0`, `eps2`),
//! - the visualization and debug flags

#[derive(Debug, Clone)]
pub struct Parameters {
    pub n: usize, // particle count
    pub iterations: usize, // fixed number of steps
    pub G: f64, // gravitational constant
    pub h0: f64, // step size
    pub eps2: f64, // softening, 0.0 = none
    pub visualization: bool, // lead worker appends a trace record every step
    pub debug: bool, // per-particle diagnostics
}
