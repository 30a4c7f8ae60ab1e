//! Core state types for the N-body simulation.
//!
//! - `Particle`      one record of the input/output table
//! - `ParticleTable` the global state held by the lead worker, stored as
//!   parallel arrays (masses, positions, velocities) indexed `0..N`

use nalgebra::Vector2;
pub type NVec2 = Vector2<f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub m: f64, // mass
    pub x: NVec2, // position
    pub v: NVec2, // velocity
}

/// Global particle state in structure-of-arrays layout.
///
/// Masses never change after load. Positions are cooperatively updated by
/// the workers, velocities live on the owning worker between load and the
/// final collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleTable {
    pub masses: Vec<f64>,
    pub positions: Vec<NVec2>,
    pub velocities: Vec<NVec2>,
}

impl ParticleTable {
    pub fn from_particles(particles: &[Particle]) -> Self {
        Self {
            masses: particles.iter().map(|p| p.m).collect(),
            positions: particles.iter().map(|p| p.x).collect(),
            velocities: particles.iter().map(|p| p.v).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn particle(&self, i: usize) -> Particle {
        Particle {
            m: self.masses[i],
            x: self.positions[i],
            v: self.velocities[i],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Particle> + '_ {
        (0..self.len()).map(move |i| self.particle(i))
    }
}
