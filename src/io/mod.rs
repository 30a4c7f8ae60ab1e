//! Load/persist collaborators used by the lead worker.

pub mod table;

use crate::error::{Result, SimError};
use crate::simulation::states::ParticleTable;

/// Where the initial particle state comes from
pub trait ParticleSource {
    /// Load exactly `n` particles
    fn load(&mut self, n: usize) -> Result<ParticleTable>;
}

/// Where the final particle state goes
pub trait StateSink {
    fn persist(&mut self, table: &ParticleTable) -> Result<()>;
}

/// In-memory source: hands out the first `n` particles
impl ParticleSource for ParticleTable {
    fn load(&mut self, n: usize) -> Result<ParticleTable> {
        if self.len() < n {
            return Err(SimError::MissingRecords { expected: n, found: self.len() });
        }
        Ok(ParticleTable {
            masses: self.masses[..n].to_vec(),
            positions: self.positions[..n].to_vec(),
            velocities: self.velocities[..n].to_vec(),
        })
    }
}

/// Sink that drops the final state (benchmarks)
pub struct Discard;

impl StateSink for Discard {
    fn persist(&mut self, _table: &ParticleTable) -> Result<()> {
        Ok(())
    }
}
