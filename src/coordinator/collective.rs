//! Collective exchanges between the lockstep workers.
//!
//! `Collective` is the shared communication world: one rendezvous plus the
//! exchange areas the workers copy through. `Coordinator` is a worker's
//! rank-bound view of it. Every exchange has the same shape:
//!
//! 1. writers copy their contribution into the shared area
//! 2. rendezvous, so all writes are visible
//! 3. readers copy what they need out of the area
//! 4. rendezvous, so nobody overwrites the area while it is being read
//!
//! All workers must call the same exchanges in the same order, including
//! workers whose partition is empty.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::coordinator::rendezvous::Rendezvous;
use crate::error::Result;
use crate::simulation::partition::{self, Partition};
use crate::simulation::states::NVec2;

/// Rank of the lead worker, which owns loading and persistence.
pub const ROOT: usize = 0;

pub struct Collective {
    n: usize,
    capacity: usize,
    rendezvous: Rendezvous,
    masses: RwLock<Vec<f64>>, // n
    positions: RwLock<Vec<NVec2>>, // n, shared global positions
    velocities: RwLock<Vec<NVec2>>, // workers * capacity, scatter/gather staging
}

impl Collective {
    pub fn new(workers: usize, n: usize) -> Self {
        let capacity = partition::block_size(n, workers);
        Self {
            n,
            capacity,
            rendezvous: Rendezvous::new(workers),
            masses: RwLock::new(vec![0.0; n]),
            positions: RwLock::new(vec![NVec2::zeros(); n]),
            velocities: RwLock::new(vec![NVec2::zeros(); workers * capacity]),
        }
    }

    pub fn workers(&self) -> usize {
        self.rendezvous.parties()
    }

    pub fn particles(&self) -> usize {
        self.n
    }

    pub fn block_capacity(&self) -> usize {
        self.capacity
    }

    pub fn abort(&self, rank: usize) {
        self.rendezvous.abort(rank);
    }

    pub fn aborted_by(&self) -> Option<usize> {
        self.rendezvous.aborted_by()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// A worker's handle on the collective world
pub struct Coordinator<'a> {
    comm: &'a Collective,
    part: Partition,
}

impl<'a> Coordinator<'a> {
    pub fn new(comm: &'a Collective, rank: usize) -> Self {
        let part = partition::plan(comm.n, comm.workers(), rank);
        Self { comm, part }
    }

    pub fn rank(&self) -> usize {
        self.part.rank
    }

    pub fn is_root(&self) -> bool {
        self.part.rank == ROOT
    }

    pub fn partition(&self) -> Partition {
        self.part
    }

    /// Tell every other worker to give up at its next (or current) exchange.
    pub fn abort(&self) {
        self.comm.abort(self.part.rank);
    }

    /// Plain rendezvous with no data.
    pub fn barrier(&self) -> Result<()> {
        self.comm.rendezvous.wait()
    }

    fn exchange<T>(&self, write_phase: impl FnOnce(), read_phase: impl FnOnce() -> T) -> Result<T> {
        write_phase();
        self.barrier()?;
        let out = read_phase();
        self.barrier()?;
        Ok(out)
    }

    /// Broadcast masses and the initial position snapshot from the root.
    ///
    /// The root passes `Some`, everyone else `None`; every worker returns
    /// its own full copy of both arrays.
    pub fn fan_out(&self, loaded: Option<(&[f64], &[NVec2])>) -> Result<(Vec<f64>, Vec<NVec2>)> {
        self.exchange(
            || {
                if let Some((masses, positions)) = loaded {
                    write(&self.comm.masses).copy_from_slice(&masses[..self.comm.n]);
                    write(&self.comm.positions).copy_from_slice(&positions[..self.comm.n]);
                }
            },
            || (read(&self.comm.masses).clone(), read(&self.comm.positions).clone()),
        )
    }

    /// Scatter velocities: each worker receives exactly its own block.
    ///
    /// The returned buffer has the block capacity as its length; slots past
    /// the partition length are zero.
    pub fn distribute(&self, velocities: Option<&[NVec2]>) -> Result<Vec<NVec2>> {
        self.exchange(
            || {
                if let Some(velocities) = velocities {
                    let mut area = write(&self.comm.velocities);
                    area.fill(NVec2::zeros());
                    for part in partition::plan_all(self.comm.n, self.comm.workers()) {
                        let slot = part.slot();
                        area[slot.start..slot.start + part.len()].copy_from_slice(&velocities[part.range()]);
                    }
                }
            },
            || read(&self.comm.velocities)[self.part.slot()].to_vec(),
        )
    }

    /// All-gather of positions after a local integration pass.
    ///
    /// Each worker publishes only its own range of `positions` and receives
    /// the full, current array back in place. Returning from this call
    /// means every worker has published its update for this step.
    pub fn merge_positions(&self, positions: &mut [NVec2]) -> Result<()> {
        debug_assert_eq!(positions.len(), self.comm.n);
        let range = self.part.range();
        if !range.is_empty() {
            write(&self.comm.positions)[range.clone()].copy_from_slice(&positions[range]);
        }
        self.barrier()?;
        positions.copy_from_slice(&read(&self.comm.positions));
        self.barrier()
    }

    /// Gather every worker's velocity block to the root.
    ///
    /// `local` is the worker's capacity-sized buffer. The root gets the
    /// assembled `N`-long array, everyone else `None`.
    pub fn collect(&self, local: &[NVec2]) -> Result<Option<Vec<NVec2>>> {
        self.exchange(
            || write(&self.comm.velocities)[self.part.slot()].copy_from_slice(&local[..self.part.capacity]),
            || {
                self.is_root()
                    .then(|| read(&self.comm.velocities)[..self.comm.n].to_vec())
            },
        )
    }
}
