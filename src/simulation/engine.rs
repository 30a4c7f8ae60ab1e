//! Lockstep multi-worker simulation driver
//!
//! `Engine::run` launches a fixed pool of `workers` scoped threads that all
//! execute the same step loop over their own partition:
//!
//! ```text
//! Loaded -> fan-out / distribute -> (forces -> integrate -> merge)* -> collect -> persist
//! ```
//!
//! Only the lead worker (rank 0) touches the [`LeadState`]: it loads the
//! initial table, writes the trace and persists the final state. Any error
//! on any worker aborts the collective world so nobody is left waiting.

use std::time::{Duration, Instant};

use crate::coordinator::collective::{Collective, Coordinator, ROOT};
use crate::error::{Result, SimError};
use crate::io::{ParticleSource, StateSink};
use crate::simulation::forces::{first_non_finite, AccelSet, NewtonianGravity};
use crate::simulation::integrator::symplectic_euler;
use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec2, ParticleTable};
use crate::visualization::trace::TraceSink;

/// State owned exclusively by the lead worker for the load and finalize
/// phases. Never reaches the per-step computation.
pub struct LeadState<'a> {
    pub source: &'a mut (dyn ParticleSource + Send),
    pub sink: &'a mut (dyn StateSink + Send),
    pub trace: Option<&'a mut (dyn TraceSink + Send)>,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub table: ParticleTable, // final global state, already persisted
    pub compute: Duration,    // distribute -> collect on the lead worker
}

pub struct Engine {
    pub workers: usize, // fixed pool size P
    pub parameters: Parameters,
    pub forces: AccelSet,
}

/// Aborts the world if the owning worker unwinds
struct AbortOnPanic<'a> {
    comm: &'a Collective,
    rank: usize,
}

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.comm.abort(self.rank);
        }
    }
}

impl Engine {
    pub fn new(workers: usize, parameters: Parameters) -> Result<Self> {
        if workers == 0 {
            return Err(SimError::InvalidWorkerCount);
        }
        let forces = AccelSet::new().with(NewtonianGravity {
            G: parameters.G,
            eps2: parameters.eps2,
        });
        Ok(Self { workers, parameters, forces })
    }

    /// Run the full simulation. The final global state in the report has
    /// already been handed to `lead.sink`.
    pub fn run(&self, lead: LeadState<'_>) -> Result<RunReport> {
        let p = &self.parameters;
        let comm = Collective::new(self.workers, p.n);
        tracing::info!(
            workers = self.workers,
            particles = p.n,
            iterations = p.iterations,
            block = comm.block_capacity(),
            "starting run"
        );

        let results = crossbeam::thread::scope(|s| {
            let mut lead = Some(lead);
            let handles: Vec<_> = (0..self.workers)
                .map(|rank| {
                    let lead = if rank == ROOT { lead.take() } else { None };
                    let comm = &comm;
                    s.spawn(move |_| self.run_worker(comm, rank, lead))
                })
                .collect();

            handles
                .into_iter()
                .enumerate()
                .map(|(rank, h)| h.join().unwrap_or(Err(SimError::WorkerPanicked { rank })))
                .collect::<Vec<_>>()
        })
        .map_err(|_| SimError::WorkerPanicked { rank: ROOT })?;

        // report the root cause, not the abort echoes it triggered
        let mut report = None;
        let mut aborted = None;
        for result in results {
            match result {
                Ok(Some(r)) => report = Some(r),
                Ok(None) => {}
                Err(e) if e.is_abort() => {
                    aborted.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }
        if let Some(e) = aborted {
            return Err(e);
        }

        let report = report.ok_or(SimError::Aborted { by: ROOT })?;
        tracing::info!(
            compute_s = report.compute.as_secs_f64(),
            "p={}, particles={}, iterations={}",
            self.workers,
            p.n,
            p.iterations
        );
        Ok(report)
    }

    fn run_worker(&self, comm: &Collective, rank: usize, mut lead: Option<LeadState<'_>>) -> Result<Option<RunReport>> {
        let _guard = AbortOnPanic { comm, rank };
        let coord = Coordinator::new(comm, rank);

        let result = self.step_loop(&coord, lead.as_mut());
        if let Err(e) = &result {
            if !e.is_abort() {
                tracing::warn!(rank, error = %e, "worker failed, aborting run");
                coord.abort();
            }
        }
        result
    }

    fn step_loop(&self, coord: &Coordinator<'_>, mut lead: Option<&mut LeadState<'_>>) -> Result<Option<RunReport>> {
        let p = &self.parameters;
        let part = coord.partition();

        // Loaded
        let loaded = match lead.as_deref_mut() {
            Some(l) => Some(l.source.load(p.n)?),
            None => None,
        };

        // Distributed
        let (masses, mut positions) = coord.fan_out(loaded.as_ref().map(|t| (&t.masses[..], &t.positions[..])))?;
        let mut velocities = coord.distribute(loaded.as_ref().map(|t| &t.velocities[..]))?;
        drop(loaded);
        let started = Instant::now();

        let mut trace = match lead.as_deref_mut() {
            Some(l) if p.visualization => l.trace.as_deref_mut(),
            _ => None,
        };
        if let Some(trace) = trace.as_deref_mut() {
            trace.begin()?;
        }

        let mut accels = vec![NVec2::zeros(); part.capacity];
        let mut reported_non_finite = false;

        for iteration in 1..=p.iterations {
            if coord.is_root() && p.debug {
                tracing::debug!("----- starting iteration {iteration} -----");
            }

            // LocalUpdate
            self.forces.accumulate_accels(&positions, &masses, &part, &mut accels);
            if !reported_non_finite {
                if let Some(k) = first_non_finite(&accels[..part.len()]) {
                    tracing::warn!(
                        rank = part.rank,
                        particle = part.start + k,
                        iteration,
                        "non-finite acceleration (coincident particles?)"
                    );
                    reported_non_finite = true;
                }
            }
            if p.debug {
                for (k, a) in accels[..part.len()].iter().enumerate() {
                    tracing::debug!(particle = part.start + k, "force {:.3} {:.3}", a.x, a.y);
                }
            }
            symplectic_euler(&part, &mut positions[part.range()], &accels, &mut velocities, p);

            // Merged
            coord.merge_positions(&mut positions)?;

            if let Some(trace) = trace.as_deref_mut() {
                trace.record(iteration, &masses, &positions)?;
            }
            if coord.is_root() && p.debug {
                tracing::debug!("----- finishing iteration {iteration} -----");
            }
        }

        // Finalized
        let gathered = coord.collect(&velocities)?;
        let compute = started.elapsed();
        if let Some(trace) = trace {
            trace.finish()?;
        }

        match (lead, gathered) {
            (Some(lead), Some(velocities)) => {
                let table = ParticleTable { masses, positions, velocities };
                lead.sink.persist(&table)?;
                Ok(Some(RunReport { table, compute }))
            }
            _ => Ok(None),
        }
    }
}
