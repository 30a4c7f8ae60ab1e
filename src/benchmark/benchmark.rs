use crate::error::Result;
use crate::io::Discard;
use crate::simulation::engine::{Engine, LeadState};
use crate::simulation::params::Parameters;
use crate::simulation::states::ParticleTable;

/// Time the compute phase of `table` for P = 1, 2, 4, ... up to `max_workers`
/// Load and persist are excluded. Prints CSV to stdout, paste into a spreadsheet to graph
pub fn bench_workers(table: &ParticleTable, params: &Parameters, max_workers: usize) -> Result<Vec<(usize, f64)>> {
    // no trace, no output file: measure the engine only
    let params = Parameters { visualization: false, debug: false, ..params.clone() };

    let mut counts = Vec::new();
    let mut p = 1;
    while p < max_workers {
        counts.push(p);
        p *= 2;
    }
    counts.push(max_workers.max(1));

    println!("workers,seconds");
    let mut timings = Vec::with_capacity(counts.len());
    for workers in counts {
        let engine = Engine::new(workers, params.clone())?;
        let mut source = table.clone();
        let mut sink = Discard;

        let report = engine.run(LeadState { source: &mut source, sink: &mut sink, trace: None })?;
        let secs = report.compute.as_secs_f64();

        println!("{},{:.6}", workers, secs);
        timings.push((workers, secs));
    }
    Ok(timings)
}
