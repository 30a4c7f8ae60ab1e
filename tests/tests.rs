use dnbsim::{
    plan, AccelSet, Engine, LeadState, NewtonianGravity, NVec2, OutputFile, Parameters, Particle,
    ParticleTable, SimError, StateSink, TableFile, TraceFile, TraceRecord, TraceSink,
};
use dnbsim::{load_trace, Discard, MassClass, ParticleSource};

use std::time::Duration;

/// Build a table from `(mass, [x, y], [vx, vy])` triples
pub fn table(bodies: &[(f64, [f64; 2], [f64; 2])]) -> ParticleTable {
    let particles: Vec<Particle> = bodies
        .iter()
        .map(|&(m, x, v)| Particle { m, x: x.into(), v: v.into() })
        .collect();
    ParticleTable::from_particles(&particles)
}

/// Two unit masses on the diagonal, at rest
pub fn diagonal_pair() -> ParticleTable {
    table(&[(1.0, [0.2, 0.2], [0.0, 0.0]), (1.0, [0.8, 0.8], [0.0, 0.0])])
}

/// Deterministic scattered system, no rand needed
pub fn scattered(n: usize) -> ParticleTable {
    let bodies: Vec<_> = (0..n)
        .map(|i| {
            let f = i as f64;
            (
                1.0 + (f * 0.7).sin().abs(),
                [0.5 + 0.4 * (f * 0.37).sin(), 0.5 + 0.4 * (f * 0.13).cos()],
                [0.05 * (f * 0.07).sin(), -0.05 * (f * 0.11).cos()],
            )
        })
        .collect();
    table(&bodies)
}

/// Default physics parameters for tests
pub fn test_params(n: usize, iterations: usize) -> Parameters {
    Parameters {
        n,
        iterations,
        G: 1.0,
        h0: 0.01,
        eps2: 0.0,
        visualization: true,
        debug: false,
    }
}

/// Run `table` on `workers` workers, returning the final state and the trace
pub fn run(table: &ParticleTable, params: Parameters, workers: usize) -> Result<(ParticleTable, Vec<TraceRecord>), SimError> {
    let engine = Engine::new(workers, params)?;
    let mut source = table.clone();
    let mut sink = Discard;
    let mut trace: Vec<TraceRecord> = Vec::new();
    let report = engine.run(LeadState { source: &mut source, sink: &mut sink, trace: Some(&mut trace) })?;
    Ok((report.table, trace))
}

fn close(a: NVec2, b: NVec2, tol: f64) -> bool {
    (a - b).norm() <= tol
}

// ==================================================================================
// Gravity tests
// ==================================================================================

fn accels_for(t: &ParticleTable, eps2: f64) -> Vec<NVec2> {
    let forces = AccelSet::new().with(NewtonianGravity { G: 1.0, eps2 });
    let part = plan(t.len(), 1, 0);
    let mut out = vec![NVec2::zeros(); part.capacity];
    forces.accumulate_accels(&t.positions, &t.masses, &part, &mut out);
    out
}

#[test]
fn gravity_symmetric_pair() {
    let t = diagonal_pair();
    let acc = accels_for(&t, 0.0);

    // equal magnitude, opposite direction
    assert!(close(acc[0], -acc[1], 1e-12), "{:?} vs {:?}", acc[0], acc[1]);

    // 1 / |r|^2 with |r| = 0.6 * sqrt(2)
    let expected = 1.0 / 0.72;
    assert!((acc[0].norm() - expected).abs() < 1e-9, "magnitude {}", acc[0].norm());

    // directly toward the other particle
    let dir = (t.positions[1] - t.positions[0]).normalize();
    assert!((acc[0].normalize().dot(&dir) - 1.0).abs() < 1e-12);
}

#[test]
fn gravity_uses_source_mass_only() {
    // doubling the receiving mass must not change its acceleration
    let light = table(&[(1.0, [0.2, 0.5], [0.0, 0.0]), (3.0, [0.7, 0.5], [0.0, 0.0])]);
    let heavy = table(&[(5.0, [0.2, 0.5], [0.0, 0.0]), (3.0, [0.7, 0.5], [0.0, 0.0])]);
    let a = accels_for(&light, 0.0);
    let b = accels_for(&heavy, 0.0);
    assert!(close(a[0], b[0], 1e-12));
    assert!((a[0].x - 3.0 / 0.25).abs() < 1e-9);
}

#[test]
fn gravity_inverse_square_law() {
    let near = table(&[(1.0, [0.4, 0.5], [0.0, 0.0]), (1.0, [0.5, 0.5], [0.0, 0.0])]);
    let far = table(&[(1.0, [0.3, 0.5], [0.0, 0.0]), (1.0, [0.5, 0.5], [0.0, 0.0])]);
    let ratio = accels_for(&near, 0.0)[0].norm() / accels_for(&far, 0.0)[0].norm();
    assert!((ratio - 4.0).abs() < 1e-9, "Expected ~4x, got {}", ratio);
}

#[test]
fn gravity_partition_matches_full_evaluation() {
    let t = scattered(11);
    let full = accels_for(&t, 0.0);
    let forces = AccelSet::new().with(NewtonianGravity { G: 1.0, eps2: 0.0 });

    for rank in 0..4 {
        let part = plan(t.len(), 4, rank);
        let mut out = vec![NVec2::zeros(); part.capacity];
        forces.accumulate_accels(&t.positions, &t.masses, &part, &mut out);
        for (k, i) in part.range().enumerate() {
            assert_eq!(out[k], full[i]);
        }
    }
}

#[test]
fn coincident_particles_are_not_masked() {
    let t = table(&[(1.0, [0.5, 0.5], [0.0, 0.0]), (1.0, [0.5, 0.5], [0.0, 0.0])]);
    let acc = accels_for(&t, 0.0);
    assert!(!acc[0].x.is_finite());
}

#[test]
fn softening_prevents_blowup() {
    let t = table(&[(1.0, [0.5, 0.5], [0.0, 0.0]), (1.0, [0.5 + 1e-9, 0.5], [0.0, 0.0])]);
    let acc = accels_for(&t, 1e-4);
    assert!(acc[0].norm().is_finite());
    assert!(acc[0].norm() < 1e3, "Softening failed; acceleration too large");
}

// ==================================================================================
// Engine tests
// ==================================================================================

#[test]
fn single_step_pair_end_to_end() {
    let t = diagonal_pair();
    let (out, _) = run(&t, test_params(2, 1), 2).unwrap();

    let a = 1.0 / 0.72 / 2f64.sqrt(); // per-axis component
    let dt: f64 = 0.01;

    assert!((out.positions[0].x - (0.2 + 0.5 * a * dt * dt)).abs() < 1e-12);
    assert!((out.positions[0].y - (0.2 + 0.5 * a * dt * dt)).abs() < 1e-12);
    assert!((out.positions[1].x - (0.8 - 0.5 * a * dt * dt)).abs() < 1e-12);
    assert!((out.velocities[0].x - a * dt).abs() < 1e-12);
    assert!((out.velocities[1].y + a * dt).abs() < 1e-12);
    assert_eq!(out.masses, t.masses);
}

#[test]
fn isolated_particle_never_moves() {
    let t = table(&[(3.0, [0.25, 0.75], [0.0, 0.0])]);
    let (out, trace) = run(&t, test_params(1, 50), 3).unwrap();
    assert_eq!(out, t);
    assert_eq!(trace.len(), 50);
    assert!(trace.iter().all(|r| r.x == NVec2::new(0.25, 0.75)));
}

#[test]
fn worker_count_does_not_change_physics() {
    let t = scattered(13);
    let (reference, ref_trace) = run(&t, test_params(13, 20), 1).unwrap();

    for workers in [2, 3, 4, 7, 13, 20] {
        let (out, trace) = run(&t, test_params(13, 20), workers).unwrap();
        assert_eq!(trace.len(), ref_trace.len());
        for (a, b) in trace.iter().zip(&ref_trace) {
            assert_eq!(a.iteration, b.iteration);
            assert!(close(a.x, b.x, 1e-12), "P={workers} it={} {:?} vs {:?}", a.iteration, a.x, b.x);
        }
        for i in 0..13 {
            assert!(close(out.velocities[i], reference.velocities[i], 1e-12));
        }
    }
}

#[test]
fn repeated_runs_are_identical() {
    let t = scattered(9);
    let (a, _) = run(&t, test_params(9, 15), 4).unwrap();
    let (b, _) = run(&t, test_params(9, 15), 4).unwrap();
    assert_eq!(a, b);
}

#[test]
fn positions_stay_on_the_torus() {
    // fast particles cross the boundary in both directions
    let t = table(&[
        (1.0, [0.99, 0.01], [3.0, -3.0]),
        (1e-6, [0.5, 0.5], [-2.5, 1.7]),
    ]);
    let (out, trace) = run(&t, test_params(2, 40), 2).unwrap();
    for r in &trace {
        assert!((0.0..1.0).contains(&r.x.x) && (0.0..1.0).contains(&r.x.y), "{:?}", r);
    }
    assert!(out.positions.iter().all(|x| (0.0..1.0).contains(&x.x)));
}

#[test]
fn trace_is_iteration_major() {
    let t = scattered(4);
    let (_, trace) = run(&t, test_params(4, 3), 3).unwrap();
    assert_eq!(trace.len(), 12);
    for (k, r) in trace.iter().enumerate() {
        assert_eq!(r.iteration, k / 4 + 1);
        assert_eq!(r.m, t.masses[k % 4]);
    }
}

#[test]
fn more_workers_than_particles() {
    let t = diagonal_pair();
    let (a, _) = run(&t, test_params(2, 5), 1).unwrap();
    let (b, _) = run(&t, test_params(2, 5), 8).unwrap();
    assert_eq!(a, b);
}

#[test]
fn empty_system_runs() {
    let (out, trace) = run(&ParticleTable::default(), test_params(0, 3), 2).unwrap();
    assert!(out.is_empty());
    assert!(trace.is_empty());
}

#[test]
fn zero_workers_is_rejected() {
    assert!(matches!(Engine::new(0, test_params(1, 1)), Err(SimError::InvalidWorkerCount)));
}

// ==================================================================================
// Failure propagation tests
// ==================================================================================

#[test]
fn short_input_aborts_every_worker() {
    let t = diagonal_pair();
    match run(&t, test_params(3, 5), 4) {
        Err(SimError::MissingRecords { expected: 3, found: 2 }) => {}
        other => panic!("unexpected {other:?}"),
    }
}

struct FailingTrace {
    fail_at: usize,
}

impl TraceSink for FailingTrace {
    fn record(&mut self, iteration: usize, _: &[f64], _: &[NVec2]) -> Result<(), SimError> {
        if iteration == self.fail_at {
            return Err(SimError::io("trace", std::io::Error::other("disk full")));
        }
        Ok(())
    }
}

#[test]
fn trace_failure_mid_run_aborts_every_worker() {
    let engine = Engine::new(4, test_params(9, 10)).unwrap();
    let mut source = scattered(9);
    let mut sink = Discard;
    let mut trace = FailingTrace { fail_at: 4 };

    let err = engine
        .run(LeadState { source: &mut source, sink: &mut sink, trace: Some(&mut trace) })
        .unwrap_err();
    assert!(matches!(err, SimError::Io { .. }), "{err:?}");
}

struct FailingSink;

impl StateSink for FailingSink {
    fn persist(&mut self, _: &ParticleTable) -> Result<(), SimError> {
        Err(SimError::io("out", std::io::Error::other("read-only")))
    }
}

#[test]
fn persist_failure_is_reported() {
    let engine = Engine::new(2, test_params(2, 1)).unwrap();
    let mut source = diagonal_pair();
    let err = engine
        .run(LeadState { source: &mut source, sink: &mut FailingSink, trace: None })
        .unwrap_err();
    assert!(matches!(err, SimError::Io { .. }));
}

// ==================================================================================
// File round trip
// ==================================================================================

#[test]
fn files_in_files_out() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    let input = dir.join("input.txt");
    std::fs::write(&input, "1 0.2 0.2 0 0\n1 0.8 0.8 0 0\n7 0.1 0.1 0 0\n").unwrap();

    let engine = Engine::new(2, test_params(2, 2)).unwrap();
    let mut source = TableFile { path: input };
    let mut sink = OutputFile { path: dir.join("out.txt") };
    let mut trace = TraceFile::new(dir.join("viz.txt"));
    engine
        .run(LeadState { source: &mut source, sink: &mut sink, trace: Some(&mut trace) })
        .unwrap();

    let out = std::fs::read_to_string(dir.join("out.txt")).unwrap();
    assert_eq!(out.lines().count(), 2);
    assert!(out.starts_with("1.000000 0.200"));

    let viz = std::fs::read_to_string(dir.join("viz.txt")).unwrap();
    let iterations: Vec<&str> = viz.lines().map(|l| l.split(' ').next().unwrap()).collect();
    assert_eq!(iterations, ["1", "1", "2", "2"]);

    // scratch files go away with the directory handle
    let kept = dir.to_path_buf();
    drop(tmp);
    assert!(!kept.exists());
}

#[test]
fn recorded_trace_replays_frame_by_frame() {
    let tmp = tempfile::tempdir().unwrap();
    let viz = tmp.path().join("viz.txt");
    let t = table(&[
        (10.0, [0.5, 0.5], [0.0, 0.0]),
        (6.0, [0.2, 0.5], [0.0, 0.3]),
        (1.0, [0.8, 0.5], [0.0, -0.3]),
    ]);

    let engine = Engine::new(2, test_params(3, 4)).unwrap();
    let mut source = t.clone();
    let mut trace = TraceFile::new(&viz);
    let report = engine
        .run(LeadState { source: &mut source, sink: &mut Discard, trace: Some(&mut trace) })
        .unwrap();

    let frames = load_trace(&viz).unwrap();
    assert_eq!(frames.len(), 4);
    for (k, frame) in frames.iter().enumerate() {
        assert_eq!(frame.iteration, k + 1);
        assert_eq!(frame.masses, t.masses);
    }

    // six decimals in the file
    let last = &frames[3];
    for (x, y) in last.positions.iter().zip(&report.table.positions) {
        assert!(close(*x, *y, 1e-6));
    }

    let classes: Vec<MassClass> = last.masses.iter().map(|&m| MassClass::of(m)).collect();
    assert_eq!(classes, [MassClass::Heavy, MassClass::Large, MassClass::Small]);
}

// ==================================================================================
// Timing
// ==================================================================================

struct SlowSource(ParticleTable);

impl ParticleSource for SlowSource {
    fn load(&mut self, n: usize) -> Result<ParticleTable, SimError> {
        std::thread::sleep(Duration::from_millis(300));
        self.0.load(n)
    }
}

struct SlowSink;

impl StateSink for SlowSink {
    fn persist(&mut self, _: &ParticleTable) -> Result<(), SimError> {
        std::thread::sleep(Duration::from_millis(300));
        Ok(())
    }
}

#[test]
fn compute_time_excludes_load_and_persist() {
    let engine = Engine::new(2, test_params(2, 1)).unwrap();
    let mut source = SlowSource(diagonal_pair());
    let report = engine
        .run(LeadState { source: &mut source, sink: &mut SlowSink, trace: None })
        .unwrap();
    assert!(report.compute < Duration::from_millis(250), "{:?}", report.compute);
}

#[test]
fn missing_input_file_fails_cleanly() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path();
    let engine = Engine::new(3, test_params(2, 2)).unwrap();
    let mut source = TableFile { path: dir.join("nope.txt") };
    let mut trace = TraceFile::new(dir.join("viz.txt"));
    let err = engine
        .run(LeadState { source: &mut source, sink: &mut Discard, trace: Some(&mut trace) })
        .unwrap_err();
    assert!(matches!(err, SimError::Io { .. }));
    // trace file is only created once the run is underway
    assert!(!dir.join("viz.txt").exists());
}
