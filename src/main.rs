use dnbsim::{Engine, LeadState, OutputFile, Scenario, ScenarioConfig, TableFile, TraceFile, TraceSink};
use dnbsim::{bench_workers, load_trace, run_replay, ParticleSource};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
struct Args {
    /// Scenario YAML
    #[arg(short, long = "file", default_value = "scenarios/default.yaml")]
    file_name: PathBuf,

    /// Number of lockstep workers (defaults to the number of CPUs)
    #[arg(short = 'p', long)]
    workers: Option<usize>,

    /// Time the scenario for 1, 2, 4, ... workers instead of running it once
    #[arg(long)]
    bench: bool,

    /// Replay a recorded visualization trace instead of simulating
    #[arg(long, value_name = "TRACE")]
    view: Option<PathBuf>,
}

// load here to keep main clean
fn load_scenario_from_yaml(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let scenario_cfg = ScenarioConfig::from_yaml(&text)?;
    let base_dir = path.parent().unwrap_or(Path::new("."));
    Ok(Scenario::build_scenario(scenario_cfg, base_dir)?)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(trace_path) = &args.view {
        tracing_subscriber::fmt().with_target(false).init();
        let frames = load_trace(trace_path)?;
        run_replay(frames);
        return Ok(());
    }

    let scenario = load_scenario_from_yaml(&args.file_name)?;

    let level = if scenario.parameters.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();

    let workers = args.workers.unwrap_or_else(num_cpus::get);
    let mut source = TableFile { path: scenario.files.input.clone() };

    if args.bench {
        let table = source.load(scenario.parameters.n)?;
        bench_workers(&table, &scenario.parameters, workers)?;
        return Ok(());
    }

    let engine = Engine::new(workers, scenario.parameters.clone())?;
    let mut sink = OutputFile { path: scenario.files.output.clone() };
    let mut trace = TraceFile::new(&scenario.files.viz);

    engine.run(LeadState {
        source: &mut source,
        sink: &mut sink,
        trace: if scenario.parameters.visualization { Some(&mut trace as &mut (dyn TraceSink + Send)) } else { None },
    })?;

    Ok(())
}
