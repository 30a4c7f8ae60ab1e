pub mod simulation;
pub mod coordinator;
pub mod configuration;
pub mod visualization;
pub mod benchmark;
pub mod error;
pub mod io;

pub use simulation::states::{Particle, ParticleTable, NVec2};
pub use simulation::params::Parameters;
pub use simulation::partition::{Partition, plan, plan_all, block_size};
pub use simulation::forces::{Acceleration, AccelSet, NewtonianGravity};
pub use simulation::integrator::{symplectic_euler, wrap_unit};
pub use simulation::engine::{Engine, LeadState, RunReport};
pub use simulation::scenario::{Scenario, ScenarioFiles};

pub use coordinator::collective::{Collective, Coordinator, ROOT};

pub use configuration::config::{ScenarioConfig, ParametersConfig, FlagsConfig, FilesConfig};

pub use io::{ParticleSource, StateSink, Discard};
pub use io::table::{read_table, write_table, TableFile, OutputFile};
pub use visualization::trace::{TraceSink, TraceRecord, TraceFile};
pub use visualization::replay::{read_trace, load_trace, TraceFrame, MassClass};
pub use visualization::replay_2d::run_replay;

pub use benchmark::benchmark::bench_workers;

pub use error::{SimError, Result};
