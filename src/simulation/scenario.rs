//! Build a runnable scenario from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle:
//! - numerical parameters (`Parameters`)
//! - resolved input, output and trace paths (`ScenarioFiles`)

use std::path::{Path, PathBuf};

use crate::configuration::config::ScenarioConfig;
use crate::error::Result;
use crate::simulation::params::Parameters;

#[derive(Debug, Clone)]
pub struct ScenarioFiles {
    pub input: PathBuf,
    pub output: PathBuf,
    pub viz: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub parameters: Parameters,
    pub files: ScenarioFiles,
}

impl Scenario {
    /// Validate `cfg` and resolve relative paths against `base_dir`
    pub fn build_scenario(cfg: ScenarioConfig, base_dir: &Path) -> Result<Self> {
        cfg.validate()?;

        // Parameters (runtime) from ParametersConfig + FlagsConfig
        let p_cfg = cfg.parameters;
        let parameters = Parameters {
            n: p_cfg.particle_count,
            iterations: p_cfg.iteration_count,
            G: p_cfg.gravity_constant,
            h0: p_cfg.time_quantum,
            eps2: p_cfg.softening,
            visualization: cfg.flags.visualization_enabled,
            debug: cfg.flags.debug_enabled,
        };

        // Output names follow the <N>_<ITER> convention unless given
        let tag = format!("{}_{}", parameters.n, parameters.iterations);
        let f_cfg = cfg.files;
        let files = ScenarioFiles {
            input: base_dir.join(f_cfg.input_file),
            output: base_dir.join(f_cfg.output_file.unwrap_or_else(|| format!("sim_output_{tag}.txt"))),
            viz: base_dir.join(f_cfg.viz_file.unwrap_or_else(|| format!("viz_data_{tag}.txt"))),
        };

        Ok(Self { parameters, files })
    }
}
