//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`ParametersConfig`] – counts, physical constants and step size
//! - [`FlagsConfig`]      – visualization trace and debug diagnostics
//! - [`FilesConfig`]      – input table, final-state output and trace paths
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! The worker count is not part of a scenario; it comes from the launcher.
//!
//! # YAML format
//!
//! ```yaml
//! parameters:
//!   particle_count: 5
//!   iteration_count: 25
//!   gravity_constant: 1.0
//!   time_quantum: 0.01
//!   softening: 0.0          # optional, eps^2 added to r^2
//!
//! flags:
//!   visualization_enabled: true
//!   debug_enabled: false
//!
//! files:                    # optional, relative to the YAML file
//!   input_file: input.txt
//!   output_file: sim_output_5_25.txt   # optional
//!   viz_file: viz_data_5_25.txt        # optional
//! ```

use serde::Deserialize;

use crate::error::{Result, SimError};

/// Global numerical and physical parameters for a scenario
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub particle_count: usize,  // number of records taken from the input table
    pub iteration_count: usize, // fixed number of time steps
    pub gravity_constant: f64,  // G
    pub time_quantum: f64,      // time step dt
    #[serde(default)]
    pub softening: f64,         // eps^2, 0.0 keeps the unsoftened singularity
}

/// Feature switches
#[derive(Deserialize, Debug, Clone, Default)]
pub struct FlagsConfig {
    #[serde(default)]
    pub visualization_enabled: bool, // append every merged snapshot to the trace file
    #[serde(default)]
    pub debug_enabled: bool,         // per-particle diagnostics at DEBUG level
}

/// Input/output locations
#[derive(Deserialize, Debug, Clone)]
pub struct FilesConfig {
    #[serde(default = "default_input_file")]
    pub input_file: String,
    pub output_file: Option<String>, // default sim_output_<N>_<ITER>.txt
    pub viz_file: Option<String>,    // default viz_data_<N>_<ITER>.txt
}

fn default_input_file() -> String {
    "input.txt".to_string()
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            input_file: default_input_file(),
            output_file: None,
            viz_file: None,
        }
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub parameters: ParametersConfig,
    #[serde(default)]
    pub flags: FlagsConfig,
    #[serde(default)]
    pub files: FilesConfig,
}

impl ScenarioConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.parameters;
        if !p.time_quantum.is_finite() {
            return Err(SimError::InvalidConfig(format!("time_quantum must be finite, got {}", p.time_quantum)));
        }
        if !p.gravity_constant.is_finite() {
            return Err(SimError::InvalidConfig(format!("gravity_constant must be finite, got {}", p.gravity_constant)));
        }
        if !(p.softening.is_finite() && p.softening >= 0.0) {
            return Err(SimError::InvalidConfig(format!("softening must be finite and >= 0, got {}", p.softening)));
        }
        Ok(())
    }
}
