//! Per-iteration visualization trace
//!
//! After every merged step the lead worker appends one record per
//! particle, `iteration mass x y`, iteration-major and particle-minor.
//! Iterations are numbered from 1.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::error::{Result, SimError};
use crate::simulation::states::NVec2;

/// Receiver of globally consistent position snapshots
pub trait TraceSink {
    /// Called once by the lead worker after the initial distribution
    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn record(&mut self, iteration: usize, masses: &[f64], positions: &[NVec2]) -> Result<()>;

    /// Called once after the last iteration
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceRecord {
    pub iteration: usize,
    pub m: f64,
    pub x: NVec2,
}

impl TraceSink for Vec<TraceRecord> {
    fn record(&mut self, iteration: usize, masses: &[f64], positions: &[NVec2]) -> Result<()> {
        self.extend(
            masses
                .iter()
                .zip(positions)
                .map(|(&m, &x)| TraceRecord { iteration, m, x }),
        );
        Ok(())
    }
}

/// Trace file, created when the run starts rather than when configured, so
/// a failed load leaves no empty trace behind
pub struct TraceFile {
    path: PathBuf,
    out: Option<BufWriter<File>>,
}

impl TraceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), out: None }
    }
}

impl TraceSink for TraceFile {
    fn begin(&mut self) -> Result<()> {
        let file = File::create(&self.path).map_err(|e| SimError::io(&self.path, e))?;
        self.out = Some(BufWriter::new(file));
        Ok(())
    }

    fn record(&mut self, iteration: usize, masses: &[f64], positions: &[NVec2]) -> Result<()> {
        if self.out.is_none() {
            self.begin()?;
        }
        let Some(out) = self.out.as_mut() else {
            return Ok(());
        };
        for (m, x) in masses.iter().zip(positions) {
            writeln!(out, "{} {:.6} {:.6} {:.6}", iteration, m, x.x, x.y)
                .map_err(|e| SimError::io(&self.path, e))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(out) = self.out.as_mut() {
            out.flush().map_err(|e| SimError::io(&self.path, e))?;
            tracing::info!(path = %self.path.display(), "visualization trace written");
        }
        Ok(())
    }
}
