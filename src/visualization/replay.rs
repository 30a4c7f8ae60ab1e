//! Read a visualization trace back into per-iteration frames
//!
//! The file holds `iteration mass x y` lines, iteration-major. Consecutive
//! lines with the same iteration index form one frame.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, SimError};
use crate::simulation::states::NVec2;

/// One globally consistent snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct TraceFrame {
    pub iteration: usize,
    pub masses: Vec<f64>,
    pub positions: Vec<NVec2>,
}

/// Display bucket by mass: >= 8, >= 6, >= 4, everything else
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassClass {
    Heavy,
    Large,
    Medium,
    Small,
}

impl MassClass {
    pub fn of(m: f64) -> Self {
        if m >= 8.0 {
            MassClass::Heavy
        } else if m >= 6.0 {
            MassClass::Large
        } else if m >= 4.0 {
            MassClass::Medium
        } else {
            MassClass::Small
        }
    }

    /// Marker radius in screen pixels
    pub fn radius(self) -> f32 {
        match self {
            MassClass::Heavy => 12.0,
            MassClass::Large => 8.0,
            MassClass::Medium => 6.0,
            MassClass::Small => 4.0,
        }
    }
}

pub fn read_trace<R: BufRead>(reader: R, origin: &Path) -> Result<Vec<TraceFrame>> {
    let mut frames: Vec<TraceFrame> = Vec::new();

    for (record, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| SimError::io(origin, e))?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() != 4 {
            return Err(SimError::Parse { record, field: tokens.len(), token: line.clone() });
        }

        let bad = |field: usize| SimError::Parse { record, field, token: tokens[field].to_string() };
        let iteration: usize = tokens[0].parse().map_err(|_| bad(0))?;
        let m: f64 = tokens[1].parse().map_err(|_| bad(1))?;
        let x: f64 = tokens[2].parse().map_err(|_| bad(2))?;
        let y: f64 = tokens[3].parse().map_err(|_| bad(3))?;

        match frames.last_mut() {
            Some(frame) if frame.iteration == iteration => {
                frame.masses.push(m);
                frame.positions.push(NVec2::new(x, y));
            }
            _ => frames.push(TraceFrame {
                iteration,
                masses: vec![m],
                positions: vec![NVec2::new(x, y)],
            }),
        }
    }

    Ok(frames)
}

pub fn load_trace(path: &Path) -> Result<Vec<TraceFrame>> {
    let file = File::open(path).map_err(|e| SimError::io(path, e))?;
    read_trace(BufReader::new(file), path)
}
