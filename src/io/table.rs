//! Whitespace-separated particle tables
//!
//! One record per particle: `mass pos_x pos_y vel_x vel_y`. Records are
//! read as a flat token stream, so line breaks inside or between records
//! do not matter. Output is one record per line with six decimals.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SimError};
use crate::io::{ParticleSource, StateSink};
use crate::simulation::states::{NVec2, Particle, ParticleTable};

const FIELDS: usize = 5;

/// Read the first `n` records from `reader`. `origin` only labels errors.
pub fn read_table<R: BufRead>(reader: R, n: usize, origin: &Path) -> Result<ParticleTable> {
    let mut particles = Vec::with_capacity(n);
    if n == 0 {
        return Ok(ParticleTable::default());
    }

    let mut fields = [0.0; FIELDS];
    let mut field = 0;

    'lines: for line in reader.lines() {
        let line = line.map_err(|e| SimError::io(origin, e))?;
        for token in line.split_whitespace() {
            fields[field] = token.parse().map_err(|_| SimError::Parse {
                record: particles.len(),
                field,
                token: token.to_string(),
            })?;
            field += 1;

            if field == FIELDS {
                particles.push(Particle {
                    m: fields[0],
                    x: NVec2::new(fields[1], fields[2]),
                    v: NVec2::new(fields[3], fields[4]),
                });
                field = 0;
                if particles.len() == n {
                    break 'lines;
                }
            }
        }
    }

    if particles.len() < n {
        return Err(SimError::MissingRecords { expected: n, found: particles.len() });
    }
    Ok(ParticleTable::from_particles(&particles))
}

pub fn write_table<W: Write>(mut out: W, table: &ParticleTable) -> std::io::Result<()> {
    for p in table.iter() {
        writeln!(out, "{:.6} {:.6} {:.6} {:.6} {:.6}", p.m, p.x.x, p.x.y, p.v.x, p.v.y)?;
    }
    out.flush()
}

/// Particle table on disk
pub struct TableFile {
    pub path: PathBuf,
}

impl ParticleSource for TableFile {
    fn load(&mut self, n: usize) -> Result<ParticleTable> {
        let file = File::open(&self.path).map_err(|e| SimError::io(&self.path, e))?;
        let table = read_table(BufReader::new(file), n, &self.path)?;
        tracing::debug!(path = %self.path.display(), particles = table.len(), "loaded particle table");
        Ok(table)
    }
}

/// Final-state output file, created on persist
pub struct OutputFile {
    pub path: PathBuf,
}

impl StateSink for OutputFile {
    fn persist(&mut self, table: &ParticleTable) -> Result<()> {
        let file = File::create(&self.path).map_err(|e| SimError::io(&self.path, e))?;
        write_table(BufWriter::new(file), table).map_err(|e| SimError::io(&self.path, e))?;
        tracing::info!(path = %self.path.display(), "final state written");
        Ok(())
    }
}
