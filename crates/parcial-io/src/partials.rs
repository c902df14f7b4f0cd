//! JSON storage for labeled Partial collections.
//!
//! A file holds a format version and a list of Partials, each with its
//! label and its Breakpoints in time order:
//!
//! ```json
//! {
//!   "version": 1,
//!   "partials": [
//!     {
//!       "label": 1,
//!       "breakpoints": [
//!         { "time": 0.0, "frequency": 220.0, "amplitude": 0.1, "bandwidth": 0.0, "phase": 0.0 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Loading checks the data model invariants that the in-memory types
//! enforce silently (sorted unique times, bandwidth in [0, 1], non-negative
//! amplitude) and reports violations instead of repairing them.

use crate::{Error, Result};
use parcial_core::{Breakpoint, Label, Partial};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Version written into new files.
pub const FORMAT_VERSION: u32 = 1;

/// One Breakpoint and its time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakpointRecord {
    /// Time in seconds.
    pub time: f64,
    /// Frequency in Hz.
    pub frequency: f64,
    /// Linear amplitude.
    pub amplitude: f64,
    /// Noise fraction of the total energy.
    #[serde(default)]
    pub bandwidth: f64,
    /// Phase in radians.
    #[serde(default)]
    pub phase: f64,
}

/// One labeled Partial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialRecord {
    /// Channel label; 0 is unlabeled.
    #[serde(default)]
    pub label: Label,
    /// Breakpoints in time order.
    pub breakpoints: Vec<BreakpointRecord>,
}

/// Top-level file contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialFile {
    /// File format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Stored Partials.
    pub partials: Vec<PartialRecord>,
}

fn default_version() -> u32 {
    FORMAT_VERSION
}

impl From<&Partial> for PartialRecord {
    fn from(p: &Partial) -> Self {
        Self {
            label: p.label(),
            breakpoints: p
                .iter()
                .map(|(time, bp)| BreakpointRecord {
                    time,
                    frequency: bp.frequency(),
                    amplitude: bp.amplitude(),
                    bandwidth: bp.bandwidth(),
                    phase: bp.phase(),
                })
                .collect(),
        }
    }
}

impl TryFrom<&PartialRecord> for Partial {
    type Error = Error;

    fn try_from(record: &PartialRecord) -> Result<Self> {
        let mut p = Partial::with_label(record.label);
        let mut previous = f64::NEG_INFINITY;
        for (i, bp) in record.breakpoints.iter().enumerate() {
            let fields = [bp.time, bp.frequency, bp.amplitude, bp.bandwidth, bp.phase];
            if fields.iter().any(|v| !v.is_finite()) {
                return Err(invalid(record.label, i, "non-finite field"));
            }
            if bp.time <= previous {
                return Err(invalid(record.label, i, "times must strictly increase"));
            }
            if bp.amplitude < 0.0 {
                return Err(invalid(record.label, i, "negative amplitude"));
            }
            if !(0.0..=1.0).contains(&bp.bandwidth) {
                return Err(invalid(record.label, i, "bandwidth outside [0, 1]"));
            }
            previous = bp.time;
            p.insert(
                bp.time,
                Breakpoint::new(bp.frequency, bp.amplitude, bp.bandwidth, bp.phase),
            );
        }
        Ok(p)
    }
}

fn invalid(label: Label, index: usize, reason: &str) -> Error {
    Error::InvalidPartial(format!("label {label}, breakpoint {index}: {reason}"))
}

impl PartialFile {
    /// Wrap a collection for storage.
    pub fn from_partials(partials: &[Partial]) -> Self {
        Self {
            version: FORMAT_VERSION,
            partials: partials.iter().map(PartialRecord::from).collect(),
        }
    }

    /// Convert back into Partials, checking every record.
    pub fn to_partials(&self) -> Result<Vec<Partial>> {
        if self.version > FORMAT_VERSION {
            return Err(Error::InvalidPartial(format!(
                "file format version {} is newer than supported version {FORMAT_VERSION}",
                self.version
            )));
        }
        self.partials.iter().map(Partial::try_from).collect()
    }
}

/// Decode a Partial collection from a JSON string.
pub fn partials_from_json(json: &str) -> Result<Vec<Partial>> {
    let file: PartialFile = serde_json::from_str(json)?;
    file.to_partials()
}

/// Encode a Partial collection as pretty-printed JSON.
pub fn partials_to_json(partials: &[Partial]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&PartialFile::from_partials(partials))?)
}

/// Read a Partial collection from a JSON file.
pub fn read_partials<P: AsRef<Path>>(path: P) -> Result<Vec<Partial>> {
    let path = path.as_ref();
    let partials = partials_from_json(&fs::read_to_string(path)?)?;
    debug!("read {} Partials from {}", partials.len(), path.display());
    Ok(partials)
}

/// Write a Partial collection to a JSON file.
pub fn write_partials<P: AsRef<Path>>(path: P, partials: &[Partial]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, partials_to_json(partials)?)?;
    debug!("wrote {} Partials to {}", partials.len(), path.display());
    Ok(())
}
