//! Obtaining dump bytes.
//!
//! The decoder only needs a complete buffer. These helpers produce one either
//! by running `rrdtool dump` on a database file or by reading a dump that was
//! saved earlier.
//!
//! # Example
//!
//! ```rust,no_run
//! use rrdump::source::RrdTool;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = RrdTool::new().dump("/var/lib/collectd/rrd/host/load/load.rrd")?;
//! let archive = rrdump::decode(&bytes)?;
//! println!("{} data sources", archive.data_sources.len());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::error::{AcquireError, Result};
use crate::schema::Archive;

/// Default name of the rrdtool executable, resolved through `PATH`.
pub const DEFAULT_PROGRAM: &str = "rrdtool";

/// Runs `rrdtool dump` and captures its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RrdTool {
    program: PathBuf,
}

impl RrdTool {
    /// Uses `rrdtool` from `PATH`.
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Uses a specific executable.
    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The executable this runner invokes.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Runs `<program> dump <path>` and returns its standard output.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Spawn`] if the program cannot be started and
    /// [`AcquireError::Failed`] if it exits unsuccessfully.
    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let path = path.as_ref();
        debug!(program = %self.program.display(), path = %path.display(), "running dump");

        let output = Command::new(&self.program)
            .arg("dump")
            .arg(path)
            .output()
            .map_err(|source| AcquireError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                program = %self.program.display(),
                path = %path.display(),
                code = ?output.status.code(),
                "dump failed"
            );
            return Err(AcquireError::Failed {
                program: self.program.clone(),
                path: path.to_path_buf(),
                code: output.status.code(),
                stderr,
            }
            .into());
        }

        debug!(bytes = output.stdout.len(), "dump captured");
        Ok(output.stdout)
    }

    /// Dumps and decodes `path` in one step.
    ///
    /// # Errors
    ///
    /// Returns any error from [`RrdTool::dump`] or [`crate::decode`].
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Archive> {
        let bytes = self.dump(path)?;
        crate::decode::decode(&bytes)
    }
}

impl Default for RrdTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a dump previously saved to a file.
///
/// # Errors
///
/// Returns [`AcquireError::Read`] if the file cannot be read.
pub fn read_dump<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| AcquireError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "read dump file");
    Ok(bytes)
}

impl Archive {
    /// Runs `rrdtool dump` on a database file and decodes the result.
    ///
    /// # Errors
    ///
    /// Returns [`RrdError::Acquire`](crate::RrdError::Acquire) if rrdtool
    /// cannot produce the dump, or any decode error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        RrdTool::new().load(path)
    }
}
