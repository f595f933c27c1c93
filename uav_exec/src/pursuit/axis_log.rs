//! # Per-axis regulator log files
//!
//! Each regulated axis appends one record per regulated tick to its own text
//! file in the session directory. The schema is a header line
//!
//! ```text
//! P: I: D: Error: Output:
//! ```
//!
//! followed by one `0,0,0,<deviation>,<output>` line per tick. The first
//! three columns were meant to carry the gain values but have always been
//! written as zeros, that behavior is kept as-is so downstream tooling keeps
//! parsing.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Header written at the top of every axis log file.
const HEADER: &str = "P: I: D: Error: Output:";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An open per-axis log file.
#[derive(Debug)]
pub struct AxisLog {
    file: File,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AxisLog {
    /// Create (or append to) the log file `<dir>/<name>.txt` and write the
    /// header line.
    pub fn create(dir: &Path, name: &str) -> std::io::Result<Self> {
        let mut path = dir.to_path_buf();
        path.push(format!("{}.txt", name));

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", HEADER)?;

        Ok(Self { file })
    }

    /// Append one regulated-tick record.
    pub fn record(&mut self, deviation: f64, output: f64) -> std::io::Result<()> {
        writeln!(self.file, "0,0,0,{},{}", deviation, output)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_header_and_record_format() {
        let dir = std::env::temp_dir();
        let name = format!("axis_log_test_{}", std::process::id());

        {
            let mut log = AxisLog::create(&dir, &name).unwrap();
            log.record(0.5, -0.1).unwrap();
        }

        let mut path = dir.clone();
        path.push(format!("{}.txt", name));

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        std::fs::remove_file(&path).unwrap();

        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("P: I: D: Error: Output:"));
        assert_eq!(lines.next(), Some("0,0,0,0.5,-0.1"));
    }
}
