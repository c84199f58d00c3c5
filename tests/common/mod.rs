#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Mixed-type sample: 300 rows with a small integer id range, a wide signed
/// column, floats that survive 32-bit rounding, a repetitive city column and a
/// unique free-text column.
pub fn sample_csv(rows: usize) -> String {
    let cities = ["Berlin", "Lisbon", "Oslo", "Quito"];
    let mut csv = String::from("id,balance,score,city,note,active\n");
    for row in 0..rows {
        let _ = writeln!(
            csv,
            "{},{},{},{},note number {},{}",
            row % 200,
            (row as i64 - 150) * 40_000,
            (row % 16) as f64 * 0.25,
            cities[row % cities.len()],
            row,
            row % 2 == 0
        );
    }
    csv
}
