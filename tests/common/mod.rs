#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const FARMERS_FIXTURE: &str = "farmers.csv";
pub const TRANSACTIONS_FIXTURE: &str = "transactions.csv";

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

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

    /// Copies both sample datasets into the workspace under their default
    /// command-line names and returns `(farmers, transactions)`.
    pub fn with_default_datasets(&self) -> (PathBuf, PathBuf) {
        let farmers = self.path().join("farmers_200_with_villageid.csv");
        let transactions = self.path().join("transactions_1000_with_villageid.csv");
        fs::copy(fixture_path(FARMERS_FIXTURE), &farmers).expect("copy farmers fixture");
        fs::copy(fixture_path(TRANSACTIONS_FIXTURE), &transactions)
            .expect("copy transactions fixture");
        (farmers, transactions)
    }
}
