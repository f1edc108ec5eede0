use std::path::{Path, PathBuf};

use super::Storage;
use crate::error::Result;
use crate::population::Population;

/// Writes each round to `<dir>/mobo_iteration_<round>.csv`.
///
/// The directory is created on first export if it does not exist.
#[derive(Clone, Debug)]
pub struct CsvStorage {
    dir: PathBuf,
}

impl CsvStorage {
    /// Exports into `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the artifact path for `round`.
    #[must_use]
    pub fn path_for(&self, round: usize) -> PathBuf {
        self.dir.join(format!("mobo_iteration_{round}.csv"))
    }
}

impl Default for CsvStorage {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Storage for CsvStorage {
    fn export(&self, round: usize, population: &Population) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(round);
        population.export_csv(&path)?;
        trace_debug!(round, path = %path.display(), rows = population.len(), "round exported");
        Ok(())
    }
}
