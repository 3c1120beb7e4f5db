//! CSV reading and writing, plus file-backed panel source and result sink.

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use factorfolio_traits::{PanelSource, ResultSink, SourceError};
use polars::prelude::*;
use tracing::{debug, info};

use crate::UtilsError;

/// Read a CSV file with a header row.
///
/// # Errors
/// Returns `UtilsError::Io` if the file does not exist and
/// `UtilsError::Polars` if it cannot be parsed.
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame, UtilsError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(UtilsError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!(path = %path.display(), rows = frame.height(), cols = frame.width(), "csv read");
    Ok(frame)
}

/// Write a frame to CSV with a header row, replacing any existing file.
///
/// # Errors
/// Returns `UtilsError::Io` if the file cannot be created and
/// `UtilsError::Polars` if serialisation fails.
pub fn write_csv(path: impl AsRef<Path>, frame: &mut DataFrame) -> Result<(), UtilsError> {
    let path = path.as_ref();
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(frame)?;
    debug!(path = %path.display(), rows = frame.height(), "csv written");
    Ok(())
}

/// Factor panel stored as a single CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvPanelSource {
    path: PathBuf,
}

impl CsvPanelSource {
    /// Source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File this source reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PanelSource for CsvPanelSource {
    fn load(&self) -> Result<DataFrame, SourceError> {
        if !self.path.exists() {
            return Err(SourceError::NotFound(self.path.display().to_string()));
        }
        Ok(read_csv(&self.path)?)
    }
}

/// Writes each named table to `<dir>/<name>.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvResultSink {
    dir: PathBuf,
}

impl CsvResultSink {
    /// Sink writing into `dir`, created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ResultSink for CsvResultSink {
    fn write(&mut self, name: &str, frame: &mut DataFrame) -> Result<(), SourceError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{name}.csv"));
        write_csv(&path, frame)?;
        info!(table = name, path = %path.display(), rows = frame.height(), "result written");
        Ok(())
    }
}
