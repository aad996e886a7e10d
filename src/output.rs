//! Stage file persistence.
//!
//! Every stage writes a comma-separated file with a header row. Rows go to a
//! `.partial` sibling that is renamed into place only when the stage
//! finishes, so a failed run never leaves a half-written artifact under the
//! declared name.

use csv::{Reader, Writer, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::records::REQUIRED_COLUMNS;

/// A write-once CSV sink with atomic publish on [`CsvSink::finish`].
pub struct CsvSink {
    path: PathBuf,
    partial_path: PathBuf,
    writer: Option<Writer<File>>,
    rows: usize,
}

impl CsvSink {
    /// Opens `<path>.partial` and writes the header row.
    pub fn create(path: impl AsRef<Path>, headers: &[&str]) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let partial_path = partial_path_for(&path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }

        let file = File::create(&partial_path).map_err(|e| PipelineError::io(&partial_path, e))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record(headers)
            .map_err(|e| PipelineError::csv(&partial_path, e))?;

        debug!(path = %partial_path.display(), "Opened CSV sink");

        Ok(Self {
            path,
            partial_path,
            writer: Some(writer),
            rows: 0,
        })
    }

    /// Appends one data row.
    pub fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let Some(writer) = self.writer.as_mut() else {
            return Err(PipelineError::Config("CSV sink already finished".into()));
        };
        writer
            .write_record(row)
            .map_err(|e| PipelineError::csv(&self.partial_path, e))?;
        self.rows += 1;
        Ok(())
    }

    /// Flushes and renames the partial file onto the final path.
    pub fn finish(mut self) -> Result<usize> {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                drop(writer);
                self.discard_partial();
                return Err(PipelineError::io(&self.partial_path, e));
            }
        }
        if let Err(e) = std::fs::rename(&self.partial_path, &self.path) {
            self.discard_partial();
            return Err(PipelineError::io(&self.path, e));
        }

        info!(path = %self.path.display(), rows = self.rows, "CSV written");
        Ok(self.rows)
    }

    fn discard_partial(&self) {
        if let Err(e) = std::fs::remove_file(&self.partial_path) {
            warn!(path = %self.partial_path.display(), error = %e, "Failed to remove partial output");
        } else {
            debug!(path = %self.partial_path.display(), "Removed partial output");
        }
    }
}

impl Drop for CsvSink {
    fn drop(&mut self) {
        // Still holding the writer means finish() never ran.
        if self.writer.take().is_some() {
            self.discard_partial();
        }
    }
}

fn partial_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Opens a stage CSV and checks that it carries every required column.
pub fn open_stage_file(path: impl AsRef<Path>) -> Result<Reader<File>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| PipelineError::csv(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::csv(path, e))?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();

    if !missing.is_empty() {
        return Err(PipelineError::Schema(format!(
            "{} is missing column(s): {}",
            path.display(),
            missing.join(", ")
        )));
    }

    Ok(reader)
}
