//! CSV file sink
//!
//! Rows are appended to a single file. When the file already has content
//! (from an earlier run) its header row fixes the columns; otherwise the
//! first item with any fields does, and the header row is written at most
//! once per processor instance.

use crate::pipeline::{CrawledItem, ItemProcessor, SinkFailure};
use crate::SinkError;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Appends items as CSV rows
pub struct CsvItemProcessor {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
    columns: Vec<String>,
    header_written: bool,
}

impl CsvItemProcessor {
    /// Creates a processor writing to `path`
    ///
    /// The file is opened lazily on the first item.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: None,
            columns: Vec::new(),
            header_written: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header_written(&self) -> bool {
        self.header_written
    }

    fn write_row(&mut self, item: &CrawledItem) -> Result<(), SinkError> {
        if self.writer.is_none() {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            if file.metadata()?.len() > 0 {
                self.columns = read_header(&self.path)?;
                self.header_written = true;
            }

            self.writer = Some(
                csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(file),
            );
        }

        if self.columns.is_empty() {
            if item.is_empty() {
                tracing::debug!("Skipping item without fields for {}", self.path.display());
                return Ok(());
            }
            self.columns = item.keys().map(str::to_string).collect();
        }

        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        if !self.header_written {
            writer.write_record(&self.columns)?;
            self.header_written = true;
        }

        let extra = item
            .keys()
            .filter(|k| !self.columns.iter().any(|c| c == k))
            .count();
        if extra > 0 {
            tracing::debug!(
                "Dropping {} field(s) not in the CSV header of {}",
                extra,
                self.path.display()
            );
        }

        let row: Vec<String> = self.columns.iter().map(|c| item.field_text(c)).collect();
        writer.write_record(&row)?;
        writer.flush()?;

        Ok(())
    }
}

/// Columns of the header row an earlier run left in `path`
fn read_header(path: &Path) -> Result<Vec<String>, SinkError> {
    let mut reader = csv::Reader::from_path(path)?;
    Ok(reader.headers()?.iter().map(str::to_string).collect())
}

impl ItemProcessor for CsvItemProcessor {
    fn name(&self) -> &str {
        "csv"
    }

    fn process_item(&mut self, item: CrawledItem) -> Result<CrawledItem, SinkFailure> {
        match self.write_row(&item) {
            Ok(()) => Ok(item),
            Err(e) => Err(SinkFailure::new(item, e)),
        }
    }
}
