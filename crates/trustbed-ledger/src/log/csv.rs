//! Append-only CSV report log
//!
//! One line per report: `reporterId,subjectId,serviceTarget,capabilityTarget,note,epoch`.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use trustbed_common::{DataError, ReportRecord, Result, TrustbedError};

/// Destination for generated reports
pub trait ReportSink {
    /// Append a batch of records
    fn append(&mut self, records: &[ReportRecord]) -> Result<()>;

    /// Make appended records durable
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl ReportSink for Vec<ReportRecord> {
    fn append(&mut self, records: &[ReportRecord]) -> Result<()> {
        self.extend_from_slice(records);
        Ok(())
    }
}

/// File-backed report log
pub struct CsvReportLog {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl CsvReportLog {
    /// Create the log, blanking any existing file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| storage_error(&path, e))?;
        debug!(path = %path.display(), "Blanked report log");
        Ok(Self::from_file(path, file))
    }

    /// Open the log for appending, creating it if missing
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| storage_error(&path, e))?;
        Ok(Self::from_file(path, file))
    }

    fn from_file(path: PathBuf, file: File) -> Self {
        Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended through this handle
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl ReportSink for CsvReportLog {
    fn append(&mut self, records: &[ReportRecord]) -> Result<()> {
        for record in records {
            writeln!(self.writer, "{}", record.to_csv_line())
                .map_err(|e| storage_error(&self.path, e))?;
        }
        self.written += records.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| storage_error(&self.path, e))
    }
}

impl Drop for CsvReportLog {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Read every record of a report log
///
/// A missing or unreadable file is a [`DataError::Unavailable`] naming the
/// file; a bad line is a [`DataError::Malformed`] with its line number.
#[instrument]
pub fn read_report_log(path: &Path) -> Result<Vec<ReportRecord>> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|e| DataError::Unavailable {
        path: display.clone(),
        reason: e.to_string(),
    })?;

    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| DataError::Unavailable {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = ReportRecord::parse_csv_line(&line).map_err(|e| DataError::Malformed {
            path: display.clone(),
            line: idx + 1,
            reason: e.to_string(),
        })?;
        records.push(record);
    }

    debug!(path = %path.display(), records = records.len(), "Read report log");
    Ok(records)
}

fn storage_error(path: &Path, err: std::io::Error) -> TrustbedError {
    TrustbedError::Storage(format!("{}: {}", path.display(), err))
}
