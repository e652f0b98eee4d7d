//! Hyperparameter log
//!
//! One line per reporter champion: `reporterId,paramA,paramB,accuracy`, where
//! `paramA` is the regularization strength and `paramB` the kernel width.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use trustbed_common::{DataError, Result, TrustbedError};

use crate::genome::Genome;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterRecord {
    pub reporter: usize,
    pub regularization: f64,
    pub kernel_width: f64,
    /// Held-out accuracy in `[0, 1]`
    pub accuracy: f64,
}

impl HyperparameterRecord {
    pub fn new(genome: &Genome, accuracy: f64) -> Self {
        Self {
            reporter: genome.reporter(),
            regularization: genome.regularization(),
            kernel_width: genome.kernel_width(),
            accuracy,
        }
    }

    pub fn genome(&self) -> Result<Genome> {
        Genome::new(self.reporter, self.regularization, self.kernel_width)
    }

    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.reporter, self.regularization, self.kernel_width, self.accuracy
        )
    }

    pub fn parse_csv_line(line: &str) -> std::result::Result<Self, DataError> {
        let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
        if fields.len() != 4 {
            return Err(DataError::InvalidRecord(format!(
                "expected 4 fields, got {}",
                fields.len()
            )));
        }
        let number = |idx: usize, name: &str| {
            fields[idx].parse::<f64>().map_err(|_| {
                DataError::InvalidRecord(format!("{} is not a number: {:?}", name, fields[idx]))
            })
        };
        let reporter = fields[0].parse::<usize>().map_err(|_| {
            DataError::InvalidRecord(format!("reporterId is not an id: {:?}", fields[0]))
        })?;

        Ok(Self {
            reporter,
            regularization: number(1, "paramA")?,
            kernel_width: number(2, "paramB")?,
            accuracy: number(3, "accuracy")?,
        })
    }
}

/// Write the log, replacing any previous contents
#[instrument(skip(records), fields(records = records.len()))]
pub fn write_hyperparameter_log(path: &Path, records: &[HyperparameterRecord]) -> Result<()> {
    let storage = |e: std::io::Error| TrustbedError::Storage(format!("{}: {}", path.display(), e));
    let mut writer = BufWriter::new(File::create(path).map_err(storage)?);
    for record in records {
        writeln!(writer, "{}", record.to_csv_line()).map_err(storage)?;
    }
    writer.flush().map_err(storage)
}

#[instrument]
pub fn read_hyperparameter_log(path: &Path) -> Result<Vec<HyperparameterRecord>> {
    let display = path.display().to_string();
    let unavailable = |e: std::io::Error| DataError::Unavailable {
        path: display.clone(),
        reason: e.to_string(),
    };
    let file = File::open(path).map_err(unavailable)?;

    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(unavailable)?;
        if line.trim().is_empty() {
            continue;
        }
        let record =
            HyperparameterRecord::parse_csv_line(&line).map_err(|e| DataError::Malformed {
                path: display.clone(),
                line: idx + 1,
                reason: e.to_string(),
            })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hyperparameters.csv");
        let records = vec![
            HyperparameterRecord::new(&Genome::new(0, 1.5, 0.25).unwrap(), 0.75),
            HyperparameterRecord::new(&Genome::new(3, 4.0, 2.0).unwrap(), 1.0),
        ];

        write_hyperparameter_log(&path, &records).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "0,1.5,0.25,0.75\n3,4,2,1\n");

        let read = read_hyperparameter_log(&path).unwrap();
        assert_eq!(read, records);
        assert_eq!(read[1].genome().unwrap().kernel_width(), 2.0);
    }

    #[test]
    fn test_bad_line_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hyperparameters.csv");
        std::fs::write(&path, "0,1,1,0.5\n1,abc,1,0.5\n").unwrap();
        assert!(matches!(
            read_hyperparameter_log(&path),
            Err(TrustbedError::Data(DataError::Malformed { line: 2, .. }))
        ));
    }

    #[test]
    fn test_missing_log_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_hyperparameter_log(&dir.path().join("none.csv")),
            Err(TrustbedError::Data(DataError::Unavailable { .. }))
        ));
    }
}
