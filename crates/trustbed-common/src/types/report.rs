//! Report - one node's rating of another for a specific demand

use serde::{Deserialize, Serialize};

use super::note::Note;
use crate::error::DataError;

/// Number of fields in a report log line
pub const REPORT_FIELDS: usize = 6;

/// A rating for one demand at one epoch
///
/// Reporter and subject are implicit in where the report is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Service threshold demanded
    pub service_target: u32,
    /// Capability threshold demanded
    pub capability_target: u32,
    pub note: Note,
    /// Epoch the report was made in (1-based)
    pub epoch: u32,
}

impl Report {
    pub fn new(service_target: u32, capability_target: u32, note: Note, epoch: u32) -> Self {
        Self {
            service_target,
            capability_target,
            note,
            epoch,
        }
    }
}

/// A report together with its reporter and subject, as written to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub reporter: usize,
    pub subject: usize,
    pub report: Report,
}

impl ReportRecord {
    pub fn new(reporter: usize, subject: usize, report: Report) -> Self {
        Self {
            reporter,
            subject,
            report,
        }
    }

    /// `reporterId,subjectId,serviceTarget,capabilityTarget,note,epoch`
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.reporter,
            self.subject,
            self.report.service_target,
            self.report.capability_target,
            self.report.note,
            self.report.epoch
        )
    }

    /// Parse one log line (without its newline)
    pub fn parse_csv_line(line: &str) -> Result<Self, DataError> {
        let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
        if fields.len() != REPORT_FIELDS {
            return Err(DataError::InvalidRecord(format!(
                "expected {} fields, got {}",
                REPORT_FIELDS,
                fields.len()
            )));
        }

        let reporter = parse_field::<usize>(fields[0], "reporterId")?;
        let subject = parse_field::<usize>(fields[1], "subjectId")?;
        let service_target = parse_field::<u32>(fields[2], "serviceTarget")?;
        let capability_target = parse_field::<u32>(fields[3], "capabilityTarget")?;
        let note = Note::try_from(parse_field::<i64>(fields[4], "note")?)?;
        let epoch = parse_field::<u32>(fields[5], "epoch")?;

        if reporter == subject {
            return Err(DataError::SelfReport(reporter));
        }

        Ok(Self::new(
            reporter,
            subject,
            Report::new(service_target, capability_target, note, epoch),
        ))
    }
}

fn parse_field<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, DataError> {
    raw.parse::<T>()
        .map_err(|_| DataError::InvalidRecord(format!("{} is not a valid number: {:?}", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_create() {
        for note in Note::ALL {
            let report = Report::new(50, 25, note, 3);
            assert_eq!(report.service_target, 50);
            assert_eq!(report.capability_target, 25);
            assert_eq!(report.note, note);
            assert_eq!(report.epoch, 3);
        }
    }

    #[test]
    fn test_csv_line_format() {
        let record = ReportRecord::new(2, 9, Report::new(40, 60, Note::Negative, 5));
        assert_eq!(record.to_csv_line(), "2,9,40,60,-1,5");
        assert_eq!(ReportRecord::parse_csv_line("2,9,40,60,-1,5").unwrap(), record);
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        assert!(matches!(
            ReportRecord::parse_csv_line("1,2,3"),
            Err(DataError::InvalidRecord(_))
        ));
        assert!(matches!(
            ReportRecord::parse_csv_line("1,2,3,4,7,1"),
            Err(DataError::InvalidNote(7))
        ));
        assert!(matches!(
            ReportRecord::parse_csv_line("1,x,3,4,0,1"),
            Err(DataError::InvalidRecord(_))
        ));
        assert_eq!(
            ReportRecord::parse_csv_line("4,4,3,4,0,1"),
            Err(DataError::SelfReport(4))
        );
    }
}
