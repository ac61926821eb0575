//! CSV reading and the full import pipeline: bytes -> columns -> segments.

use serde::Serialize;

use crate::columns::{infer_columns_with, ColumnMapping};
use crate::error::{TimelineError, TimelineResult};
use crate::timecode::TimecodeParser;
use crate::timeline::{build_timeline_with, RowError, Segment};

/// Rows handed to the column inferencer when it has to look at values.
pub const DEFAULT_SAMPLE_ROWS: usize = 5;

/// Header plus data rows, all cells as read (no trimming).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Immutable per-import settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportOptions {
    pub parser: TimecodeParser,
    pub sample_rows: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            parser: TimecodeParser::default(),
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }
}

/// Outcome of importing one CSV: the valid segments and the rows that were left out.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineImport {
    pub columns: Vec<String>,
    pub mapping: ColumnMapping,
    pub segments: Vec<Segment>,
    pub rejected: Vec<RowError>,
}

/// Reads UTF-8 CSV bytes. The first record is the header; records may have differing lengths.
pub fn read_csv(bytes: &[u8]) -> TimelineResult<CsvTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if header.iter().all(|h| h.trim().is_empty()) {
        return Err(TimelineError::MissingHeader);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(CsvTable { header, rows })
}

/// Runs the whole pipeline. Column problems abort; row problems are collected.
pub fn import_csv(bytes: &[u8], options: &ImportOptions) -> TimelineResult<TimelineImport> {
    let table = read_csv(bytes)?;
    let sample_len = table.rows.len().min(options.sample_rows);
    let mapping = infer_columns_with(&options.parser, &table.header, &table.rows[..sample_len])?;
    let (segments, rejected) = build_timeline_with(&options.parser, &table.rows, &mapping);

    if !rejected.is_empty() {
        tracing::warn!(
            rejected = rejected.len(),
            accepted = segments.len(),
            "timeline import left out rows"
        );
    }

    Ok(TimelineImport {
        columns: table.header,
        mapping,
        segments,
        rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::ColumnRole;
    use crate::timeline::RowErrorKind;

    const SCRIPT: &str = "Speaker,Start_Time,End_Time,Transcription\n\
Alice,00:00:01:00,00:00:02:15,\"Hi, Bob.\"\n\
Bob,2.5,00:00:04.000,Hello Alice\n\
Alice,00:00:09,00:00:05,Oops\n";

    #[test]
    fn reads_header_and_rows() {
        let table = read_csv(SCRIPT.as_bytes()).unwrap();
        assert_eq!(
            table.header,
            vec!["Speaker", "Start_Time", "End_Time", "Transcription"]
        );
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0][3], "Hi, Bob.");
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(read_csv(b""), Err(TimelineError::MissingHeader)));
    }

    #[test]
    fn invalid_utf8_is_a_csv_error() {
        let bytes = b"speaker,start,end,text\n\xff\xfe,1.0,2.0,x\n";
        assert!(matches!(read_csv(bytes), Err(TimelineError::Csv(_))));
    }

    #[test]
    fn ragged_rows_are_accepted() {
        let table = read_csv(b"speaker,start,end,text\nA,1.0\n").unwrap();
        assert_eq!(table.rows[0].len(), 2);
    }

    #[test]
    fn import_reports_partial_success() {
        let import = import_csv(SCRIPT.as_bytes(), &ImportOptions::default()).unwrap();
        assert_eq!(import.mapping.index(ColumnRole::Text), Some(3));
        assert_eq!(import.segments.len(), 2);
        assert_eq!(import.segments[0].start_seconds, 1.0);
        assert_eq!(import.segments[0].end_seconds, 2.5);
        assert_eq!(import.segments[1].text, "Hello Alice");
        assert_eq!(import.rejected.len(), 1);
        assert_eq!(import.rejected[0].row_index, 2);
        assert_eq!(import.rejected[0].kind, RowErrorKind::RowRejected);
    }

    #[test]
    fn column_errors_abort_the_import() {
        let csv = "who,when,until,notes\nA,1.0,2.0,x\n";
        assert!(matches!(
            import_csv(csv.as_bytes(), &ImportOptions::default()),
            Err(TimelineError::MissingColumn(ColumnRole::Speaker))
        ));
    }

    #[test]
    fn only_sample_rows_drive_positional_inference() {
        let csv = "speaker,a,b,dialogue\nA,1.0,2.0,x\nB,2.0,3.0,y\nC,later,4.0,z\n";
        let options = ImportOptions {
            sample_rows: 2,
            ..ImportOptions::default()
        };
        let import = import_csv(csv.as_bytes(), &options).unwrap();
        assert_eq!(
            (import.mapping.start_time, import.mapping.end_time),
            (1, 2)
        );
        assert_eq!(import.segments.len(), 2);
        assert_eq!(import.rejected[0].kind, RowErrorKind::InvalidTimecode);
    }
}
