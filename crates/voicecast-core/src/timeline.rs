//! Timeline Assembler: turns CSV rows into speaker segments, carries voice assignments,
//! and writes the augmented CSV back out.

use serde::{Deserialize, Serialize};

use crate::columns::{normalize_column_name, ColumnMapping, ColumnRole};
use crate::error::{TimelineError, TimelineResult};
use crate::timecode::TimecodeParser;

/// One speaker-attributed span of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Zero-based data row (header excluded) this segment was read from.
    pub row_index: usize,
    pub speaker: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
    #[serde(default)]
    pub voice_id: Option<String>,
    /// Original cells of the row, in source column order. Export writes these back verbatim.
    pub source: Vec<String>,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorKind {
    /// A start or end cell is not a valid timecode.
    InvalidTimecode,
    /// Timecodes parsed but the row failed validation (end before start).
    RowRejected,
}

/// A row excluded from the timeline, with enough context to show or fix it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row_index: usize,
    pub values: Vec<String>,
    pub kind: RowErrorKind,
    pub detail: String,
}

impl RowError {
    fn new(row_index: usize, values: &[String], err: &TimelineError) -> Self {
        let kind = match err {
            TimelineError::RowRejected { .. } => RowErrorKind::RowRejected,
            _ => RowErrorKind::InvalidTimecode,
        };
        Self {
            row_index,
            values: values.to_vec(),
            kind,
            detail: err.to_string(),
        }
    }
}

/// Builds segments at the default frame rate. See [`build_timeline_with`].
pub fn build_timeline(rows: &[Vec<String>], mapping: &ColumnMapping) -> (Vec<Segment>, Vec<RowError>) {
    build_timeline_with(&TimecodeParser::default(), rows, mapping)
}

/// Builds segments in row order. Rows with unparseable timecodes or `end < start` are left out
/// of the segment list and returned as row errors instead; they never abort the import.
pub fn build_timeline_with(
    parser: &TimecodeParser,
    rows: &[Vec<String>],
    mapping: &ColumnMapping,
) -> (Vec<Segment>, Vec<RowError>) {
    let mut segments = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for (row_index, row) in rows.iter().enumerate() {
        match build_segment(parser, row_index, row, mapping) {
            Ok(segment) => segments.push(segment),
            Err(err) => {
                tracing::debug!(row_index, error = %err, "row rejected");
                rejected.push(RowError::new(row_index, row, &err));
            }
        }
    }

    (segments, rejected)
}

fn build_segment(
    parser: &TimecodeParser,
    row_index: usize,
    row: &[String],
    mapping: &ColumnMapping,
) -> TimelineResult<Segment> {
    let start_seconds = parser.parse(cell(row, mapping.start_time))?;
    let end_seconds = parser.parse(cell(row, mapping.end_time))?;
    if end_seconds < start_seconds {
        return Err(TimelineError::RowRejected {
            row_index,
            start_seconds,
            end_seconds,
        });
    }

    let voice_id = mapping
        .index(ColumnRole::VoiceId)
        .map(|i| cell(row, i).trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    Ok(Segment {
        row_index,
        speaker: cell(row, mapping.speaker).trim().to_string(),
        start_seconds,
        end_seconds,
        text: cell(row, mapping.text).to_string(),
        voice_id,
        source: row.to_vec(),
    })
}

/// Short rows read as empty cells.
fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Returns a copy of `segments` where every segment spoken by `speaker` carries `voice_id`.
pub fn assign_voice(segments: &[Segment], speaker: &str, voice_id: &str) -> Vec<Segment> {
    set_voice(segments, speaker, Some(voice_id))
}

/// Returns a copy of `segments` with the voice removed from every segment of `speaker`.
pub fn clear_voice(segments: &[Segment], speaker: &str) -> Vec<Segment> {
    set_voice(segments, speaker, None)
}

fn set_voice(segments: &[Segment], speaker: &str, voice_id: Option<&str>) -> Vec<Segment> {
    segments
        .iter()
        .map(|segment| {
            if segment.speaker == speaker {
                Segment {
                    voice_id: voice_id.map(str::to_string),
                    ..segment.clone()
                }
            } else {
                segment.clone()
            }
        })
        .collect()
}

/// Distinct speakers in first-appearance order.
pub fn speakers(segments: &[Segment]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for segment in segments {
        if !seen.iter().any(|s| s == &segment.speaker) {
            seen.push(segment.speaker.clone());
        }
    }
    seen
}

/// Latest end time across the timeline, 0 when empty.
pub fn total_duration(segments: &[Segment]) -> f64 {
    segments.iter().map(|s| s.end_seconds).fold(0.0, f64::max)
}

/// Segments ordered by start time for display; ties keep row order.
pub fn sorted_by_start(segments: &[Segment]) -> Vec<Segment> {
    let mut sorted = segments.to_vec();
    sorted.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));
    sorted
}

/// Writes `original_columns` plus a trailing `voice_id` column, one line per segment in source
/// row order. A header that already has a `voice_id` column gets it overwritten in place.
pub fn export_csv(segments: &[Segment], original_columns: &[String]) -> TimelineResult<Vec<u8>> {
    let voice_column = original_columns
        .iter()
        .position(|c| normalize_column_name(c) == ColumnRole::VoiceId.as_str());

    let mut ordered: Vec<&Segment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.row_index);

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header: Vec<&str> = original_columns.iter().map(String::as_str).collect();
    if voice_column.is_none() {
        header.push(ColumnRole::VoiceId.as_str());
    }
    writer.write_record(&header)?;

    for segment in ordered {
        let mut record: Vec<&str> = (0..original_columns.len())
            .map(|i| cell(&segment.source, i))
            .collect();
        let voice = segment.voice_id.as_deref().unwrap_or("");
        match voice_column {
            Some(i) => record[i] = voice,
            None => record.push(voice),
        }
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| TimelineError::Csv(e.into_error().into()))
}
