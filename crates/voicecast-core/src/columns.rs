//! Column Inferencer: decides which physical CSV column plays which role.
//!
//! Header names win first (case-insensitive, trimmed). The transcript column is then found by
//! keyword, start/end columns without a recognizable header are found by checking that every
//! sampled value parses as a timecode, and finally the text role falls back to the single column
//! nobody claimed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TimelineError, TimelineResult};
use crate::timecode::TimecodeParser;

const SPEAKER_NAMES: &[&str] = &["speaker"];
const START_NAMES: &[&str] = &["start_time", "start", "starttime", "start time"];
const END_NAMES: &[&str] = &["end_time", "end", "endtime", "end time"];
const VOICE_ID_NAMES: &[&str] = &["voice_id"];

/// Substrings that mark a header as holding transcript text.
const TEXT_KEYWORDS: &[&str] = &["text", "script", "line", "dialogue", "transcription"];

/// Logical meaning of a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Speaker,
    StartTime,
    EndTime,
    Text,
    /// Voice assignment written by a previous export. Optional.
    VoiceId,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Speaker => "speaker",
            ColumnRole::StartTime => "start_time",
            ColumnRole::EndTime => "end_time",
            ColumnRole::Text => "text",
            ColumnRole::VoiceId => "voice_id",
        }
    }

    fn header_names(&self) -> &'static [&'static str] {
        match self {
            ColumnRole::Speaker => SPEAKER_NAMES,
            ColumnRole::StartTime => START_NAMES,
            ColumnRole::EndTime => END_NAMES,
            ColumnRole::VoiceId => VOICE_ID_NAMES,
            ColumnRole::Text => &[],
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical column index for each role. Built once per upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub speaker: usize,
    pub start_time: usize,
    pub end_time: usize,
    pub text: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<usize>,
}

impl ColumnMapping {
    pub fn index(&self, role: ColumnRole) -> Option<usize> {
        match role {
            ColumnRole::Speaker => Some(self.speaker),
            ColumnRole::StartTime => Some(self.start_time),
            ColumnRole::EndTime => Some(self.end_time),
            ColumnRole::Text => Some(self.text),
            ColumnRole::VoiceId => self.voice_id,
        }
    }
}

/// Header normalization: trimmed, BOM stripped, lowercase.
pub fn normalize_column_name(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Infers the column mapping at the default frame rate.
pub fn infer_columns(header: &[String], sample_rows: &[Vec<String>]) -> TimelineResult<ColumnMapping> {
    infer_columns_with(&TimecodeParser::default(), header, sample_rows)
}

/// Infers the column mapping; `parser` validates positional start/end candidates.
pub fn infer_columns_with(
    parser: &TimecodeParser,
    header: &[String],
    sample_rows: &[Vec<String>],
) -> TimelineResult<ColumnMapping> {
    let names: Vec<String> = header.iter().map(|h| normalize_column_name(h)).collect();
    let mut claimed = vec![false; names.len()];

    let speaker = claim_by_name(&names, header, &mut claimed, ColumnRole::Speaker)?;
    let mut start_time = claim_by_name(&names, header, &mut claimed, ColumnRole::StartTime)?;
    let mut end_time = claim_by_name(&names, header, &mut claimed, ColumnRole::EndTime)?;
    let voice_id = claim_by_name(&names, header, &mut claimed, ColumnRole::VoiceId)?;

    let keyword_hits: Vec<usize> = (0..names.len())
        .filter(|&i| !claimed[i] && TEXT_KEYWORDS.iter().any(|k| names[i].contains(k)))
        .collect();
    let named_text = match keyword_hits.as_slice() {
        [] => None,
        [only] => Some(*only),
        many => return Err(ambiguous(ColumnRole::Text, header, many)),
    };
    if let Some(i) = named_text {
        claimed[i] = true;
    }

    if start_time.is_none() || end_time.is_none() {
        let (start, end) = pick_timecode_columns(parser, &claimed, sample_rows, start_time, end_time);
        for i in [start, end].into_iter().flatten() {
            claimed[i] = true;
        }
        start_time = start;
        end_time = end;
    }

    let speaker = speaker.ok_or(TimelineError::MissingColumn(ColumnRole::Speaker))?;
    let start_time = start_time.ok_or(TimelineError::MissingColumn(ColumnRole::StartTime))?;
    let end_time = end_time.ok_or(TimelineError::MissingColumn(ColumnRole::EndTime))?;

    let text = match named_text {
        Some(i) => i,
        None => {
            let remaining: Vec<usize> = (0..names.len()).filter(|&i| !claimed[i]).collect();
            match remaining.as_slice() {
                [] => return Err(TimelineError::MissingColumn(ColumnRole::Text)),
                [only] => *only,
                many => return Err(ambiguous(ColumnRole::Text, header, many)),
            }
        }
    };

    let mapping = ColumnMapping {
        speaker,
        start_time,
        end_time,
        text,
        voice_id,
    };
    tracing::debug!(?mapping, "columns inferred");
    Ok(mapping)
}

/// Claims the single column whose header names `role`. Two such columns are ambiguous.
fn claim_by_name(
    names: &[String],
    header: &[String],
    claimed: &mut [bool],
    role: ColumnRole,
) -> TimelineResult<Option<usize>> {
    let hits: Vec<usize> = (0..names.len())
        .filter(|&i| !claimed[i] && role.header_names().contains(&names[i].as_str()))
        .collect();
    match hits.as_slice() {
        [] => Ok(None),
        [only] => {
            claimed[*only] = true;
            Ok(Some(*only))
        }
        many => Err(ambiguous(role, header, many)),
    }
}

/// Sampled values of every unclaimed column that parses as a timecode in all sample rows.
fn timecode_candidates(
    parser: &TimecodeParser,
    claimed: &[bool],
    sample_rows: &[Vec<String>],
) -> Vec<(usize, Vec<Option<f64>>)> {
    if sample_rows.is_empty() {
        return Vec::new();
    }
    (0..claimed.len())
        .filter(|&i| !claimed[i])
        .map(|i| (i, column_values(parser, i, sample_rows)))
        .filter(|(_, values)| values.iter().all(Option::is_some))
        .collect()
}

fn column_values(parser: &TimecodeParser, index: usize, sample_rows: &[Vec<String>]) -> Vec<Option<f64>> {
    sample_rows
        .iter()
        .map(|row| row.get(index).and_then(|cell| parser.parse(cell).ok()))
        .collect()
}

/// Sample rows where `end >= start`.
fn ordered_rows(start: &[Option<f64>], end: &[Option<f64>]) -> usize {
    start
        .iter()
        .zip(end)
        .filter(|(s, e)| matches!((s, e), (Some(s), Some(e)) if e >= s))
        .count()
}

/// Highest score wins; ties go to the earliest option.
fn first_best<T>(options: impl IntoIterator<Item = (T, usize)>) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for (item, score) in options {
        if best.as_ref().map_or(true, |(_, top)| score > *top) {
            best = Some((item, score));
        }
    }
    best.map(|(item, _)| item)
}

/// Fills whichever of start/end has no header match from the timecode-valued columns.
///
/// A pair (or single column next to a named one) is scored by how many sample rows it keeps
/// in order, so a sample row that will be rejected anyway cannot pull the choice toward columns
/// that stop matching once that row is gone. Among equal scores the leftmost columns win.
fn pick_timecode_columns(
    parser: &TimecodeParser,
    claimed: &[bool],
    sample_rows: &[Vec<String>],
    start_time: Option<usize>,
    end_time: Option<usize>,
) -> (Option<usize>, Option<usize>) {
    let candidates = timecode_candidates(parser, claimed, sample_rows);
    match (start_time, end_time) {
        (None, None) => {
            let pairs = candidates.iter().enumerate().flat_map(|(n, (start, start_values))| {
                candidates[n + 1..].iter().map(move |(end, end_values)| {
                    ((*start, *end), ordered_rows(start_values, end_values))
                })
            });
            match first_best(pairs) {
                Some((start, end)) => (Some(start), Some(end)),
                None => (candidates.first().map(|(i, _)| *i), None),
            }
        }
        (Some(start), None) => {
            let start_values = column_values(parser, start, sample_rows);
            let end = first_best(
                candidates
                    .iter()
                    .map(|(i, values)| (*i, ordered_rows(&start_values, values))),
            );
            (Some(start), end)
        }
        (None, Some(end)) => {
            let end_values = column_values(parser, end, sample_rows);
            let start = first_best(
                candidates
                    .iter()
                    .map(|(i, values)| (*i, ordered_rows(values, &end_values))),
            );
            (start, Some(end))
        }
        (Some(start), Some(end)) => (Some(start), Some(end)),
    }
}

fn ambiguous(role: ColumnRole, header: &[String], indices: &[usize]) -> TimelineError {
    TimelineError::AmbiguousColumns {
        role,
        candidates: indices.iter().map(|&i| header[i].trim().to_string()).collect(),
    }
}
