//! Timecode Parser: normalizes the four accepted timestamp notations into seconds.
//!
//! | Notation | Example | Value |
//! |----------|---------|-------|
//! | Decimal seconds | `00.167` | 0.167 |
//! | `H:M:S:F` frames | `00:00:01:15` | 1 + 15 / frame rate |
//! | `H:M:S.mmm` | `00:00:00.500` | 0.5 |
//! | `H:M:S` | `00:01:05` | 65 |
//!
//! The notation is picked from the string's shape (colon count, decimal point) before any
//! number is parsed, so a plain `H:M:S` can never be read as decimal seconds.

use crate::error::{TimelineError, TimelineResult};

/// Frames per second assumed for `H:M:S:F` timecodes unless configured otherwise.
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Structural classification of a raw timecode string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimecodeFormat {
    DecimalSeconds,
    Frames,
    Milliseconds,
    Plain,
}

/// Classifies `raw` by shape only. Returns `None` for shapes no grammar accepts.
pub fn classify(raw: &str) -> Option<TimecodeFormat> {
    let s = raw.trim();
    let colons = s.matches(':').count();
    let has_dot = s.contains('.');
    match (colons, has_dot) {
        (0, true) => Some(TimecodeFormat::DecimalSeconds),
        (3, _) => Some(TimecodeFormat::Frames),
        (2, true) => Some(TimecodeFormat::Milliseconds),
        (2, false) => Some(TimecodeFormat::Plain),
        _ => None,
    }
}

/// Parses timecodes with a fixed frame rate. Cheap to copy; holds no other state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimecodeParser {
    frame_rate: f64,
}

impl Default for TimecodeParser {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl TimecodeParser {
    /// Parser for `H:M:S:F` timecodes at `frame_rate` fps (e.g. 24, 25, 29.97, 30).
    pub fn new(frame_rate: f64) -> TimelineResult<Self> {
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(TimelineError::InvalidFrameRate(frame_rate));
        }
        Ok(Self { frame_rate })
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Converts `raw` into seconds. Fails with `InvalidTimecode` carrying `raw` untouched.
    pub fn parse(&self, raw: &str) -> TimelineResult<f64> {
        let s = raw.trim();
        let invalid = || TimelineError::invalid_timecode(raw);

        let seconds = match classify(s).ok_or_else(invalid)? {
            TimecodeFormat::DecimalSeconds => parse_decimal(s),
            TimecodeFormat::Frames => self.parse_frames(s),
            TimecodeFormat::Milliseconds => parse_milliseconds(s),
            TimecodeFormat::Plain => parse_plain(s),
        };
        seconds.filter(|v| v.is_finite()).ok_or_else(invalid)
    }

    fn parse_frames(&self, s: &str) -> Option<f64> {
        let mut groups = s.split(':');
        let hours = unsigned(groups.next()?)?;
        let minutes = sexagesimal(groups.next()?)?;
        let secs = sexagesimal(groups.next()?)?;
        let frames = unsigned(groups.next()?)?;
        if frames as f64 >= self.frame_rate.ceil() {
            return None;
        }
        Some(hms(hours, minutes, secs as f64) + frames as f64 / self.frame_rate)
    }
}

/// Parses `raw` at the default frame rate. See [`TimecodeParser::parse`].
pub fn parse_timecode(raw: &str) -> TimelineResult<f64> {
    TimecodeParser::default().parse(raw)
}

/// Renders seconds as `HH:MM:SS.mmm`, rounded to the nearest millisecond.
pub fn format_timecode(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}

fn hms(hours: u64, minutes: u64, seconds: f64) -> f64 {
    hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds
}

/// `digits.digits`, integer part optional.
fn parse_decimal(s: &str) -> Option<f64> {
    let (whole, frac) = s.split_once('.')?;
    if !(whole.is_empty() || is_digits(whole)) || !is_digits(frac) {
        return None;
    }
    s.parse::<f64>().ok()
}

fn parse_milliseconds(s: &str) -> Option<f64> {
    let mut groups = s.split(':');
    let hours = unsigned(groups.next()?)?;
    let minutes = sexagesimal(groups.next()?)?;
    let last = groups.next()?;
    let (whole, frac) = last.split_once('.')?;
    if !is_digits(frac) {
        return None;
    }
    sexagesimal(whole)?;
    let secs = last.parse::<f64>().ok()?;
    Some(hms(hours, minutes, secs))
}

fn parse_plain(s: &str) -> Option<f64> {
    let mut groups = s.split(':');
    let hours = unsigned(groups.next()?)?;
    let minutes = sexagesimal(groups.next()?)?;
    let secs = sexagesimal(groups.next()?)?;
    Some(hms(hours, minutes, secs as f64))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn unsigned(group: &str) -> Option<u64> {
    if !is_digits(group) {
        return None;
    }
    group.parse().ok()
}

/// Minutes or seconds component: 0..=59.
fn sexagesimal(group: &str) -> Option<u64> {
    unsigned(group).filter(|v| *v < 60)
}
