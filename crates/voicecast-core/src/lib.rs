//! voicecast: Core library.
//! Timecode normalization, CSV column inference and timeline assembly for voice casting.
//! Pure over its inputs: no environment reads, no process-wide state.

pub mod columns;
pub mod csv_io;
pub mod error;
pub mod timecode;
pub mod timeline;
pub mod voices;

pub use columns::{infer_columns, infer_columns_with, ColumnMapping, ColumnRole};
pub use csv_io::{import_csv, read_csv, CsvTable, ImportOptions, TimelineImport, DEFAULT_SAMPLE_ROWS};
pub use error::{TimelineError, TimelineResult};
pub use timecode::{
    classify, format_timecode, parse_timecode, TimecodeFormat, TimecodeParser, DEFAULT_FRAME_RATE,
};
pub use timeline::{
    assign_voice, build_timeline, build_timeline_with, clear_voice, export_csv, sorted_by_start,
    speakers, total_duration, RowError, RowErrorKind, Segment,
};
pub use voices::{
    ElevenLabsCatalog, VoiceCatalog, VoiceCatalogEntry, VoiceCatalogError, ELEVENLABS_BASE_URL,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
