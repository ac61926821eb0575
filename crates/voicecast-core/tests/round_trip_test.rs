//! Round-trip test: import -> assign voices -> export -> import again.
//!
//! Re-importing an exported file must give back the same speaker, start, end and text for
//! every segment; the voice assignment is the only new information.
//!
//! Run with: `cargo test -p voicecast_core --test round_trip_test`

use voicecast_core::{
    assign_voice, build_timeline, export_csv, import_csv, infer_columns, read_csv, ColumnRole,
    ImportOptions, Segment, TimecodeParser,
};

const MIXED_FORMATS: &str = "speaker,start_time,end_time,dialogue\n\
Narrator,00.167,00:00:02.000,\"Once upon a time, there was a CSV.\"\n\
Hero,00:00:02,00:00:04:15,I have a bad feeling about this\n\
Villain,00:00:05.250,00:00:07,\"He said \"\"no\"\".\"\n\
Hero,00:00:07,00:00:09:00,\"Multi\nline text\"\n";

fn core_values(segments: &[Segment]) -> Vec<(String, f64, f64, String)> {
    segments
        .iter()
        .map(|s| (s.speaker.clone(), s.start_seconds, s.end_seconds, s.text.clone()))
        .collect()
}

#[test]
fn export_then_reimport_preserves_timeline() {
    let options = ImportOptions::default();
    let first = import_csv(MIXED_FORMATS.as_bytes(), &options).expect("first import");
    assert!(first.rejected.is_empty());
    assert_eq!(first.segments.len(), 4);

    let exported = export_csv(&first.segments, &first.columns).expect("export");
    let second = import_csv(&exported, &options).expect("reimport");

    assert_eq!(core_values(&first.segments), core_values(&second.segments));
    assert_eq!(second.mapping.index(ColumnRole::VoiceId), Some(4));
    assert!(second.segments.iter().all(|s| s.voice_id.is_none()));
}

#[test]
fn voice_assignments_survive_the_round_trip() {
    let options = ImportOptions::default();
    let first = import_csv(MIXED_FORMATS.as_bytes(), &options).expect("import");

    let cast = assign_voice(&first.segments, "Hero", "voice-hero");
    let cast = assign_voice(&cast, "Villain", "voice-villain");

    let exported = export_csv(&cast, &first.columns).expect("export");
    let second = import_csv(&exported, &options).expect("reimport");
    let voices: Vec<Option<&str>> = second.segments.iter().map(|s| s.voice_id.as_deref()).collect();
    assert_eq!(
        voices,
        vec![None, Some("voice-hero"), Some("voice-villain"), Some("voice-hero")]
    );

    // A second export rewrites the existing voice column instead of adding another.
    let again = export_csv(&second.segments, &second.columns).expect("second export");
    assert_eq!(again, exported);
}

#[test]
fn positional_columns_round_trip() {
    let csv = "speaker,from,to,words\nA,00:00:01,00:00:02,alpha\nB,2.0,00:00:03:15,beta\n";
    let table = read_csv(csv.as_bytes()).expect("read");
    let mapping = infer_columns(&table.header, &table.rows).expect("infer");
    let (segments, rejected) = build_timeline(&table.rows, &mapping);
    assert!(rejected.is_empty());

    let exported = export_csv(&segments, &table.header).expect("export");
    let table2 = read_csv(&exported).expect("reread");
    let mapping2 = infer_columns(&table2.header, &table2.rows).expect("reinfer");
    let (segments2, _) = build_timeline(&table2.rows, &mapping2);
    assert_eq!(core_values(&segments), core_values(&segments2));
}

#[test]
fn rejected_rows_are_not_exported() {
    let csv = "speaker,start,end,script\nA,00:00:03,00:00:01,backwards\nB,1.0,2.0,fine\n";
    let import = import_csv(csv.as_bytes(), &ImportOptions::default()).expect("import");
    assert_eq!(import.rejected.len(), 1);

    let exported = String::from_utf8(export_csv(&import.segments, &import.columns).unwrap()).unwrap();
    assert!(!exported.contains("backwards"));
    assert!(exported.contains("B,1.0,2.0,fine,"));
}

#[test]
fn custom_frame_rate_flows_through_import() {
    let csv = "speaker,start_time,end_time,text\nA,00:00:00:12,00:00:01:00,x\n";
    let options = ImportOptions {
        parser: TimecodeParser::new(24.0).expect("frame rate"),
        ..ImportOptions::default()
    };
    let import = import_csv(csv.as_bytes(), &options).expect("import");
    assert_eq!(import.segments[0].start_seconds, 0.5);
    assert_eq!(import.segments[0].end_seconds, 1.0);
}

#[test]
fn rejected_sample_row_does_not_move_positional_columns() {
    let csv = "speaker,a,b,c,dialogue\n\
A,x,00:00:05,00:00:01,backwards\n\
B,00:00:09,00:00:01,00:00:02,hi\n";
    let options = ImportOptions::default();
    let first = import_csv(csv.as_bytes(), &options).expect("import");
    assert_eq!((first.mapping.start_time, first.mapping.end_time), (2, 3));
    assert_eq!(first.rejected.len(), 1);

    let exported = export_csv(&first.segments, &first.columns).expect("export");
    let second = import_csv(&exported, &options).expect("reimport");
    assert_eq!(
        (second.mapping.start_time, second.mapping.end_time),
        (first.mapping.start_time, first.mapping.end_time)
    );
    assert!(second.rejected.is_empty());
    assert_eq!(core_values(&first.segments), core_values(&second.segments));
}
