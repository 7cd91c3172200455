//! End-to-end split against the real FFmpeg engine. Skipped when ffmpeg is
//! not installed.

mod support;

use std::fs;
use std::io::{Cursor, Read};

use serial_test::serial;
use vidsplit::{FfmpegEngine, SplitRequest, Splitter, TranscodeEngine};

#[test]
#[serial]
fn split_real_video_end_to_end() {
    let Some(env) = support::IntegrationEnv::try_new() else {
        eprintln!("skipping: ffmpeg not available");
        return;
    };

    let input = env.create_test_video("fixture.mp4", 12.0);
    let data = fs::read(&input).expect("read fixture");

    let mut engine = FfmpegEngine::new();
    engine.load().expect("engine load");
    let mut splitter = Splitter::new(engine);

    let request = SplitRequest {
        file_name: "fixture.mp4".to_string(),
        data,
        segment_secs: 5,
    };
    let mut percents = Vec::new();
    let outcome = splitter
        .run(&request, |p| percents.push(p.percent))
        .expect("split job");

    // ceil(12 / 5) segments
    assert_eq!(outcome.segment_count, 3);
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    assert_eq!(*percents.last().unwrap(), 100);

    let mut reader = zip::ZipArchive::new(Cursor::new(outcome.archive)).expect("open archive");
    assert_eq!(reader.len(), 3);
    for index in 1..=3 {
        let name = format!("fixture_part{index}.mp4");
        let mut file = reader.by_name(&name).expect("archive entry");
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).expect("read entry");
        assert!(!bytes.is_empty(), "{name} should carry segment bytes");
    }
}

#[test]
#[serial]
fn probe_reports_fixture_duration() {
    let Some(env) = support::IntegrationEnv::try_new() else {
        eprintln!("skipping: ffmpeg not available");
        return;
    };

    let input = env.create_test_video("probe_me.mp4", 8.0);
    let data = fs::read(&input).expect("read fixture");

    let mut engine = FfmpegEngine::new();
    engine.load().expect("engine load");
    engine.write_file("probe_me.mp4", &data).expect("stage");

    let duration = engine.probe_duration("probe_me.mp4").expect("probe");
    assert!(
        (duration - 8.0).abs() < 0.5,
        "expected ~8s, got {duration}"
    );

    engine.delete_file("probe_me.mp4").expect("cleanup");
}
