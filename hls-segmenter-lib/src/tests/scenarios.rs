//! End-to-end segmentation scenarios driven by synthetic sources

use std::path::Path;

use crate::config::SegmenterOptions;
use crate::error::{HlsError, Result};
use crate::segment::{EngineState, Segmenter};
use crate::tests::fixtures::{
    list_segment_files, RecordingSink, SyntheticMedia, SyntheticSource,
};
use crate::tests::validation::{parse_media_playlist, validate_media_playlist};
use crate::types::{SegmentationReport, TrackRole};

const VIDEO_OUT: usize = 0;

fn options(dir: &Path, target: u32, window: usize) -> SegmenterOptions {
    let mut options = SegmenterOptions::new("synthetic.mp4", dir, dir.join("index.m3u8"));
    options.segment_prefix = "seg".to_string();
    options.target_duration_secs = target;
    options.window_size = window;
    options
}

type Engine = Segmenter<SyntheticSource, RecordingSink>;

fn run_with(
    media: &SyntheticMedia,
    options: SegmenterOptions,
    sink: RecordingSink,
) -> (Result<SegmentationReport>, Engine) {
    let mut segmenter = Segmenter::new(SyntheticSource::new(media), sink, options).unwrap();
    let result = segmenter.run();
    (result, segmenter)
}

fn read_manifest(dir: &Path) -> String {
    std::fs::read_to_string(dir.join("index.m3u8")).unwrap()
}

#[test]
fn test_vod_constant_gop() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::constant_gop();
    let (result, segmenter) = run_with(&media, options(dir.path(), 10, 0), RecordingSink::new());

    let report = result.unwrap();
    assert!(report.finished);
    assert_eq!(report.segments_created, 4);
    assert_eq!(report.segments_listed, 4);
    assert_eq!(report.media_sequence, 1);
    assert_eq!(report.total_duration_secs, 32);
    assert_eq!(segmenter.state(), EngineState::Finalized);

    let content = read_manifest(dir.path());
    let result = validate_media_playlist(&content);
    result.print_report();
    assert!(result.is_valid);

    let playlist = parse_media_playlist(&content);
    assert_eq!(playlist.durations(), vec![10, 10, 10, 2]);
    assert_eq!(playlist.uris(), vec!["seg-1.ts", "seg-2.ts", "seg-3.ts", "seg-4.ts"]);
    assert_eq!(playlist.media_sequence, Some(1));
    assert_eq!(playlist.target_duration, Some(10));
    assert!(playlist.ended);

    assert_eq!(
        list_segment_files(dir.path()),
        vec!["seg-1.ts", "seg-2.ts", "seg-3.ts", "seg-4.ts"]
    );

    let sink = segmenter.sink();
    assert!(sink.header_written);
    assert!(sink.trailer_written);
    assert_eq!(sink.segments.len(), 4);
    assert!(!dir.path().join("index.m3u8.tmp").exists());
}

#[test]
fn test_live_window_evicts_oldest() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::constant_gop();
    let sink = RecordingSink::new().watching_manifest(dir.path().join("index.m3u8"));
    let (result, segmenter) = run_with(&media, options(dir.path(), 10, 2), sink);
    let report = result.unwrap();

    // Segment 4 is opened right after segment 3 sealed and the playlist
    // was republished.
    let opened_4th = &segmenter.sink().segments[3];
    let playlist = parse_media_playlist(opened_4th.manifest_at_open.as_deref().unwrap());
    assert_eq!(playlist.uris(), vec!["seg-2.ts", "seg-3.ts"]);
    assert_eq!(playlist.media_sequence, Some(2));
    assert!(!playlist.ended);
    assert_eq!(opened_4th.files_at_open, vec!["seg-2.ts", "seg-3.ts"]);

    let playlist = parse_media_playlist(&read_manifest(dir.path()));
    assert_eq!(playlist.uris(), vec!["seg-3.ts", "seg-4.ts"]);
    assert_eq!(playlist.media_sequence, Some(3));
    assert!(playlist.ended);
    assert_eq!(list_segment_files(dir.path()), vec!["seg-3.ts", "seg-4.ts"]);

    assert_eq!(report.segments_created, 4);
    assert_eq!(report.segments_listed, 2);
    assert_eq!(report.media_sequence, 3);
}

#[test]
fn test_no_video_stream_aborts_before_output() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::audio_only();
    let (result, segmenter) = run_with(&media, options(dir.path(), 10, 0), RecordingSink::new());

    assert!(matches!(result, Err(HlsError::NoVideoStream)));
    assert!(segmenter.sink().segments.is_empty());
    assert!(segmenter.sink().added_streams.is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_packets_before_first_keyframe_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::late_keyframe(3.0);
    let (result, segmenter) = run_with(&media, options(dir.path(), 10, 0), RecordingSink::new());
    let report = result.unwrap();

    let sink = segmenter.sink();
    let first = sink.all_packets().next().unwrap();
    assert_eq!(first.stream, VIDEO_OUT);
    assert!(first.is_key);
    assert_eq!(first.pts, Some(270000));
    assert!(sink.all_packets().all(|p| p.time().unwrap() >= 3.0));

    // 75 video frames and 141 audio frames precede the keyframe at 3.0s
    assert_eq!(report.packets_dropped, 216);

    let playlist = parse_media_playlist(&read_manifest(dir.path()));
    assert_eq!(playlist.durations(), vec![10, 10, 9]);
}

#[test]
fn test_cuts_only_on_video_keyframes() {
    for seed in 1..=8 {
        let dir = tempfile::tempdir().unwrap();
        let media = SyntheticMedia::jittered(seed);
        let (result, segmenter) = run_with(&media, options(dir.path(), 10, 0), RecordingSink::new());
        let report = result.unwrap();

        let starts: Vec<f64> = segmenter
            .sink()
            .segments
            .iter()
            .map(|segment| {
                let first = &segment.packets[0];
                assert_eq!(first.stream, VIDEO_OUT, "seed {}", seed);
                assert!(first.is_key, "seed {}: segment starts on a non-keyframe", seed);
                first.time().unwrap()
            })
            .collect();

        for pair in starts.windows(2) {
            assert!(
                pair[1] - pair[0] >= 9.75,
                "seed {}: cut after only {:.2}s",
                seed,
                pair[1] - pair[0]
            );
        }

        let content = read_manifest(dir.path());
        assert!(validate_media_playlist(&content).is_valid, "seed {}", seed);
        let playlist = parse_media_playlist(&content);
        assert_eq!(playlist.entries.len() as u64, report.segments_created);

        // Declared durations add up to the source duration within one
        // second per segment.
        let sum: u32 = playlist.durations().iter().sum();
        let tolerance = playlist.entries.len() as f64;
        assert!(
            (sum as f64 - media.duration_secs as f64).abs() <= tolerance,
            "seed {}: durations sum to {}s",
            seed,
            sum
        );
    }
}

#[test]
fn test_vod_manifest_only_grows() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::constant_gop();
    let sink = RecordingSink::new().watching_manifest(dir.path().join("index.m3u8"));
    let (result, segmenter) = run_with(&media, options(dir.path(), 4, 0), sink);
    let report = result.unwrap();
    assert_eq!(report.segments_created, 8);

    let mut previous = 0;
    for (opened, segment) in segmenter.sink().segments.iter().enumerate() {
        let listed = segment
            .manifest_at_open
            .as_deref()
            .map(|content| parse_media_playlist(content).entries.len())
            .unwrap_or(0);
        assert_eq!(listed, opened);
        assert!(listed >= previous);
        previous = listed;
    }

    let playlist = parse_media_playlist(&read_manifest(dir.path()));
    assert_eq!(playlist.durations(), vec![4; 8]);
    assert_eq!(playlist.media_sequence, Some(1));
}

#[test]
fn test_live_window_matches_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::constant_gop();
    let sink = RecordingSink::new().watching_manifest(dir.path().join("index.m3u8"));
    let (result, segmenter) = run_with(&media, options(dir.path(), 4, 3), sink);
    result.unwrap();

    for segment in &segmenter.sink().segments[1..] {
        let playlist = parse_media_playlist(segment.manifest_at_open.as_deref().unwrap());
        assert!(playlist.entries.len() <= 3);
        assert_eq!(playlist.uris(), segment.files_at_open);

        let first_listed: u64 = playlist.uris()[0]
            .trim_start_matches("seg-")
            .trim_end_matches(".ts")
            .parse()
            .unwrap();
        assert_eq!(playlist.media_sequence, Some(first_listed));
    }

    let playlist = parse_media_playlist(&read_manifest(dir.path()));
    assert_eq!(playlist.uris(), vec!["seg-6.ts", "seg-7.ts", "seg-8.ts"]);
    assert_eq!(playlist.uris(), list_segment_files(dir.path()));
}

#[test]
fn test_manifest_reads_are_stable() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::constant_gop();
    let (result, _) = run_with(&media, options(dir.path(), 10, 2), RecordingSink::new());
    result.unwrap();

    let first = std::fs::read(dir.path().join("index.m3u8")).unwrap();
    let second = std::fs::read(dir.path().join("index.m3u8")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_packet_write_failures_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::constant_gop();
    let mut sink = RecordingSink::new();
    sink.fail_every = Some(50);
    let (result, _) = run_with(&media, options(dir.path(), 10, 0), sink);
    let report = result.unwrap();

    // 800 video and 1500 audio packets, none before the first keyframe
    assert_eq!(report.packets_dropped, 0);
    assert_eq!(report.write_failures, 46);
    assert_eq!(report.packets_written + report.write_failures, 2300);
    assert!(report.finished);
    assert_eq!(report.segments_created, 4);
}

#[test]
fn test_segment_limit_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::constant_gop();
    let mut options = options(dir.path(), 10, 0);
    options.segment_limit = 2;
    let (result, segmenter) = run_with(&media, options, RecordingSink::new());

    assert!(matches!(result, Err(HlsError::SegmentLimit { limit: 2 })));
    assert_eq!(segmenter.state(), EngineState::Finalized);
    assert_eq!(segmenter.report().segments_created, 2);
    assert!(!segmenter.report().finished);

    let playlist = parse_media_playlist(&read_manifest(dir.path()));
    assert_eq!(playlist.uris(), vec!["seg-1.ts", "seg-2.ts"]);
    assert!(!playlist.ended);
    assert!(!dir.path().join("seg-3.ts").exists());
}

#[test]
fn test_strict_manifest_aborts_on_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("index.m3u8.tmp")).unwrap();

    let media = SyntheticMedia::constant_gop();
    let mut options = options(dir.path(), 10, 0);
    options.strict_manifest = true;
    let (result, segmenter) = run_with(&media, options, RecordingSink::new());

    assert!(matches!(result, Err(HlsError::ManifestWrite { .. })));
    assert_eq!(segmenter.report().segments_created, 1);
    assert_eq!(segmenter.report().manifest_failures, 1);
    assert!(!dir.path().join("index.m3u8").exists());
}

#[test]
fn test_intermediate_manifest_failures_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("index.m3u8.tmp");
    std::fs::create_dir(&blocker).unwrap();

    // Unblock the playlist once the third segment opens.
    let sink = RecordingSink::new().before_open(move |opened, _| {
        if opened == 2 {
            std::fs::remove_dir(&blocker).unwrap();
        }
    });

    let media = SyntheticMedia::constant_gop();
    let (result, _) = run_with(&media, options(dir.path(), 10, 0), sink);
    let report = result.unwrap();

    assert_eq!(report.manifest_failures, 2);
    assert!(report.finished);
    let playlist = parse_media_playlist(&read_manifest(dir.path()));
    assert_eq!(playlist.entries.len(), 4);
    assert!(playlist.ended);
}

#[test]
fn test_final_manifest_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("index.m3u8.tmp")).unwrap();

    let media = SyntheticMedia::constant_gop();
    let (result, segmenter) = run_with(&media, options(dir.path(), 10, 0), RecordingSink::new());

    assert!(matches!(result, Err(HlsError::ManifestWrite { .. })));
    assert_eq!(segmenter.report().segments_created, 4);
    assert_eq!(segmenter.report().manifest_failures, 4);
    assert!(!segmenter.report().finished);
}

#[test]
fn test_source_without_keyframes() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::without_keyframes();
    let (result, segmenter) = run_with(&media, options(dir.path(), 10, 0), RecordingSink::new());
    let report = result.unwrap();

    assert!(!report.finished);
    assert_eq!(report.segments_created, 0);
    assert_eq!(report.packets_written, 0);
    assert_eq!(report.packets_dropped, 2300);
    assert_eq!(segmenter.sink().segments.len(), 1);
    assert!(!dir.path().join("seg-1.ts").exists());
    assert!(!dir.path().join("index.m3u8").exists());
}

#[test]
fn test_unselected_streams_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia {
        has_data: true,
        ..SyntheticMedia::constant_gop()
    };
    let (result, segmenter) = run_with(&media, options(dir.path(), 10, 0), RecordingSink::new());
    let report = result.unwrap();

    let sink = segmenter.sink();
    assert_eq!(sink.added_streams.len(), 2);
    assert!(sink.all_packets().all(|p| p.stream <= 1));
    assert_eq!(report.packets_written, 2300);
    // data packets belong to no track and are not counted
    assert_eq!(report.packets_dropped, 0);

    let tracks = segmenter.tracks();
    assert_eq!(tracks[0].role, TrackRole::Video);
    assert_eq!(tracks[0].source_index, 2);
    assert_eq!(tracks[0].output_index, 0);
    assert_eq!(tracks[1].role, TrackRole::Audio);
    assert_eq!(tracks[1].source_index, 1);
}

#[test]
fn test_read_error_finalizes() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::constant_gop();
    let mut segmenter = Segmenter::new(
        SyntheticSource::new(&media).failing_after(1000),
        RecordingSink::new(),
        options(dir.path(), 10, 0),
    )
    .unwrap();
    let report = segmenter.run().unwrap();

    assert!(report.finished);
    assert_eq!(report.packets_written, 1000);
    assert!(parse_media_playlist(&read_manifest(dir.path())).ended);
}

#[test]
fn test_run_twice_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::constant_gop();
    let (result, mut segmenter) =
        run_with(&media, options(dir.path(), 10, 0), RecordingSink::new());
    result.unwrap();
    assert!(matches!(segmenter.run(), Err(HlsError::Config(_))));
}

#[test]
fn test_invalid_options_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::constant_gop();
    let result = Segmenter::new(
        SyntheticSource::new(&media),
        RecordingSink::new(),
        options(dir.path(), 0, 0),
    );
    assert!(matches!(result, Err(HlsError::Config(_))));
}

#[test]
fn test_output_timestamps_rescaled() {
    let dir = tempfile::tempdir().unwrap();
    let media = SyntheticMedia::constant_gop();
    let (result, segmenter) = run_with(&media, options(dir.path(), 10, 0), RecordingSink::new());
    result.unwrap();

    // Audio at 1/48000 lands in the 1/90000 output timebase
    let audio: Vec<_> = segmenter
        .sink()
        .all_packets()
        .filter(|p| p.stream == 1)
        .take(3)
        .map(|p| p.pts)
        .collect();
    assert_eq!(audio, vec![Some(0), Some(1920), Some(3840)]);
}
