// tests/sse_frames.rs

use caesium_console::events::frame::DEFAULT_MAX_FRAME_BYTES;
use caesium_console::events::{EventKind, FrameError, SseFrameDecoder};
use caesium_console_test_utils::EventBuilder;

#[test]
fn decodes_frame_split_across_chunks() {
    let frame = EventBuilder::task(EventKind::TaskStarted, "run-1", "a").frame();
    let (head, tail) = frame.split_at(frame.len() / 2);

    let mut decoder = SseFrameDecoder::default();
    let first = decoder.push_chunk(head);
    assert!(first.frames.is_empty());
    assert!(first.errors.is_empty());

    let second = decoder.push_chunk(tail);
    assert_eq!(second.frames.len(), 1);
    let event = &second.frames[0];
    assert_eq!(event.kind(), Some(EventKind::TaskStarted));
    assert_eq!(event.run_id.as_deref(), Some("run-1"));
    assert_eq!(event.task_id.as_deref(), Some("a"));
}

#[test]
fn multiple_frames_in_one_chunk_keep_order() {
    let mut bytes = EventBuilder::task(EventKind::TaskStarted, "run-1", "a").frame();
    bytes.extend(EventBuilder::task(EventKind::TaskSucceeded, "run-1", "a").frame());
    bytes.extend(EventBuilder::new(EventKind::RunSucceeded).run("run-1").frame());

    let report = SseFrameDecoder::default().push_chunk(&bytes);
    let kinds: Vec<_> = report.frames.iter().filter_map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![EventKind::TaskStarted, EventKind::TaskSucceeded, EventKind::RunSucceeded]
    );
}

#[test]
fn comments_and_crlf_are_handled() {
    let input = b": keep-alive\r\n\r\nevent: run_failed\r\ndata: {\"type\":\"run_failed\",\"run_id\":\"r\"}\r\n\r\n";
    let report = SseFrameDecoder::default().push_chunk(input);
    assert!(report.errors.is_empty());
    assert_eq!(report.frames.len(), 1);
    assert_eq!(report.frames[0].kind(), Some(EventKind::RunFailed));
}

#[test]
fn event_label_fills_missing_type() {
    let input = b"event: task_skipped\ndata: {\"task_id\":\"x\"}\n\n";
    let report = SseFrameDecoder::default().push_chunk(input);
    assert_eq!(report.frames.len(), 1);
    assert_eq!(report.frames[0].event_type, "task_skipped");
    assert_eq!(report.frames[0].task_id.as_deref(), Some("x"));
}

#[test]
fn multi_line_data_is_joined() {
    let input = b"data: {\"type\":\"job_created\",\ndata: \"job_id\":\"j1\"}\n\n";
    let report = SseFrameDecoder::default().push_chunk(input);
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.frames[0].job_id.as_deref(), Some("j1"));
}

#[test]
fn bad_json_is_reported_and_stream_continues() {
    let mut bytes = b"data: {not json\n\n".to_vec();
    bytes.extend(EventBuilder::new(EventKind::JobDeleted).job("j1").frame());

    let report = SseFrameDecoder::default().push_chunk(&bytes);
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(report.errors[0], FrameError::Decode(_)));
    assert_eq!(report.frames.len(), 1);
    assert_eq!(report.frames[0].kind(), Some(EventKind::JobDeleted));
}

#[test]
fn oversized_frame_is_dropped() {
    let mut decoder = SseFrameDecoder::new(64);
    let big = format!("data: {{\"type\":\"log_chunk\",\"payload\":\"{}\"}}\n\n", "x".repeat(100));
    let report = decoder.push_chunk(big.as_bytes());
    assert!(report.frames.is_empty());
    assert!(matches!(report.errors[0], FrameError::OversizedFrame { max: 64, .. }));

    // The decoder recovers for the next frame.
    let next = decoder.push_chunk(b"data: {\"type\":\"job_created\"}\n\n");
    assert_eq!(next.frames.len(), 1);
}

#[test]
fn data_lines_without_blank_line_stop_buffering_at_the_limit() {
    let mut decoder = SseFrameDecoder::new(1024);
    let line = format!("data: {}\n", "x".repeat(500));

    let mut errors = Vec::new();
    for _ in 0..10_000 {
        let report = decoder.push_chunk(line.as_bytes());
        assert!(report.frames.is_empty());
        errors.extend(report.errors);
    }
    // Reported once when the limit is crossed; later lines are skipped.
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(matches!(errors[0], FrameError::OversizedFrame { size: 1502, max: 1024 }));

    // The blank line ends the skipped frame and decoding resumes.
    let mut tail = b"\n".to_vec();
    tail.extend(EventBuilder::new(EventKind::RunStarted).run("r").frame());
    let report = decoder.push_chunk(&tail);
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.frames.len(), 1);
    assert_eq!(report.frames[0].kind(), Some(EventKind::RunStarted));
    assert!(decoder.finish().frames.is_empty());
}

#[test]
fn unterminated_buffer_over_limit_is_discarded() {
    let mut decoder = SseFrameDecoder::new(16);
    let report = decoder.push_chunk(&[b'x'; 32]);
    assert!(matches!(report.errors[0], FrameError::OversizedBuffer { size: 32, max: 16 }));
    assert!(decoder.finish().frames.is_empty());
}

#[test]
fn finish_flushes_trailing_frame() {
    let mut decoder = SseFrameDecoder::default();
    let report = decoder.push_chunk(b"data: {\"type\":\"run_started\",\"run_id\":\"r\"}");
    assert!(report.frames.is_empty());

    let tail = decoder.finish();
    assert_eq!(tail.frames.len(), 1);
    assert_eq!(tail.frames[0].kind(), Some(EventKind::RunStarted));
    assert_eq!(DEFAULT_MAX_FRAME_BYTES, 1024 * 1024);
}

#[test]
fn nil_ids_decode_as_absent() {
    let input = b"data: {\"type\":\"task_started\",\"run_id\":\"00000000-0000-0000-0000-000000000000\",\"task_id\":\"\"}\n\n";
    let report = SseFrameDecoder::default().push_chunk(input);
    assert_eq!(report.frames[0].run_id, None);
    assert_eq!(report.frames[0].task_id, None);
}
