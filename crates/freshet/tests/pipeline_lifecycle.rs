//! End-to-end pipeline tests
//!
//! Drives full pipelines (source → filters → sink) through start, play,
//! EOF/error, join, and restart, observing only the public controller API
//! and the event queue.

use std::time::Duration;

use freshet::{
    AudioFormat, BufferSink, BufferSource, EventKind, GainFilter, NullSink, Pipeline,
    PipelineConfig, QueueError, SilenceSource, Timeout, WavFileSink, WavFileSource,
    UNITY_GAIN_Q15,
};

fn config(frame_samples: usize) -> PipelineConfig {
    PipelineConfig {
        frame_samples,
        ..Default::default()
    }
}

/// Run a pipeline until its first event and return the event kind and code
fn run_to_event(pipeline: &mut Pipeline) -> freshet::Event {
    pipeline.start().unwrap();
    pipeline.play().unwrap();
    pipeline.get_event(Timeout::Forever).unwrap()
}

#[test]
fn roundtrip_reproduces_samples_exactly() {
    let samples: Vec<i32> = (0..1000).map(|v| v * 31 - 15_000).collect();
    let sink = BufferSink::new();
    let capture = sink.capture();

    let mut pipeline = Pipeline::new(config(64)).unwrap();
    pipeline
        .set_nodes(
            Box::new(BufferSource::new(samples.clone())),
            vec![],
            Box::new(sink),
        )
        .unwrap();

    let event = run_to_event(&mut pipeline);
    assert_eq!(event.kind, EventKind::Eof);
    pipeline.join().unwrap();

    assert_eq!(capture.samples(), samples);
}

#[test]
fn gain_chain_scales_bit_exactly() {
    let samples = vec![2, -2, 1000, -1000, i32::MIN, 3];
    let gain = 16384; // 0.5 in Q15
    let expected: Vec<i32> = samples
        .iter()
        .map(|&s| ((s as i64 * gain as i64) >> 15) as i32)
        .collect();

    let sink = BufferSink::new();
    let capture = sink.capture();

    let mut pipeline = Pipeline::new(config(4)).unwrap();
    pipeline
        .set_nodes(
            Box::new(BufferSource::new(samples)),
            vec![Box::new(GainFilter::new(gain))],
            Box::new(sink),
        )
        .unwrap();

    let event = run_to_event(&mut pipeline);
    assert_eq!(event.kind, EventKind::Eof);
    pipeline.join().unwrap();

    assert_eq!(capture.samples(), expected);
}

#[test]
fn eof_emitted_exactly_once() {
    let mut pipeline = Pipeline::new(config(8)).unwrap();
    pipeline
        .set_nodes(
            Box::new(SilenceSource::new(3)),
            vec![],
            Box::new(NullSink::new()),
        )
        .unwrap();

    let event = run_to_event(&mut pipeline);
    assert_eq!(event.kind, EventKind::Eof);

    // Pipeline is paused; no further events arrive until play is called again
    assert_eq!(
        pipeline.get_event(Timeout::After(Duration::from_millis(50))),
        Err(QueueError::TimedOut)
    );
    assert!(!pipeline.is_playing());

    pipeline.join().unwrap();
}

#[test]
fn node_error_pauses_without_crashing() {
    let sink = BufferSink::new().fail_on_pull(2, -5);
    let capture = sink.capture();

    let mut pipeline = Pipeline::new(config(8)).unwrap();
    pipeline
        .set_nodes(
            Box::new(BufferSource::new(vec![7; 100])),
            vec![Box::new(GainFilter::new(UNITY_GAIN_Q15))],
            Box::new(sink),
        )
        .unwrap();

    let event = run_to_event(&mut pipeline);
    assert_eq!(event.kind, EventKind::Error);
    assert_eq!(event.error, Some(-5));

    // Exactly one error event, then silence
    assert_eq!(
        pipeline.get_event(Timeout::After(Duration::from_millis(50))),
        Err(QueueError::TimedOut)
    );

    // Join still succeeds and closes all nodes
    pipeline.join().unwrap();

    // The two pulls before the failure made it through
    assert_eq!(capture.samples(), vec![7; 16]);
}

#[test]
fn lifecycle_is_idempotent_and_restartable() {
    let sink = BufferSink::new();
    let capture = sink.capture();

    let mut pipeline = Pipeline::new(config(8)).unwrap();
    pipeline
        .set_nodes(
            Box::new(BufferSource::new(vec![42; 24])),
            vec![],
            Box::new(sink),
        )
        .unwrap();

    pipeline.start().unwrap();
    pipeline.start().unwrap();
    pipeline.play().unwrap();
    pipeline.play().unwrap();

    let event = pipeline.get_event(Timeout::Forever).unwrap();
    assert_eq!(event.kind, EventKind::Eof);

    pipeline.stop().unwrap();
    pipeline.stop().unwrap();

    pipeline.join().unwrap();
    assert!(!pipeline.is_started());
    assert_eq!(capture.samples(), vec![42; 24]);

    // start after join re-opens the chain and replays from a clean state
    pipeline.start().unwrap();
    pipeline.play().unwrap();
    let event = pipeline.get_event(Timeout::Forever).unwrap();
    assert_eq!(event.kind, EventKind::Eof);
    pipeline.join().unwrap();

    assert_eq!(capture.samples(), vec![42; 24]);
}

#[test]
fn play_after_eof_resumes_with_exhausted_source() {
    let mut pipeline = Pipeline::new(config(8)).unwrap();
    pipeline
        .set_nodes(
            Box::new(SilenceSource::new(1)),
            vec![],
            Box::new(NullSink::new()),
        )
        .unwrap();

    let event = run_to_event(&mut pipeline);
    assert_eq!(event.kind, EventKind::Eof);

    // The source stays exhausted until reopened, so playing again yields
    // another EOF rather than fresh data
    pipeline.play().unwrap();
    let event = pipeline.get_event(Timeout::Forever).unwrap();
    assert_eq!(event.kind, EventKind::Eof);

    pipeline.join().unwrap();
}

#[test]
fn full_event_queue_drops_without_stalling_worker() {
    let mut pipeline = Pipeline::new(PipelineConfig {
        frame_samples: 8,
        event_queue_len: 1,
        ..Default::default()
    })
    .unwrap();
    // An exhausted source reports EOF on every pull
    pipeline
        .set_nodes(
            Box::new(SilenceSource::new(0)),
            vec![],
            Box::new(NullSink::new()),
        )
        .unwrap();

    pipeline.start().unwrap();

    let wait_paused = |p: &Pipeline| {
        while p.is_playing() {
            std::thread::sleep(Duration::from_millis(1));
        }
    };

    // First EOF fills the single-slot queue
    pipeline.play().unwrap();
    wait_paused(&pipeline);

    // Second EOF finds the queue full and gets dropped; the worker survives
    pipeline.play().unwrap();
    wait_paused(&pipeline);

    assert_eq!(
        pipeline.get_event(Timeout::NoWait),
        Ok(freshet::Event::eof())
    );
    assert_eq!(
        pipeline.get_event(Timeout::NoWait),
        Err(QueueError::WouldBlock)
    );

    // The worker is still serviceable after the drop
    pipeline.play().unwrap();
    let event = pipeline.get_event(Timeout::Forever).unwrap();
    assert_eq!(event.kind, EventKind::Eof);

    pipeline.join().unwrap();
}

#[test]
fn wav_files_roundtrip_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let in_path = dir.path().join("in.wav");
    let out_path = dir.path().join("out.wav");

    let samples: Vec<i32> = (0..256).map(|v| (v - 128) * 65536).collect();
    {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&in_path, spec).unwrap();
        for &s in &samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    let mut pipeline = Pipeline::new(config(32)).unwrap();
    pipeline
        .set_nodes(
            Box::new(WavFileSource::new(&in_path)),
            vec![],
            Box::new(WavFileSink::new(&out_path, AudioFormat::default())),
        )
        .unwrap();

    let event = run_to_event(&mut pipeline);
    assert_eq!(event.kind, EventKind::Eof);
    pipeline.join().unwrap();

    let written: Vec<i32> = hound::WavReader::open(&out_path)
        .unwrap()
        .into_samples::<i32>()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(written, samples);
}
