//! End-to-end behavior of the gesture pipeline with scripted classifier output.

use signsync::classifier::MockClassifier;
use signsync::config::{ActionKind, ClassConfig, PipelineSection};
use signsync::landmarks::{FrameDetections, Landmark, MockLandmarkSource, RegionLayout};
use signsync::pipeline::{
    CollectorSink, Dispatcher, GesturePipeline, Pipeline, PipelineConfig, Sentence, StableLabel,
    TickOutcome, Transition,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

const NONE: [f32; 2] = [0.5, 0.5];
const FLUSH: [f32; 2] = [0.95, 0.05];
const TOKEN: [f32; 2] = [0.05, 0.95];

fn classes() -> Vec<ClassConfig> {
    vec![
        ClassConfig {
            index: 0,
            label: Some("stop".to_string()),
            action: ActionKind::Flush,
            token: None,
        },
        ClassConfig {
            index: 1,
            label: Some("sign".to_string()),
            action: ActionKind::Append,
            token: Some("TOKEN".to_string()),
        },
    ]
}

fn settings(window_size: usize, stride: u64) -> PipelineSection {
    PipelineSection {
        window_size,
        stride,
        smoothing_window: 1,
        confidence_threshold: 0.7,
        dispatch_queue: 8,
    }
}

fn regions() -> Vec<RegionLayout> {
    vec![
        RegionLayout::new("pose", 2, true),
        RegionLayout::new("right_hand", 3, false),
    ]
}

fn frame() -> FrameDetections {
    FrameDetections::empty().with_points("right_hand", vec![Landmark::new(0.1, 0.2, 0.3); 3])
}

fn scripted(labels: &[[f32; 2]]) -> MockClassifier {
    MockClassifier::new(2).with_responses(labels.iter().map(|p| p.to_vec()).collect())
}

/// Run one inference per frame and collect everything dispatched.
fn run_labels(labels: &[[f32; 2]]) -> (Vec<Sentence>, GesturePipeline) {
    let (dispatcher, rx) = Dispatcher::bounded(16);
    let mut pipeline = GesturePipeline::new(
        &settings(1, 1),
        regions(),
        &classes(),
        Arc::new(scripted(labels)),
    )
    .unwrap()
    .with_dispatcher(dispatcher);

    for _ in labels {
        pipeline.tick(&frame()).unwrap();
    }
    (rx.try_iter().collect(), pipeline)
}

#[test]
fn test_token_then_flush_dispatches_one_sentence() {
    let (sentences, pipeline) = run_labels(&[NONE, TOKEN, TOKEN, FLUSH]);

    assert_eq!(sentences.len(), 1);
    assert_eq!(sentences[0].join(" "), "TOKEN");
    assert!(pipeline.pending().is_empty());
}

#[test]
fn test_flush_with_empty_buffer_dispatches_nothing() {
    let (sentences, _) = run_labels(&[NONE, FLUSH, NONE]);
    assert!(sentences.is_empty());
}

#[test]
fn test_two_sentences_in_sequence() {
    let (sentences, _) = run_labels(&[NONE, TOKEN, FLUSH, TOKEN, TOKEN, FLUSH]);

    assert_eq!(sentences.len(), 2);
    for (i, sentence) in sentences.iter().enumerate() {
        assert_eq!(sentence.join(" "), "TOKEN");
        assert_eq!(sentence.sequence, i as u64 + 1);
    }
}

#[test]
fn test_no_gesture_between_tokens_flushes() {
    let (sentences, _) = run_labels(&[TOKEN, NONE, TOKEN, NONE]);
    assert_eq!(sentences.len(), 2);
}

#[test]
fn test_inference_schedule_for_default_window_and_stride() {
    let classifier = MockClassifier::new(2);
    let mut pipeline = GesturePipeline::new(
        &settings(30, 2),
        regions(),
        &classes(),
        Arc::new(classifier.clone()),
    )
    .unwrap();

    let mut inferred = Vec::new();
    for _ in 0..32 {
        let tick = pipeline.tick(&frame()).unwrap();
        if tick.ran_inference() {
            inferred.push(tick.frame);
        }
        if tick.frame < 30 {
            assert_eq!(
                tick.outcome,
                TickOutcome::Warming {
                    buffered: tick.frame as usize
                }
            );
        }
    }

    assert_eq!(inferred, vec![30, 32]);
    assert_eq!(classifier.calls(), 2);
}

#[test]
fn test_smoothing_delays_label_change() {
    let mut section = settings(1, 1);
    section.smoothing_window = 3;
    let mut pipeline = GesturePipeline::new(
        &section,
        regions(),
        &classes(),
        Arc::new(scripted(&[FLUSH, FLUSH, TOKEN, TOKEN, TOKEN])),
    )
    .unwrap();

    let labels: Vec<StableLabel> = (0..5)
        .map(|_| match pipeline.tick(&frame()).unwrap().outcome {
            TickOutcome::Inferred { decision, .. } => decision.label,
            other => panic!("Expected inference, got {:?}", other),
        })
        .collect();

    // mean of [F, F, T] is 0.65/0.35, below the threshold
    assert_eq!(labels[0], StableLabel::Class(0));
    assert_eq!(labels[1], StableLabel::Class(0));
    assert_eq!(labels[2], StableLabel::NoGesture);
    assert_eq!(labels[3], StableLabel::NoGesture);
    assert_eq!(labels[4], StableLabel::Class(1));
}

#[test]
fn test_classifier_failure_keeps_label_and_buffer() {
    let classifier = MockClassifier::new(2)
        .with_response(TOKEN.to_vec())
        .with_failure("inference timeout")
        .with_response(FLUSH.to_vec());
    let (dispatcher, rx) = Dispatcher::bounded(4);
    let mut pipeline =
        GesturePipeline::new(&settings(1, 1), regions(), &classes(), Arc::new(classifier))
            .unwrap()
            .with_dispatcher(dispatcher);

    pipeline.tick(&frame()).unwrap();
    let failed = pipeline.tick(&frame()).unwrap();
    assert!(matches!(failed.outcome, TickOutcome::ClassifierFailed { .. }));
    assert_eq!(pipeline.pending().len(), 1);

    let flushed = pipeline.tick(&frame()).unwrap();
    assert!(flushed.flushed().is_some());
    assert_eq!(rx.try_recv().unwrap().join(" "), "TOKEN");
}

#[test]
fn test_full_dispatch_queue_drops_without_blocking() {
    // nobody drains the queue
    let (dispatcher, rx) = Dispatcher::bounded(1);
    let labels = [TOKEN, FLUSH, TOKEN, FLUSH, TOKEN, FLUSH];
    let mut pipeline =
        GesturePipeline::new(&settings(1, 1), regions(), &classes(), Arc::new(scripted(&labels)))
            .unwrap()
            .with_dispatcher(dispatcher);

    let start = Instant::now();
    let mut flushes = 0;
    for _ in labels {
        if let TickOutcome::Inferred {
            transition: Transition::Flushed(_),
            ..
        } = pipeline.tick(&frame()).unwrap().outcome
        {
            flushes += 1;
        }
    }
    assert!(start.elapsed() < Duration::from_secs(1));

    assert_eq!(flushes, 3);
    assert_eq!(rx.try_iter().count(), 1);
}

#[test]
fn test_region_coverage_reported_per_frame() {
    let mut pipeline = GesturePipeline::new(
        &settings(2, 1),
        regions(),
        &classes(),
        Arc::new(MockClassifier::new(2)),
    )
    .unwrap();

    let tick = pipeline.tick(&frame()).unwrap();
    assert_eq!(tick.coverage.present, 1);
    assert_eq!(tick.coverage.absent, 1);

    let malformed = FrameDetections::empty().with_points("pose", vec![Landmark::default(); 5]);
    let tick = pipeline.tick(&malformed).unwrap();
    assert_eq!(tick.coverage.malformed, 1);
}

#[test]
fn test_threaded_pipeline_delivers_and_discards_tail() {
    let labels = [NONE, TOKEN, FLUSH, TOKEN, TOKEN, NONE, TOKEN];
    let source = MockLandmarkSource::new(vec![frame(); labels.len()]);

    let handle = Pipeline::new(PipelineConfig::default())
        .start(
            Box::new(source),
            GesturePipeline::new(&settings(1, 1), regions(), &classes(), Arc::new(scripted(&labels)))
                .unwrap(),
            Box::new(CollectorSink::new()),
        )
        .unwrap();

    // the trailing TOKEN never gets a flush and is discarded at end of stream
    assert_eq!(handle.wait().unwrap(), Some("TOKEN\nTOKEN".to_string()));
}
