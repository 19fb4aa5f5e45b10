//! Landmark pipeline that runs from startup until the source ends or stop.

use crate::error::{Result, SignSyncError};
use crate::landmarks::LandmarkSource;
use crate::output::ReadoutStation;
use crate::pipeline::dispatcher::{DispatchWorker, Dispatcher};
use crate::pipeline::error::{ErrorReporter, LogReporter, StationError};
use crate::pipeline::gesture::{GesturePipeline, GestureStation};
use crate::pipeline::sink::SentenceSink;
use crate::pipeline::station::StationRunner;
use crate::pipeline::types::Tick;
use crossbeam_channel::{Receiver, RecvTimeoutError, TrySendError, bounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Consecutive read errors tolerated from a live source before giving up.
const MAX_CONSECUTIVE_ERRORS: u32 = 10;

/// Configuration for the pipeline threads.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Frames buffered between the source thread and the gesture station.
    pub frame_buffer: usize,
    /// Inference ticks buffered for the readout.
    pub tick_buffer: usize,
    /// Sentences waiting for the sink before new ones are dropped.
    pub dispatch_queue: usize,
    /// Draw the prediction/buffer line on stderr.
    pub readout: bool,
    pub color: bool,
    /// Token separator used by the readout.
    pub separator: String,
    /// How long `stop` waits for queued sentences to be delivered.
    pub drain_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_buffer: 64,
            tick_buffer: 16,
            dispatch_queue: crate::defaults::DISPATCH_QUEUE,
            readout: false,
            color: true,
            separator: crate::defaults::TOKEN_SEPARATOR.to_string(),
            drain_timeout: Duration::from_secs(5),
        }
    }
}

/// Cloneable request to stop a running pipeline from another thread.
#[derive(Debug, Clone)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn trigger(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        !self.0.load(Ordering::SeqCst)
    }
}

/// Remembers the first fatal station error so the handle can surface it.
struct FatalTracker {
    inner: Arc<dyn ErrorReporter>,
    fatal: Mutex<Option<(String, String)>>,
}

impl ErrorReporter for FatalTracker {
    fn report(&self, station: &str, error: &StationError) {
        self.inner.report(station, error);
        if let StationError::Fatal(message) = error
            && let Ok(mut fatal) = self.fatal.lock()
            && fatal.is_none()
        {
            *fatal = Some((station.to_string(), message.clone()));
        }
    }
}

impl FatalTracker {
    fn take(&self) -> Option<(String, String)> {
        self.fatal.lock().ok().and_then(|mut f| f.take())
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
    /// Receiver for the sink's finish() result
    result_rx: Receiver<Option<String>>,
    tracker: Arc<FatalTracker>,
    drain_timeout: Duration,
}

impl PipelineHandle {
    /// Stops the pipeline and returns the sink's accumulated result.
    ///
    /// The unfinished sentence is discarded. Sentences already queued are
    /// still delivered, waiting up to `drain_timeout`.
    pub fn stop(self) -> Result<Option<String>> {
        self.running.store(false, Ordering::SeqCst);
        let timeout = self.drain_timeout;
        self.finish(Some(timeout))
    }

    /// Blocks until the source ends, then shuts down.
    ///
    /// After a `StopSignal` fires this returns within `drain_timeout` even if
    /// the source is stuck waiting for input.
    pub fn wait(self) -> Result<Option<String>> {
        self.finish(None)
    }

    pub fn stop_signal(&self) -> StopSignal {
        StopSignal(self.running.clone())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Waits for the dispatch worker's result.
    ///
    /// Without a timeout this blocks until the stream ends, but once a stop
    /// is requested it only waits `drain_timeout` more: a source blocked in
    /// `read_frame` never notices the stop and would keep the stations alive.
    fn wait_for_result(&self, timeout: Option<Duration>) -> Option<String> {
        if let Some(timeout) = timeout {
            return self.result_rx.recv_timeout(timeout).ok().flatten();
        }
        let poll_interval = Duration::from_millis(50);
        loop {
            match self.result_rx.recv_timeout(poll_interval) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Disconnected) => return None,
                Err(RecvTimeoutError::Timeout) if !self.is_running() => {
                    tracing::debug!("stop requested, waiting for queued sentences");
                    return self
                        .result_rx
                        .recv_timeout(self.drain_timeout)
                        .ok()
                        .flatten();
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    fn finish(mut self, timeout: Option<Duration>) -> Result<Option<String>> {
        let result = self.wait_for_result(timeout);
        self.running.store(false, Ordering::SeqCst);

        // Give remaining threads 1s, joining finished ones to surface panics.
        let deadline = Instant::now() + Duration::from_secs(1);
        let poll_interval = Duration::from_millis(20);

        loop {
            let mut remaining = Vec::new();
            for handle in self.threads.drain(..) {
                if handle.is_finished() {
                    if let Err(panic_info) = handle.join() {
                        let msg = panic_info
                            .downcast_ref::<&str>()
                            .copied()
                            .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                            .unwrap_or("unknown panic");
                        tracing::error!("pipeline thread panicked: {msg}");
                    }
                } else {
                    remaining.push(handle);
                }
            }
            self.threads = remaining;

            if self.threads.is_empty() {
                break;
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    threads = self.threads.len(),
                    "shutdown timeout, detaching remaining threads"
                );
                break;
            }
            thread::sleep(poll_interval);
        }

        match self.tracker.take() {
            Some((station, message)) => Err(SignSyncError::PipelineFailed { station, message }),
            None => Ok(result),
        }
    }
}

/// Gesture pipeline: LandmarkSource → GestureStation → readout, with
/// flushed sentences going through the dispatcher to a SentenceSink.
pub struct Pipeline {
    config: PipelineConfig,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    /// Creates a new pipeline with the default error reporter.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Starts the source, the gesture station, the readout and the dispatch worker.
    pub fn start(
        self,
        mut source: Box<dyn LandmarkSource>,
        gesture: GesturePipeline,
        sink: Box<dyn SentenceSink>,
    ) -> Result<PipelineHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let tracker = Arc::new(FatalTracker {
            inner: self.error_reporter.clone(),
            fatal: Mutex::new(None),
        });
        let reporter: Arc<dyn ErrorReporter> = tracker.clone();

        let (frame_tx, frame_rx) = bounded(self.config.frame_buffer.max(1));
        let (tick_tx, tick_rx) = bounded::<Tick>(self.config.tick_buffer.max(1));
        let (dispatcher, sentence_rx) = Dispatcher::bounded(self.config.dispatch_queue);
        let (result_tx, result_rx) = bounded(1);

        let actions = gesture.actions().clone();
        let worker = DispatchWorker::spawn(sentence_rx, sink, result_tx);
        let gesture_runner = StationRunner::spawn(
            GestureStation::new(gesture.with_dispatcher(dispatcher)),
            frame_rx,
            tick_tx,
            reporter.clone(),
        );

        let mut threads = Vec::new();
        if self.config.readout {
            // the readout never produces output
            let (readout_tx, _readout_rx) = bounded::<()>(1);
            let readout = ReadoutStation::new(actions, &self.config.separator)
                .with_color(self.config.color);
            let readout_runner = StationRunner::spawn(readout, tick_rx, readout_tx, reporter);
            threads.push(thread::spawn(move || {
                if let Err(msg) = readout_runner.join() {
                    tracing::error!("{msg}");
                }
            }));
        } else {
            threads.push(thread::spawn(move || for _ in tick_rx {}));
        }

        // Start the source last so nothing is lost while stations spin up.
        // Dropping frame_tx on failure unwinds the stations.
        source.start()?;
        let source_is_finite = source.is_finite();

        let source_running = running.clone();
        let source_handle = thread::spawn(move || {
            let poll_interval = Duration::from_millis(10);
            let mut consecutive_errors: u32 = 0;
            let mut frames_sent: u64 = 0;
            let mut frames_dropped: u64 = 0;

            while source_running.load(Ordering::SeqCst) {
                let frame = match source.read_frame() {
                    Ok(Some(frame)) => {
                        consecutive_errors = 0;
                        frame
                    }
                    Ok(None) => {
                        tracing::debug!("landmark stream ended");
                        break;
                    }
                    Err(e) if source_is_finite => {
                        tracing::error!(error = %e, "landmark source failed, ending stream");
                        break;
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                            tracing::error!(
                                error = %e,
                                "landmark source failed {consecutive_errors} times in a row"
                            );
                            break;
                        }
                        thread::sleep(poll_interval);
                        continue;
                    }
                };

                if source_is_finite {
                    // replayed frames are never dropped
                    if frame_tx.send(frame).is_err() {
                        break;
                    }
                    frames_sent += 1;
                } else {
                    match frame_tx.try_send(frame) {
                        Ok(()) => frames_sent += 1,
                        Err(TrySendError::Full(_)) => frames_dropped += 1,
                        Err(TrySendError::Disconnected(_)) => break,
                    }
                }
            }

            if let Err(e) = source.stop() {
                tracing::warn!(error = %e, "failed to stop landmark source");
            }
            tracing::info!(frames_sent, frames_dropped, "landmark source stopped");
        });

        threads.push(source_handle);
        threads.push(thread::spawn(move || {
            if let Err(msg) = gesture_runner.join() {
                tracing::error!("{msg}");
            }
        }));
        threads.push(thread::spawn(move || {
            if let Err(msg) = worker.join() {
                tracing::error!("{msg}");
            }
        }));

        Ok(PipelineHandle {
            running,
            threads,
            result_rx,
            tracker,
            drain_timeout: self.config.drain_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MockClassifier;
    use crate::config::{ActionKind, ClassConfig, PipelineSection};
    use crate::landmarks::{FrameDetections, Landmark, MockLandmarkSource, RegionLayout};
    use crate::pipeline::sink::CollectorSink;

    fn gesture(classifier: MockClassifier) -> GesturePipeline {
        let settings = PipelineSection {
            window_size: 1,
            stride: 1,
            smoothing_window: 1,
            confidence_threshold: 0.7,
            dispatch_queue: 4,
        };
        let classes = vec![
            ClassConfig {
                index: 0,
                label: None,
                action: ActionKind::Flush,
                token: None,
            },
            ClassConfig {
                index: 1,
                label: None,
                action: ActionKind::Append,
                token: Some("six-seven".to_string()),
            },
        ];
        GesturePipeline::new(
            &settings,
            vec![RegionLayout::new("hand", 1, false)],
            &classes,
            Arc::new(classifier),
        )
        .unwrap()
    }

    fn frames(n: usize) -> MockLandmarkSource {
        let frame = FrameDetections::empty().with_points("hand", vec![Landmark::default()]);
        MockLandmarkSource::new(vec![frame; n])
    }

    #[test]
    fn finite_source_runs_to_completion() {
        let classifier = MockClassifier::new(2).with_responses(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
        ]);
        let handle = Pipeline::new(PipelineConfig::default())
            .start(
                Box::new(frames(5)),
                gesture(classifier),
                Box::new(CollectorSink::new()),
            )
            .unwrap();

        let result = handle.wait().unwrap();
        assert_eq!(result, Some("six-seven\nsix-seven".to_string()));
    }

    #[test]
    fn end_of_stream_discards_unfinished_sentence() {
        let classifier = MockClassifier::new(2).with_response(vec![0.0, 1.0]);
        let handle = Pipeline::new(PipelineConfig::default())
            .start(
                Box::new(frames(3)),
                gesture(classifier),
                Box::new(CollectorSink::new()),
            )
            .unwrap();

        assert_eq!(handle.wait().unwrap(), None);
    }

    #[test]
    fn source_start_failure_is_returned() {
        let result = Pipeline::new(PipelineConfig::default()).start(
            Box::new(frames(1).with_start_failure()),
            gesture(MockClassifier::new(2)),
            Box::new(CollectorSink::new()),
        );
        assert!(matches!(result, Err(SignSyncError::LandmarkSource { .. })));
    }

    #[test]
    fn fatal_station_error_surfaces_from_wait() {
        // three scores for a two-class map
        let classifier = MockClassifier::new(2).with_response(vec![0.1, 0.2, 0.7]);
        let handle = Pipeline::new(PipelineConfig::default())
            .start(
                Box::new(frames(4)),
                gesture(classifier),
                Box::new(CollectorSink::new()),
            )
            .unwrap();

        match handle.wait() {
            Err(SignSyncError::PipelineFailed { station, .. }) => assert_eq!(station, "gesture"),
            other => panic!("Expected PipelineFailed, got {:?}", other),
        }
    }

    #[test]
    fn stop_signal_ends_wait() {
        struct EndlessSource;
        impl LandmarkSource for EndlessSource {
            fn start(&mut self) -> Result<()> {
                Ok(())
            }
            fn stop(&mut self) -> Result<()> {
                Ok(())
            }
            fn read_frame(&mut self) -> Result<Option<FrameDetections>> {
                thread::sleep(Duration::from_millis(2));
                Ok(Some(FrameDetections::empty()))
            }
        }

        let handle = Pipeline::new(PipelineConfig::default())
            .start(
                Box::new(EndlessSource),
                gesture(MockClassifier::new(2)),
                Box::new(CollectorSink::new()),
            )
            .unwrap();
        assert!(handle.is_running());

        let signal = handle.stop_signal();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            signal.trigger();
        });

        assert_eq!(handle.wait().unwrap(), None);
        stopper.join().unwrap();
    }

    #[test]
    fn stop_signal_ends_wait_while_source_is_blocked() {
        // read_frame never returns, like stdin on an idle terminal
        struct IdleSource {
            frames: Receiver<FrameDetections>,
        }
        impl LandmarkSource for IdleSource {
            fn start(&mut self) -> Result<()> {
                Ok(())
            }
            fn stop(&mut self) -> Result<()> {
                Ok(())
            }
            fn read_frame(&mut self) -> Result<Option<FrameDetections>> {
                Ok(self.frames.recv().ok())
            }
        }

        let (_frame_tx, frame_rx) = bounded(1);
        let config = PipelineConfig {
            drain_timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let handle = Pipeline::new(config)
            .start(
                Box::new(IdleSource { frames: frame_rx }),
                gesture(MockClassifier::new(2)),
                Box::new(CollectorSink::new()),
            )
            .unwrap();

        let signal = handle.stop_signal();
        let (done_tx, done_rx) = bounded(1);
        let waiter = thread::spawn(move || {
            let _ = done_tx.send(handle.wait());
        });

        thread::sleep(Duration::from_millis(50));
        signal.trigger();
        assert!(signal.is_triggered());

        let result = done_rx
            .recv_timeout(Duration::from_secs(3))
            .expect("wait() should return after the stop signal");
        assert_eq!(result.unwrap(), None);
        waiter.join().unwrap();
    }
}
