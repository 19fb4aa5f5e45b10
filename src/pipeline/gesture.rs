//! Per-stream gesture state and the station that drives it.
//!
//! Every frame runs synchronously through
//! features → window → scheduler → classifier → smoother → gate → assembler,
//! and a flushed sentence leaves through the dispatcher.

use crate::classifier::Classifier;
use crate::config::{ClassConfig, PipelineSection};
use crate::error::{Result, SignSyncError};
use crate::landmarks::{FrameDetections, RegionLayout};
use crate::pipeline::assembler::{ClassActionMap, SentenceAssembler};
use crate::pipeline::dispatcher::Dispatcher;
use crate::pipeline::error::StationError;
use crate::pipeline::features::FeatureVectorBuilder;
use crate::pipeline::gate::StabilityGate;
use crate::pipeline::scheduler::InferenceScheduler;
use crate::pipeline::smoother::ProbabilitySmoother;
use crate::pipeline::station::Station;
use crate::pipeline::types::{Tick, TickOutcome, Token, Transition};
use crate::pipeline::window::SequenceWindow;
use std::sync::Arc;

/// All mutable state for one landmark stream.
pub struct GesturePipeline {
    features: FeatureVectorBuilder,
    window: SequenceWindow,
    scheduler: InferenceScheduler,
    classifier: Arc<dyn Classifier>,
    smoother: ProbabilitySmoother,
    gate: StabilityGate,
    assembler: SentenceAssembler,
    dispatcher: Option<Dispatcher>,
}

impl GesturePipeline {
    /// Validate the configuration against the classifier and build the state.
    pub fn new(
        settings: &PipelineSection,
        regions: Vec<RegionLayout>,
        classes: &[ClassConfig],
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self> {
        let features = FeatureVectorBuilder::new(regions)?;
        if let Some(expected) = classifier.expected_features()
            && expected != features.dims()
        {
            return Err(SignSyncError::ShapeMismatch {
                what: format!("feature width for classifier '{}'", classifier.name()),
                expected,
                actual: features.dims(),
            });
        }

        let num_classes = classifier.num_classes();
        let actions = ClassActionMap::from_config(classes, num_classes)?;

        Ok(Self {
            window: SequenceWindow::new(settings.window_size)?,
            scheduler: InferenceScheduler::new(settings.stride)?,
            smoother: ProbabilitySmoother::new(settings.smoothing_window, num_classes)?,
            gate: StabilityGate::new(settings.confidence_threshold)?,
            assembler: SentenceAssembler::new(actions),
            features,
            classifier,
            dispatcher: None,
        })
    }

    /// Send flushed sentences to `dispatcher`.
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Feed one frame.
    ///
    /// Only configuration problems are returned as errors. A failing
    /// classifier yields `TickOutcome::ClassifierFailed` and leaves the
    /// current label and buffer as they were.
    pub fn tick(&mut self, detections: &FrameDetections) -> Result<Tick> {
        let (vector, coverage) = self.features.build(detections);
        self.window.push(vector)?;

        let full = self.window.is_full();
        let run_inference = self.scheduler.advance(full);
        let frame = self.scheduler.frame();

        let outcome = if !full {
            TickOutcome::Warming {
                buffered: self.window.len(),
            }
        } else if !run_inference {
            TickOutcome::OffStride
        } else {
            self.infer(frame)?
        };

        Ok(Tick {
            frame,
            coverage,
            outcome,
        })
    }

    fn infer(&mut self, frame: u64) -> Result<TickOutcome> {
        let window = self.window.snapshot();
        let probs = match self.classifier.classify(&window) {
            Ok(probs) => probs,
            Err(e) if e.is_configuration() => return Err(e),
            Err(e) => {
                tracing::warn!(frame, error = %e, "classifier failed, keeping previous label");
                return Ok(TickOutcome::ClassifierFailed {
                    message: e.to_string(),
                });
            }
        };

        // a NaN would sit in the smoother for a whole smoothing window
        if let Some(&score) = probs.iter().find(|p| !p.is_finite() || **p < 0.0) {
            tracing::warn!(
                frame,
                score,
                "classifier returned an invalid score, keeping previous label"
            );
            return Ok(TickOutcome::ClassifierFailed {
                message: format!("invalid score {score} in classifier output"),
            });
        }

        self.smoother.push(probs)?;
        let smoothed = self.smoother.mean().unwrap_or_default();
        let decision = self.gate.evaluate(&smoothed);
        let transition = self.assembler.advance(decision.label);

        match &transition {
            Transition::Flushed(sentence) => {
                tracing::debug!(
                    frame,
                    sequence = sentence.sequence,
                    tokens = sentence.len(),
                    "sentence flushed"
                );
                if let Some(dispatcher) = &self.dispatcher {
                    dispatcher.dispatch(sentence.clone());
                }
            }
            Transition::Appended(token) => tracing::trace!(frame, %token, "token appended"),
            _ => {}
        }

        Ok(TickOutcome::Inferred {
            decision,
            transition,
            pending: self.assembler.pending().to_vec(),
        })
    }

    /// Tokens accumulated since the last flush.
    pub fn pending(&self) -> &[Token] {
        self.assembler.pending()
    }

    pub fn actions(&self) -> &ClassActionMap {
        self.assembler.actions()
    }

    pub fn feature_dims(&self) -> usize {
        self.features.dims()
    }

    pub fn frames(&self) -> u64 {
        self.scheduler.frame()
    }

    /// End of stream: the pending buffer is discarded, never flushed.
    pub fn shutdown(&mut self) -> usize {
        let dropped = self.assembler.discard();
        if dropped > 0 {
            tracing::debug!(tokens = dropped, "discarding unfinished sentence");
        }
        self.dispatcher = None;
        dropped
    }
}

/// Station running a `GesturePipeline`, forwarding only inference ticks.
pub struct GestureStation {
    pipeline: GesturePipeline,
    inferences: u64,
    classifier_failures: u64,
}

impl GestureStation {
    pub fn new(pipeline: GesturePipeline) -> Self {
        Self {
            pipeline,
            inferences: 0,
            classifier_failures: 0,
        }
    }
}

impl Station for GestureStation {
    type Input = FrameDetections;
    type Output = Tick;

    fn process(
        &mut self,
        input: FrameDetections,
    ) -> std::result::Result<Option<Tick>, StationError> {
        let tick = self.pipeline.tick(&input)?;
        match &tick.outcome {
            TickOutcome::Inferred { .. } => {
                self.inferences += 1;
                Ok(Some(tick))
            }
            TickOutcome::ClassifierFailed { message } => {
                self.classifier_failures += 1;
                Err(StationError::Recoverable(format!(
                    "frame {}: {}",
                    tick.frame, message
                )))
            }
            TickOutcome::Warming { .. } | TickOutcome::OffStride => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "gesture"
    }

    fn shutdown(&mut self) {
        let discarded = self.pipeline.shutdown();
        tracing::info!(
            frames = self.pipeline.frames(),
            inferences = self.inferences,
            classifier_failures = self.classifier_failures,
            discarded_tokens = discarded,
            "gesture station finished"
        );
    }
}
