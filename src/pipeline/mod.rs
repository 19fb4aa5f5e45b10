//! Gesture pipeline: landmark frames in, sentences out.
//!
//! The per-frame path runs on a single station thread. Stations are
//! connected by bounded crossbeam channels; finished sentences cross to a
//! dedicated dispatch worker.

pub mod assembler;
pub mod dispatcher;
pub mod error;
pub mod features;
pub mod gate;
pub mod gesture;
pub mod orchestrator;
pub mod scheduler;
pub mod sink;
pub mod smoother;
pub mod station;
pub mod types;
pub mod window;

pub use assembler::{ClassAction, ClassActionMap, SentenceAssembler};
pub use dispatcher::{DispatchWorker, Dispatcher};
pub use error::{ErrorReporter, LogReporter, StationError};
pub use features::{FeatureVector, FeatureVectorBuilder, RegionCoverage};
pub use gate::{GateDecision, StabilityGate};
pub use gesture::{GesturePipeline, GestureStation};
pub use orchestrator::{Pipeline, PipelineConfig, PipelineHandle, StopSignal};
pub use scheduler::InferenceScheduler;
pub use sink::{
    CollectorSink, CommandExecutor, CommandSink, SentenceSink, StdoutSink, SystemCommandExecutor,
};
pub use smoother::ProbabilitySmoother;
pub use station::{Station, StationRunner};
pub use types::{Sentence, StableLabel, Tick, TickOutcome, Token, Transition};
pub use window::SequenceWindow;
