//! Application entry points.
//!
//! Wires configuration, classifier, landmark source and sentence sink into a
//! running pipeline: frames → gestures → sentences → output.

use crate::classifier::{Classifier, LinearClassifier};
use crate::config::Config;
use crate::error::{Result, SignSyncError};
use crate::landmarks::{LandmarkSource, ReplaySource};
use crate::pipeline::gesture::GesturePipeline;
use crate::pipeline::orchestrator::{Pipeline, PipelineConfig};
use crate::pipeline::sink::{CommandSink, SentenceSink, StdoutSink, SystemCommandExecutor};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Options for `signsync run` that are not part of the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub input: Option<PathBuf>,
    pub model: Option<PathBuf>,
    pub pace: Option<Duration>,
    pub quiet: bool,
    pub color: bool,
}

/// Load the configured classifier model.
pub fn load_classifier(config: &Config) -> Result<Arc<dyn Classifier>> {
    let path = config.classifier.model.as_deref().ok_or_else(|| {
        SignSyncError::invalid(
            "classifier.model",
            "no model configured (use --model or SIGNSYNC_MODEL)",
        )
    })?;
    let model = LinearClassifier::load(path)?;
    tracing::info!(
        model = model.name(),
        classes = model.num_classes(),
        "classifier loaded"
    );
    Ok(Arc::new(model))
}

/// Build the per-stream state, checking the config against the classifier.
pub fn build_gesture_pipeline(
    config: &Config,
    classifier: Arc<dyn Classifier>,
) -> Result<GesturePipeline> {
    config.validate()?;
    GesturePipeline::new(
        &config.pipeline,
        config.regions.clone(),
        &config.classes,
        classifier,
    )
}

/// External command when configured, stdout otherwise.
pub fn build_sink(config: &Config) -> Box<dyn SentenceSink> {
    match &config.output.command {
        Some(command) => Box::new(CommandSink::new(
            SystemCommandExecutor,
            command,
            config.output.args.clone(),
            &config.output.separator,
        )),
        None => Box::new(StdoutSink::new(&config.output.separator)),
    }
}

fn open_source(input: Option<&Path>, pace: Option<Duration>) -> Result<Box<dyn LandmarkSource>> {
    let source = match input {
        Some(path) => ReplaySource::open(path)?,
        None => {
            if std::io::stdin().is_terminal() {
                eprintln!("Reading landmark frames from stdin (one JSON object per line)...");
            }
            ReplaySource::from_stdin()
        }
    };
    Ok(match pace {
        Some(interval) => Box::new(source.with_frame_interval(interval)),
        None => Box::new(source),
    })
}

/// Run the pipeline until the input ends or Ctrl+C.
pub async fn run_command(mut config: Config, options: RunOptions) -> Result<()> {
    if let Some(model) = options.model {
        config.classifier.model = Some(model);
    }

    let classifier = load_classifier(&config)?;
    let gesture = build_gesture_pipeline(&config, classifier)?;
    let source = open_source(options.input.as_deref(), options.pace)?;
    let sink = build_sink(&config);

    let pipeline_config = PipelineConfig {
        dispatch_queue: config.pipeline.dispatch_queue,
        readout: !options.quiet,
        color: options.color,
        separator: config.output.separator.clone(),
        ..Default::default()
    };

    let handle = Pipeline::new(pipeline_config).start(source, gesture, sink)?;
    let stop = handle.stop_signal();
    let mut waiter = tokio::task::spawn_blocking(move || handle.wait());

    let joined = tokio::select! {
        joined = &mut waiter => joined,
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|e| SignSyncError::Other(format!("Failed to wait for Ctrl+C: {}", e)))?;
            if !options.quiet {
                crate::output::clear_line();
                eprintln!("Shutting down...");
            }
            stop.trigger();
            waiter.await
        }
    };

    joined
        .map_err(|e| SignSyncError::Other(format!("Pipeline task failed: {}", e)))?
        .map(|_| ())
}

/// Summary produced by `signsync check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub model: String,
    pub classes: usize,
    pub feature_dims: usize,
    pub window_size: usize,
    pub stride: u64,
    /// `(index, display name)` for every class.
    pub labels: Vec<(usize, String)>,
}

/// Validate the configuration end to end without starting a stream.
pub fn check_command(mut config: Config, model: Option<PathBuf>) -> Result<CheckReport> {
    if let Some(model) = model {
        config.classifier.model = Some(model);
    }
    let classifier = load_classifier(&config)?;
    let name = classifier.name().to_string();
    let classes = classifier.num_classes();
    let gesture = build_gesture_pipeline(&config, classifier)?;

    Ok(CheckReport {
        model: name,
        classes,
        feature_dims: gesture.feature_dims(),
        window_size: config.pipeline.window_size,
        stride: config.pipeline.stride,
        labels: (0..classes)
            .map(|i| (i, gesture.actions().label_name(i)))
            .collect(),
    })
}
