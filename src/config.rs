use crate::defaults;
use crate::error::{Result, SignSyncError};
use crate::landmarks::RegionLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineSection,
    pub classifier: ClassifierSection,
    pub output: OutputSection,
    /// Feature layout, in vector order.
    pub regions: Vec<RegionLayout>,
    /// One entry per classifier output index.
    pub classes: Vec<ClassConfig>,
}

/// Windowing, smoothing and gating parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSection {
    pub window_size: usize,
    pub stride: u64,
    pub smoothing_window: usize,
    pub confidence_threshold: f32,
    /// Sentences that may wait for a slow output sink. A sentence flushed
    /// while this many are already waiting is lost (logged at `warn`).
    pub dispatch_queue: usize,
}

/// Sequence classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ClassifierSection {
    /// Path to a linear model JSON file.
    pub model: Option<PathBuf>,
}

/// Sentence output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSection {
    pub separator: String,
    /// External program run once per sentence (e.g. a speech synthesizer).
    /// Sentences go to stdout when unset.
    pub command: Option<String>,
    pub args: Vec<String>,
}

/// What a class does when it becomes the stable label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Append,
    Flush,
    Ignore,
}

/// One `[[classes]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassConfig {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PipelineSection::default(),
            classifier: ClassifierSection::default(),
            output: OutputSection::default(),
            regions: RegionLayout::holistic(),
            classes: default_classes(),
        }
    }
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            window_size: defaults::WINDOW_SIZE,
            stride: defaults::STRIDE,
            smoothing_window: defaults::SMOOTHING_WINDOW,
            confidence_threshold: defaults::CONFIDENCE_THRESHOLD,
            dispatch_queue: defaults::DISPATCH_QUEUE,
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            separator: defaults::TOKEN_SEPARATOR.to_string(),
            command: None,
            args: Vec::new(),
        }
    }
}

/// Two-class model: class 0 ends the sentence, class 1 adds the default token.
fn default_classes() -> Vec<ClassConfig> {
    vec![
        ClassConfig {
            index: 0,
            label: Some("Gesture_0".to_string()),
            action: ActionKind::Flush,
            token: None,
        },
        ClassConfig {
            index: 1,
            label: Some("Gesture_1".to_string()),
            action: ActionKind::Append,
            token: Some(defaults::DEFAULT_TOKEN.to_string()),
        },
    ]
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SignSyncError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SignSyncError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults only when the file is missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(SignSyncError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// - SIGNSYNC_MODEL → classifier.model
    /// - SIGNSYNC_STRIDE → pipeline.stride
    /// - SIGNSYNC_CONFIDENCE_THRESHOLD → pipeline.confidence_threshold
    ///
    /// Values are trimmed and blank ones ignored. Unparseable numbers are an error.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(model) = env_value("SIGNSYNC_MODEL") {
            self.classifier.model = Some(PathBuf::from(model));
        }

        if let Some(stride) = env_value("SIGNSYNC_STRIDE") {
            self.pipeline.stride = stride.parse().map_err(|_| {
                SignSyncError::invalid("SIGNSYNC_STRIDE", format!("not an integer: '{stride}'"))
            })?;
        }

        if let Some(threshold) = env_value("SIGNSYNC_CONFIDENCE_THRESHOLD") {
            self.pipeline.confidence_threshold = threshold.parse().map_err(|_| {
                SignSyncError::invalid(
                    "SIGNSYNC_CONFIDENCE_THRESHOLD",
                    format!("not a number: '{threshold}'"),
                )
            })?;
        }

        Ok(self)
    }

    /// Check values that do not depend on the loaded classifier.
    ///
    /// Class coverage against the classifier's class count is checked when the
    /// pipeline is built.
    pub fn validate(&self) -> Result<()> {
        let p = &self.pipeline;
        if p.window_size == 0 {
            return Err(SignSyncError::invalid("pipeline.window_size", "must be at least 1"));
        }
        if p.stride == 0 {
            return Err(SignSyncError::invalid("pipeline.stride", "must be at least 1"));
        }
        if p.smoothing_window == 0 {
            return Err(SignSyncError::invalid(
                "pipeline.smoothing_window",
                "must be at least 1",
            ));
        }
        if !p.confidence_threshold.is_finite() || p.confidence_threshold < 0.0 {
            return Err(SignSyncError::invalid(
                "pipeline.confidence_threshold",
                format!("must be a finite value >= 0, got {}", p.confidence_threshold),
            ));
        }
        if p.dispatch_queue == 0 {
            return Err(SignSyncError::invalid(
                "pipeline.dispatch_queue",
                "must be at least 1",
            ));
        }
        if self.regions.is_empty() {
            return Err(SignSyncError::invalid("regions", "at least one region is required"));
        }
        if self.classes.is_empty() {
            return Err(SignSyncError::invalid("classes", "at least one class is required"));
        }
        if let Some(command) = &self.output.command
            && command.trim().is_empty()
        {
            return Err(SignSyncError::invalid("output.command", "must not be empty"));
        }
        Ok(())
    }

    /// Total feature vector length for the configured regions.
    pub fn feature_dims(&self) -> usize {
        self.regions.iter().map(RegionLayout::dims).sum()
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SignSyncError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/signsync/config.toml on Linux
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("signsync").join("config.toml"))
            .ok_or_else(|| SignSyncError::ConfigParse {
                message: "could not determine config directory".to_string(),
            })
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
